//! Ambient light sensing.
//!
//! The board carries a single Lite-On LTR-303ALS-01 on the shared I²C bus.
//! The driver is blocking and stateless; the polling loop in
//! [`crate::monitor`] is its only caller.

pub mod ltr303;
pub mod registers;

pub use ltr303::{ChannelReading, Ltr303};

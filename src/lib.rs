//! Host-testable core of the ney_tack firmware.
//!
//! Everything that does not need real hardware lives here: the register bus
//! client, the LTR-303 driver, the device state and its wire format, the
//! flasher, and the BLE connection logic. The embedded binary (`main.rs`,
//! behind the `embedded` feature) links against this crate and supplies the
//! HAL peripherals and the SoftDevice.
//!
//! Usage: `cargo test` (host), `cargo run --release --features embedded`
//! (target, add `wireless` to bring up the BLE subsystem).

#![cfg_attr(not(test), no_std)]

// ═══════════════════════════════════════════════════════════════════════════
// Configuration & Errors
// ═══════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod error;

pub use error::{BleError, BusError, Error, SensorError};

// ═══════════════════════════════════════════════════════════════════════════
// Hardware drivers
// ═══════════════════════════════════════════════════════════════════════════

pub mod bus;
pub mod led;
pub mod sensor;

// ═══════════════════════════════════════════════════════════════════════════
// Device logic
// ═══════════════════════════════════════════════════════════════════════════

pub mod app;
pub mod ble;
pub mod flasher;
pub mod monitor;
pub mod state;

pub use app::App;
pub use state::{DeviceState, SERIALIZED_STATE_LEN};

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests - cross-module scenarios
// ═══════════════════════════════════════════════════════════════════════════

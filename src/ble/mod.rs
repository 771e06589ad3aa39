//! Bluetooth Low Energy peripheral logic.
//!
//! The device runs the Nordic SoftDevice S140 in **Peripheral** role and
//! exposes the Nordic UART Service (NUS):
//!
//! 1. **Advertising** - static payload with the device name and NUS UUID.
//! 2. **Connection Manager** - the single logical connection and its
//!    reaction to transport events.
//! 3. **Throughput** - rolling bytes/s accounting for the send pump.
//! 4. **Backlog** - coalesced callback events that did not fit the run-loop
//!    channel.
//!
//! Everything here is plain data and runs on the host. The SoftDevice glue
//! lives in the firmware binary and turns stack callbacks into
//! [`TransportEvent`]s.

pub mod advertising;
pub mod backlog;
pub mod connection;
pub mod throughput;

pub use backlog::{Deferred, EventBacklog};
pub use connection::{ConnectionContext, Reaction};
pub use throughput::{ThroughputMeter, ThroughputReport};

/// Stack-assigned connection handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnHandle(pub u16);

/// Link events delivered by the radio task to the run loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportEvent {
    /// A central connected.
    Connected { handle: ConnHandle },
    /// The link dropped or was closed.
    Disconnected { handle: ConnHandle },
    /// ATT MTU exchange completed.
    MtuExchanged { handle: ConnHandle, mtu: u16 },
    /// The peer enabled TX notifications.
    ServiceConnected { handle: ConnHandle },
    /// The peer disabled TX notifications.
    ServiceDisconnected { handle: ConnHandle },
    /// The peer wrote `len` bytes to RX.
    DataReceived { handle: ConnHandle, len: usize },
}

impl TransportEvent {
    pub fn handle(&self) -> ConnHandle {
        match *self {
            TransportEvent::Connected { handle }
            | TransportEvent::Disconnected { handle }
            | TransportEvent::MtuExchanged { handle, .. }
            | TransportEvent::ServiceConnected { handle }
            | TransportEvent::ServiceDisconnected { handle }
            | TransportEvent::DataReceived { handle, .. } => handle,
        }
    }
}

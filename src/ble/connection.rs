//! The single logical NUS connection.
//!
//! One slot, empty until a central connects. Events for any other handle
//! are ignored, except that every inbound write toggles flashing.

use super::throughput::{ThroughputMeter, ThroughputReport};
use super::{ConnHandle, TransportEvent};
use crate::config::{ATT_DEFAULT_MTU, ATT_PAYLOAD_OVERHEAD, CONNECTION_TAG, PAYLOAD_CAPACITY};
use crate::state::{DeviceState, SERIALIZED_STATE_LEN};
use heapless::Vec;

/// Usable payload before an MTU exchange.
pub const DEFAULT_PAYLOAD_CAPACITY: u16 = ATT_DEFAULT_MTU - 4;

/// What the caller has to do after an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reaction {
    /// The event concerned the current connection.
    pub matched: bool,
    /// Ask the stack for a send-readiness callback.
    pub request_send: bool,
    /// `active` was flipped to this value.
    pub toggled: Option<bool>,
    /// A throughput window closed.
    pub report: Option<ThroughputReport>,
}

#[derive(Debug)]
pub struct ConnectionContext {
    identity_tag: char,
    handle: Option<ConnHandle>,
    notifications_enabled: bool,
    payload_capacity: u16,
    send_counter: u32,
    payload: Vec<u8, PAYLOAD_CAPACITY>,
    throughput: ThroughputMeter,
}

impl Default for ConnectionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionContext {
    pub const fn new() -> Self {
        Self {
            identity_tag: CONNECTION_TAG,
            handle: None,
            notifications_enabled: false,
            payload_capacity: DEFAULT_PAYLOAD_CAPACITY,
            send_counter: 0,
            payload: Vec::new(),
            throughput: ThroughputMeter::new(),
        }
    }

    pub fn identity_tag(&self) -> char {
        self.identity_tag
    }

    pub fn handle(&self) -> Option<ConnHandle> {
        self.handle
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }

    /// MTU-derived notification payload size.
    pub fn payload_capacity(&self) -> u16 {
        self.payload_capacity
    }

    /// A serialized state frame fits in one notification at the current MTU.
    pub fn frame_fits(&self) -> bool {
        SERIALIZED_STATE_LEN <= self.payload_capacity as usize
    }

    /// Notifications sent since the last connect.
    pub fn send_counter(&self) -> u32 {
        self.send_counter
    }

    /// Bytes staged by the last [`prepare_send`](Self::prepare_send).
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn throughput(&self) -> &ThroughputMeter {
        &self.throughput
    }

    fn owns(&self, handle: ConnHandle) -> bool {
        self.handle == Some(handle)
    }

    /// Apply a transport event.
    pub fn handle_transport(
        &mut self,
        event: TransportEvent,
        state: &mut DeviceState,
        now_ms: u32,
    ) -> Reaction {
        let mut reaction = Reaction::default();

        match event {
            TransportEvent::Connected { handle } => {
                if self.handle.is_some() {
                    return reaction;
                }
                self.handle = Some(handle);
                self.notifications_enabled = false;
                self.payload_capacity = DEFAULT_PAYLOAD_CAPACITY;
                self.send_counter = 0;
                self.payload.clear();
                self.throughput.reset(now_ms);
                reaction.matched = true;
                reaction.request_send = true;
            }
            TransportEvent::Disconnected { handle } => {
                if self.owns(handle) {
                    self.notifications_enabled = false;
                    self.handle = None;
                    reaction.matched = true;
                }
            }
            TransportEvent::MtuExchanged { handle, mtu } => {
                if self.owns(handle) {
                    self.payload_capacity = mtu
                        .saturating_sub(ATT_PAYLOAD_OVERHEAD)
                        .min(PAYLOAD_CAPACITY as u16);
                    reaction.matched = true;
                }
            }
            TransportEvent::ServiceConnected { handle } => {
                if self.owns(handle) {
                    self.notifications_enabled = true;
                    self.throughput.reset(now_ms);
                    reaction.matched = true;
                    reaction.request_send = true;
                }
            }
            TransportEvent::ServiceDisconnected { handle } => {
                if self.owns(handle) {
                    self.notifications_enabled = false;
                    reaction.matched = true;
                }
            }
            TransportEvent::DataReceived { handle, len } => {
                // Any write is a toggle command, whoever sent it.
                reaction.toggled = Some(state.toggle_active());
                if self.owns(handle) {
                    reaction.matched = true;
                    reaction.report = self.throughput.track(len, now_ms);
                }
            }
        }

        reaction
    }

    /// Stage the current state for transmission.
    ///
    /// Returns the handle to notify on, or `None` when there is no
    /// connection or the peer has not enabled notifications.
    pub fn prepare_send(&mut self, state: &DeviceState) -> Option<ConnHandle> {
        let handle = self.handle?;
        if !self.notifications_enabled {
            return None;
        }
        self.payload.clear();
        self.payload.extend_from_slice(&state.to_wire()).ok()?;
        Some(handle)
    }

    /// Account for a notification the stack accepted.
    pub fn complete_send(&mut self, now_ms: u32) -> Option<ThroughputReport> {
        self.send_counter = self.send_counter.wrapping_add(1);
        self.throughput.track(self.payload.len(), now_ms)
    }
}

//! Run-loop context.
//!
//! Owns the device state, the flasher and the connection slot. Every event
//! source (supervisor timer, flasher timer, radio) is dispatched to one of
//! the `on_*` handlers by a single loop, so there is no shared mutable state
//! and no locking.

use crate::ble::{ConnHandle, ConnectionContext, Reaction, ThroughputReport, TransportEvent};
use crate::flasher::{Flasher, Step};
use crate::state::DeviceState;

#[derive(Debug, Default)]
pub struct App {
    state: DeviceState,
    flasher: Flasher,
    link: ConnectionContext,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: DeviceState) -> Self {
        Self {
            state,
            flasher: Flasher::new(),
            link: ConnectionContext::new(),
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn flasher(&self) -> &Flasher {
        &self.flasher
    }

    pub fn link(&self) -> &ConnectionContext {
        &self.link
    }

    /// 300 ms supervisor. Returns the delay to arm the flasher timer with.
    pub fn on_supervisor_tick(&mut self) -> Option<u32> {
        self.flasher.supervise(&self.state)
    }

    /// Flasher timer expiry.
    pub fn on_flasher_timer(&mut self) -> Step {
        self.flasher.tick(&mut self.state)
    }

    pub fn on_transport(&mut self, event: TransportEvent, now_ms: u32) -> Reaction {
        self.link.handle_transport(event, &mut self.state, now_ms)
    }

    /// Send readiness. On `Some`, transmit [`payload`](Self::payload) on the
    /// returned handle and report back through [`on_sent`](Self::on_sent).
    pub fn on_can_send(&mut self) -> Option<ConnHandle> {
        self.link.prepare_send(&self.state)
    }

    pub fn payload(&self) -> &[u8] {
        self.link.payload()
    }

    pub fn on_sent(&mut self, now_ms: u32) -> Option<ThroughputReport> {
        self.link.complete_send(now_ms)
    }
}

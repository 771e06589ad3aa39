//! Overflow store for radio events that could not be queued.
//!
//! The GATT callback cannot wait for room in the run-loop channel. Instead
//! of dropping what does not fit, it parks the event here: RX writes are
//! coalesced into a count, the CCCD keeps only its latest value. The run
//! loop later replays the backlog as ordinary [`TransportEvent`]s.
//!
//! Lifecycle events (`Connected`, `Disconnected`, `MtuExchanged`) are not
//! accepted; the radio task sends those with an awaited send.

use core::sync::atomic::{AtomicU16, AtomicU32, AtomicU8, Ordering};

use super::{ConnHandle, TransportEvent};

const CCCD_NONE: u8 = 0;
const CCCD_OFF: u8 = 1;
const CCCD_ON: u8 = 2;

pub struct EventBacklog {
    handle: AtomicU16,
    writes: AtomicU32,
    bytes: AtomicU32,
    notifications: AtomicU8,
}

impl Default for EventBacklog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBacklog {
    pub const fn new() -> Self {
        Self {
            handle: AtomicU16::new(0),
            writes: AtomicU32::new(0),
            bytes: AtomicU32::new(0),
            notifications: AtomicU8::new(CCCD_NONE),
        }
    }

    /// Something is waiting to be replayed.
    ///
    /// Once this is true every later callback event must be deferred as
    /// well, or it would overtake the parked ones.
    pub fn is_pending(&self) -> bool {
        self.writes.load(Ordering::Acquire) != 0
            || self.notifications.load(Ordering::Acquire) != CCCD_NONE
    }

    /// Park `event`. Returns `false` for events that cannot be coalesced.
    pub fn defer(&self, event: TransportEvent) -> bool {
        match event {
            TransportEvent::DataReceived { handle, len } => {
                self.handle.store(handle.0, Ordering::Release);
                self.bytes.fetch_add(len as u32, Ordering::AcqRel);
                self.writes.fetch_add(1, Ordering::AcqRel);
                true
            }
            TransportEvent::ServiceConnected { handle } => {
                self.handle.store(handle.0, Ordering::Release);
                self.notifications.store(CCCD_ON, Ordering::Release);
                true
            }
            TransportEvent::ServiceDisconnected { handle } => {
                self.handle.store(handle.0, Ordering::Release);
                self.notifications.store(CCCD_OFF, Ordering::Release);
                true
            }
            TransportEvent::Connected { .. }
            | TransportEvent::Disconnected { .. }
            | TransportEvent::MtuExchanged { .. } => false,
        }
    }

    /// Empty the backlog, returning what it held.
    pub fn take(&self) -> Deferred {
        let writes = self.writes.swap(0, Ordering::AcqRel);
        let bytes = self.bytes.swap(0, Ordering::AcqRel);
        let notifications = match self.notifications.swap(CCCD_NONE, Ordering::AcqRel) {
            CCCD_ON => Some(true),
            CCCD_OFF => Some(false),
            _ => None,
        };
        Deferred {
            handle: ConnHandle(self.handle.load(Ordering::Acquire)),
            writes,
            bytes,
            notifications,
        }
    }
}

/// Contents of a drained backlog. Iterates as the events to replay: the
/// writes first (all bytes on the first one), then the CCCD state.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deferred {
    pub handle: ConnHandle,
    pub writes: u32,
    pub bytes: u32,
    pub notifications: Option<bool>,
}

impl Deferred {
    pub fn is_empty(&self) -> bool {
        self.writes == 0 && self.notifications.is_none()
    }
}

impl Iterator for Deferred {
    type Item = TransportEvent;

    fn next(&mut self) -> Option<TransportEvent> {
        let handle = self.handle;
        if self.writes > 0 {
            self.writes -= 1;
            let len = core::mem::take(&mut self.bytes) as usize;
            return Some(TransportEvent::DataReceived { handle, len });
        }
        let enabled = self.notifications.take()?;
        Some(if enabled {
            TransportEvent::ServiceConnected { handle }
        } else {
            TransportEvent::ServiceDisconnected { handle }
        })
    }
}

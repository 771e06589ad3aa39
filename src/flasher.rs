//! Blink-pattern state machine.
//!
//! Driven by a one-shot timer that the caller re-arms after every tick with
//! the delay returned in [`Step::Lit`]. Nothing here touches a pin or a
//! timer directly, so a whole pattern can be stepped through on the host.
//!
//! ```text
//!   start()          tick()                tick()
//!  Off ──armed──▶ On (index kept) ──▶ On (index + 1 mod len) ──▶ …
//!   ▲                                        │
//!   └──── inactive or no duration ───────────┘  (index = 0, LED off)
//! ```

use crate::state::DeviceState;

/// Whether a flash cycle is in progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlasherPhase {
    #[default]
    Off,
    On,
}

/// Outcome of one timer expiry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Drive the LED to `led_on` and fire again after `delay_ms`.
    Lit { led_on: bool, delay_ms: u16 },
    /// The cycle ended: LED off, do not reschedule.
    Stopped,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flasher {
    phase: FlasherPhase,
    /// A tick has been scheduled but has not fired yet.
    armed: bool,
}

/// Duration of the slot at the current index.
///
/// `None` when the pattern is empty or the index lies outside it.
pub fn next_delay(state: &DeviceState) -> Option<u16> {
    if state.pattern_length() == 0 {
        return None;
    }
    state.duration_at(state.flash_index())
}

impl Flasher {
    pub const fn new() -> Self {
        Self {
            phase: FlasherPhase::Off,
            armed: false,
        }
    }

    pub fn phase(&self) -> FlasherPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.armed || self.phase == FlasherPhase::On
    }

    /// Begin a cycle. Returns the delay (ms) for the first tick, or `None`
    /// if a cycle is already scheduled or running.
    pub fn start(&mut self) -> Option<u32> {
        if self.is_running() {
            return None;
        }
        self.armed = true;
        Some(0)
    }

    /// Periodic supervisory check: make sure an active state is flashing.
    pub fn supervise(&mut self, state: &DeviceState) -> Option<u32> {
        if state.is_active() {
            self.start()
        } else {
            None
        }
    }

    /// Handle a timer expiry.
    pub fn tick(&mut self, state: &mut DeviceState) -> Step {
        self.armed = false;

        match self.phase {
            FlasherPhase::Off => self.phase = FlasherPhase::On,
            FlasherPhase::On => {
                let len = state.pattern_length();
                if len > 0 {
                    let next = (state.flash_index() as u16 + 1) % len as u16;
                    state.set_flash_index(next as u8);
                }
            }
        }

        match next_delay(state) {
            Some(delay_ms) if state.is_active() => Step::Lit {
                led_on: state.flash_index() % 2 == 0,
                delay_ms,
            },
            _ => {
                self.phase = FlasherPhase::Off;
                state.set_flash_index(0);
                Step::Stopped
            }
        }
    }
}

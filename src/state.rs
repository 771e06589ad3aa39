//! Device state and its fixed wire encoding.
//!
//! Layout (35 bytes, sent as one NUS notification):
//! ```text
//! Byte 0:      active          (0 = idle, 1 = flashing)
//! Byte 1:      flash_index
//! Byte 2:      pattern_length  (0..=16)
//! Byte 3..35:  pattern[0..16]  (u16 big-endian, all 16 slots always)
//! ```

use crate::config::{DEFAULT_PATTERN, PATTERN_CAPACITY};
use crate::error::Error;

/// Serialized state size in bytes.
pub const SERIALIZED_STATE_LEN: usize = 3 + 2 * PATTERN_CAPACITY;

/// Blink pattern and flashing status.
///
/// `pattern` holds alternating on/off durations in milliseconds; an even
/// index lights the LED, an odd index turns it off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceState {
    active: bool,
    flash_index: u8,
    pattern_length: u8,
    pattern: [u16; PATTERN_CAPACITY],
}

impl Default for DeviceState {
    /// Idle, with the power-up pattern loaded.
    fn default() -> Self {
        let mut pattern = [0u16; PATTERN_CAPACITY];
        pattern[..DEFAULT_PATTERN.len()].copy_from_slice(&DEFAULT_PATTERN);
        Self {
            active: false,
            flash_index: 0,
            pattern_length: DEFAULT_PATTERN.len() as u8,
            pattern,
        }
    }
}

impl DeviceState {
    /// Idle state with a custom pattern. Unused slots are zero.
    pub fn with_pattern(durations: &[u16]) -> Result<Self, Error> {
        if durations.len() > PATTERN_CAPACITY {
            return Err(Error::PatternTooLong);
        }
        let mut pattern = [0u16; PATTERN_CAPACITY];
        pattern[..durations.len()].copy_from_slice(durations);
        Ok(Self {
            active: false,
            flash_index: 0,
            pattern_length: durations.len() as u8,
            pattern,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Flip `active`, returning the new value.
    pub fn toggle_active(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }

    pub fn flash_index(&self) -> u8 {
        self.flash_index
    }

    pub(crate) fn set_flash_index(&mut self, index: u8) {
        self.flash_index = index;
    }

    pub fn pattern_length(&self) -> u8 {
        self.pattern_length
    }

    /// The valid prefix of the pattern.
    pub fn pattern(&self) -> &[u16] {
        &self.pattern[..self.pattern_length as usize]
    }

    /// Duration stored at `index`, if it lies inside the valid prefix.
    pub fn duration_at(&self, index: u8) -> Option<u16> {
        self.pattern().get(index as usize).copied()
    }

    /// Encode into `buf`.
    /// Returns the number of bytes written (always 35), or 0 if `buf` is too short.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < SERIALIZED_STATE_LEN {
            return 0;
        }
        buf[0] = self.active as u8;
        buf[1] = self.flash_index;
        buf[2] = self.pattern_length;
        for (slot, duration) in buf[3..SERIALIZED_STATE_LEN]
            .chunks_exact_mut(2)
            .zip(self.pattern.iter())
        {
            slot.copy_from_slice(&duration.to_be_bytes());
        }
        SERIALIZED_STATE_LEN
    }

    /// Encode into a fresh fixed-size array.
    pub fn to_wire(&self) -> [u8; SERIALIZED_STATE_LEN] {
        let mut buf = [0u8; SERIALIZED_STATE_LEN];
        self.serialize(&mut buf);
        buf
    }

    /// Decode the layout produced by [`serialize`](Self::serialize).
    ///
    /// Returns `None` for a short buffer or a `pattern_length` above 16.
    /// Any non-zero `active` byte reads as `true`.
    pub fn from_wire_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < SERIALIZED_STATE_LEN {
            return None;
        }
        let pattern_length = data[2];
        if pattern_length as usize > PATTERN_CAPACITY {
            return None;
        }
        let mut pattern = [0u16; PATTERN_CAPACITY];
        for (duration, bytes) in pattern
            .iter_mut()
            .zip(data[3..SERIALIZED_STATE_LEN].chunks_exact(2))
        {
            *duration = u16::from_be_bytes([bytes[0], bytes[1]]);
        }
        Some(Self {
            active: data[0] != 0,
            flash_index: data[1],
            pattern_length,
            pattern,
        })
    }
}

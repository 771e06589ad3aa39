//! Register-addressed access over a shared I²C bus.
//!
//! Every call is one blocking bus transaction. There is no retry logic
//! here; callers decide whether a failed transfer is worth repeating.

use crate::error::BusError;
use embedded_hal::i2c::{Error as _, I2c};

/// Largest data payload accepted by [`RegisterBus::write`].
pub const MAX_WRITE_LEN: usize = 16;

/// Register client wrapping an `embedded-hal` I²C bus.
pub struct RegisterBus<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> RegisterBus<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Write `data` starting at `register`.
    ///
    /// The register byte and data go out in one frame with no bus release
    /// in between. An empty `data` slice is a no-op returning `Ok(0)`.
    pub fn write(&mut self, address: u8, register: u8, data: &[u8]) -> Result<usize, BusError> {
        if data.is_empty() {
            return Ok(0);
        }
        if data.len() > MAX_WRITE_LEN {
            return Err(BusError::FrameTooLong);
        }

        let mut frame = [0u8; MAX_WRITE_LEN + 1];
        frame[0] = register;
        frame[1..=data.len()].copy_from_slice(data);

        self.i2c
            .write(address, &frame[..=data.len()])
            .map_err(|e| BusError::Transport(e.kind()))?;
        Ok(data.len())
    }

    /// Read `buf.len()` bytes starting at `register`.
    ///
    /// The register byte is written with a repeated start, then the data is
    /// read in the same transaction. An empty `buf` performs no transfer.
    pub fn read(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<usize, BusError> {
        if buf.is_empty() {
            return Ok(0);
        }

        self.i2c
            .write_read(address, &[register], buf)
            .map_err(|e| BusError::Transport(e.kind()))?;
        Ok(buf.len())
    }

    /// Read a single register.
    pub fn read_u8(&mut self, address: u8, register: u8) -> Result<u8, BusError> {
        let mut buf = [0u8; 1];
        self.read(address, register, &mut buf)?;
        Ok(buf[0])
    }

    /// Give the underlying bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

//! Status LED.
//!
//! The level is cached so repeated writes of the same value never reach the
//! pin. Both the polling loop and the flasher drive this one LED.

use crate::error::Error;
use embedded_hal::digital::OutputPin;

pub struct StatusLed<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// Take the pin and drive it low.
    pub fn new(mut pin: P) -> Result<Self, Error> {
        pin.set_low().map_err(|_| Error::Led)?;
        Ok(Self { pin, on: false })
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn set(&mut self, on: bool) -> Result<(), Error> {
        if on == self.on {
            return Ok(());
        }
        if on {
            self.pin.set_high().map_err(|_| Error::Led)?;
        } else {
            self.pin.set_low().map_err(|_| Error::Led)?;
        }
        self.on = on;
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<(), Error> {
        self.set(!self.on)
    }

    pub fn release(self) -> P {
        self.pin
    }
}

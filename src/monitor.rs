//! One iteration of the light polling loop.
//!
//! Checks for a fresh measurement, reads both channels in one burst and
//! drops the sample on any failure or overrun. An accepted sample mirrors
//! the motion input onto the status LED.

use crate::error::Error;
use crate::led::StatusLed;
use crate::sensor::{ChannelReading, Ltr303};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    /// No measurement ready (or the status read failed).
    NoData,
    /// A measurement was ready but could not be trusted.
    Discarded,
    /// An accepted sample and the motion input level read alongside it.
    Sampled {
        reading: ChannelReading,
        motion: bool,
    },
}

pub struct Monitor<I2C, D, M> {
    sensor: Ltr303<I2C, D>,
    motion: M,
}

impl<I2C: I2c, D: DelayNs, M: InputPin> Monitor<I2C, D, M> {
    /// Wrap an initialized sensor and the motion input.
    pub fn new(sensor: Ltr303<I2C, D>, motion: M) -> Self {
        Self { sensor, motion }
    }

    /// Poll the sensor once without touching the LED.
    pub fn poll(&mut self) -> CycleOutcome {
        match self.sensor.has_new_data() {
            Ok(true) => {}
            Ok(false) | Err(_) => return CycleOutcome::NoData,
        }

        let reading = match self.sensor.read_both_channels() {
            Ok(reading) if !reading.overrun => reading,
            _ => return CycleOutcome::Discarded,
        };

        let motion = self.motion.is_high().unwrap_or(false);
        CycleOutcome::Sampled { reading, motion }
    }

    /// Poll once and drive the LED from an accepted sample.
    pub fn step<P: OutputPin>(&mut self, led: &mut StatusLed<P>) -> Result<CycleOutcome, Error> {
        let outcome = self.poll();
        if let CycleOutcome::Sampled { motion, .. } = outcome {
            led.set(motion)?;
        }
        Ok(outcome)
    }

    pub fn release(self) -> (Ltr303<I2C, D>, M) {
        (self.sensor, self.motion)
    }
}

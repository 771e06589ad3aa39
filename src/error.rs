//! Unified error type for ney_tack.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

use embedded_hal::i2c::ErrorKind;

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Sensor
    /// The light sensor could not be brought up or read.
    Sensor(SensorError),

    // GPIO
    /// Driving the status LED pin failed.
    Led,

    // BLE
    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),

    // Generic
    /// A duration pattern longer than the fixed slot count was supplied.
    PatternTooLong,
}

/// Failures of the register-level bus client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The I²C transaction failed (NACK, arbitration loss, short read, ...).
    Transport(ErrorKind),
    /// Register data does not fit in a single write frame.
    FrameTooLong,
}

/// LTR-303 driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Underlying bus transaction failed.
    Bus(BusError),
    /// PART_ID register did not match the LTR-303 (value read).
    WrongPartId(u8),
    /// MANUFAC_ID register did not match Lite-On (value read).
    WrongManufacturerId(u8),
    /// Control register did not self-clear after a software reset.
    ResetNotCleared(u8),
    /// Active-mode bit did not stick after enabling.
    NotActive(u8),
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// GATT server registration failed.
    ServerInit,
    /// A BLE task could not be spawned (its pool is exhausted).
    TaskSpawn,
    /// Advertising could not start or was aborted.
    AdvertiseFailed,
    /// A notification could not be queued.
    NotifyFailed,
}

// Convenience conversions

impl From<BusError> for SensorError {
    fn from(e: BusError) -> Self {
        SensorError::Bus(e)
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Error::Sensor(e)
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Error::Sensor(SensorError::Bus(e))
    }
}

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}

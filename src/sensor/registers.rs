//! LTR-303ALS-01 register map.
//!
//! Reference: Lite-On LTR-303ALS-01 datasheet (DS86-2013-0004).

/// 7-bit I²C device address (fixed in silicon).
pub const LTR303_I2C_ADDR: u8 = 0x29;

/// ALS_CONTR: operation mode (ALS gain, SW reset, ALS mode).
pub const REG_ALS_CONTR: u8 = 0x80;
/// ALS_MEAS_RATE: integration time and repeat rate.
pub const REG_ALS_MEAS_RATE: u8 = 0x85;
/// PART_ID: part number (high nibble) and revision (low nibble).
pub const REG_PART_ID: u8 = 0x86;
/// MANUFAC_ID: manufacturer ID.
pub const REG_MANUFAC_ID: u8 = 0x87;
/// ALS_DATA_CH1_0: first of four data bytes (CH1 LSB, CH1 MSB, CH0 LSB, CH0 MSB).
pub const REG_ALS_DATA_CH1_0: u8 = 0x88;
/// ALS_STATUS: data validity, gain, interrupt and new-data flags.
pub const REG_ALS_STATUS: u8 = 0x8C;
/// INTERRUPT: interrupt pin polarity and mode.
pub const REG_INTERRUPT: u8 = 0x8F;
/// ALS_THRES_UP_0: upper interrupt threshold LSB.
pub const REG_ALS_THRES_UP_0: u8 = 0x97;
/// ALS_THRES_LOW_0: lower interrupt threshold LSB.
pub const REG_ALS_THRES_LOW_0: u8 = 0x99;
/// INTERRUPT_PERSIST: consecutive out-of-threshold readings before an IRQ.
pub const REG_INTERRUPT_PERSIST: u8 = 0x9E;

/// Expected PART_ID value.
pub const PART_ID_LTR303: u8 = 0xA0;
/// Expected MANUFAC_ID value (Lite-On).
pub const MANUFACTURER_ID_LITEON: u8 = 0x05;

/// ALS_CONTR: ALS active mode.
pub const CONTR_ALS_MODE_ACTIVE: u8 = 1 << 0;
/// ALS_CONTR: software reset, self-clears when the reset completes.
pub const CONTR_SW_RESET: u8 = 1 << 1;

/// ALS_STATUS: a fresh measurement has not been read yet.
pub const STATUS_NEW_DATA: u8 = 1 << 2;
/// ALS_STATUS: data is invalid (overrun during conversion).
pub const STATUS_DATA_INVALID: u8 = 1 << 7;

/// Time the device needs to finish a software reset (ms).
pub const RESET_SETTLE_MS: u32 = 10;

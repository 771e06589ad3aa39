//! Advertising payload and Nordic UART Service identifiers.
//!
//! The payload is assembled at compile time: flags, the complete local name
//! from [`DEVICE_NAME`] and the NUS 128-bit service UUID. With the default
//! name it fills the 31-byte legacy advertising PDU exactly, so there is no
//! room left for a TX power or appearance field.

use crate::config::DEVICE_NAME;

/// AD type: Flags.
pub const AD_TYPE_FLAGS: u8 = 0x01;
/// AD type: Complete List of 128-bit Service Class UUIDs.
pub const AD_TYPE_UUID128_COMPLETE: u8 = 0x07;
/// AD type: Complete Local Name.
pub const AD_TYPE_COMPLETE_NAME: u8 = 0x09;

/// LE General Discoverable, BR/EDR not supported.
pub const ADV_FLAGS: u8 = 0x06;

/// Legacy advertising PDU payload limit.
pub const LEGACY_ADV_MAX: usize = 31;

/// NUS service UUID in big-endian (printed) byte order:
/// 6e400001-b5a3-f393-e0a9-e50e24dcca9e
pub const NUS_SERVICE_UUID: [u8; 16] = [
    0x6e, 0x40, 0x00, 0x01, 0xb5, 0xa3, 0xf3, 0x93,
    0xe0, 0xa9, 0xe5, 0x0e, 0x24, 0xdc, 0xca, 0x9e,
];

/// NUS service UUID as it goes on air (little-endian).
pub const NUS_SERVICE_UUID_LE: [u8; 16] = reversed(NUS_SERVICE_UUID);

const NAME: &[u8] = DEVICE_NAME.as_bytes();

/// Offset of the name AD structure (after the 3-byte flags structure).
pub const NAME_OFFSET: usize = 3;
/// Offset of the 128-bit UUID list AD structure.
pub const UUID_OFFSET: usize = NAME_OFFSET + 2 + NAME.len();

pub const ADV_DATA_LEN: usize = UUID_OFFSET + 2 + 16;

const _: () = assert!(ADV_DATA_LEN <= LEGACY_ADV_MAX, "DEVICE_NAME too long to advertise");

/// Raw advertising data broadcast while discoverable.
pub const ADV_DATA: [u8; ADV_DATA_LEN] = build_adv_data();

/// Scan response data (empty: everything fits in the advertisement).
pub const SCAN_DATA: [u8; 0] = [];

const fn reversed(uuid: [u8; 16]) -> [u8; 16] {
    let mut out = [0u8; 16];
    let mut i = 0;
    while i < 16 {
        out[i] = uuid[15 - i];
        i += 1;
    }
    out
}

const fn build_adv_data() -> [u8; ADV_DATA_LEN] {
    let mut out = [0u8; ADV_DATA_LEN];

    // Flags
    out[0] = 0x02;
    out[1] = AD_TYPE_FLAGS;
    out[2] = ADV_FLAGS;

    // Complete Local Name
    out[NAME_OFFSET] = (NAME.len() + 1) as u8;
    out[NAME_OFFSET + 1] = AD_TYPE_COMPLETE_NAME;
    let mut i = 0;
    while i < NAME.len() {
        out[NAME_OFFSET + 2 + i] = NAME[i];
        i += 1;
    }

    // Complete List of 128-bit Service UUIDs: NUS
    out[UUID_OFFSET] = 17;
    out[UUID_OFFSET + 1] = AD_TYPE_UUID128_COMPLETE;
    let mut i = 0;
    while i < 16 {
        out[UUID_OFFSET + 2 + i] = NUS_SERVICE_UUID_LE[i];
        i += 1;
    }

    out
}

/// A connection interval in 1.25 ms units, split for integer-only logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnInterval(pub u16);

impl ConnInterval {
    /// Whole milliseconds.
    pub fn millis(&self) -> u32 {
        self.0 as u32 * 125 / 100
    }

    /// Hundredths of a millisecond (0, 25, 50 or 75).
    pub fn hundredths(&self) -> u32 {
        25 * (self.0 as u32 & 0x03)
    }
}

//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

// Sensor / I²C

/// I²C bus frequency (Hz). The LTR-303 supports fast mode.
pub const I2C_FREQUENCY_HZ: u32 = 400_000;

/// Delay between accepted light samples in the polling loop (ms).
pub const SENSOR_SAMPLE_PERIOD_MS: u64 = 250;

// Run loop timing

/// Period of the supervisory check that (re)starts the flasher (ms).
pub const STATE_CHECK_INTERVAL_MS: u64 = 300;

/// Throughput report window for the send pump (ms).
pub const REPORT_INTERVAL_MS: u32 = 3000;

/// Back-off before asking again when the BLE TX queue is full (ms).
pub const SEND_RETRY_MS: u64 = 5;

// Device state

/// Number of duration slots in the blink pattern.
pub const PATTERN_CAPACITY: usize = 16;

/// Pattern loaded at power-up: long on/off, short on/off (ms).
pub const DEFAULT_PATTERN: [u16; 4] = [1000, 1000, 250, 250];

// BLE

/// Advertised GAP device name.
pub const DEVICE_NAME: &str = "Ney Tack";

/// Advertising interval (in 0.625 ms units). 800 = 500 ms.
pub const BLE_ADV_INTERVAL: u32 = 800;

/// Default ATT MTU before any exchange (Bluetooth Core, Vol 3, Part F).
pub const ATT_DEFAULT_MTU: u16 = 23;

/// ATT MTU the SoftDevice is configured to accept.
pub const ATT_MAX_MTU: u16 = 247;

/// Bytes lost to ATT headers between the MTU and usable notification payload.
pub const ATT_PAYLOAD_OVERHEAD: u16 = 6;

/// Capacity of the per-connection payload buffer.
pub const PAYLOAD_CAPACITY: usize = 200;

/// Debug label of the single connection slot.
pub const CONNECTION_TAG: char = 'A';

/// Requested connection interval (in 1.25 ms units). 400 = 500 ms.
pub const BLE_CONN_INTERVAL_MIN: u16 = 400;
pub const BLE_CONN_INTERVAL_MAX: u16 = 400;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   Motion input   → P0.03 (pull-down)
//   I²C SDA        → P0.26
//   I²C SCL        → P0.27
//   Status LED     → P0.13

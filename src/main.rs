//! ney_tack - ambient light monitor with a BLE pattern flasher.
//!
//! Polls an LTR-303 over I²C and mirrors the motion input onto the status
//! LED. Built with `--features wireless`, it also advertises the Nordic UART
//! Service, streams the device state to a connected central and flashes the
//! LED pattern whenever a peer has toggled it on.
//!
//! Target: nRF52840 + S140 SoftDevice.

#![no_std]
#![no_main]

mod firmware;

use core::cell::RefCell;

use defmt::{debug, error, info};
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pull};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Delay, Duration, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, nrf_softdevice as _, panic_probe as _};

use firmware::SharedLed;
use ney_tack::config;
use ney_tack::led::StatusLed;
use ney_tack::monitor::{CycleOutcome, Monitor};
use ney_tack::sensor::Ltr303;

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

static LED: StaticCell<SharedLed> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("ney_tack starting");

    // SoftDevice reserves interrupt priorities 0, 1 and 4.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    interrupt::SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0.set_priority(Priority::P3);
    let mut twim_config = twim::Config::default();
    twim_config.frequency = firmware::twim_frequency(config::I2C_FREQUENCY_HZ);
    let i2c = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim_config);

    let motion = Input::new(p.P0_03, Pull::Down);
    let led_pin = Output::new(p.P0_13, Level::Low, OutputDrive::Standard);
    let led = match StatusLed::new(led_pin) {
        Ok(led) => led,
        Err(e) => {
            error!("status LED init failed: {}", e);
            firmware::park().await
        }
    };
    let led: &'static SharedLed = LED.init(Mutex::new(RefCell::new(led)));

    let mut sensor = Ltr303::new(i2c, Delay);
    if let Err(e) = sensor.init() {
        error!("LTR-303 init failed: {}", e);
        firmware::park().await
    }
    info!("LTR-303 ready");

    // The polling loop keeps running without BLE.
    if let Err(e) = firmware::start_wireless(spawner, led) {
        error!("BLE start failed: {}", e);
    }

    // Polling loop: blocking I²C lives here and nowhere else.
    let mut monitor = Monitor::new(sensor, motion);
    loop {
        match monitor.poll() {
            CycleOutcome::Sampled { reading, motion } => {
                firmware::set_led(led, motion);
                info!(
                    "ch0 {} ch1 {} visible {} motion {}",
                    reading.ch0,
                    reading.ch1,
                    reading.visible(),
                    motion
                );
                Timer::after(Duration::from_millis(config::SENSOR_SAMPLE_PERIOD_MS)).await;
            }
            CycleOutcome::Discarded => {
                debug!("sample discarded");
                yield_now().await;
            }
            CycleOutcome::NoData => yield_now().await,
        }
    }
}

//! Hardware glue between the embassy-nrf peripherals, the SoftDevice and the
//! host-testable `ney_tack` library.

#[cfg(feature = "wireless")]
pub mod radio;
#[cfg(feature = "wireless")]
pub mod run_loop;

use core::cell::RefCell;

use defmt::warn;
use embassy_executor::Spawner;
use embassy_nrf::gpio::Output;
use embassy_nrf::twim;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Timer;
use ney_tack::error::Error;
use ney_tack::led::StatusLed;

/// The status LED, driven by both the polling loop and the flasher.
pub type SharedLed = Mutex<CriticalSectionRawMutex, RefCell<StatusLed<Output<'static>>>>;

pub fn set_led(led: &SharedLed, on: bool) {
    if let Err(e) = led.lock(|cell| cell.borrow_mut().set(on)) {
        warn!("LED write failed: {}", e);
    }
}

pub fn twim_frequency(hz: u32) -> twim::Frequency {
    match hz {
        0..=100_000 => twim::Frequency::K100,
        100_001..=250_000 => twim::Frequency::K250,
        _ => twim::Frequency::K400,
    }
}

/// Stop here after a fatal init error. The core just idles.
pub async fn park() -> ! {
    loop {
        Timer::after_secs(3600).await;
    }
}

/// Bring up the SoftDevice, the NUS server and the run loop.
#[cfg(feature = "wireless")]
pub fn start_wireless(spawner: Spawner, led: &'static SharedLed) -> Result<(), Error> {
    use defmt::{error, info};
    use nrf_softdevice::Softdevice;
    use ney_tack::error::BleError;
    use static_cell::StaticCell;

    static SERVER: StaticCell<radio::Server> = StaticCell::new();

    let sd = Softdevice::enable(&radio::softdevice_config());
    let server = match radio::Server::new(sd) {
        Ok(server) => SERVER.init(server),
        Err(e) => {
            error!("GATT server registration: {:?}", e);
            return Err(BleError::ServerInit.into());
        }
    };
    let sd: &'static Softdevice = sd;

    spawner
        .spawn(radio::softdevice_task(sd))
        .map_err(|_| BleError::TaskSpawn)?;
    spawner
        .spawn(radio::radio_task(sd, server))
        .map_err(|_| BleError::TaskSpawn)?;
    spawner
        .spawn(run_loop::run_loop_task(server, led))
        .map_err(|_| BleError::TaskSpawn)?;

    info!("To start the streaming, please run nRF Toolbox -> UART to connect.");
    Ok(())
}

/// Polling loop only: the BLE subsystem is left out of this build.
#[cfg(not(feature = "wireless"))]
pub fn start_wireless(_spawner: Spawner, _led: &'static SharedLed) -> Result<(), Error> {
    defmt::info!("BLE disabled (build with --features wireless)");
    Ok(())
}

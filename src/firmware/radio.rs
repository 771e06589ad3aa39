//! SoftDevice peripheral: advertising, the NUS GATT server and the
//! connection lifecycle.
//!
//! Stack callbacks never touch device state. They only translate what
//! happened into [`RadioEvent`]s for the run loop. Lifecycle events are
//! sent with an awaited send; callback events that find the channel full
//! are parked in [`BACKLOG`].

use core::mem;

use defmt::{info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Timer;
use heapless::Vec;
use nrf_softdevice::ble::{gatt_server, peripheral, Connection};
use nrf_softdevice::{raw, Softdevice};

use ney_tack::ble::advertising::{ConnInterval, ADV_DATA, SCAN_DATA};
use ney_tack::ble::{ConnHandle, EventBacklog, TransportEvent};
use ney_tack::config::{
    ATT_MAX_MTU, BLE_ADV_INTERVAL, BLE_CONN_INTERVAL_MAX, BLE_CONN_INTERVAL_MIN,
    BLE_SLAVE_LATENCY, BLE_SUP_TIMEOUT, DEVICE_NAME, PAYLOAD_CAPACITY,
};
use ney_tack::error::BleError;

#[nrf_softdevice::gatt_service(uuid = "6e400001-b5a3-f393-e0a9-e50e24dcca9e")]
pub struct NusService {
    /// Peer → device. Any write toggles flashing.
    #[characteristic(uuid = "6e400002-b5a3-f393-e0a9-e50e24dcca9e", write, write_without_response)]
    pub rx: Vec<u8, PAYLOAD_CAPACITY>,
    /// Device → peer. Serialized device state.
    #[characteristic(uuid = "6e400003-b5a3-f393-e0a9-e50e24dcca9e", notify)]
    pub tx: Vec<u8, PAYLOAD_CAPACITY>,
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub nus: NusService,
}

/// What the radio task reports to the run loop.
pub enum RadioEvent {
    /// A central connected; the run loop keeps this to notify on.
    Link(Connection),
    Transport(TransportEvent),
}

pub static RADIO_EVENTS: Channel<CriticalSectionRawMutex, RadioEvent, 16> = Channel::new();

/// Callback events that did not fit in [`RADIO_EVENTS`].
pub static BACKLOG: EventBacklog = EventBacklog::new();

/// Queue an event from inside the GATT callback, which cannot wait.
fn publish_from_callback(event: TransportEvent) {
    // Queued events must not overtake parked ones.
    if BACKLOG.is_pending() || RADIO_EVENTS.try_send(RadioEvent::Transport(event)).is_err() {
        BACKLOG.defer(event);
    }
}

/// Hand the parked events to the run loop in order, ahead of `Disconnected`.
async fn flush_backlog() {
    for event in BACKLOG.take() {
        RADIO_EVENTS.send(RadioEvent::Transport(event)).await;
    }
}

pub fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t {
            att_mtu: ATT_MAX_MTU,
        }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            // SAFETY: all-zero is the "no access" permission.
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

/// Advertise, serve one central until it leaves, repeat.
#[embassy_executor::task]
pub async fn radio_task(sd: &'static Softdevice, server: &'static Server) -> ! {
    let adv_config = peripheral::Config {
        interval: BLE_ADV_INTERVAL,
        ..Default::default()
    };

    loop {
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };
        let conn = match peripheral::advertise_connectable(sd, adv, &adv_config).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("{}: {:?}", BleError::AdvertiseFailed, e);
                Timer::after_secs(1).await;
                continue;
            }
        };
        let Some(raw_handle) = conn.handle() else {
            continue;
        };
        let handle = ConnHandle(raw_handle);
        info!("connected, handle {}", raw_handle);

        request_conn_params(&conn);
        RADIO_EVENTS.send(RadioEvent::Link(conn.clone())).await;

        let reason = gatt_server::run(&conn, server, |e| match e {
            ServerEvent::Nus(NusServiceEvent::RxWrite(data)) => {
                publish_from_callback(TransportEvent::DataReceived {
                    handle,
                    len: data.len(),
                });
            }
            ServerEvent::Nus(NusServiceEvent::TxCccdWrite { notifications }) => {
                info!("TX notifications {}", notifications);
                let event = if notifications {
                    TransportEvent::ServiceConnected { handle }
                } else {
                    TransportEvent::ServiceDisconnected { handle }
                };
                publish_from_callback(event);
            }
        })
        .await;

        info!("disconnected: {:?}", reason);
        flush_backlog().await;
        RADIO_EVENTS
            .send(RadioEvent::Transport(TransportEvent::Disconnected { handle }))
            .await;
    }
}

/// Ask the central for a 500 ms interval with no slave latency.
fn request_conn_params(conn: &Connection) {
    let params = raw::ble_gap_conn_params_t {
        min_conn_interval: BLE_CONN_INTERVAL_MIN,
        max_conn_interval: BLE_CONN_INTERVAL_MAX,
        slave_latency: BLE_SLAVE_LATENCY,
        conn_sup_timeout: BLE_SUP_TIMEOUT,
    };
    let interval = ConnInterval(BLE_CONN_INTERVAL_MAX);
    if conn.set_conn_params(params).is_err() {
        warn!("connection parameter request rejected");
    } else {
        info!(
            "requested conn interval {}.{:02} ms, latency {}",
            interval.millis(),
            interval.hundredths(),
            BLE_SLAVE_LATENCY
        );
    }
}

//! The run loop: one task owning [`App`], fed by the radio channel (and its
//! backlog), the supervisor ticker, the flasher one-shot and the
//! send-readiness deadline.

use defmt::{info, warn};
use embassy_futures::select::{select4, Either4};
use embassy_time::{Duration, Instant, Ticker, Timer};
use heapless::Vec;
use nrf_softdevice::ble::gatt_server::NotifyValueError;
use nrf_softdevice::ble::Connection;
use nrf_softdevice::RawError;

use ney_tack::ble::{ConnHandle, Reaction, ThroughputReport, TransportEvent};
use ney_tack::config::{PAYLOAD_CAPACITY, SEND_RETRY_MS, STATE_CHECK_INTERVAL_MS};
use ney_tack::error::BleError;
use ney_tack::flasher::Step;
use ney_tack::state::SERIALIZED_STATE_LEN;
use ney_tack::App;

use super::radio::{RadioEvent, Server, BACKLOG, RADIO_EVENTS};
use super::{set_led, SharedLed};

fn millis(at: Instant) -> u32 {
    at.as_millis() as u32
}

#[embassy_executor::task]
pub async fn run_loop_task(server: &'static Server, led: &'static SharedLed) -> ! {
    let mut app = App::new();
    let mut conn: Option<Connection> = None;
    let mut supervisor = Ticker::every(Duration::from_millis(STATE_CHECK_INTERVAL_MS));
    let mut flasher_at: Option<Instant> = None;
    let mut send_at: Option<Instant> = None;

    loop {
        let fired = select4(
            RADIO_EVENTS.receive(),
            supervisor.next(),
            Timer::at(flasher_at.unwrap_or(Instant::MAX)),
            Timer::at(send_at.unwrap_or(Instant::MAX)),
        )
        .await;
        let now = Instant::now();

        match fired {
            Either4::First(radio_event) => {
                let event = match radio_event {
                    RadioEvent::Link(link) => {
                        let Some(raw_handle) = link.handle() else {
                            continue;
                        };
                        if conn.is_none() {
                            conn = Some(link);
                        }
                        TransportEvent::Connected {
                            handle: ConnHandle(raw_handle),
                        }
                    }
                    RadioEvent::Transport(event) => event,
                };
                dispatch(&mut app, &mut conn, &mut send_at, event, now);

                // Parked events are newer than anything still queued.
                if RADIO_EVENTS.is_empty() && BACKLOG.is_pending() {
                    let deferred = BACKLOG.take();
                    info!("replaying {} deferred RX writes", deferred.writes);
                    for event in deferred {
                        dispatch(&mut app, &mut conn, &mut send_at, event, now);
                    }
                }
            }
            Either4::Second(()) => {
                if let Some(delay) = app.on_supervisor_tick() {
                    info!("flasher started");
                    flasher_at = Some(now + Duration::from_millis(delay as u64));
                }
            }
            Either4::Third(()) => {
                flasher_at = None;
                match app.on_flasher_timer() {
                    Step::Lit { led_on, delay_ms } => {
                        set_led(led, led_on);
                        flasher_at = Some(now + Duration::from_millis(delay_ms as u64));
                    }
                    Step::Stopped => {
                        set_led(led, false);
                        info!("flasher stopped");
                    }
                }
            }
            Either4::Fourth(()) => {
                send_at = pump(&mut app, server, conn.as_ref(), now);
            }
        }
    }
}

/// Apply one transport event and act on the reaction.
fn dispatch(
    app: &mut App,
    conn: &mut Option<Connection>,
    send_at: &mut Option<Instant>,
    event: TransportEvent,
    now: Instant,
) {
    let reaction = app.on_transport(event, millis(now));
    if let TransportEvent::Disconnected { .. } = event {
        if reaction.matched {
            *conn = None;
            *send_at = None;
        }
    }
    log_reaction(app, &event, &reaction);
    if reaction.request_send {
        *send_at = Some(now);
    }
}

/// One send-readiness callback. Returns when to try again, if at all.
fn pump(app: &mut App, server: &Server, conn: Option<&Connection>, now: Instant) -> Option<Instant> {
    let conn = conn?;
    app.on_can_send()?;
    let payload: Vec<u8, PAYLOAD_CAPACITY> = Vec::from_slice(app.payload()).ok()?;

    match server.nus.tx_notify(conn, &payload) {
        Ok(()) => {
            if let Some(report) = app.on_sent(millis(now)) {
                log_report(app.link().identity_tag(), &report);
            }
            Some(now)
        }
        // TX queue full: the stack has no room until a connection event drains it.
        Err(NotifyValueError::Raw(RawError::Resources)) => {
            Some(now + Duration::from_millis(SEND_RETRY_MS))
        }
        Err(e) => {
            warn!(
                "{}: {}: {:?} (payload capacity {})",
                app.link().identity_tag(),
                BleError::NotifyFailed,
                e,
                app.link().payload_capacity()
            );
            None
        }
    }
}

fn log_reaction(app: &App, event: &TransportEvent, reaction: &Reaction) {
    let link = app.link();
    let tag = link.identity_tag();
    if !reaction.matched {
        match event {
            TransportEvent::DataReceived { .. } => {}
            _ => warn!("{}: ignored {} for unknown connection", tag, event),
        }
    } else {
        match event {
            TransportEvent::Disconnected { .. } => info!("{}: disconnected", tag),
            TransportEvent::MtuExchanged { mtu, .. } => info!("{}: ATT MTU = {}", tag, mtu),
            _ => {}
        }
        let capacity_changed = matches!(
            event,
            TransportEvent::Connected { .. }
                | TransportEvent::ServiceConnected { .. }
                | TransportEvent::MtuExchanged { .. }
        );
        if capacity_changed && !link.frame_fits() {
            warn!(
                "{}: {}-byte frame exceeds payload capacity {}",
                tag,
                SERIALIZED_STATE_LEN,
                link.payload_capacity()
            );
        }
    }
    if let Some(active) = reaction.toggled {
        info!("flashing {}", if active { "enabled" } else { "disabled" });
    }
    if let Some(report) = &reaction.report {
        log_report(tag, report);
    }
}

fn log_report(tag: char, report: &ThroughputReport) {
    info!(
        "{}: {} bytes in {} ms: {}.{:03} kB/s",
        tag,
        report.bytes,
        report.elapsed_ms,
        report.kilobytes(),
        report.fraction()
    );
}

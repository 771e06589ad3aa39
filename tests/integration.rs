//! Integration tests for the ney_tack run loop, driven by a virtual clock.
//!
//! `Sim` plays the part of the firmware run loop: it owns an [`App`], keeps
//! the three deadlines (supervisor, flasher, send readiness) and dispatches
//! whichever is due first, interleaved with scripted radio events.

use std::collections::VecDeque;

use ney_tack::ble::{ConnHandle, EventBacklog, TransportEvent};
use ney_tack::config::{STATE_CHECK_INTERVAL_MS, SEND_RETRY_MS};
use ney_tack::flasher::Step;
use ney_tack::{App, DeviceState};

const H: ConnHandle = ConnHandle(7);

/// Time the simulated stack needs before it can take the next notification.
const LINK_INTERVAL_MS: u32 = 50;

struct Sim {
    app: App,
    now: u32,
    supervisor_at: u32,
    flasher_at: Option<u32>,
    send_at: Option<u32>,
    led_on: bool,
    led_log: Vec<(u32, bool)>,
    sent: Vec<[u8; 35]>,
    reports: Vec<(u32, u32)>,
    queue_full_until: u32,
}

impl Sim {
    fn new(app: App) -> Self {
        Self {
            app,
            now: 0,
            supervisor_at: STATE_CHECK_INTERVAL_MS as u32,
            flasher_at: None,
            send_at: None,
            led_on: false,
            led_log: Vec::new(),
            sent: Vec::new(),
            reports: Vec::new(),
            queue_full_until: 0,
        }
    }

    fn set_led(&mut self, on: bool) {
        if on != self.led_on {
            self.led_on = on;
            self.led_log.push((self.now, on));
        }
    }

    fn radio(&mut self, event: TransportEvent) {
        let reaction = self.app.on_transport(event, self.now);
        if reaction.request_send {
            self.send_at = Some(self.now);
        }
        if let Some(report) = reaction.report {
            self.reports.push((report.bytes, report.elapsed_ms));
        }
    }

    /// Dispatch every timer due up to and including `until`.
    fn run_until(&mut self, until: u32) {
        loop {
            let next = [Some(self.supervisor_at), self.flasher_at, self.send_at]
                .into_iter()
                .flatten()
                .min()
                .unwrap();
            if next > until {
                self.now = until;
                return;
            }
            self.now = next;

            if self.flasher_at == Some(next) {
                self.flasher_at = None;
                match self.app.on_flasher_timer() {
                    Step::Lit { led_on, delay_ms } => {
                        self.set_led(led_on);
                        self.flasher_at = Some(next + delay_ms as u32);
                    }
                    Step::Stopped => self.set_led(false),
                }
            } else if self.supervisor_at == next {
                self.supervisor_at += STATE_CHECK_INTERVAL_MS as u32;
                if let Some(delay) = self.app.on_supervisor_tick() {
                    self.flasher_at = Some(next + delay);
                }
            } else {
                self.send_at = None;
                if self.app.on_can_send().is_none() {
                    continue;
                }
                if next < self.queue_full_until {
                    self.send_at = Some(next + SEND_RETRY_MS as u32);
                    continue;
                }
                let mut frame = [0u8; 35];
                frame.copy_from_slice(self.app.payload());
                self.sent.push(frame);
                if let Some(report) = self.app.on_sent(next) {
                    self.reports.push((report.bytes, report.elapsed_ms));
                }
                self.queue_full_until = next + LINK_INTERVAL_MS;
                self.send_at = Some(next);
            }
        }
    }
}

/// The radio-to-run-loop bridge: a bounded queue with an overflow backlog.
struct Bridge {
    queue: VecDeque<TransportEvent>,
    capacity: usize,
    backlog: EventBacklog,
}

impl Bridge {
    fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity,
            backlog: EventBacklog::new(),
        }
    }

    /// GATT callback side: cannot wait, parks what does not fit.
    fn from_callback(&mut self, event: TransportEvent) {
        if self.backlog.is_pending() || self.queue.len() == self.capacity {
            assert!(self.backlog.defer(event));
        } else {
            self.queue.push_back(event);
        }
    }

    /// Radio task side: waits for room, so nothing is lost.
    fn send(&mut self, sim: &mut Sim, event: TransportEvent) {
        while self.queue.len() == self.capacity {
            self.step(sim);
        }
        self.queue.push_back(event);
    }

    fn disconnect(&mut self, sim: &mut Sim, handle: ConnHandle) {
        for event in self.backlog.take() {
            self.send(sim, event);
        }
        self.send(sim, TransportEvent::Disconnected { handle });
    }

    /// One run-loop wake on the radio channel.
    fn step(&mut self, sim: &mut Sim) {
        let Some(event) = self.queue.pop_front() else {
            return;
        };
        sim.radio(event);
        if self.queue.is_empty() && self.backlog.is_pending() {
            for event in self.backlog.take() {
                sim.radio(event);
            }
        }
    }

    fn drain(&mut self, sim: &mut Sim) {
        while !self.queue.is_empty() {
            self.step(sim);
        }
    }
}

#[test]
fn idle_device_never_lights_the_led() {
    let mut sim = Sim::new(App::new());
    sim.run_until(10_000);
    assert!(sim.led_log.is_empty());
    assert!(!sim.app.flasher().is_running());
}

#[test]
fn write_starts_flashing_at_next_supervisor_tick() {
    let mut sim = Sim::new(App::new());
    sim.radio(TransportEvent::Connected { handle: H });
    sim.run_until(400);
    sim.radio(TransportEvent::DataReceived { handle: H, len: 1 });
    sim.run_until(4_000);

    // Supervisor at 600 ms starts the cycle: 1000 on, 1000 off, 250 on, 250 off.
    assert_eq!(
        &sim.led_log[..4],
        &[(600, true), (1600, false), (2600, true), (2850, false)]
    );
    assert_eq!(sim.led_log[4], (3100, true));
}

#[test]
fn second_write_stops_flashing_after_current_slot() {
    let mut sim = Sim::new(App::new());
    sim.radio(TransportEvent::Connected { handle: H });
    sim.radio(TransportEvent::DataReceived { handle: H, len: 1 });
    sim.run_until(1_000);
    assert_eq!(sim.led_log, [(300, true)]);

    sim.radio(TransportEvent::DataReceived { handle: H, len: 1 });
    sim.run_until(5_000);

    // The running slot expires at 1300; that tick sees inactive and stops.
    assert_eq!(sim.led_log, [(300, true), (1300, false)]);
    assert!(!sim.app.flasher().is_running());
    assert_eq!(sim.app.state().flash_index(), 0);
}

#[test]
fn send_pump_streams_only_after_notifications_enabled() {
    let mut sim = Sim::new(App::new());
    sim.radio(TransportEvent::Connected { handle: H });
    sim.run_until(1_000);
    assert!(sim.sent.is_empty());

    sim.radio(TransportEvent::ServiceConnected { handle: H });
    sim.run_until(1_500);
    // One frame per link interval, starting immediately.
    assert_eq!(sim.sent.len(), 11);
    assert!(sim.sent.iter().all(|f| *f == DeviceState::default().to_wire()));
}

#[test]
fn streamed_frames_follow_state_changes() {
    let mut sim = Sim::new(App::new());
    sim.radio(TransportEvent::Connected { handle: H });
    sim.radio(TransportEvent::ServiceConnected { handle: H });
    sim.run_until(100);
    sim.radio(TransportEvent::DataReceived { handle: H, len: 4 });
    sim.run_until(2_000);

    let last = sim.sent.last().unwrap();
    assert_eq!(last[0], 1);
    assert_eq!(last[1], sim.app.state().flash_index());
    assert_eq!(&last[2..11], &DeviceState::default().to_wire()[2..11]);
}

#[test]
fn throughput_reports_every_window() {
    let mut sim = Sim::new(App::new());
    sim.radio(TransportEvent::Connected { handle: H });
    sim.radio(TransportEvent::ServiceConnected { handle: H });
    sim.run_until(9_500);

    // 50 ms per frame: window closes on the frame at 3000, 6000, 9000.
    assert_eq!(
        sim.reports,
        [(61 * 35, 3000), (60 * 35, 3000), (60 * 35, 3000)]
    );
}

#[test]
fn service_disconnect_pauses_stream_until_reenabled() {
    let mut sim = Sim::new(App::new());
    sim.radio(TransportEvent::Connected { handle: H });
    sim.radio(TransportEvent::ServiceConnected { handle: H });
    sim.run_until(200);
    let before = sim.sent.len();

    sim.radio(TransportEvent::ServiceDisconnected { handle: H });
    sim.run_until(1_000);
    assert_eq!(sim.sent.len(), before);
    assert_eq!(sim.app.link().handle(), Some(H));

    sim.radio(TransportEvent::ServiceConnected { handle: H });
    sim.run_until(1_200);
    assert!(sim.sent.len() > before);
}

#[test]
fn disconnect_frees_the_slot_for_a_new_central() {
    let other = ConnHandle(8);
    let mut sim = Sim::new(App::new());
    sim.radio(TransportEvent::Connected { handle: H });
    sim.radio(TransportEvent::Connected { handle: other });
    assert_eq!(sim.app.link().handle(), Some(H));

    sim.radio(TransportEvent::Disconnected { handle: H });
    sim.radio(TransportEvent::Connected { handle: other });
    assert_eq!(sim.app.link().handle(), Some(other));
    assert_eq!(sim.app.link().send_counter(), 0);
}

#[test]
fn companion_app_decodes_frames() {
    let mut state = DeviceState::with_pattern(&[500, 100, 500, 900]).unwrap();
    state.set_active(true);
    let mut sim = Sim::new(App::with_state(state));
    sim.radio(TransportEvent::Connected { handle: H });
    sim.radio(TransportEvent::ServiceConnected { handle: H });
    sim.run_until(10);

    let frame = sim.sent[0];
    let decoded = DeviceState::from_wire_bytes(&frame).unwrap();
    assert!(decoded.is_active());
    assert_eq!(decoded.pattern(), &[500, 100, 500, 900]);
}

#[test]
fn write_burst_beyond_queue_capacity_toggles_every_time() {
    for writes in [5, 6] {
        let mut sim = Sim::new(App::new());
        let mut bridge = Bridge::new(2);
        bridge.send(&mut sim, TransportEvent::Connected { handle: H });
        bridge.drain(&mut sim);

        for _ in 0..writes {
            bridge.from_callback(TransportEvent::DataReceived { handle: H, len: 1 });
        }
        assert!(bridge.backlog.is_pending());
        bridge.drain(&mut sim);

        assert!(!bridge.backlog.is_pending());
        assert_eq!(sim.app.state().is_active(), writes % 2 == 1);
        assert_eq!(sim.app.link().throughput().bytes_total(), writes);
    }
}

#[test]
fn parked_cccd_change_is_not_overtaken_by_later_events() {
    let mut sim = Sim::new(App::new());
    let mut bridge = Bridge::new(1);
    bridge.send(&mut sim, TransportEvent::Connected { handle: H });
    bridge.drain(&mut sim);

    bridge.from_callback(TransportEvent::ServiceConnected { handle: H });
    bridge.from_callback(TransportEvent::ServiceDisconnected { handle: H });
    bridge.from_callback(TransportEvent::ServiceConnected { handle: H });
    bridge.drain(&mut sim);

    assert!(sim.app.link().notifications_enabled());
}

#[test]
fn new_central_is_served_after_disconnect_hits_a_full_queue() {
    let next = ConnHandle(8);
    let mut sim = Sim::new(App::new());
    let mut bridge = Bridge::new(2);
    bridge.send(&mut sim, TransportEvent::Connected { handle: H });
    for _ in 0..4 {
        bridge.from_callback(TransportEvent::DataReceived { handle: H, len: 1 });
    }

    // The queue is still full when the link drops.
    assert!(!bridge.backlog.defer(TransportEvent::Disconnected { handle: H }));
    bridge.disconnect(&mut sim, H);
    bridge.send(&mut sim, TransportEvent::Connected { handle: next });
    bridge.send(&mut sim, TransportEvent::ServiceConnected { handle: next });
    bridge.drain(&mut sim);

    assert_eq!(sim.app.link().handle(), Some(next));
    assert!(!sim.app.state().is_active());
    assert_eq!(sim.app.on_can_send(), Some(next));
}

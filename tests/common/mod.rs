//! Mock PWM slice and delay that log every hardware interaction in order.
#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal_async::delay::DelayNs;
use servo_sweep::servo_config::{ClockDivider, ServoLimits, SliceConfig};
use servo_sweep::servo_driver::{PwmSlice, ServoDriver, StopSignal};

/// One observed interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Configure { divider: ClockDivider, wrap: u16 },
    Level(u16),
    Enabled(bool),
    DelayMs(u32),
}

pub type Log = Rc<RefCell<Vec<Event>>>;

pub struct MockSlice {
    log: Log,
    pub divider: Option<ClockDivider>,
    pub wrap: Option<u16>,
    pub enabled: bool,
    pub last_level: Option<u16>,
}

impl PwmSlice for MockSlice {
    fn configure(&mut self, slice_config: &SliceConfig) {
        self.divider = Some(slice_config.divider());
        self.wrap = Some(slice_config.wrap());
        self.enabled = true;
        self.log.borrow_mut().push(Event::Configure {
            divider: slice_config.divider(),
            wrap: slice_config.wrap(),
        });
    }

    fn set_level(&mut self, level: u16) {
        self.last_level = Some(level);
        self.log.borrow_mut().push(Event::Level(level));
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.log.borrow_mut().push(Event::Enabled(enabled));
    }
}

/// Completes every wait immediately, recording the requested time.
///
/// With `stop_after`, raises the stop signal during the n-th wait.
pub struct MockDelay<'a> {
    log: Log,
    waits: usize,
    stop_after: Option<(usize, &'a StopSignal)>,
}

impl MockDelay<'_> {
    fn record(&mut self, ms: u32) {
        self.log.borrow_mut().push(Event::DelayMs(ms));
        self.waits += 1;
        if let Some((limit, stop)) = self.stop_after {
            if self.waits == limit {
                stop.signal(());
            }
        }
    }
}

impl DelayNs for MockDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.record(ns / 1_000_000);
    }

    async fn delay_us(&mut self, us: u32) {
        self.record(us / 1_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.record(ms);
    }
}

/// Completes waits immediately until the n-th, which raises the stop signal
/// and never finishes, like a timer still running when the stop arrives.
pub struct HangingDelay<'a> {
    log: Log,
    waits: usize,
    hang_at: usize,
    stop: &'a StopSignal,
}

impl HangingDelay<'_> {
    async fn wait(&mut self, ms: u32) {
        self.log.borrow_mut().push(Event::DelayMs(ms));
        self.waits += 1;
        if self.waits == self.hang_at {
            self.stop.signal(());
            core::future::pending::<()>().await;
        }
    }
}

impl DelayNs for HangingDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.wait(ns / 1_000_000).await;
    }

    async fn delay_us(&mut self, us: u32) {
        self.wait(us / 1_000).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.wait(ms).await;
    }
}

pub fn mock_parts<'a>(
    stop_after: Option<(usize, &'a StopSignal)>,
) -> (MockSlice, MockDelay<'a>, Log) {
    let log: Log = Rc::default();
    let slice = MockSlice {
        log: Rc::clone(&log),
        divider: None,
        wrap: None,
        enabled: false,
        last_level: None,
    };
    let delay = MockDelay {
        log: Rc::clone(&log),
        waits: 0,
        stop_after,
    };
    (slice, delay, log)
}

/// Driver with the firmware's configuration over fresh mocks.
pub fn servo_driver<'a>(
    stop_after: Option<(usize, &'a StopSignal)>,
) -> (ServoDriver<MockSlice, MockDelay<'a>>, Log) {
    let (slice, delay, log) = mock_parts(stop_after);
    let driver = ServoDriver::configure(slice, delay, SliceConfig::SERVO, ServoLimits::SERVO)
        .expect("firmware configuration is valid");
    (driver, log)
}

/// Driver whose `hang_at`-th wait is still running when `stop` is raised.
pub fn hanging_servo_driver(
    hang_at: usize,
    stop: &StopSignal,
) -> (ServoDriver<MockSlice, HangingDelay<'_>>, Log) {
    let (slice, _delay, log) = mock_parts(None);
    let delay = HangingDelay {
        log: Rc::clone(&log),
        waits: 0,
        hang_at,
        stop,
    };
    let driver = ServoDriver::configure(slice, delay, SliceConfig::SERVO, ServoLimits::SERVO)
        .expect("firmware configuration is valid");
    (driver, log)
}

pub fn levels(log: &Log) -> Vec<u16> {
    log.borrow()
        .iter()
        .filter_map(|event| match event {
            Event::Level(level) => Some(*level),
            _ => None,
        })
        .collect()
}

pub fn delays(log: &Log) -> Vec<u32> {
    log.borrow()
        .iter()
        .filter_map(|event| match event {
            Event::DelayMs(ms) => Some(*ms),
            _ => None,
        })
        .collect()
}

/// Log without the initial configure event.
pub fn after_configure(log: &Log) -> Vec<Event> {
    log.borrow()
        .iter()
        .copied()
        .filter(|event| !matches!(event, Event::Configure { .. }))
        .collect()
}

//! Timer plumbing for the cooperative scheduler
//!
//! The driver never blocks. Each device instance owns one [`Timer`]; the host
//! firmware's scheduler calls the instance's timer callback when the wake time
//! is due, and the callback answers with a [`TimerAction`] telling the scheduler
//! whether to keep the timer queued.
//!
//! Time is counted in ticks of a free-running 1 MHz timer, so one tick is one
//! microsecond. Wake times advance from the previous wake time rather than from
//! the current time, which keeps the step cadence stable even when a callback
//! runs late.
//!
//! ## Example
//!
//! ```
//! use tm1637::scheduler::{Duration, Instant, Timer};
//!
//! let mut timer = Timer::new();
//! assert!(!timer.is_armed());
//!
//! timer.arm(Instant::from_ticks(1_000));
//! assert_eq!(timer.waketime(), Some(Instant::from_ticks(1_000)));
//!
//! let next = timer.delay(Duration::micros(100));
//! assert_eq!(next, Some(Instant::from_ticks(1_100)));
//! ```

/// Tick rate of the scheduler clock
pub const TIMER_HZ: u32 = 1_000_000;

/// Point in time on the scheduler clock
pub type Instant = fugit::TimerInstantU32<TIMER_HZ>;

/// Span of time on the scheduler clock
pub type Duration = fugit::TimerDurationU32<TIMER_HZ>;

/// What the scheduler should do with a timer after its callback ran
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerAction {
    /// Keep the timer queued and call it again at this wake time
    Reschedule(Instant),
    /// Remove the timer from the queue
    Done,
}

/// One-shot timer re-armed by its own callback
///
/// A disarmed timer is how an instance says "no session in flight".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timer {
    waketime: Option<Instant>,
}

impl Timer {
    /// Create a disarmed timer
    pub const fn new() -> Self {
        Self { waketime: None }
    }

    /// Whether the timer is queued
    pub fn is_armed(&self) -> bool {
        self.waketime.is_some()
    }

    /// Next wake time, if armed
    pub fn waketime(&self) -> Option<Instant> {
        self.waketime
    }

    /// Queue the timer for `at`
    pub fn arm(&mut self, at: Instant) {
        self.waketime = Some(at);
    }

    /// Push the wake time back by `by`, returning the new wake time
    ///
    /// Has no effect on a disarmed timer.
    pub fn delay(&mut self, by: Duration) -> Option<Instant> {
        self.waketime = self.waketime.map(|at| at + by);
        self.waketime
    }

    /// Drop the timer from the queue
    pub fn disarm(&mut self) {
        self.waketime = None;
    }
}

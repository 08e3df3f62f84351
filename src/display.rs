//! Device instance and its timer callback
//!
//! A [`Display`] is one configured TM1637: its two bus lines, the session being
//! transmitted and the timer that steps it. The firmware's scheduler drives it
//! by calling [`Display::on_timer`] whenever the instance's wake time is due;
//! the host feeds it through [`Display::submit`].
//!
//! Both take `&mut self`. When sends arrive in interrupt context, share the
//! instances through [`SharedRegistry`](crate::SharedRegistry), which masks
//! interrupts around every call.

use crate::config::Config;
use crate::error::Error;
use crate::interface::{BusPin, GpioLine};
use crate::lock::BusLock;
use crate::protocol::{Fault, PAYLOAD_LEN, Progress, Session};
use crate::scheduler::{Duration, Instant, Timer, TimerAction};

/// Whether a submitted payload was accepted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Payload copied in and the timer armed
    Queued,
    /// A session was already in flight; the payload was discarded
    Dropped,
}

/// One TM1637 and the state of its transfer
#[derive(Debug)]
pub struct Display<L> {
    /// Host-assigned instance id
    oid: u8,
    /// Clock line
    clk: BusPin<L>,
    /// Data line
    dio: BusPin<L>,
    /// Transfer in progress, if the timer is armed
    session: Session,
    /// Step timer
    timer: Timer,
    /// How the most recent session ended
    last_outcome: Option<Result<(), Fault>>,
}

impl<L> Display<L>
where
    L: GpioLine,
{
    /// Create an idle instance; the lines are not touched until the first step
    pub fn new(oid: u8, clk: L, dio: L) -> Self {
        Self {
            oid,
            clk: BusPin::new(clk),
            dio: BusPin::new(dio),
            session: Session::new(),
            timer: Timer::new(),
            last_outcome: None,
        }
    }

    /// Host-assigned instance id
    pub fn oid(&self) -> u8 {
        self.oid
    }

    /// Whether a session is in flight
    pub fn is_busy(&self) -> bool {
        self.timer.is_armed()
    }

    /// Next wake time, if a session is in flight
    pub fn waketime(&self) -> Option<Instant> {
        self.timer.waketime()
    }

    /// Current transfer state
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// How the most recent session ended, `None` before the first one
    ///
    /// Bus faults are only reported here and in the log; the host never hears
    /// about them.
    pub fn last_outcome(&self) -> Option<Result<(), Fault>> {
        self.last_outcome
    }

    /// Clock line
    pub fn clk(&self) -> &BusPin<L> {
        &self.clk
    }

    /// Data line
    pub fn dio(&self) -> &BusPin<L> {
        &self.dio
    }

    /// Queue a payload for transmission
    ///
    /// The first step is scheduled one step interval after `now`. A payload
    /// submitted while a session is in flight is dropped and leaves the
    /// instance untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadLength`] if `data` is not exactly
    /// [`PAYLOAD_LEN`] bytes. Nothing is changed in that case.
    pub fn submit(
        &mut self,
        data: &[u8],
        now: Instant,
        config: &Config,
    ) -> Result<SendOutcome, Error> {
        let payload: &[u8; PAYLOAD_LEN] = data
            .try_into()
            .map_err(|_| Error::payload_length(data.len()))?;

        let outcome = if self.timer.is_armed() {
            SendOutcome::Dropped
        } else {
            self.session.load(payload);
            self.timer.arm(now + config.step_interval);
            SendOutcome::Queued
        };

        match outcome {
            SendOutcome::Queued => log::debug!("tm1637 {}: session queued", self.oid),
            SendOutcome::Dropped => log::warn!("tm1637 {}: busy, send dropped", self.oid),
        }
        Ok(outcome)
    }

    /// Timer callback: advance the session by one micro-step
    ///
    /// Takes the bus lock first. If another instance holds it, the wake time is
    /// pushed back by the contention back-off and nothing else happens. When the
    /// session ends (sent or faulted) the lock is released and the timer retired.
    pub fn on_timer(&mut self, lock: &BusLock, config: &Config) -> TimerAction {
        if !self.timer.is_armed() {
            return TimerAction::Done;
        }

        if !lock.try_acquire(self.oid) {
            log::debug!(
                "tm1637 {}: bus held by {:?}, backing off",
                self.oid,
                lock.holder()
            );
            return self.reschedule(config.backoff_interval());
        }

        match self
            .session
            .step(&mut self.clk, &mut self.dio, config.bus_reset_pulses)
        {
            Progress::Active => self.reschedule(config.step_interval),
            Progress::Complete(outcome) => {
                self.session.clear();
                lock.release();
                self.timer.disarm();
                self.last_outcome = Some(outcome);
                if outcome.is_ok() {
                    log::debug!("tm1637 {}: session complete", self.oid);
                }
                TimerAction::Done
            }
        }
    }

    fn reschedule(&mut self, by: Duration) -> TimerAction {
        match self.timer.delay(by) {
            Some(at) => TimerAction::Reschedule(at),
            None => TimerAction::Done,
        }
    }

    /// Force both lines to their inert state
    ///
    /// Any session in flight is abandoned. The bus lock is left to the caller.
    pub fn shutdown(&mut self) {
        for line in [&mut self.clk, &mut self.dio] {
            if let Err(e) = line.reset() {
                log::warn!("tm1637 {}: pin reset failed: {:?}", self.oid, e);
            }
        }
        self.session.clear();
        self.timer.disarm();
    }
}

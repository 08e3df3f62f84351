//! Instance table and host command entry points
//!
//! The [`Registry`] owns every configured [`Display`], the [`BusLock`] they
//! share and the driver [`Config`]. The firmware's command dispatcher calls
//! [`Registry::configure`] and [`Registry::send`] with the decoded arguments of
//! the `config_tm1637` and `tm1637_send` messages; its scheduler calls
//! [`Registry::run_timer`] for whichever instance [`Registry::next_wake`] names.
//!
//! Any [`Error`] returned here is fatal for the host session and should be
//! handed to the firmware shutdown path with [`Error::shutdown_reason`].
//!
//! ## Sharing with interrupt handlers
//!
//! Every entry point takes `&mut self`, so a registry reached from both the
//! scheduler loop and an interrupt handler must sit behind a
//! `critical_section::Mutex<RefCell<Registry<..>>>`. [`SharedRegistry`] is that
//! wrapper: each call runs with interrupts masked, so a send can never observe
//! or leave a half-copied payload.
//!
//! ## Example
//!
//! ```
//! use tm1637::scheduler::Instant;
//! use tm1637::{Config, GpioBank, GpioLine, Registry, SendOutcome};
//! # struct Line;
//! # impl GpioLine for Line {
//! #     type Error = ();
//! #     fn configure_input_pull_up(&mut self) -> Result<(), ()> { Ok(()) }
//! #     fn configure_output_low(&mut self) -> Result<(), ()> { Ok(()) }
//! #     fn configure_inert(&mut self) -> Result<(), ()> { Ok(()) }
//! #     fn read(&mut self) -> Result<bool, ()> { Ok(true) }
//! # }
//! # struct Bank;
//! # impl GpioBank for Bank {
//! #     type Line = Line;
//! #     fn line(&mut self, pin: u32) -> Option<Line> { (pin < 32).then_some(Line) }
//! # }
//! # let mut gpio = Bank;
//! let mut registry: Registry<Line, 4> = Registry::new(Config::default());
//! if let Err(e) = registry.configure(0, 4, 5, &mut gpio) {
//!     panic!("{}", e.shutdown_reason());
//! }
//!
//! let frame = [0x40, 0xC0, 0x3F, 0x06, 0x5B, 0x4F, 0x00, 0x00, 0x8F];
//! assert_eq!(
//!     registry.send(0, &frame, Instant::from_ticks(0)),
//!     Ok(SendOutcome::Queued)
//! );
//!
//! // Scheduler loop
//! while let Some((oid, _waketime)) = registry.next_wake() {
//!     let _ = registry.run_timer(oid);
//! }
//! ```

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Vec;

use crate::config::Config;
use crate::display::{Display, SendOutcome};
use crate::error::Error;
use crate::interface::{GpioBank, GpioLine};
use crate::lock::BusLock;
use crate::scheduler::{Instant, TimerAction};

/// Every configured display, keyed by oid
#[derive(Debug)]
pub struct Registry<L, const N: usize> {
    /// Configured instances, in configuration order
    displays: Vec<Display<L>, N>,
    /// Bus token shared by all instances
    lock: BusLock,
    /// Timing shared by all instances
    config: Config,
}

impl<L, const N: usize> Registry<L, N>
where
    L: GpioLine,
{
    /// Create an empty registry
    pub const fn new(config: Config) -> Self {
        Self {
            displays: Vec::new(),
            lock: BusLock::new(),
            config,
        }
    }

    /// Driver configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared bus lock
    pub fn lock(&self) -> &BusLock {
        &self.lock
    }

    /// Look up an instance
    pub fn device(&self, oid: u8) -> Option<&Display<L>> {
        self.displays.iter().find(|d| d.oid() == oid)
    }

    /// Configured instances
    pub fn devices(&self) -> impl Iterator<Item = &Display<L>> {
        self.displays.iter()
    }

    fn device_mut(&mut self, oid: u8) -> Result<&mut Display<L>, Error> {
        self.displays
            .iter_mut()
            .find(|d| d.oid() == oid)
            .ok_or(Error::UnknownOid(oid))
    }

    /// `config_tm1637 oid=%c clk_pin=%u dio_pin=%u`
    ///
    /// Binds both pins and adds an idle instance. No pin is touched until the
    /// first send.
    pub fn configure<B>(
        &mut self,
        oid: u8,
        clk_pin: u32,
        dio_pin: u32,
        bank: &mut B,
    ) -> Result<(), Error>
    where
        B: GpioBank<Line = L>,
    {
        self.try_configure(oid, clk_pin, dio_pin, bank)
            .map_err(fatal)
    }

    fn try_configure<B>(
        &mut self,
        oid: u8,
        clk_pin: u32,
        dio_pin: u32,
        bank: &mut B,
    ) -> Result<(), Error>
    where
        B: GpioBank<Line = L>,
    {
        if self.device(oid).is_some() {
            return Err(Error::OidInUse(oid));
        }
        if self.displays.is_full() {
            return Err(Error::TableFull);
        }
        let clk = bank.line(clk_pin).ok_or(Error::InvalidPin(clk_pin))?;
        let dio = bank.line(dio_pin).ok_or(Error::InvalidPin(dio_pin))?;
        self.displays
            .push(Display::new(oid, clk, dio))
            .map_err(|_| Error::TableFull)?;
        log::debug!(
            "tm1637 {}: configured clk_pin={} dio_pin={}",
            oid,
            clk_pin,
            dio_pin
        );
        Ok(())
    }

    /// `tm1637_send oid=%c data=%*s`
    ///
    /// Queues `data` on the instance; see [`Display::submit`].
    pub fn send(&mut self, oid: u8, data: &[u8], now: Instant) -> Result<SendOutcome, Error> {
        let config = self.config;
        self.device_mut(oid)
            .and_then(|display| display.submit(data, now, &config))
            .map_err(fatal)
    }

    /// Timer callback for one instance; see [`Display::on_timer`]
    pub fn run_timer(&mut self, oid: u8) -> Result<TimerAction, Error> {
        let lock = &self.lock;
        let config = &self.config;
        self.displays
            .iter_mut()
            .find(|d| d.oid() == oid)
            .map(|display| display.on_timer(lock, config))
            .ok_or(Error::UnknownOid(oid))
    }

    /// Earliest armed timer, as `(oid, waketime)`
    pub fn next_wake(&self) -> Option<(u8, Instant)> {
        self.displays
            .iter()
            .filter_map(|d| d.waketime().map(|at| (d.oid(), at)))
            .min_by(|a, b| a.1.cmp(&b.1))
    }

    /// Shutdown hook: reset every pin and drop every session in flight
    pub fn shutdown(&mut self) {
        for display in &mut self.displays {
            display.shutdown();
        }
        self.lock.release();
        log::debug!("tm1637: shutdown, {} instances reset", self.displays.len());
    }
}

/// [`Registry`] behind an interrupt-masking mutex
///
/// Suitable for a `static` shared between the scheduler and interrupt
/// handlers.
///
/// ```
/// use tm1637::scheduler::Instant;
/// use tm1637::{Config, Registry, SendOutcome, SharedRegistry};
/// # struct Line;
/// # impl tm1637::GpioLine for Line {
/// #     type Error = ();
/// #     fn configure_input_pull_up(&mut self) -> Result<(), ()> { Ok(()) }
/// #     fn configure_output_low(&mut self) -> Result<(), ()> { Ok(()) }
/// #     fn configure_inert(&mut self) -> Result<(), ()> { Ok(()) }
/// #     fn read(&mut self) -> Result<bool, ()> { Ok(true) }
/// # }
/// # struct Bank;
/// # impl tm1637::GpioBank for Bank {
/// #     type Line = Line;
/// #     fn line(&mut self, _pin: u32) -> Option<Line> { Some(Line) }
/// # }
/// let displays: SharedRegistry<Line, 2> = SharedRegistry::new(Registry::new(Config::default()));
/// let configured = displays.with(|registry| registry.configure(0, 4, 5, &mut Bank));
/// assert!(configured.is_ok());
///
/// // Interrupt context
/// let payload = [0x40, 0xC0, 0, 0, 0, 0, 0, 0, 0x88];
/// assert_eq!(
///     displays.send(0, &payload, Instant::from_ticks(0)),
///     Ok(SendOutcome::Queued)
/// );
///
/// // Scheduler loop
/// while let Some((oid, _)) = displays.next_wake() {
///     let _ = displays.run_timer(oid);
/// }
/// ```
pub struct SharedRegistry<L, const N: usize> {
    inner: Mutex<RefCell<Registry<L, N>>>,
}

impl<L, const N: usize> SharedRegistry<L, N>
where
    L: GpioLine,
{
    /// Wrap a registry
    pub const fn new(registry: Registry<L, N>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(registry)),
        }
    }

    /// Run `f` on the registry with interrupts masked
    pub fn with<R>(&self, f: impl FnOnce(&mut Registry<L, N>) -> R) -> R {
        critical_section::with(|cs| f(&mut *self.inner.borrow_ref_mut(cs)))
    }

    /// See [`Registry::send`]
    pub fn send(&self, oid: u8, data: &[u8], now: Instant) -> Result<SendOutcome, Error> {
        self.with(|registry| registry.send(oid, data, now))
    }

    /// See [`Registry::run_timer`]
    pub fn run_timer(&self, oid: u8) -> Result<TimerAction, Error> {
        self.with(|registry| registry.run_timer(oid))
    }

    /// See [`Registry::next_wake`]
    pub fn next_wake(&self) -> Option<(u8, Instant)> {
        self.with(|registry| registry.next_wake())
    }

    /// See [`Registry::shutdown`]
    pub fn shutdown(&self) {
        self.with(Registry::shutdown);
    }
}

fn fatal(e: Error) -> Error {
    log::error!("tm1637: {}", e);
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::PinRole;
    use crate::protocol::{PAYLOAD_LEN, Stage};
    use crate::testing::{EventLog, Line, Op, SimBank, SimLine, new_log};

    const PAYLOAD: [u8; PAYLOAD_LEN] = [0x40, 0xC0, 0x06, 0x5B, 0x4F, 0x00, 0x00, 0x00, 0x8F];

    fn setup<const N: usize>(displays: u8) -> (EventLog, SimBank, Registry<SimLine, N>) {
        let log = new_log();
        let mut bank = SimBank::new(displays, &log);
        let mut registry = Registry::new(Config::default());
        for oid in 0..displays {
            let pin = u32::from(oid) * 2;
            registry.configure(oid, pin, pin + 1, &mut bank).unwrap();
        }
        (log, bank, registry)
    }

    /// Drive every timer to completion, returning the number of callbacks
    fn run_scheduler<const N: usize>(registry: &mut Registry<SimLine, N>) -> usize {
        let mut calls = 0;
        while let Some((oid, _)) = registry.next_wake() {
            registry.run_timer(oid).unwrap();
            calls += 1;
            assert!(calls < 100_000, "timers never retired");
        }
        calls
    }

    #[test]
    fn test_end_to_end_single_display() {
        let (_, bank, mut registry) = setup::<4>(1);
        let payload = [0x40, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            registry.send(0, &payload, Instant::from_ticks(0)),
            Ok(SendOutcome::Queued)
        );
        // idle check, 3 starts, 72 bits, 9 acks, 3 stops
        assert_eq!(run_scheduler(&mut registry), 1 + 3 * 2 + 72 * 3 + 9 * 4 + 3 * (2 + 4));

        let display = registry.device(0).unwrap();
        assert_eq!(display.session().stage(), Stage::Idle);
        assert_eq!(display.session().bits_sent(), 0);
        assert_eq!(display.last_outcome(), Some(Ok(())));
        assert_eq!(registry.lock().holder(), None);

        let bus = bank.buses[0].borrow();
        assert_eq!(bus.chip.bytes(), payload.to_vec());
        assert_eq!(bus.chip.frames.len(), 3);
        assert_eq!(bus.chip.data_bits, 72);
    }

    #[test]
    fn test_two_displays_never_interleave() {
        let (log, bank, mut registry) = setup::<4>(2);
        let now = Instant::from_ticks(0);
        assert_eq!(registry.send(0, &PAYLOAD, now), Ok(SendOutcome::Queued));
        assert_eq!(registry.send(1, &PAYLOAD, now), Ok(SendOutcome::Queued));
        run_scheduler(&mut registry);

        let tags: std::vec::Vec<u8> = log.borrow().iter().map(|e| e.tag).collect();
        let switches = tags.windows(2).filter(|w| w[0] != w[1]).count();
        assert_eq!(switches, 1);
        for bus in &bank.buses {
            assert_eq!(bus.borrow().chip.bytes(), PAYLOAD.to_vec());
        }
        assert_eq!(registry.lock().holder(), None);
    }

    #[test]
    fn test_loser_waits_for_backoff() {
        let (_, _, mut registry) = setup::<4>(2);
        let now = Instant::from_ticks(0);
        registry.send(0, &PAYLOAD, now).unwrap();
        registry.send(1, &PAYLOAD, now).unwrap();

        assert_eq!(registry.next_wake(), Some((0, Instant::from_ticks(100))));
        registry.run_timer(0).unwrap();
        assert_eq!(registry.next_wake(), Some((1, Instant::from_ticks(100))));
        assert_eq!(
            registry.run_timer(1),
            Ok(TimerAction::Reschedule(Instant::from_ticks(50_100)))
        );
        assert_eq!(registry.lock().holder(), Some(0));
    }

    #[test]
    fn test_wrong_payload_length_is_fatal() {
        let (log, _, mut registry) = setup::<4>(1);
        let result = registry.send(0, &PAYLOAD[..8], Instant::from_ticks(0));
        assert_eq!(
            result,
            Err(Error::PayloadLength {
                expected: 9,
                provided: 8
            })
        );
        assert_eq!(result.unwrap_err().shutdown_reason(), "tm1637 data wrong size");
        assert!(log.borrow().is_empty());
        assert_eq!(registry.next_wake(), None);
    }

    #[test]
    fn test_configure_rejects_bad_requests() {
        let log = new_log();
        let mut bank = SimBank::new(2, &log);
        let mut registry: Registry<SimLine, 2> = Registry::new(Config::default());

        assert_eq!(registry.configure(0, 0, 9, &mut bank), Err(Error::InvalidPin(9)));
        assert!(registry.device(0).is_none());

        registry.configure(0, 0, 1, &mut bank).unwrap();
        assert_eq!(registry.configure(0, 2, 3, &mut bank), Err(Error::OidInUse(0)));
        registry.configure(7, 2, 3, &mut bank).unwrap();
        assert_eq!(registry.configure(8, 0, 1, &mut bank), Err(Error::TableFull));
        assert_eq!(registry.devices().count(), 2);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_unknown_oid() {
        let (_, _, mut registry) = setup::<4>(1);
        assert_eq!(
            registry.send(3, &PAYLOAD, Instant::from_ticks(0)),
            Err(Error::UnknownOid(3))
        );
        assert_eq!(registry.run_timer(3), Err(Error::UnknownOid(3)));
    }

    #[test]
    fn test_shutdown_resets_every_pin() {
        let (log, _, mut registry) = setup::<4>(2);
        registry.send(0, &PAYLOAD, Instant::from_ticks(0)).unwrap();
        for _ in 0..20 {
            registry.run_timer(0).unwrap();
        }
        assert_eq!(registry.lock().holder(), Some(0));

        registry.shutdown();
        assert_eq!(registry.lock().holder(), None);
        assert_eq!(registry.next_wake(), None);
        for display in registry.devices() {
            assert_eq!(display.clk().role(), PinRole::Unconfigured);
            assert_eq!(display.dio().role(), PinRole::Unconfigured);
        }
        let events = log.borrow();
        let tail = &events[events.len() - 2..];
        assert!(tail.iter().all(|e| e.tag == 0 && e.op == Op::Inert));
        assert_eq!(tail[0].line, Line::Clk);
        assert_eq!(tail[1].line, Line::Dio);
    }

    #[test]
    fn test_shared_registry_masks_each_call() {
        let (_, bank, registry) = setup::<4>(1);
        let shared = SharedRegistry::new(registry);
        assert_eq!(
            shared.send(0, &PAYLOAD, Instant::from_ticks(0)),
            Ok(SendOutcome::Queued)
        );
        assert_eq!(
            shared.send(0, &PAYLOAD, Instant::from_ticks(0)),
            Ok(SendOutcome::Dropped)
        );
        while let Some((oid, _)) = shared.next_wake() {
            shared.run_timer(oid).unwrap();
        }
        assert_eq!(bank.buses[0].borrow().chip.bytes(), PAYLOAD.to_vec());
        assert!(shared.with(|registry| registry.lock().holder().is_none()));
        assert_eq!(shared.run_timer(9), Err(Error::UnknownOid(9)));
    }
}

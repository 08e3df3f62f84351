//! Driver timing configuration and builder

pub use crate::error::BuilderError;
use crate::scheduler::Duration;

/// Default micro-step cadence in microseconds
pub const DEFAULT_STEP_INTERVAL_US: u32 = 100;

/// Default back-off multiplier applied to the step interval under lock contention
pub const DEFAULT_CONTENTION_BACKOFF: u32 = 500;

/// Default number of clock pulses emitted by a bus reset
pub const DEFAULT_BUS_RESET_PULSES: u8 = 11;

/// Driver configuration
///
/// Shared by every instance in a [`Registry`](crate::Registry). Use [`Builder`]
/// to create a Config; [`Config::default`] matches the chip timing the driver
/// was tuned for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Delay between two protocol micro-steps
    pub step_interval: Duration,
    /// Multiplier on `step_interval` used when another instance holds the bus
    pub contention_backoff: u32,
    /// Clock pulses emitted to free a stuck bus
    pub bus_reset_pulses: u8,
}

impl Config {
    /// Timing the driver was tuned for, usable in `const` context
    pub const DEFAULT: Self = Self {
        step_interval: Duration::micros(DEFAULT_STEP_INTERVAL_US),
        contention_backoff: DEFAULT_CONTENTION_BACKOFF,
        bus_reset_pulses: DEFAULT_BUS_RESET_PULSES,
    };

    /// Delay before retrying after losing the bus lock
    pub fn backoff_interval(&self) -> Duration {
        self.step_interval * self.contention_backoff
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Builder for constructing driver configuration
///
/// # Example
///
/// ```
/// use tm1637::Builder;
///
/// let config = match Builder::new().step_interval_us(50).build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// assert_eq!(config.backoff_interval().ticks(), 25_000);
/// ```
#[must_use]
pub struct Builder {
    /// Step interval in microseconds
    step_interval_us: u32,
    /// Contention back-off multiplier
    contention_backoff: u32,
    /// Bus reset clock pulses
    bus_reset_pulses: u8,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            step_interval_us: DEFAULT_STEP_INTERVAL_US,
            contention_backoff: DEFAULT_CONTENTION_BACKOFF,
            bus_reset_pulses: DEFAULT_BUS_RESET_PULSES,
        }
    }
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the micro-step cadence in microseconds
    ///
    /// Every stage of the protocol is one micro-step, so this is also the
    /// half-period of the bus clock while a byte is being written.
    pub fn step_interval_us(mut self, us: u32) -> Self {
        self.step_interval_us = us;
        self
    }

    /// Set the back-off multiplier used when another instance holds the bus
    pub fn contention_backoff(mut self, factor: u32) -> Self {
        self.contention_backoff = factor;
        self
    }

    /// Set the number of clock pulses emitted by a bus reset
    pub fn bus_reset_pulses(mut self, pulses: u8) -> Self {
        self.bus_reset_pulses = pulses;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns a [`BuilderError`] if any value is zero.
    pub fn build(self) -> Result<Config, BuilderError> {
        if self.step_interval_us == 0 {
            return Err(BuilderError::ZeroStepInterval);
        }
        if self.contention_backoff == 0 {
            return Err(BuilderError::ZeroBackoff);
        }
        if self.bus_reset_pulses == 0 {
            return Err(BuilderError::ZeroResetPulses);
        }
        Ok(Config {
            step_interval: Duration::micros(self.step_interval_us),
            contention_backoff: self.contention_backoff,
            bus_reset_pulses: self.bus_reset_pulses,
        })
    }
}

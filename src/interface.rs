//! Hardware interface abstraction
//!
//! This module provides the [`GpioLine`] trait, the capability the driver needs
//! from a single GPIO line, and [`BusPin`], which wraps one line in the two
//! states an open-drain bus allows:
//!
//! - **Released**: input with pull-up. The line floats high unless another agent
//!   on the bus holds it low, so reading it tells who is driving the bus.
//! - **Asserted low**: output driven low.
//!
//! The driver never drives a line high. A released line that reads low means the
//! display (or a fault) is holding it, and that reading is authoritative for every
//! protocol decision.
//!
//! ## Hardware Requirements
//!
//! The TM1637 requires 2 GPIO lines with external pull-ups:
//! - **CLK**: Clock
//! - **DIO**: Data, sampled by the display on the rising clock edge
//!
//! Both lines can be switched between input and output at run time. Chips whose
//! HAL exposes open-drain pins through embedded-hal can use [`OpenDrain`] instead
//! of implementing [`GpioLine`] directly.
//!
//! ## Example
//!
//! ```rust
//! use core::convert::Infallible;
//! use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
//! use tm1637::{BusPin, OpenDrain, PinRole};
//! # struct MockPin { low: bool }
//! # impl ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { self.low = true; Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { self.low = false; Ok(()) }
//! # }
//! # impl InputPin for MockPin {
//! #     fn is_high(&mut self) -> Result<bool, Self::Error> { Ok(!self.low) }
//! #     fn is_low(&mut self) -> Result<bool, Self::Error> { Ok(self.low) }
//! # }
//! let mut clk = BusPin::new(OpenDrain::new(MockPin { low: false }));
//! assert_eq!(clk.role(), PinRole::Unconfigured);
//!
//! assert_eq!(clk.assert_low(), Ok(()));
//! assert_eq!(clk.role(), PinRole::AssertedLow);
//!
//! // Released line floats high
//! assert_eq!(clk.release(), Ok(true));
//! ```

use core::fmt::Debug;
use embedded_hal::digital::{InputPin, OutputPin};

/// Capability the driver needs from one GPIO line
///
/// Implementations reconfigure the pin in hardware. The driver only calls the
/// `configure_*` methods when the line's role actually changes.
pub trait GpioLine {
    /// Error type for configuring or reading the line
    type Error: Debug;

    /// Configure the line as an input with pull-up
    fn configure_input_pull_up(&mut self) -> Result<(), Self::Error>;

    /// Configure the line as an output driven low
    fn configure_output_low(&mut self) -> Result<(), Self::Error>;

    /// Return the line to an inert, high-impedance state
    fn configure_inert(&mut self) -> Result<(), Self::Error>;

    /// Sample the logic level on the line (`true` = high)
    fn read(&mut self) -> Result<bool, Self::Error>;
}

/// Binds host-supplied pin numbers to GPIO lines
///
/// Binding a number must not touch the hardware; the line is first configured
/// when the driver releases or asserts it.
pub trait GpioBank {
    /// Line type handed out by this bank
    type Line: GpioLine;

    /// Bind a pin number, or `None` if the number is not a valid GPIO
    fn line(&mut self, pin: u32) -> Option<Self::Line>;
}

/// Bus role of a pin
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PinRole {
    /// Not configured yet, or reset
    #[default]
    Unconfigured,
    /// Input with pull-up, floating high unless held low by another agent
    Released,
    /// Output driven low
    AssertedLow,
}

/// One open-drain bus line and its current role
#[derive(Debug)]
pub struct BusPin<L> {
    line: L,
    role: PinRole,
}

impl<L: GpioLine> BusPin<L> {
    /// Wrap a line; the line is not touched until first use
    pub fn new(line: L) -> Self {
        Self {
            line,
            role: PinRole::Unconfigured,
        }
    }

    /// Current role
    pub fn role(&self) -> PinRole {
        self.role
    }

    /// Release the line and sample it
    ///
    /// Returns `Ok(false)` when something holds the line low. The role only
    /// changes once the hardware accepted the new configuration.
    pub fn release(&mut self) -> Result<bool, L::Error> {
        if self.role != PinRole::Released {
            self.reset()?;
            self.line.configure_input_pull_up()?;
            self.role = PinRole::Released;
        }
        self.line.read()
    }

    /// Drive the line low
    pub fn assert_low(&mut self) -> Result<(), L::Error> {
        if self.role != PinRole::AssertedLow {
            self.reset()?;
            self.line.configure_output_low()?;
            self.role = PinRole::AssertedLow;
        }
        Ok(())
    }

    /// Return the line to its inert state
    pub fn reset(&mut self) -> Result<(), L::Error> {
        if self.role != PinRole::Unconfigured {
            self.line.configure_inert()?;
            self.role = PinRole::Unconfigured;
        }
        Ok(())
    }

    /// Access the underlying line
    pub fn line(&self) -> &L {
        &self.line
    }
}

/// [`GpioLine`] over an embedded-hal open-drain pin
///
/// The pin must be configured as open-drain with a pull-up (internal or external)
/// by the HAL before it is handed over. Releasing writes a high level, which
/// leaves the output transistor off; asserting writes a low level.
#[derive(Debug)]
pub struct OpenDrain<P> {
    pin: P,
}

impl<P> OpenDrain<P>
where
    P: InputPin + OutputPin,
{
    /// Wrap an open-drain pin
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Release the wrapped pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> GpioLine for OpenDrain<P>
where
    P: InputPin + OutputPin,
{
    type Error = P::Error;

    fn configure_input_pull_up(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }

    fn configure_output_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low()
    }

    fn configure_inert(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }

    fn read(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_high()
    }
}

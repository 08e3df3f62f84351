//! TM1637 Seven-Segment Display Driver
//!
//! A driver for the TM1637 LED controller, bit-banged over two open-drain GPIO
//! lines and stepped by the firmware's timer scheduler instead of busy-waiting.
//!
//! ## Features
//!
//! - `no_std` compatible, no allocator
//! - One protocol micro-step per timer callback, so the bus never blocks the
//!   scheduler
//! - Several displays, optionally sharing a data line, arbitrated by one
//!   [`BusLock`]
//! - Interrupt-safe sharing of the instance table through [`SharedRegistry`]
//! - Bus reset recovery when a line is found held low
//! - `embedded-hal` v1.0 open-drain pins through [`OpenDrain`]
//! - Seven-segment font and payload assembly ([`Frame`])
//!
//! ## Usage
//!
//! ```rust
//! use core::convert::Infallible;
//! use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
//! use tm1637::scheduler::Instant;
//! use tm1637::{Builder, Frame, GpioBank, OpenDrain, Registry};
//!
//! # struct MockPin;
//! # impl ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl InputPin for MockPin {
//! #     fn is_high(&mut self) -> Result<bool, Self::Error> { Ok(true) }
//! #     fn is_low(&mut self) -> Result<bool, Self::Error> { Ok(false) }
//! # }
//! struct Gpio;
//!
//! impl GpioBank for Gpio {
//!     type Line = OpenDrain<MockPin>;
//!
//!     fn line(&mut self, pin: u32) -> Option<Self::Line> {
//!         (pin < 48).then(|| OpenDrain::new(MockPin))
//!     }
//! }
//!
//! let config = match Builder::new().step_interval_us(100).build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//! let mut displays: Registry<OpenDrain<MockPin>, 2> = Registry::new(config);
//! if displays.configure(0, 10, 11, &mut Gpio).is_err() {
//!     return;
//! }
//!
//! let mut frame = Frame::new();
//! frame.set_text("12.34");
//! let _ = displays.send(0, &frame.payload(), Instant::from_ticks(0));
//!
//! // From the scheduler, whenever the earliest wake time is due
//! if let Some((oid, _due)) = displays.next_wake() {
//!     let _ = displays.run_timer(oid);
//! }
//! ```

#![cfg_attr(not(test), no_std)]

/// TM1637 command definitions
pub mod command;
/// Driver timing configuration and builder
pub mod config;
/// Device instance and timer callback
pub mod display;
/// Error types for the driver
pub mod error;
/// Display contents and payload assembly
pub mod frame;
/// Hardware interface abstraction
pub mod interface;
/// Bus arbitration between instances
pub mod lock;
/// Wire protocol state machine
pub mod protocol;
/// Instance table and host command entry points
pub mod registry;
/// Timer plumbing for the cooperative scheduler
pub mod scheduler;
/// Seven-segment font
pub mod segment;

#[cfg(test)]
mod testing;

pub use config::{Builder, Config};
pub use display::{Display, SendOutcome};
pub use error::{BuilderError, Error};
pub use frame::{Brightness, Frame};
pub use interface::{BusPin, GpioBank, GpioLine, OpenDrain, PinRole};
pub use lock::BusLock;
pub use protocol::{Fault, PAYLOAD_LEN, Session, Stage};
pub use registry::{Registry, SharedRegistry};
pub use scheduler::{Instant, TimerAction};

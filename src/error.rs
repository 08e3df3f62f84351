//! Error types for the driver
//!
//! This module defines error types for configuration building ([`BuilderError`])
//! and host command handling ([`Error`]).
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors during configuration construction
//! - [`Error`] - Command errors raised by the [`Registry`](crate::Registry)
//! - [`Fault`](crate::protocol::Fault) - Bus faults, handled inside the protocol state machine
//!
//! Every [`Error`] is fatal: it means the host and the firmware disagree about the
//! command protocol, so the firmware glue is expected to enter its shutdown path.
//! Bus faults never surface as an [`Error`]; a faulted transmission is dropped.
//!
//! ## Example
//!
//! ```
//! use tm1637::{Builder, BuilderError};
//!
//! let result = Builder::new().step_interval_us(0).build();
//! assert!(matches!(result, Err(BuilderError::ZeroStepInterval)));
//! ```

use crate::protocol::PAYLOAD_LEN;

/// Errors raised by the command surface
///
/// All of these indicate a host/firmware protocol mismatch and are not recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Send payload is not exactly [`PAYLOAD_LEN`] bytes
    PayloadLength {
        /// Required payload length in bytes
        expected: usize,
        /// Provided payload length in bytes
        provided: usize,
    },
    /// No instance was configured under this oid
    UnknownOid(u8),
    /// An instance is already configured under this oid
    OidInUse(u8),
    /// The instance table has no free slot
    TableFull,
    /// The GPIO bank rejected this pin number
    InvalidPin(u32),
}

impl Error {
    /// Payload length error for a buffer of `provided` bytes
    pub(crate) const fn payload_length(provided: usize) -> Self {
        Self::PayloadLength {
            expected: PAYLOAD_LEN,
            provided,
        }
    }

    /// Static message handed to the firmware shutdown path
    pub fn shutdown_reason(&self) -> &'static str {
        match self {
            Self::PayloadLength { .. } => "tm1637 data wrong size",
            Self::UnknownOid(_) => "Invalid oid type",
            Self::OidInUse(_) => "Can't assign oid",
            Self::TableFull => "tm1637 instance table full",
            Self::InvalidPin(_) => "Not a valid pin",
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PayloadLength { expected, provided } => {
                write!(
                    f,
                    "Payload length mismatch: expected {expected} bytes, provided {provided}"
                )
            }
            Self::UnknownOid(oid) => write!(f, "Unknown oid {oid}"),
            Self::OidInUse(oid) => write!(f, "Oid {oid} already configured"),
            Self::TableFull => write!(f, "Instance table full"),
            Self::InvalidPin(pin) => write!(f, "Invalid pin {pin}"),
        }
    }
}

impl core::error::Error for Error {}

/// Errors that can occur when building configuration
///
/// These errors occur during the builder pattern before any instance is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderError {
    /// Step interval must be at least one microsecond
    ZeroStepInterval,
    /// Contention back-off multiplier must be non-zero
    ///
    /// A zero back-off would reschedule a contending instance at its current
    /// wake time and starve the cooperative scheduler.
    ZeroBackoff,
    /// Bus reset must emit at least one clock pulse
    ZeroResetPulses,
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ZeroStepInterval => write!(f, "Step interval must be non-zero"),
            Self::ZeroBackoff => write!(f, "Contention back-off must be non-zero"),
            Self::ZeroResetPulses => write!(f, "Bus reset pulse count must be non-zero"),
        }
    }
}

impl core::error::Error for BuilderError {}

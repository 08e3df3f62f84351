//! TM1637 command definitions
//!
//! This module defines the command bytes understood by the TM1637 and the host
//! message formats the driver answers to.
//!
//! ## Command Structure
//!
//! A display update is three separate transfers, each wrapped in its own
//! start and stop condition:
//! 1. Data setting command ([`DATA_SETTING`])
//! 2. Address setting command ([`ADDRESS_SETTING`] plus the first grid) followed
//!    by the grid bytes, written to consecutive addresses
//! 3. Display control command ([`DISPLAY_CONTROL`])
//!
//! [`Frame`](crate::Frame) assembles all three into one payload.
//!
//! ## Example
//!
//! ```rust
//! use tm1637::command;
//!
//! // Display on at the lowest pulse width
//! let control = command::DISPLAY_CONTROL | command::DISPLAY_ON;
//! assert_eq!(control, 0x88);
//! ```

// Data setting

/// Data setting command (0x40)
///
/// Write to display registers with automatic address increment.
pub const DATA_SETTING: u8 = 0x40;

/// Data setting flag: write to a fixed address instead of incrementing (0x04)
pub const DATA_FIXED_ADDRESS: u8 = 0x04;

/// Data setting flag: test mode (0x08)
pub const DATA_TEST_MODE: u8 = 0x08;

// Address setting

/// Address setting command (0xC0)
///
/// The low bits select the first grid register (0..=5) to write.
pub const ADDRESS_SETTING: u8 = 0xC0;

/// Number of grid registers
pub const GRID_COUNT: usize = 6;

// Display control

/// Display control command (0x80)
///
/// Sent alone it turns the display off.
pub const DISPLAY_CONTROL: u8 = 0x80;

/// Display control flag: display on (0x08)
pub const DISPLAY_ON: u8 = 0x08;

/// Display control mask for the pulse width (brightness) field
pub const PULSE_WIDTH_MASK: u8 = 0x07;

// Host messages

/// Host message that creates an instance
pub const CONFIG_MESSAGE: &str = "config_tm1637 oid=%c clk_pin=%u dio_pin=%u";

/// Host message that submits a payload
pub const SEND_MESSAGE: &str = "tm1637_send oid=%c data=%*s";

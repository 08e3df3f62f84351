//! Display contents and payload assembly
//!
//! A [`Frame`] holds what the six grid registers should show and how bright.
//! [`Frame::payload`] turns it into the 9-byte payload a send carries:
//!
//! | Byte | Content |
//! |---|---|
//! | 0 | [`DATA_SETTING`] |
//! | 1 | [`ADDRESS_SETTING`], grid 0 |
//! | 2..=7 | Grid 0 through 5 |
//! | 8 | [`DISPLAY_CONTROL`] with on flag and pulse width |
//!
//! ## Example
//!
//! ```
//! use tm1637::{Brightness, Frame};
//!
//! let mut frame = Frame::new();
//! assert!(frame.set_digits(1234, 4));
//! frame.set_dot(1, true);
//! frame.set_brightness(Brightness::MAX);
//!
//! assert_eq!(
//!     frame.payload(),
//!     [0x40, 0xC0, 0x06, 0xDB, 0x4F, 0x66, 0x00, 0x00, 0x8F]
//! );
//! ```

use crate::command::{
    ADDRESS_SETTING, DATA_SETTING, DISPLAY_CONTROL, DISPLAY_ON, GRID_COUNT, PULSE_WIDTH_MASK,
};
use crate::protocol::PAYLOAD_LEN;
use crate::segment::{BLANK, DIGITS, SEG_DP, encode_char};

/// Display pulse width, or display off
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Brightness(Option<u8>);

impl Brightness {
    /// Display off
    pub const OFF: Self = Self(None);
    /// 1/16 pulse width
    pub const MIN: Self = Self(Some(0));
    /// 14/16 pulse width
    pub const MAX: Self = Self(Some(PULSE_WIDTH_MASK));

    /// Display on at `level` (0..=7), `None` if out of range
    pub const fn new(level: u8) -> Option<Self> {
        if level <= PULSE_WIDTH_MASK {
            Some(Self(Some(level)))
        } else {
            None
        }
    }

    /// Pulse width level, `None` when off
    pub const fn level(self) -> Option<u8> {
        self.0
    }

    /// Display control command for this setting
    pub const fn control_byte(self) -> u8 {
        match self.0 {
            Some(level) => DISPLAY_CONTROL | DISPLAY_ON | level,
            None => DISPLAY_CONTROL,
        }
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::MIN
    }
}

/// Contents of the six grid registers and the display brightness
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    grids: [u8; GRID_COUNT],
    brightness: Brightness,
}

impl Frame {
    /// Blank frame at minimum brightness
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame with raw segment bitmaps
    pub fn from_grids(grids: [u8; GRID_COUNT]) -> Self {
        Self {
            grids,
            brightness: Brightness::default(),
        }
    }

    /// Raw segment bitmaps
    pub fn grids(&self) -> &[u8; GRID_COUNT] {
        &self.grids
    }

    /// Set one grid's segment bitmap; out of range indices are ignored
    pub fn set_grid(&mut self, index: usize, segments: u8) {
        if let Some(grid) = self.grids.get_mut(index) {
            *grid = segments;
        }
    }

    /// Turn the decimal point (or colon) of one grid on or off
    pub fn set_dot(&mut self, index: usize, on: bool) {
        if let Some(grid) = self.grids.get_mut(index) {
            if on {
                *grid |= SEG_DP;
            } else {
                *grid &= !SEG_DP;
            }
        }
    }

    /// Current brightness
    pub fn brightness(&self) -> Brightness {
        self.brightness
    }

    /// Set the brightness
    pub fn set_brightness(&mut self, brightness: Brightness) {
        self.brightness = brightness;
    }

    /// Blank every grid
    pub fn clear(&mut self) {
        self.grids = [BLANK; GRID_COUNT];
    }

    /// Show `value` in decimal, right-aligned in the first `width` grids
    ///
    /// Leading positions are blanked and decimal points in the field are
    /// cleared. Returns `false` and leaves the frame unchanged if the number
    /// does not fit.
    pub fn set_digits(&mut self, value: u32, width: usize) -> bool {
        let width = width.min(GRID_COUNT);
        let mut field = [BLANK; GRID_COUNT];
        let mut rest = value;
        for pos in (0..width).rev() {
            field[pos] = DIGITS[(rest % 10) as usize];
            rest /= 10;
            if rest == 0 {
                break;
            }
        }
        if rest != 0 || width == 0 {
            return false;
        }
        self.grids[..width].copy_from_slice(&field[..width]);
        true
    }

    /// Show `text` from the left, one character per grid
    ///
    /// A `.` lights the decimal point of the preceding character instead of
    /// taking a grid. Characters without a seven-segment form show as blank,
    /// and anything past the last grid is dropped. Grids after the text are
    /// blanked.
    pub fn set_text(&mut self, text: &str) {
        self.clear();
        let mut pos = 0;
        for c in text.chars() {
            if c == '.' && pos > 0 {
                self.grids[pos - 1] |= SEG_DP;
                continue;
            }
            if pos == GRID_COUNT {
                break;
            }
            self.grids[pos] = encode_char(c).unwrap_or(BLANK);
            pos += 1;
        }
    }

    /// Assemble the send payload
    pub fn payload(&self) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0; PAYLOAD_LEN];
        payload[0] = DATA_SETTING;
        payload[1] = ADDRESS_SETTING;
        payload[2..2 + GRID_COUNT].copy_from_slice(&self.grids);
        payload[PAYLOAD_LEN - 1] = self.brightness.control_byte();
        payload
    }
}

//! Seven-segment font
//!
//! Each grid register holds one digit as a segment bitmap, segment `a` in bit 0
//! through `g` in bit 6, with the decimal point (or colon, depending on the
//! module) in bit 7:
//!
//! ```text
//!    aaa
//!   f   b
//!   f   b
//!    ggg
//!   e   c
//!   e   c
//!    ddd  dp
//! ```

/// Segment a (top)
pub const SEG_A: u8 = 1 << 0;
/// Segment b (top right)
pub const SEG_B: u8 = 1 << 1;
/// Segment c (bottom right)
pub const SEG_C: u8 = 1 << 2;
/// Segment d (bottom)
pub const SEG_D: u8 = 1 << 3;
/// Segment e (bottom left)
pub const SEG_E: u8 = 1 << 4;
/// Segment f (top left)
pub const SEG_F: u8 = 1 << 5;
/// Segment g (middle)
pub const SEG_G: u8 = 1 << 6;
/// Decimal point or colon
pub const SEG_DP: u8 = 1 << 7;

/// All segments off
pub const BLANK: u8 = 0;

/// Minus sign
pub const MINUS: u8 = SEG_G;

/// Digits 0 through 9
pub const DIGITS: [u8; 10] = [
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F,
    SEG_B | SEG_C,
    SEG_A | SEG_B | SEG_D | SEG_E | SEG_G,
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_G,
    SEG_B | SEG_C | SEG_F | SEG_G,
    SEG_A | SEG_C | SEG_D | SEG_F | SEG_G,
    SEG_A | SEG_C | SEG_D | SEG_E | SEG_F | SEG_G,
    SEG_A | SEG_B | SEG_C,
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F | SEG_G,
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_F | SEG_G,
];

/// Segments for a decimal digit, `None` above 9
pub const fn encode_digit(digit: u8) -> Option<u8> {
    if digit < 10 {
        Some(DIGITS[digit as usize])
    } else {
        None
    }
}

/// Segments for a character, `None` if it has no seven-segment form
///
/// Covers the digits, the hex letters and the few other letters that read
/// unambiguously. Case matters only where both forms exist (`C`/`c`, `H`/`h`,
/// `U`/`u`, `O`/`o`).
///
/// ```
/// use tm1637::segment::{encode_char, DIGITS};
///
/// assert_eq!(encode_char('7'), Some(DIGITS[7]));
/// assert_eq!(encode_char('O'), encode_char('0'));
/// assert_eq!(encode_char('#'), None);
/// ```
pub const fn encode_char(c: char) -> Option<u8> {
    let segments = match c {
        '0'..='9' => DIGITS[c as usize - '0' as usize],
        'A' | 'a' => SEG_A | SEG_B | SEG_C | SEG_E | SEG_F | SEG_G,
        'B' | 'b' => SEG_C | SEG_D | SEG_E | SEG_F | SEG_G,
        'C' => SEG_A | SEG_D | SEG_E | SEG_F,
        'c' => SEG_D | SEG_E | SEG_G,
        'D' | 'd' => SEG_B | SEG_C | SEG_D | SEG_E | SEG_G,
        'E' | 'e' => SEG_A | SEG_D | SEG_E | SEG_F | SEG_G,
        'F' | 'f' => SEG_A | SEG_E | SEG_F | SEG_G,
        'H' => SEG_B | SEG_C | SEG_E | SEG_F | SEG_G,
        'h' => SEG_C | SEG_E | SEG_F | SEG_G,
        'L' | 'l' => SEG_D | SEG_E | SEG_F,
        'O' => DIGITS[0],
        'o' => SEG_C | SEG_D | SEG_E | SEG_G,
        'P' | 'p' => SEG_A | SEG_B | SEG_E | SEG_F | SEG_G,
        'R' | 'r' => SEG_E | SEG_G,
        'U' => SEG_B | SEG_C | SEG_D | SEG_E | SEG_F,
        'u' => SEG_C | SEG_D | SEG_E,
        '-' => MINUS,
        '_' => SEG_D,
        ' ' => BLANK,
        _ => return None,
    };
    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_bitmaps() {
        assert_eq!(
            DIGITS,
            [0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F]
        );
    }

    #[test]
    fn test_encode_digit_range() {
        assert_eq!(encode_digit(0), Some(0x3F));
        assert_eq!(encode_digit(9), Some(0x6F));
        assert_eq!(encode_digit(10), None);
    }

    #[test]
    fn test_encode_char_never_sets_dot() {
        for c in (' '..='~').filter_map(encode_char) {
            assert_eq!(c & SEG_DP, 0);
        }
    }

    #[test]
    fn test_encode_char_hex_letters() {
        assert_eq!(encode_char('A'), encode_char('a'));
        assert_eq!(encode_char('F'), Some(0x71));
        assert_eq!(encode_char('-'), Some(MINUS));
        assert_eq!(encode_char(' '), Some(BLANK));
        assert_eq!(encode_char('x'), None);
    }
}

//! Guardian phone formatting.
//!
//! The form shows phone numbers as `(DD) DDDDD-DDDD` while the user types and
//! sends them to the backend as bare digits.

/// Maximum number of digits kept: 2 area-code + 5 prefix + 4 suffix.
pub const MAX_PHONE_DIGITS: usize = 11;

const AREA_DIGITS: usize = 2;
const PREFIX_END: usize = 7;

/// Reformat raw keystroke input for display.
///
/// Non-digits are dropped and at most [`MAX_PHONE_DIGITS`] digits are kept.
/// Up to two digits pass through unchanged; longer input renders as
/// `(DD) DDDDD-DDDD`, filling groups left to right.
///
/// ```
/// use turmas_core::phone::format_phone;
///
/// assert_eq!(format_phone("34987654321"), "(34) 98765-4321");
/// assert_eq!(format_phone("349"), "(34) 9");
/// assert_eq!(format_phone("3"), "3");
/// ```
pub fn format_phone(raw: &str) -> String {
    let digits: Vec<char> = raw
        .chars()
        .filter(char::is_ascii_digit)
        .take(MAX_PHONE_DIGITS)
        .collect();

    if digits.len() <= AREA_DIGITS {
        return digits.into_iter().collect();
    }

    let mut out = String::with_capacity(15);
    out.push('(');
    out.extend(&digits[..AREA_DIGITS]);
    out.push_str(") ");
    out.extend(&digits[AREA_DIGITS..digits.len().min(PREFIX_END)]);
    if digits.len() > PREFIX_END {
        out.push('-');
        out.extend(&digits[PREFIX_END..]);
    }
    out
}

/// Strip a display-formatted phone down to the digits sent on the wire.
pub fn to_wire_phone(display: &str) -> String {
    display.chars().filter(char::is_ascii_digit).collect()
}

//! UK postcode grammar.
//!
//! A postcode is an outward code and an inward code separated by a single
//! space:
//!
//! ```text
//! outward: 1-2 letters, 1 digit, optional letter or digit   (SW1A, EH1, M60)
//! inward:  1 digit, 2 letters excluding C I K M O V          (1AA, 1YZ)
//! ```
//!
//! Matching is case-insensitive; input is upper-cased before it is checked.

/// Letters that never appear in the two trailing positions of the inward code.
const EXCLUDED_INWARD_LETTERS: &[u8] = b"CIKMOV";

/// Returns true when `code` is a well-formed UK postcode.
///
/// Empty input is rejected. The check never panics.
pub fn is_valid_postcode(code: &str) -> bool {
    let upper = code.to_ascii_uppercase();
    let Some((outward, inward)) = upper.split_once(' ') else {
        return false;
    };
    is_valid_outward(outward.as_bytes()) && is_valid_inward(inward.as_bytes())
}

fn is_valid_outward(bytes: &[u8]) -> bool {
    let letters = bytes.iter().take_while(|b| b.is_ascii_uppercase()).count();
    if !(1..=2).contains(&letters) {
        return false;
    }

    match &bytes[letters..] {
        [digit] => digit.is_ascii_digit(),
        [digit, extra] => {
            digit.is_ascii_digit() && (extra.is_ascii_uppercase() || extra.is_ascii_digit())
        }
        _ => false,
    }
}

fn is_valid_inward(bytes: &[u8]) -> bool {
    match bytes {
        [digit, first, second] => {
            digit.is_ascii_digit() && is_inward_letter(*first) && is_inward_letter(*second)
        }
        _ => false,
    }
}

fn is_inward_letter(b: u8) -> bool {
    b.is_ascii_uppercase() && !EXCLUDED_INWARD_LETTERS.contains(&b)
}

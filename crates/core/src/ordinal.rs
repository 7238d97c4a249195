//! English ordinal words for parameter positions in diagnostics.

const IRREGULAR: [&str; 20] = [
    "zeroth",
    "first",
    "second",
    "third",
    "fourth",
    "fifth",
    "sixth",
    "seventh",
    "eighth",
    "ninth",
    "tenth",
    "eleventh",
    "twelfth",
    "thirteenth",
    "fourteenth",
    "fifteenth",
    "sixteenth",
    "seventeenth",
    "eighteenth",
    "nineteenth",
];

/// Tens stems from twenty to ninety, completed by `ieth` or `y-`.
const TENS_STEMS: [&str; 8] = [
    "twent", "thirt", "fort", "fift", "sixt", "sevent", "eight", "ninet",
];

/// Largest number [`ordinal_word`] can spell.
pub const MAX_ORDINAL: i64 = 99;

/// The number is outside the range [`ordinal_word`] can spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Ordinal must be a number from 0 to {MAX_ORDINAL}, got {0}")]
pub struct DomainError(pub i64);

/// Spell `n` as an English ordinal word.
///
/// # Examples
///
/// ```
/// use ducttape_core::ordinal::ordinal_word;
///
/// assert_eq!(ordinal_word(1).unwrap(), "first");
/// assert_eq!(ordinal_word(40).unwrap(), "fortieth");
/// assert_eq!(ordinal_word(99).unwrap(), "ninety-ninth");
/// assert!(ordinal_word(100).is_err());
/// ```
pub fn ordinal_word(n: i64) -> Result<String, DomainError> {
    if !(0..=MAX_ORDINAL).contains(&n) {
        return Err(DomainError(n));
    }
    let n = n as usize;

    if n < IRREGULAR.len() {
        return Ok(IRREGULAR[n].to_string());
    }

    let stem = TENS_STEMS[n / 10 - 2];
    if n % 10 == 0 {
        Ok(format!("{stem}ieth"))
    } else {
        Ok(format!("{stem}y-{}", IRREGULAR[n % 10]))
    }
}

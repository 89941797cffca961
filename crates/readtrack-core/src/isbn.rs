use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

const ISBN13_LEN: usize = 13;

/// Weighted ISBN-13 / EAN-13 sum: digits at even positions count once, odd
/// positions three times. `None` unless the input is exactly 13 ASCII digits.
pub fn weighted_sum(input: &str) -> Option<u32> {
    let bytes = input.as_bytes();
    if bytes.len() != ISBN13_LEN || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let sum = bytes
        .iter()
        .map(|b| u32::from(b - b'0'))
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d } else { d * 3 })
        .sum();
    Some(sum)
}

/// Checksum test over all 13 digits, check digit included.
/// Wrong length or any non-digit character yields `false`.
pub fn is_valid_isbn13(input: &str) -> bool {
    weighted_sum(input).is_some_and(|sum| sum % 10 == 0)
}

/// A checksum-valid ISBN-13. Books are deduplicated on this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isbn13(String);

impl Isbn13 {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if is_valid_isbn13(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(TrackerError::InvalidIsbn(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isbn13 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Isbn13 {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Isbn13 {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Isbn13> for String {
    fn from(isbn: Isbn13) -> Self {
        isbn.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_isbn13() {
        assert!(is_valid_isbn13("9780306406157"));
        assert!(is_valid_isbn13("9791032305690"));
        assert!(is_valid_isbn13("9780141036144"));
    }

    #[test]
    fn test_wrong_check_digit() {
        assert!(!is_valid_isbn13("9780306406158"));
    }

    #[test]
    fn test_wrong_length_is_false() {
        assert!(!is_valid_isbn13("12345"));
        assert!(!is_valid_isbn13(""));
        assert!(!is_valid_isbn13("97803064061570"));
        // ISBN-10 is not accepted
        assert!(!is_valid_isbn13("0306406152"));
    }

    #[test]
    fn test_non_digit_is_false() {
        assert!(!is_valid_isbn13("97804306226X9"));
        assert!(!is_valid_isbn13("978-0306406157"));
        assert!(!is_valid_isbn13("９７８０３０６４０６１５７"));
        assert!(!is_valid_isbn13(" 978030640615"));
    }

    #[test]
    fn test_validity_matches_weighted_sum() {
        let base = "978030640615";
        for check in 0..10u32 {
            let candidate = format!("{base}{check}");
            let sum = weighted_sum(&candidate).unwrap();
            assert_eq!(is_valid_isbn13(&candidate), sum % 10 == 0);
        }
        // exactly one check digit completes a given prefix
        let valid = (0..10)
            .filter(|c| is_valid_isbn13(&format!("{base}{c}")))
            .count();
        assert_eq!(valid, 1);
    }

    #[test]
    fn test_parse_trims_and_rejects() {
        let isbn = Isbn13::parse("  9780306406157\n").unwrap();
        assert_eq!(isbn.as_str(), "9780306406157");
        assert_eq!(isbn.to_string(), "9780306406157");
        assert!(matches!(Isbn13::parse("9780306406158"), Err(TrackerError::InvalidIsbn(_))));
    }
}

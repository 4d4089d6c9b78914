//! EAN-13 identifiers
//!
//! Identifiers are `prefix (6) + random body (6) + check digit (1)`.
//! Uniqueness holds within one generator; nothing is remembered across runs.

use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LabelError, LabelResult};

pub const PREFIX_LEN: usize = 6;
pub const BODY_LEN: usize = 6;
pub const BASE_LEN: usize = PREFIX_LEN + BODY_LEN;
pub const EAN13_LEN: usize = BASE_LEN + 1;

/// Number of distinct bodies available under one prefix
pub const BODY_SPACE: usize = 1_000_000;

pub const DEFAULT_PREFIX: &str = "703018";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

/// A syntactically valid 13-digit EAN with a correct check digit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ean13(String);

impl Ean13 {
    pub fn parse(digits: &str) -> LabelResult<Self> {
        if digits.len() != EAN13_LEN || !all_digits(digits) {
            return Err(LabelError::InvalidIdentifier(format!(
                "expected {} digits, got {:?}",
                EAN13_LEN, digits
            )));
        }
        let expected = check_digit(&digits[..BASE_LEN])?;
        let actual = digits.as_bytes()[BASE_LEN] - b'0';
        if expected != actual {
            return Err(LabelError::InvalidIdentifier(format!(
                "{}: check digit is {}, expected {}",
                digits, actual, expected
            )));
        }
        Ok(Self(digits.to_string()))
    }

    /// Complete a 12-digit base with its check digit
    pub fn from_base(base: &str) -> LabelResult<Self> {
        let digit = check_digit(base)?;
        Ok(Self(format!("{}{}", base, digit)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn prefix(&self) -> &str {
        &self.0[..PREFIX_LEN]
    }

    pub fn base(&self) -> &str {
        &self.0[..BASE_LEN]
    }

    /// Digits as numeric values, leftmost first
    pub fn digits(&self) -> [u8; EAN13_LEN] {
        let mut out = [0u8; EAN13_LEN];
        for (slot, b) in out.iter_mut().zip(self.0.bytes()) {
            *slot = b - b'0';
        }
        out
    }
}

impl fmt::Display for Ean13 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Ean13 {
    type Error = LabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ean13> for String {
    fn from(value: Ean13) -> Self {
        value.0
    }
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// EAN-13 check digit over a 12-digit base.
///
/// Weights alternate 1,3,1,3... starting at the leftmost digit.
pub fn check_digit(base: &str) -> LabelResult<u8> {
    if base.len() != BASE_LEN || !all_digits(base) {
        return Err(LabelError::InvalidIdentifier(format!(
            "expected {} digit base, got {:?}",
            BASE_LEN, base
        )));
    }
    let sum: u32 = base
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            let d = (b - b'0') as u32;
            if i % 2 == 0 { d } else { d * 3 }
        })
        .sum();
    Ok(((10 - sum % 10) % 10) as u8)
}

pub fn validate_prefix(prefix: &str) -> LabelResult<()> {
    if prefix.len() != PREFIX_LEN || !all_digits(prefix) {
        return Err(LabelError::InvalidInput(format!(
            "prefix must be {} digits, got {:?}",
            PREFIX_LEN, prefix
        )));
    }
    Ok(())
}

/// Draws random bodies under a fixed prefix, rejecting bases already issued.
pub struct IdentifierGenerator<R: Rng> {
    prefix: String,
    max_attempts: u32,
    used: HashSet<String>,
    rng: R,
}

impl<R: Rng> IdentifierGenerator<R> {
    pub fn new(prefix: &str, max_attempts: u32, rng: R) -> LabelResult<Self> {
        validate_prefix(prefix)?;
        if max_attempts == 0 {
            return Err(LabelError::InvalidConfig("max_attempts must be > 0".into()));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            max_attempts,
            used: HashSet::new(),
            rng,
        })
    }

    pub fn issued(&self) -> usize {
        self.used.len()
    }

    /// Produce one fresh identifier.
    ///
    /// Fails once `max_attempts` consecutive draws all hit bases already issued.
    pub fn next_identifier(&mut self) -> LabelResult<Ean13> {
        if self.used.len() >= BODY_SPACE {
            return Err(LabelError::Capacity {
                requested: self.used.len() + 1,
                generated: self.used.len(),
                attempts: 0,
            });
        }
        for _ in 0..self.max_attempts {
            let body: u32 = self.rng.gen_range(0..BODY_SPACE as u32);
            let base = format!("{}{:06}", self.prefix, body);
            if self.used.contains(&base) {
                continue;
            }
            let ean = Ean13::from_base(&base)?;
            self.used.insert(base);
            return Ok(ean);
        }
        Err(LabelError::Capacity {
            requested: self.used.len() + 1,
            generated: self.used.len(),
            attempts: self.max_attempts,
        })
    }

    /// Produce `count` mutually distinct identifiers, in draw order.
    pub fn generate(&mut self, count: usize) -> LabelResult<Vec<Ean13>> {
        let available = BODY_SPACE - self.used.len();
        if count > available {
            return Err(LabelError::Capacity {
                requested: count,
                generated: 0,
                attempts: 0,
            });
        }
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            match self.next_identifier() {
                Ok(ean) => out.push(ean),
                Err(LabelError::Capacity { attempts, .. }) => {
                    return Err(LabelError::Capacity {
                        requested: count,
                        generated: out.len(),
                        attempts,
                    });
                }
                Err(e) => return Err(e),
            }
        }
        debug!(prefix = %self.prefix, count, "identifiers generated");
        Ok(out)
    }
}

/// Generate `count` unique identifiers with the thread-local RNG.
pub fn generate_identifiers(prefix: &str, count: usize) -> LabelResult<Vec<Ean13>> {
    IdentifierGenerator::new(prefix, DEFAULT_MAX_ATTEMPTS, rand::thread_rng())?.generate(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_check_digit_known_codes() {
        assert_eq!(check_digit("400638133393").unwrap(), 1);
        assert_eq!(check_digit("590123412345").unwrap(), 7);
        assert_eq!(check_digit("703018000000").unwrap(), 5);
    }

    #[test]
    fn test_parse_rejects_bad_check_digit() {
        assert!(Ean13::parse("4006381333931").is_ok());
        let err = Ean13::parse("4006381333932").unwrap_err();
        assert!(err.to_string().contains("check digit"));
    }

    #[test]
    fn test_parse_rejects_wrong_length_and_non_digits() {
        assert!(Ean13::parse("400638133393").is_err());
        assert!(Ean13::parse("40063813339311").is_err());
        assert!(Ean13::parse("40063813339a1").is_err());
    }

    #[test]
    fn test_serde_as_plain_string() {
        let ean = Ean13::parse("5901234123457").unwrap();
        let json = serde_json::to_string(&ean).unwrap();
        assert_eq!(json, "\"5901234123457\"");
        let back: Ean13 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ean);
        assert!(serde_json::from_str::<Ean13>("\"5901234123450\"").is_err());
    }

    #[test]
    fn test_generated_codes_carry_prefix_and_are_unique() {
        let mut gen = IdentifierGenerator::new("703018", 100, StdRng::seed_from_u64(7)).unwrap();
        let codes = gen.generate(500).unwrap();
        let unique: HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), 500);
        for code in &codes {
            assert_eq!(code.prefix(), "703018");
            assert!(Ean13::parse(code.as_str()).is_ok());
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = IdentifierGenerator::new("703018", 100, StdRng::seed_from_u64(42))
            .unwrap()
            .generate(20)
            .unwrap();
        let b = IdentifierGenerator::new("703018", 100, StdRng::seed_from_u64(42))
            .unwrap()
            .generate(20)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stuck_rng_hits_capacity_error() {
        // Always draws body 000000, so the second identifier can never be found.
        let mut gen = IdentifierGenerator::new("703018", 25, StepRng::new(0, 0)).unwrap();
        let err = gen.generate(2).unwrap_err();
        match err {
            LabelError::Capacity { requested, generated, attempts } => {
                assert_eq!(requested, 2);
                assert_eq!(generated, 1);
                assert_eq!(attempts, 25);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_request_beyond_body_space_fails_fast() {
        let mut gen = IdentifierGenerator::new("703018", 10, StepRng::new(0, 1)).unwrap();
        assert!(matches!(
            gen.generate(BODY_SPACE + 1),
            Err(LabelError::Capacity { generated: 0, .. })
        ));
        assert_eq!(gen.issued(), 0);
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        assert!(IdentifierGenerator::new("70301", 10, StepRng::new(0, 1)).is_err());
        assert!(IdentifierGenerator::new("70301x", 10, StepRng::new(0, 1)).is_err());
        assert!(generate_identifiers("12345678", 1).is_err());
    }

    #[test]
    fn test_zero_count_is_empty() {
        assert!(generate_identifiers(DEFAULT_PREFIX, 0).unwrap().is_empty());
    }
}

//! Exact rational numbers for quota, remainder and average computations.
//!
//! A [`Fraction`] keeps the denominator it was produced with: the quota and the
//! remainders of an election share the number of seats as denominator, and the
//! average of a political group uses the number of seats it would have after
//! one more seat. Reducing them would make the published audit trail harder to
//! follow, so only comparisons normalise (by cross-multiplication).

use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// The non-negative rational number `numerator / denominator`.
///
/// ```
/// use apportionment::Fraction;
///
/// let quota = Fraction::new(1200, 23);
/// assert_eq!(quota.integer_part(), 52);
/// assert_eq!(quota.fractional_numerator(), 4);
/// assert_eq!(quota.to_string(), "52 4/23");
/// assert!(Fraction::new(101, 2) > Fraction::new(302, 6));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Fraction {
    numerator: u64,
    denominator: u64,
}

impl Fraction {
    pub const ZERO: Fraction = Fraction {
        numerator: 0,
        denominator: 1,
    };

    pub const THREE_QUARTERS: Fraction = Fraction {
        numerator: 3,
        denominator: 4,
    };

    /// Creates `numerator / denominator`. The denominator must not be zero.
    pub fn new(numerator: u64, denominator: u64) -> Fraction {
        assert!(denominator > 0, "fraction with a zero denominator");
        Fraction {
            numerator,
            denominator,
        }
    }

    /// Builds the fraction from its published form `integer + numerator/denominator`.
    pub fn from_parts(integer: u64, numerator: u64, denominator: u64) -> Option<Fraction> {
        if denominator == 0 || numerator >= denominator {
            return None;
        }
        let total = integer.checked_mul(denominator)?.checked_add(numerator)?;
        Some(Fraction::new(total, denominator))
    }

    /// The whole part, `floor(self)`.
    pub fn integer_part(&self) -> u64 {
        self.numerator / self.denominator
    }

    /// The numerator of the part below one, over [`Fraction::denominator`].
    pub fn fractional_numerator(&self) -> u64 {
        self.numerator % self.denominator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// The numerator of the un-reduced representation.
    pub fn raw_numerator(&self) -> u64 {
        self.numerator
    }

    pub fn is_whole(&self) -> bool {
        self.fractional_numerator() == 0
    }

    /// `floor(self / other)`, computed without rounding.
    pub fn floor_div(&self, other: &Fraction) -> Option<u64> {
        if other.numerator == 0 {
            return None;
        }
        let n = self.numerator as u128 * other.denominator as u128;
        let d = self.denominator as u128 * other.numerator as u128;
        u64::try_from(n / d).ok()
    }

    fn cross(&self, other: &Fraction) -> (u128, u128) {
        (
            self.numerator as u128 * other.denominator as u128,
            other.numerator as u128 * self.denominator as u128,
        )
    }
}

impl From<u64> for Fraction {
    fn from(value: u64) -> Self {
        Fraction::new(value, 1)
    }
}

impl From<u32> for Fraction {
    fn from(value: u32) -> Self {
        Fraction::new(value as u64, 1)
    }
}

impl PartialEq for Fraction {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = self.cross(other);
        a == b
    }
}

impl Eq for Fraction {}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = self.cross(other);
        a.cmp(&b)
    }
}

impl Display for Fraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let integer = self.integer_part();
        let rest = self.fractional_numerator();
        match (integer, rest) {
            (i, 0) => write!(f, "{}", i),
            (0, r) => write!(f, "{}/{}", r, self.denominator),
            (i, r) => write!(f, "{} {}/{}", i, r, self.denominator),
        }
    }
}

/// Error when reading a fraction from text.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParseFractionError {
    pub input: String,
}

impl std::error::Error for ParseFractionError {}

impl Display for ParseFractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot read a fraction from {:?}", self.input)
    }
}

/// Accepts `7`, `3/4`, `52 4/23` and improper forms such as `9/4`.
impl FromStr for Fraction {
    type Err = ParseFractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseFractionError {
            input: s.to_string(),
        };
        let parse = |x: &str| x.trim().parse::<u64>().map_err(|_| err());
        let (integer, rest) = match s.trim().split_once(' ') {
            Some((i, r)) => (parse(i)?, r),
            None => (0, s.trim()),
        };
        match rest.split_once('/') {
            Some((n, d)) => {
                let (n, d) = (parse(n)?, parse(d)?);
                if d == 0 {
                    return Err(err());
                }
                let whole = integer.checked_mul(d).ok_or_else(err)?;
                Ok(Fraction::new(whole.checked_add(n).ok_or_else(err)?, d))
            }
            None if integer == 0 => Ok(Fraction::from(parse(rest)?)),
            None => Err(err()),
        }
    }
}

impl Serialize for Fraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("Fraction", 3)?;
        st.serialize_field("integer", &self.integer_part())?;
        st.serialize_field("numerator", &self.fractional_numerator())?;
        st.serialize_field("denominator", &self.denominator)?;
        st.end()
    }
}

impl<'de> Deserialize<'de> for Fraction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FractionVisitor)
    }
}

struct FractionVisitor;

impl<'de> Visitor<'de> for FractionVisitor {
    type Value = Fraction;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("an object {integer, numerator, denominator} or a string such as \"3/4\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Fraction, E> {
        v.parse::<Fraction>().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Fraction, E> {
        Ok(Fraction::from(v))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Fraction, A::Error> {
        let mut integer: Option<u64> = None;
        let mut numerator: Option<u64> = None;
        let mut denominator: Option<u64> = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "integer" => integer = Some(map.next_value()?),
                "numerator" => numerator = Some(map.next_value()?),
                "denominator" => denominator = Some(map.next_value()?),
                other => {
                    return Err(de::Error::unknown_field(
                        other,
                        &["integer", "numerator", "denominator"],
                    ))
                }
            }
        }
        let integer = integer.ok_or_else(|| de::Error::missing_field("integer"))?;
        let numerator = numerator.ok_or_else(|| de::Error::missing_field("numerator"))?;
        let denominator = denominator.ok_or_else(|| de::Error::missing_field("denominator"))?;
        Fraction::from_parts(integer, numerator, denominator).ok_or_else(|| {
            de::Error::custom(format!(
                "invalid fraction {} {}/{}",
                integer, numerator, denominator
            ))
        })
    }
}

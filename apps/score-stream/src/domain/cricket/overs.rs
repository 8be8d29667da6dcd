//! Overs Notation
//!
//! Cricket writes overs as `overs.balls`, where the digit after the point is
//! the number of legal deliveries bowled in the current over (0-5), not a
//! decimal fraction. `18.3` is eighteen overs and three balls, i.e. 111 balls.
//!
//! [`Overs`] stores the pair of integers and only converts to and from the
//! decimal form at the edges, so arithmetic never goes through a float.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Legal deliveries in one over.
pub const BALLS_PER_OVER: u32 = 6;

/// Errors from parsing overs notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OversError {
    /// Negative overs value.
    #[error("overs cannot be negative: {0}")]
    Negative(Decimal),

    /// Balls component outside 0-5.
    #[error("balls within an over must be 0-5, got {0}")]
    InvalidBalls(u32),

    /// More than one digit after the point, or otherwise unparsable.
    #[error("invalid overs notation: {0}")]
    InvalidNotation(String),
}

/// A count of overs in `(completed overs, balls into the current over)` form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Overs {
    completed: u32,
    balls: u8,
}

impl Overs {
    /// Zero overs.
    pub const ZERO: Self = Self {
        completed: 0,
        balls: 0,
    };

    /// Build from a completed-overs count and the balls bowled in the current over.
    ///
    /// # Errors
    ///
    /// Returns [`OversError::InvalidBalls`] if `balls` is 6 or more.
    pub fn new(completed: u32, balls: u32) -> Result<Self, OversError> {
        if balls >= BALLS_PER_OVER {
            return Err(OversError::InvalidBalls(balls));
        }
        Ok(Self {
            completed,
            balls: u8::try_from(balls).map_err(|_| OversError::InvalidBalls(balls))?,
        })
    }

    /// A whole number of overs.
    #[must_use]
    pub const fn whole(completed: u32) -> Self {
        Self {
            completed,
            balls: 0,
        }
    }

    /// Build from a total count of legal deliveries.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_balls(balls: u32) -> Self {
        Self {
            completed: balls / BALLS_PER_OVER,
            balls: (balls % BALLS_PER_OVER) as u8,
        }
    }

    /// Parse the decimal `overs.balls` notation.
    ///
    /// # Errors
    ///
    /// Fails on negative values, more than one fractional digit, or a balls
    /// digit above 5.
    pub fn from_decimal(value: Decimal) -> Result<Self, OversError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(OversError::Negative(value));
        }

        let whole = value.trunc();
        let tenths = (value - whole) * Decimal::TEN;
        if !tenths.fract().is_zero() {
            return Err(OversError::InvalidNotation(value.to_string()));
        }

        let completed = whole
            .to_u32()
            .ok_or_else(|| OversError::InvalidNotation(value.to_string()))?;
        let balls = tenths
            .to_u32()
            .ok_or_else(|| OversError::InvalidNotation(value.to_string()))?;

        Self::new(completed, balls)
    }

    /// Total legal deliveries, saturating at `u32::MAX`.
    #[must_use]
    pub const fn to_balls(self) -> u32 {
        self.completed
            .saturating_mul(BALLS_PER_OVER)
            .saturating_add(self.balls as u32)
    }

    /// Decimal `overs.balls` notation.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.completed) + Decimal::new(i64::from(self.balls), 1)
    }

    /// True overs as a fraction (`18.3` -> `18.5`), for rate calculations.
    #[must_use]
    pub fn as_true_overs(self) -> Decimal {
        Decimal::from(self.to_balls()) / Decimal::from(BALLS_PER_OVER)
    }

    /// Completed overs.
    #[must_use]
    pub const fn completed(self) -> u32 {
        self.completed
    }

    /// Balls bowled in the current over.
    #[must_use]
    pub const fn balls(self) -> u32 {
        self.balls as u32
    }

    /// Whether no ball has been bowled.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.completed == 0 && self.balls == 0
    }
}

/// Convert overs notation to legal deliveries.
#[must_use]
pub const fn overs_to_balls(overs: Overs) -> u32 {
    overs.to_balls()
}

/// Convert legal deliveries to overs notation: `floor(b/6) + (b%6)/10`.
#[must_use]
pub const fn balls_to_overs(balls: u32) -> Overs {
    Overs::from_balls(balls)
}

impl fmt::Display for Overs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.completed, self.balls)
    }
}

impl FromStr for Overs {
    type Err = OversError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value =
            Decimal::from_str(s.trim()).map_err(|_| OversError::InvalidNotation(s.to_string()))?;
        Self::from_decimal(value)
    }
}

impl TryFrom<Decimal> for Overs {
    type Error = OversError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

// Overs travel as a JSON number (`18.3`) or a string (`"18.3"`).
impl Serialize for Overs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self
            .to_decimal()
            .to_f64()
            .ok_or_else(|| serde::ser::Error::custom("overs out of range"))?;
        serializer.serialize_f64(value)
    }
}

impl<'de> Deserialize<'de> for Overs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n.to_string(),
            Raw::Text(s) => s,
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn parses_notation() {
        let overs: Overs = "18.3".parse().unwrap();
        assert_eq!(overs.completed(), 18);
        assert_eq!(overs.balls(), 3);
        assert_eq!(overs.to_balls(), 111);
    }

    #[test]
    fn ball_count_saturates_for_huge_overs() {
        let overs = Overs::from_decimal(Decimal::from(u32::MAX)).unwrap();
        assert_eq!(overs.to_balls(), u32::MAX);
        assert_eq!(Overs::new(u32::MAX, 5).unwrap().to_balls(), u32::MAX);
    }

    #[test]
    fn whole_overs_have_no_balls() {
        let overs: Overs = "20".parse().unwrap();
        assert_eq!(overs, Overs::whole(20));
        assert_eq!(overs.to_balls(), 120);
    }

    #[test]
    fn rejects_six_balls() {
        assert_eq!(
            "4.6".parse::<Overs>().unwrap_err(),
            OversError::InvalidBalls(6)
        );
        assert!(Overs::new(4, 6).is_err());
    }

    #[test]
    fn rejects_two_fractional_digits() {
        assert!(matches!(
            "4.25".parse::<Overs>(),
            Err(OversError::InvalidNotation(_))
        ));
    }

    #[test]
    fn trailing_zero_is_accepted() {
        assert_eq!("4.30".parse::<Overs>().unwrap(), Overs::new(4, 3).unwrap());
    }

    #[test]
    fn rejects_negative() {
        assert!(matches!(
            "-1.2".parse::<Overs>(),
            Err(OversError::Negative(_))
        ));
    }

    #[test]
    fn balls_to_overs_formula() {
        assert_eq!(balls_to_overs(0), Overs::ZERO);
        assert_eq!(balls_to_overs(5).to_decimal(), Decimal::new(5, 1));
        assert_eq!(balls_to_overs(6).to_decimal(), Decimal::ONE);
        assert_eq!(balls_to_overs(111).to_decimal(), Decimal::new(183, 1));
    }

    #[test]
    fn true_overs_are_fractional() {
        let overs = Overs::new(18, 3).unwrap();
        assert_eq!(overs.as_true_overs(), Decimal::new(185, 1));
    }

    #[test]
    fn ordering_follows_deliveries() {
        assert!(Overs::new(19, 5).unwrap() < Overs::whole(20));
        assert!(Overs::new(3, 1).unwrap() > Overs::whole(3));
    }

    #[test]
    fn display_uses_notation() {
        assert_eq!(Overs::new(7, 4).unwrap().to_string(), "7.4");
        assert_eq!(Overs::whole(20).to_string(), "20.0");
    }

    #[test]
    fn json_accepts_number_and_string() {
        let from_num: Overs = serde_json::from_str("18.3").unwrap();
        let from_str: Overs = serde_json::from_str("\"18.3\"").unwrap();
        assert_eq!(from_num, from_str);
        assert_eq!(serde_json::to_string(&from_num).unwrap(), "18.3");
    }

    proptest! {
        #[test]
        fn balls_round_trip(completed in 0u32..500, balls in 0u32..6) {
            let overs = Overs::new(completed, balls).unwrap();
            prop_assert_eq!(balls_to_overs(overs_to_balls(overs)), overs);

            let reparsed = Overs::from_decimal(overs.to_decimal()).unwrap();
            prop_assert_eq!(reparsed, overs);
        }
    }
}

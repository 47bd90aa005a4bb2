//! Rational optimum values, with infinities and NaN as ordinary outcomes.

use std::fmt;

use rug::{Integer, Rational};

/// The externally visible value of an optimization.
///
/// `Rat` carries a normalized rational (positive denominator, reduced).
/// Unbounded objectives yield `Infinity`/`NegInfinity` depending on the
/// sense; an empty region yields `NaN`. These are first-class results and
/// compare by structure, so `NaN == NaN` holds, unlike for floats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RatValue {
    Rat(Rational),
    Infinity,
    NegInfinity,
    NaN,
}

impl RatValue {
    /// A normalized rational from a numerator/denominator pair.
    ///
    /// The denominator must be positive; this is the form the tableau
    /// engine hands back.
    pub fn from_frac(num: Integer, den: Integer) -> Self {
        debug_assert!(den > 0, "optimum denominators are positive");
        RatValue::Rat(Rational::from((num, den)))
    }

    pub fn from_integer(value: Integer) -> Self {
        RatValue::Rat(Rational::from(value))
    }

    pub fn is_rational(&self) -> bool {
        matches!(self, RatValue::Rat(_))
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, RatValue::Infinity | RatValue::NegInfinity)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, RatValue::NaN)
    }

    pub fn as_rational(&self) -> Option<&Rational> {
        match self {
            RatValue::Rat(q) => Some(q),
            _ => None,
        }
    }

    /// Numerator and denominator of a rational value.
    pub fn into_frac(self) -> Option<(Integer, Integer)> {
        match self {
            RatValue::Rat(q) => Some(q.into_numer_denom()),
            _ => None,
        }
    }
}

impl From<Rational> for RatValue {
    fn from(q: Rational) -> Self {
        RatValue::Rat(q)
    }
}

impl fmt::Display for RatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatValue::Rat(q) => write!(f, "{q}"),
            RatValue::Infinity => write!(f, "infty"),
            RatValue::NegInfinity => write!(f, "-infty"),
            RatValue::NaN => write!(f, "NaN"),
        }
    }
}

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::DispatchError;
use crate::Error;

/// Default number of models drained per tick.
pub const RATE_DEFAULT: usize = 100;

/// Maximum number of models drained per drain tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RateRepr", into = "RateRepr")]
pub enum Rate {
    Limited(NonZeroUsize),
    Unbounded,
}

impl Default for Rate {
    fn default() -> Self {
        match NonZeroUsize::new(RATE_DEFAULT) {
            Some(n) => Rate::Limited(n),
            None => Rate::Unbounded,
        }
    }
}

impl Rate {
    /// Number of models to drain this tick given how many are pending.
    pub fn batch_size(
        &self,
        pending: usize,
    ) -> usize {
        match self {
            Rate::Limited(n) => pending.min(n.get()),
            Rate::Unbounded => pending,
        }
    }
}

impl fmt::Display for Rate {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Rate::Limited(n) => write!(f, "{n}"),
            Rate::Unbounded => f.write_str("unbounded"),
        }
    }
}

fn invalid(value: impl fmt::Display) -> Error {
    DispatchError::InvalidRate(value.to_string()).into()
}

impl TryFrom<usize> for Rate {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self, Error> {
        NonZeroUsize::new(value).map(Rate::Limited).ok_or_else(|| invalid(value))
    }
}

impl TryFrom<u64> for Rate {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self, Error> {
        usize::try_from(value)
            .map_err(|_| invalid(value))
            .and_then(Rate::try_from)
    }
}

impl TryFrom<u32> for Rate {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Error> {
        Rate::try_from(u64::from(value))
    }
}

impl TryFrom<i64> for Rate {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Error> {
        u64::try_from(value)
            .map_err(|_| invalid(value))
            .and_then(Rate::try_from)
    }
}

impl TryFrom<i32> for Rate {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Error> {
        Rate::try_from(i64::from(value))
    }
}

/// Positive infinity means unbounded; any other value must be a positive
/// whole number.
impl TryFrom<f64> for Rate {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self, Error> {
        if value == f64::INFINITY {
            return Ok(Rate::Unbounded);
        }
        if !value.is_finite() || value.fract() != 0.0 || value < 1.0 || value > usize::MAX as f64 {
            return Err(invalid(value));
        }
        Rate::try_from(value as usize)
    }
}

impl FromStr for Rate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let trimmed = s.trim();
        if ["unbounded", "infinity", "inf"]
            .iter()
            .any(|word| trimmed.eq_ignore_ascii_case(word))
        {
            return Ok(Rate::Unbounded);
        }
        trimmed
            .parse::<usize>()
            .map_err(|_| invalid(s))
            .and_then(Rate::try_from)
    }
}

impl TryFrom<&str> for Rate {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Error> {
        value.parse()
    }
}

/// Wire form used by settings: a number or the word "unbounded".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RateRepr {
    Count(i64),
    Named(String),
}

impl TryFrom<RateRepr> for Rate {
    type Error = Error;

    fn try_from(repr: RateRepr) -> Result<Self, Error> {
        match repr {
            RateRepr::Count(n) => Rate::try_from(n),
            RateRepr::Named(name) => name.parse(),
        }
    }
}

impl From<Rate> for RateRepr {
    fn from(rate: Rate) -> Self {
        match rate {
            Rate::Limited(n) => RateRepr::Count(i64::try_from(n.get()).unwrap_or(i64::MAX)),
            Rate::Unbounded => RateRepr::Named("unbounded".to_string()),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A CSS-style percentage such as `15%`.
///
/// Decodes from either a number (`15`, `15.5`) or a string (`"15%"`, `"15"`)
/// and always serialises as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "RawPercentage", into = "f32")]
pub struct Percentage(f32);

impl Percentage {
    /// Build a percentage, rejecting NaN and infinities.
    pub fn new(value: f32) -> Result<Self, PercentageError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(PercentageError::NotFinite)
        }
    }

    /// Const constructor for values known to be finite.
    pub const fn from_const(value: f32) -> Self {
        Self(value)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Clamp into `[min, max]`.
    pub fn clamp(self, min: f32, max: f32) -> Self {
        Self(self.0.clamp(min, max))
    }

    /// Zero counts as "unset" during preference resolution.
    pub fn is_unset(self) -> bool {
        self.0 == 0.0
    }

    /// CSS rendering, e.g. `15%`.
    pub fn css(self) -> String {
        format!("{self}%")
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<Percentage> for f32 {
    fn from(value: Percentage) -> Self {
        value.0
    }
}

impl FromStr for Percentage {
    type Err = PercentageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        let value = number
            .parse::<f32>()
            .map_err(|_| PercentageError::Invalid(s.to_string()))?;
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PercentageError {
    #[error("invalid percentage: {0:?}")]
    Invalid(String),
    #[error("percentage must be a finite number")]
    NotFinite,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPercentage {
    Number(f64),
    Text(String),
}

impl TryFrom<RawPercentage> for Percentage {
    type Error = PercentageError;

    fn try_from(raw: RawPercentage) -> Result<Self, Self::Error> {
        match raw {
            RawPercentage::Number(n) => Percentage::new(n as f32),
            RawPercentage::Text(s) => s.parse(),
        }
    }
}

// Metric values: a finite number, or an explicit marker when the denominator
// rules out a meaningful result.

use serde::{Serialize, Serializer};
use std::fmt;

/// A single derived statistic.
///
/// Division by a zero or negative denominator never produces a number; it
/// produces `Undefined`. `Unbounded` is reserved for ratios whose numerator is
/// positive over a zero denominator (K/BB with no walks) and is reported as
/// infinite, but it carries no comparable value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    Unbounded,
    Undefined,
}

impl Metric {
    /// `numerator / denominator`, undefined unless the denominator is positive.
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator > 0.0 {
            Metric::Value(numerator / denominator)
        } else {
            Metric::Undefined
        }
    }

    /// Like [`Metric::ratio`], but a positive numerator over zero is reported
    /// as `Unbounded` instead of undefined.
    pub fn ratio_or_unbounded(numerator: f64, denominator: f64) -> Self {
        if denominator > 0.0 {
            Metric::Value(numerator / denominator)
        } else if denominator == 0.0 && numerator > 0.0 {
            Metric::Unbounded
        } else {
            Metric::Undefined
        }
    }

    /// The numeric value, if there is one. `Unbounded` has none.
    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(v),
            Metric::Unbounded | Metric::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        self.value().is_some()
    }

    /// Apply `f` to a defined value; anything else passes through unchanged.
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Metric::Value(v) => Metric::Value(f(v)),
            other => other,
        }
    }

    /// Combine two metrics; the result is undefined unless both are defined.
    pub fn zip_with(self, other: Metric, f: impl FnOnce(f64, f64) -> f64) -> Self {
        match (self.value(), other.value()) {
            (Some(a), Some(b)) => Metric::Value(f(a, b)),
            _ => Metric::Undefined,
        }
    }

    /// Format with a fixed number of decimals. Rate stats conventionally drop
    /// the leading zero (".390"), so `strip_leading_zero` does that for values
    /// in (-1, 1).
    pub fn format(self, decimals: usize, strip_leading_zero: bool) -> String {
        match self {
            Metric::Value(v) => {
                let s = format!("{v:.decimals$}");
                if strip_leading_zero && v.abs() < 1.0 {
                    s.replacen("0.", ".", 1)
                } else {
                    s
                }
            }
            Metric::Unbounded => "inf".to_string(),
            Metric::Undefined => "-".to_string(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => match f.precision() {
                Some(p) => write!(f, "{v:.p$}"),
                None => write!(f, "{v}"),
            },
            Metric::Unbounded => f.write_str("inf"),
            Metric::Undefined => f.write_str("undefined"),
        }
    }
}

/// Serialized as a JSON number, `null` when undefined, or `"inf"`.
impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Value(v) => serializer.serialize_f64(*v),
            Metric::Unbounded => serializer.serialize_str("inf"),
            Metric::Undefined => serializer.serialize_none(),
        }
    }
}

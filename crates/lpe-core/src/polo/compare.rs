use super::PoloError;
use super::measurement::Measurement;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Match,
    ToleranceExceeded,
    NameMismatch,
}

impl Verdict {
    pub const fn code(self) -> u8 {
        match self {
            Self::Match => 0,
            Self::ToleranceExceeded => 1,
            Self::NameMismatch => 2,
        }
    }

    pub const fn is_match(self) -> bool {
        matches!(self, Self::Match)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueComparison {
    pub verdict: Verdict,
    /// Signed percent difference relative to the old value.
    pub diff: f64,
}

impl ValueComparison {
    const fn name_mismatch() -> Self {
        Self {
            verdict: Verdict::NameMismatch,
            diff: 0.0,
        }
    }
}

/// Compares a new result against an old one.
///
/// `old_name` is a regex anchored at the start of `new_name`, so `freq`
/// accepts `freq_hz` but not `f`. The percent difference divides by the old
/// value; a zero old value matches only a zero new value.
pub fn compare_name_and_value(
    pct_error: f64,
    new_name: &str,
    new_value: f64,
    old_name: &str,
    old_value: f64,
) -> Result<ValueComparison, PoloError> {
    if !pct_error.is_finite() || pct_error < 0.0 {
        return Err(PoloError::InvalidTolerance(pct_error));
    }

    let pattern = format!("^(?:{})", old_name);
    let name_pattern = Regex::new(&pattern).map_err(|source| PoloError::InvalidNamePattern {
        pattern: old_name.to_string(),
        source,
    })?;
    if !name_pattern.is_match(new_name) {
        return Ok(ValueComparison::name_mismatch());
    }

    let diff = if old_value == 0.0 {
        if new_value == 0.0 { 0.0 } else { f64::INFINITY }
    } else {
        100.0 * (old_value - new_value) / old_value
    };

    let verdict = if (-pct_error..=pct_error).contains(&diff) {
        Verdict::Match
    } else {
        Verdict::ToleranceExceeded
    };
    Ok(ValueComparison { verdict, diff })
}

/// Like [`compare_name_and_value`], but an unset side is a name mismatch.
pub fn compare_measurements(
    pct_error: f64,
    new: Option<&Measurement>,
    old: Option<&Measurement>,
) -> Result<ValueComparison, PoloError> {
    let (Some(new), Some(old)) = (new, old) else {
        return Ok(ValueComparison::name_mismatch());
    };
    compare_name_and_value(
        pct_error,
        &new.name,
        new.numeric()?,
        &old.name,
        old.numeric()?,
    )
}

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Urgency of the next dose relative to now.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    /// Next dose time has passed
    Late,
    /// Due within the next hour
    Soon,
    /// Due an hour or more from now
    Future,
}

impl DoseStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Late => "late",
            Self::Soon => "soon",
            Self::Future => "on time",
        }
    }

    pub fn is_due(&self) -> bool {
        matches!(self, Self::Late | Self::Soon)
    }
}

impl fmt::Display for DoseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Converts a (possibly fractional) number of hours to a millisecond-precise
/// duration, or `None` when it does not fit in a `Duration`.
pub fn frequency_duration(frequency_hours: f64) -> Option<Duration> {
    let millis = (frequency_hours * 3_600_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64)
}

/// Next dose time, or `None` when it falls outside the representable range.
pub fn checked_next_dose_time(
    last_taken_at: DateTime<Utc>,
    frequency_hours: f64,
) -> Option<DateTime<Utc>> {
    frequency_duration(frequency_hours).and_then(|every| last_taken_at.checked_add_signed(every))
}

/// Saturates at the latest representable instant.
pub fn next_dose_time(last_taken_at: DateTime<Utc>, frequency_hours: f64) -> DateTime<Utc> {
    checked_next_dose_time(last_taken_at, frequency_hours).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub fn status(next_dose: DateTime<Utc>, now: DateTime<Utc>) -> DoseStatus {
    let remaining = next_dose - now;
    if remaining < Duration::zero() {
        DoseStatus::Late
    } else if remaining < Duration::hours(1) {
        DoseStatus::Soon
    } else {
        DoseStatus::Future
    }
}

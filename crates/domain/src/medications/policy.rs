use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Error;

use super::aggregate::Medication;

/// How a treatment course ends.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DurationPolicy {
    /// No end; taken until deleted
    #[default]
    Indefinite,
    /// Ends once `total` doses have been taken
    ByDoseCount { total: u32 },
    /// Ends after `total` days counted from the start date
    ByDays { total: u32 },
}

/// Duration kind as chosen on the input form, before a total is attached.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DurationKind {
    #[default]
    Indefinite,
    Doses,
    Days,
}

impl DurationPolicy {
    /// Build a policy from the loose form input. Bounded kinds need a positive total.
    pub fn from_parts(kind: DurationKind, total: Option<i64>) -> Result<Self, Error> {
        let bounded_total = || -> Result<u32, Error> {
            match total {
                None => Err(Error::validation("duration total is required")),
                Some(t) if t <= 0 => Err(Error::validation("duration total must be positive")),
                Some(t) => u32::try_from(t)
                    .map_err(|_| Error::validation("duration total is too large")),
            }
        };

        match kind {
            DurationKind::Indefinite => Ok(Self::Indefinite),
            DurationKind::Doses => Ok(Self::ByDoseCount {
                total: bounded_total()?,
            }),
            DurationKind::Days => Ok(Self::ByDays {
                total: bounded_total()?,
            }),
        }
    }

    /// Like [`validate`](Self::validate), and also rejects courses whose end,
    /// counted from `start`, cannot be represented.
    pub fn validate_from(&self, start: DateTime<Utc>) -> Result<(), Error> {
        self.validate()?;
        if let Self::ByDays { total } = *self {
            if course_end(start, total).is_none() {
                return Err(Error::validation("duration total is too large"));
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Self::Indefinite => Ok(()),
            Self::ByDoseCount { total: 0 } | Self::ByDays { total: 0 } => {
                Err(Error::validation("duration total must be positive"))
            }
            Self::ByDoseCount { .. } | Self::ByDays { .. } => Ok(()),
        }
    }

    pub fn is_finished(&self, medication: &Medication, now: DateTime<Utc>) -> bool {
        match *self {
            Self::Indefinite => false,
            Self::ByDoseCount { total } => medication.doses_taken >= total,
            // Still active through the whole of day `total`.
            Self::ByDays { total } => match course_end(medication.start_date, total) {
                Some(end) => now > end,
                None => false,
            },
        }
    }

    /// Completion in `[0, 100]`. Indefinite courses report 100.
    pub fn progress_percent(&self, medication: &Medication, now: DateTime<Utc>) -> f64 {
        match *self {
            Self::Indefinite => 100.0,
            Self::ByDoseCount { total } => {
                if total == 0 {
                    return 100.0;
                }
                (f64::from(medication.doses_taken) / f64::from(total) * 100.0).min(100.0)
            }
            Self::ByDays { total } => {
                let course = Duration::days(total.into()).num_milliseconds();
                if course <= 0 {
                    return 100.0;
                }
                let elapsed = elapsed_since(medication.start_date, now).num_milliseconds();
                (elapsed as f64 / course as f64 * 100.0).min(100.0)
            }
        }
    }

    pub fn progress_label(&self, medication: &Medication, now: DateTime<Utc>) -> String {
        match *self {
            Self::Indefinite => "continuous".to_string(),
            Self::ByDoseCount { total } => {
                format!("{} of {} doses", medication.doses_taken, total)
            }
            Self::ByDays { total } => {
                let days_passed = elapsed_since(medication.start_date, now).num_days() + 1;
                if days_passed > i64::from(total) {
                    "Finished".to_string()
                } else {
                    format!("Day {} of {}", days_passed, total)
                }
            }
        }
    }
}

fn course_end(start: DateTime<Utc>, total_days: u32) -> Option<DateTime<Utc>> {
    start.checked_add_signed(Duration::days(total_days.into()))
}

fn elapsed_since(start: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - start).max(Duration::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn medication(duration: DurationPolicy, doses_taken: u32) -> Medication {
        Medication {
            id: "01HTEST".to_string(),
            name: "Amoxicillin".to_string(),
            dosage: "500mg".to_string(),
            frequency_hours: 8.0,
            last_taken_at: start(),
            start_date: start(),
            duration,
            doses_taken,
            ..Default::default()
        }
    }

    #[test]
    fn indefinite_never_finishes() {
        let med = medication(DurationPolicy::Indefinite, 500);
        let far = start() + Duration::days(3650);

        assert!(!med.duration.is_finished(&med, far));
        assert_eq!(med.duration.progress_percent(&med, far), 100.0);
        assert_eq!(med.duration.progress_label(&med, far), "continuous");
    }

    #[test]
    fn dose_count_finishes_at_total() {
        let policy = DurationPolicy::ByDoseCount { total: 10 };

        let done = medication(policy, 10);
        assert!(policy.is_finished(&done, start()));
        assert_eq!(policy.progress_percent(&done, start()), 100.0);

        let half = medication(policy, 5);
        assert!(!policy.is_finished(&half, start()));
        assert_eq!(policy.progress_percent(&half, start()), 50.0);
        assert_eq!(policy.progress_label(&half, start()), "5 of 10 doses");
    }

    #[test]
    fn dose_count_percent_is_capped() {
        let policy = DurationPolicy::ByDoseCount { total: 4 };
        let over = medication(policy, 9);
        assert_eq!(policy.progress_percent(&over, start()), 100.0);
    }

    #[test]
    fn days_finish_strictly_after_last_day() {
        let policy = DurationPolicy::ByDays { total: 7 };
        let med = medication(policy, 0);

        let last_hour = start() + Duration::days(6) + Duration::hours(23);
        assert!(!policy.is_finished(&med, last_hour));
        assert_eq!(policy.progress_label(&med, last_hour), "Day 7 of 7");

        assert!(!policy.is_finished(&med, start() + Duration::days(7)));
        assert!(policy.is_finished(&med, start() + Duration::days(8)));
        assert_eq!(
            policy.progress_label(&med, start() + Duration::days(8)),
            "Finished"
        );
    }

    #[test]
    fn days_progress_clamps_before_start() {
        let policy = DurationPolicy::ByDays { total: 2 };
        let med = medication(policy, 0);
        let before = start() - Duration::hours(30);

        assert!(!policy.is_finished(&med, before));
        assert_eq!(policy.progress_percent(&med, before), 0.0);
        assert_eq!(policy.progress_label(&med, before), "Day 1 of 2");
        assert_eq!(policy.progress_percent(&med, start() + Duration::days(1)), 50.0);
        assert_eq!(policy.progress_percent(&med, start() + Duration::days(30)), 100.0);
    }

    #[test]
    fn from_parts_rejects_missing_or_non_positive_totals() {
        assert_eq!(
            DurationPolicy::from_parts(DurationKind::Indefinite, None),
            Ok(DurationPolicy::Indefinite)
        );
        assert_eq!(
            DurationPolicy::from_parts(DurationKind::Days, Some(7)),
            Ok(DurationPolicy::ByDays { total: 7 })
        );
        assert!(DurationPolicy::from_parts(DurationKind::Doses, None).is_err());
        assert!(DurationPolicy::from_parts(DurationKind::Doses, Some(0)).is_err());
        assert!(DurationPolicy::from_parts(DurationKind::Days, Some(-3)).is_err());
    }

    #[test]
    fn huge_day_total_does_not_overflow() {
        let policy = DurationPolicy::ByDays { total: u32::MAX };
        let med = medication(policy, 0);
        let later = start() + Duration::days(400);

        assert!(!policy.is_finished(&med, later));
        assert!(policy.progress_percent(&med, later) < 1.0);
        assert_eq!(policy.progress_label(&med, later), format!("Day 401 of {}", u32::MAX));
        assert!(policy.validate_from(start()).is_err());
        assert!(DurationPolicy::ByDays { total: 7 }.validate_from(start()).is_ok());
    }

    #[test]
    fn validate_rejects_zero_totals() {
        assert!(DurationPolicy::ByDays { total: 0 }.validate().is_err());
        assert!(DurationPolicy::ByDoseCount { total: 0 }.validate().is_err());
        assert!(DurationPolicy::ByDoseCount { total: 1 }.validate().is_ok());
    }
}

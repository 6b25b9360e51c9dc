use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cqrs_es::Aggregate;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::errors::Error;

use super::policy::DurationPolicy;
use super::schedule::{self, DoseStatus};
use super::{Command, Event};

/// Opaque image payload supplied by the capture collaborator, kept verbatim.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct MedicationImage(String);

impl MedicationImage {
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Medication aggregate
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency_hours: f64,
    pub last_taken_at: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub duration: DurationPolicy,
    pub doses_taken: u32,
    pub image: Option<MedicationImage>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
}

pub const AGGREGATE_TYPE: &str = "Medication";

#[derive(Clone, new)]
pub struct Services {
    clock: Arc<dyn Clock>,
}

impl Services {
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[async_trait]
impl Aggregate for Medication {
    type Command = Command;
    type Event = Event;
    type Error = Error;
    type Services = Services;

    fn aggregate_type() -> String {
        AGGREGATE_TYPE.to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            Command::CreateMedication {
                id,
                name,
                dosage,
                frequency_hours,
                duration,
                image,
            } => {
                self.validate_new()?;
                let created_at = services.now();
                validate_regimen(&name, &dosage, frequency_hours, &duration, created_at)?;

                Ok(vec![Event::MedicationCreated {
                    id,
                    name,
                    dosage,
                    frequency_hours,
                    duration,
                    image,
                    created_at,
                }])
            }

            Command::TakeDose { id, taken_at } => {
                self.validate_existing(&id)?;

                Ok(vec![Event::DoseTaken {
                    id,
                    medication_name: self.name.clone(),
                    dosage: self.dosage.clone(),
                    taken_at,
                }])
            }

            Command::DeleteMedication { id } => {
                self.validate_existing(&id)?;

                Ok(vec![Event::MedicationDeleted {
                    id,
                    deleted_at: services.now(),
                }])
            }
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            Event::MedicationCreated {
                id,
                name,
                dosage,
                frequency_hours,
                duration,
                image,
                created_at,
            } => {
                self.id = id;
                self.name = name;
                self.dosage = dosage;
                self.frequency_hours = frequency_hours;
                self.duration = duration;
                self.image = image;
                self.start_date = created_at;
                self.last_taken_at = created_at;
                self.doses_taken = 0;
            }

            Event::DoseTaken { taken_at, .. } => {
                self.doses_taken = self.doses_taken.saturating_add(1);
                self.last_taken_at = self.last_taken_at.max(taken_at);
            }

            Event::MedicationDeleted { .. } => {
                self.deleted = true;
            }
        }
    }
}

impl Medication {
    pub fn next_dose_time(&self) -> DateTime<Utc> {
        schedule::next_dose_time(self.last_taken_at, self.frequency_hours)
    }

    pub fn status(&self, now: DateTime<Utc>) -> DoseStatus {
        schedule::status(self.next_dose_time(), now)
    }

    pub fn is_finished(&self, now: DateTime<Utc>) -> bool {
        self.duration.is_finished(self, now)
    }

    pub fn progress_percent(&self, now: DateTime<Utc>) -> f64 {
        self.duration.progress_percent(self, now)
    }

    pub fn progress_label(&self, now: DateTime<Utc>) -> String {
        self.duration.progress_label(self, now)
    }

    fn validate_new(&self) -> Result<(), Error> {
        if !self.id.is_empty() {
            return Err(Error::validation("medication id already in use"));
        }
        Ok(())
    }

    fn validate_existing(&self, id: &str) -> Result<(), Error> {
        if self.id.is_empty() || self.deleted {
            return Err(Error::NotFound {
                entity: AGGREGATE_TYPE.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

fn validate_regimen(
    name: &str,
    dosage: &str,
    frequency_hours: f64,
    duration: &DurationPolicy,
    start: DateTime<Utc>,
) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::validation("name is required"));
    }
    if dosage.trim().is_empty() {
        return Err(Error::validation("dosage is required"));
    }
    if !frequency_hours.is_finite() || frequency_hours <= 0.0 {
        return Err(Error::validation("frequency must be a positive number of hours"));
    }
    if schedule::checked_next_dose_time(start, frequency_hours).is_none() {
        return Err(Error::validation("frequency is too large"));
    }
    duration.validate_from(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{Duration, TimeZone};
    use cqrs_es::test::TestFramework;

    type MedicationTester = TestFramework<Medication>;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn services() -> Services {
        Services::new(Arc::new(FixedClock::new(now())))
    }

    fn create(name: &str, dosage: &str, frequency_hours: f64, duration: DurationPolicy) -> Command {
        Command::CreateMedication {
            id: "med-1".to_string(),
            name: name.to_string(),
            dosage: dosage.to_string(),
            frequency_hours,
            duration,
            image: None,
        }
    }

    fn created() -> Event {
        Event::MedicationCreated {
            id: "med-1".to_string(),
            name: "Ibuprofen".to_string(),
            dosage: "400mg".to_string(),
            frequency_hours: 12.0,
            duration: DurationPolicy::ByDoseCount { total: 10 },
            image: None,
            created_at: now(),
        }
    }

    #[test]
    fn create_stamps_start_from_clock() {
        MedicationTester::with(services())
            .given_no_previous_events()
            .when(create("Ibuprofen", "400mg", 12.0, DurationPolicy::ByDoseCount { total: 10 }))
            .then_expect_events(vec![created()]);
    }

    #[test]
    fn create_rejects_blank_text_and_bad_frequency() {
        MedicationTester::with(services())
            .given_no_previous_events()
            .when(create("", "500mg", 8.0, DurationPolicy::Indefinite))
            .then_expect_error(Error::validation("name is required"));

        MedicationTester::with(services())
            .given_no_previous_events()
            .when(create("Ibuprofen", "  ", 8.0, DurationPolicy::Indefinite))
            .then_expect_error(Error::validation("dosage is required"));

        MedicationTester::with(services())
            .given_no_previous_events()
            .when(create("Ibuprofen", "400mg", 0.0, DurationPolicy::Indefinite))
            .then_expect_error(Error::validation(
                "frequency must be a positive number of hours",
            ));
    }

    #[test]
    fn create_rejects_zero_total() {
        MedicationTester::with(services())
            .given_no_previous_events()
            .when(create("Ibuprofen", "400mg", 8.0, DurationPolicy::ByDays { total: 0 }))
            .then_expect_error(Error::validation("duration total must be positive"));
    }

    #[test]
    fn create_rejects_unrepresentable_schedule() {
        MedicationTester::with(services())
            .given_no_previous_events()
            .when(create("Ibuprofen", "400mg", 1e12, DurationPolicy::Indefinite))
            .then_expect_error(Error::validation("frequency is too large"));

        MedicationTester::with(services())
            .given_no_previous_events()
            .when(create("Ibuprofen", "400mg", f64::MAX, DurationPolicy::Indefinite))
            .then_expect_error(Error::validation("frequency is too large"));

        MedicationTester::with(services())
            .given_no_previous_events()
            .when(create(
                "Ibuprofen",
                "400mg",
                8.0,
                DurationPolicy::ByDays { total: u32::MAX },
            ))
            .then_expect_error(Error::validation("duration total is too large"));
    }

    #[test]
    fn create_twice_is_rejected() {
        MedicationTester::with(services())
            .given(vec![created()])
            .when(create("Ibuprofen", "400mg", 12.0, DurationPolicy::Indefinite))
            .then_expect_error(Error::validation("medication id already in use"));
    }

    #[test]
    fn take_dose_captures_current_name_and_dosage() {
        let taken_at = now() + Duration::hours(3);

        MedicationTester::with(services())
            .given(vec![created()])
            .when(Command::TakeDose {
                id: "med-1".to_string(),
                taken_at,
            })
            .then_expect_events(vec![Event::DoseTaken {
                id: "med-1".to_string(),
                medication_name: "Ibuprofen".to_string(),
                dosage: "400mg".to_string(),
                taken_at,
            }]);
    }

    #[test]
    fn take_dose_on_unknown_or_deleted_is_not_found() {
        let missing = Error::NotFound {
            entity: AGGREGATE_TYPE.to_string(),
            id: "missing-id".to_string(),
        };

        MedicationTester::with(services())
            .given_no_previous_events()
            .when(Command::TakeDose {
                id: "missing-id".to_string(),
                taken_at: now(),
            })
            .then_expect_error(missing);

        MedicationTester::with(services())
            .given(vec![
                created(),
                Event::MedicationDeleted {
                    id: "med-1".to_string(),
                    deleted_at: now(),
                },
            ])
            .when(Command::TakeDose {
                id: "med-1".to_string(),
                taken_at: now(),
            })
            .then_expect_error(Error::NotFound {
                entity: AGGREGATE_TYPE.to_string(),
                id: "med-1".to_string(),
            });
    }

    #[test]
    fn delete_twice_is_not_found() {
        MedicationTester::with(services())
            .given(vec![
                created(),
                Event::MedicationDeleted {
                    id: "med-1".to_string(),
                    deleted_at: now(),
                },
            ])
            .when(Command::DeleteMedication {
                id: "med-1".to_string(),
            })
            .then_expect_error(Error::NotFound {
                entity: AGGREGATE_TYPE.to_string(),
                id: "med-1".to_string(),
            });
    }

    #[test]
    fn apply_never_moves_last_taken_backward() {
        let mut med = Medication::default();
        med.apply(created());
        med.apply(Event::DoseTaken {
            id: "med-1".to_string(),
            medication_name: "Ibuprofen".to_string(),
            dosage: "400mg".to_string(),
            taken_at: now() + Duration::hours(5),
        });
        med.apply(Event::DoseTaken {
            id: "med-1".to_string(),
            medication_name: "Ibuprofen".to_string(),
            dosage: "400mg".to_string(),
            taken_at: now() + Duration::hours(1),
        });

        assert_eq!(med.doses_taken, 2);
        assert_eq!(med.last_taken_at, now() + Duration::hours(5));
        assert_eq!(med.start_date, now());
    }

    #[test]
    fn medication_round_trips_through_json() {
        let mut med = Medication::default();
        med.apply(Event::MedicationCreated {
            id: "med-2".to_string(),
            name: "Amoxicillin".to_string(),
            dosage: "500mg".to_string(),
            frequency_hours: 8.0,
            duration: DurationPolicy::ByDays { total: 7 },
            image: Some(MedicationImage::new("data:image/png;base64,iVBORw0KGgo=")),
            created_at: now(),
        });

        let json = serde_json::to_string(&med).unwrap();
        let back: Medication = serde_json::from_str(&json).unwrap();
        assert_eq!(back, med);
    }
}

use chrono::{DateTime, Utc};
use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

use super::aggregate::MedicationImage;
use super::policy::DurationPolicy;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    MedicationCreated {
        id: String,
        name: String,
        dosage: String,
        frequency_hours: f64,
        duration: DurationPolicy,
        image: Option<MedicationImage>,
        created_at: DateTime<Utc>,
    },

    /// Carries the name and dosage as they were when the dose was taken, so
    /// the ledger entry and the counter come from one committed fact.
    DoseTaken {
        id: String,
        medication_name: String,
        dosage: String,
        taken_at: DateTime<Utc>,
    },

    MedicationDeleted {
        id: String,
        deleted_at: DateTime<Utc>,
    },
}

impl DomainEvent for Event {
    fn event_type(&self) -> String {
        match self {
            Event::MedicationCreated { .. } => "Medication:Created".to_string(),
            Event::DoseTaken { .. } => "Medication:DoseTaken".to_string(),
            Event::MedicationDeleted { .. } => "Medication:Deleted".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}

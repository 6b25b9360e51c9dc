use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::aggregate::MedicationImage;
use super::policy::DurationPolicy;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Command {
    /// Register a new medication regimen
    CreateMedication {
        id: String,
        name: String,
        dosage: String,
        frequency_hours: f64,
        duration: DurationPolicy,
        image: Option<MedicationImage>,
    },

    /// Record one dose taken at `taken_at`
    TakeDose {
        id: String,
        taken_at: DateTime<Utc>,
    },

    /// Stop tracking the medication; its history is kept
    DeleteMedication {
        id: String,
    },
}

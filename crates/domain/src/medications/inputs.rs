use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

use super::aggregate::MedicationImage;
use super::policy::{DurationKind, DurationPolicy};

/// Typed request to register a medication.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, new)]
pub struct NewMedication {
    pub name: String,
    pub dosage: String,
    pub frequency_hours: f64,
    pub duration: DurationPolicy,
    #[new(default)]
    pub image: Option<MedicationImage>,
}

impl NewMedication {
    pub fn with_image(mut self, image: MedicationImage) -> Self {
        self.image = Some(image);
        self
    }
}

/// Add-medication form as submitted by a client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateMedicationInput {
    pub name: String,
    pub dosage: String,
    pub frequency_hours: f64,
    #[serde(default)]
    pub duration_type: DurationKind,
    #[serde(default)]
    pub duration_total: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
}

impl TryFrom<CreateMedicationInput> for NewMedication {
    type Error = Error;

    fn try_from(input: CreateMedicationInput) -> Result<Self, Self::Error> {
        let duration = DurationPolicy::from_parts(input.duration_type, input.duration_total)?;

        Ok(NewMedication {
            name: input.name,
            dosage: input.dosage,
            frequency_hours: input.frequency_hours,
            duration,
            image: input.image.map(MedicationImage::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_defaults_to_indefinite() {
        let input: CreateMedicationInput = serde_json::from_str(
            r#"{"name":"Ibuprofen","dosage":"400mg","frequency_hours":12}"#,
        )
        .unwrap();

        let new = NewMedication::try_from(input).unwrap();
        assert_eq!(new.duration, DurationPolicy::Indefinite);
        assert_eq!(new.image, None);
    }

    #[test]
    fn bounded_form_without_total_is_rejected() {
        let input: CreateMedicationInput = serde_json::from_str(
            r#"{"name":"Ibuprofen","dosage":"400mg","frequency_hours":12,"duration_type":"doses"}"#,
        )
        .unwrap();

        assert!(matches!(
            NewMedication::try_from(input),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn image_is_kept_verbatim() {
        let input = CreateMedicationInput {
            name: "Amoxicillin".to_string(),
            dosage: "500mg".to_string(),
            frequency_hours: 8.0,
            duration_type: DurationKind::Days,
            duration_total: Some(7),
            image: Some("data:image/jpeg;base64,/9j/4AAQ".to_string()),
        };

        let new = NewMedication::try_from(input).unwrap();
        assert_eq!(new.duration, DurationPolicy::ByDays { total: 7 });
        assert_eq!(
            new.image.as_ref().map(MedicationImage::as_str),
            Some("data:image/jpeg;base64,/9j/4AAQ")
        );
    }
}

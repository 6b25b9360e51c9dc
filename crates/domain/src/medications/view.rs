use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use cqrs_es::{Aggregate, EventEnvelope};
use serde::{Deserialize, Serialize};

use super::history::{HistoryRecord, Ledger};
use super::{Event, Medication};

/// Read model: live medications and the dose ledger, always updated together.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RegistryState {
    pub medications: Vec<Medication>,
    pub ledger: Ledger,
}

impl RegistryState {
    pub fn medication(&self, id: &str) -> Option<&Medication> {
        self.medications.iter().find(|m| m.id == id)
    }

    fn apply(&mut self, aggregate_id: &str, event: &Event) {
        match event {
            Event::MedicationCreated { .. } => {
                let mut medication = Medication::default();
                medication.apply(event.clone());
                self.medications.push(medication);
            }

            Event::DoseTaken {
                id,
                medication_name,
                dosage,
                taken_at,
            } => {
                match self.medications.iter_mut().find(|m| m.id == aggregate_id) {
                    Some(medication) => medication.apply(event.clone()),
                    None => tracing::error!(
                        medication_id = %aggregate_id,
                        "dose recorded for a medication missing from the view"
                    ),
                }
                self.ledger.append(HistoryRecord::new(
                    id.clone(),
                    medication_name.clone(),
                    dosage.clone(),
                    *taken_at,
                ));
            }

            Event::MedicationDeleted { .. } => {
                self.medications.retain(|m| m.id != aggregate_id);
            }
        }
    }
}

/// Projects committed medication events into the shared [`RegistryState`].
#[derive(Clone, Default)]
pub struct Query {
    state: Arc<RwLock<RegistryState>>,
}

impl Query {
    pub fn new(state: Arc<RwLock<RegistryState>>) -> Self {
        Self { state }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|poisoned| {
            tracing::error!("registry view lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(|poisoned| {
            tracing::error!("registry view lock poisoned; recovering");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl cqrs_es::Query<Medication> for Query {
    async fn dispatch(&self, medication_id: &str, events: &[EventEnvelope<Medication>]) {
        // One guard for the whole batch keeps counter and ledger in step.
        let mut state = self.write();
        for event in events {
            state.apply(medication_id, &event.payload);
        }
    }
}

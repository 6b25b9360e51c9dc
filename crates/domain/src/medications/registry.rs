use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::clock::Clock;
use crate::errors::Error;

use super::cqrs::{self, MedicationCqrs};
use super::history::HistoryRecord;
use super::inputs::NewMedication;
use super::ordering::{ordered_view, OrderedView};
use super::view::{Query, RegistryState};
use super::{Command, Medication, Services, AGGREGATE_TYPE};

/// Owner of the medication set and the dose ledger.
///
/// Commands go through the event-sourced aggregate one at a time; reads are
/// served from the projected [`RegistryState`].
pub struct Registry {
    cqrs: Arc<MedicationCqrs>,
    view: Query,
    clock: Arc<dyn Clock>,
    commands: Mutex<()>,
}

impl Registry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let view = Query::default();
        let cqrs = cqrs::init(Services::new(clock.clone()), view.clone());

        Self {
            cqrs,
            view,
            clock,
            commands: Mutex::new(()),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn create(&self, new: NewMedication) -> Result<Medication, Error> {
        let id = Ulid::new().to_string();
        let command = Command::CreateMedication {
            id: id.clone(),
            name: new.name,
            dosage: new.dosage,
            frequency_hours: new.frequency_hours,
            duration: new.duration,
            image: new.image,
        };

        self.execute(&id, command).await?.ok_or_else(|| missing_from_view(&id))
    }

    /// Counts one dose and appends its ledger record as a single committed event.
    pub async fn take_dose(&self, id: &str, now: DateTime<Utc>) -> Result<Medication, Error> {
        let command = Command::TakeDose {
            id: id.to_string(),
            taken_at: now,
        };

        self.execute(id, command).await?.ok_or_else(|| missing_from_view(id))
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let command = Command::DeleteMedication { id: id.to_string() };
        self.execute(id, command).await.map(|_| ())
    }

    pub fn get(&self, id: &str) -> Result<Medication, Error> {
        self.view
            .read()
            .medication(id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                entity: AGGREGATE_TYPE.to_string(),
                id: id.to_string(),
            })
    }

    pub fn list(&self) -> Vec<Medication> {
        self.view.read().medications.clone()
    }

    /// Ledger records, newest first.
    pub fn history(&self) -> Vec<HistoryRecord> {
        self.view.read().ledger.to_vec()
    }

    /// Medications and ledger as read under one lock.
    pub fn snapshot(&self) -> RegistryState {
        self.view.read().clone()
    }

    pub fn ordered_view(&self, now: DateTime<Utc>) -> OrderedView {
        ordered_view(&self.list(), now)
    }

    /// Runs one command and returns the projected medication as it stood right
    /// after that command, before any other command can run.
    async fn execute(&self, id: &str, command: Command) -> Result<Option<Medication>, Error> {
        let _guard = self.commands.lock().await;
        self.cqrs.execute(id, command).await?;
        Ok(self.view.read().medication(id).cloned())
    }
}

fn missing_from_view(id: &str) -> Error {
    Error::Unexpected {
        message: format!("medication {id} was committed but is missing from the view"),
    }
}

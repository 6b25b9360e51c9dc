use std::sync::Arc;

use cqrs_es::CqrsFramework;

use crate::store::EventLog;

use super::{Medication, Query, Services};

pub type MedicationCqrs = CqrsFramework<Medication, EventLog<Medication>>;

pub fn init(services: Services, query: Query) -> Arc<MedicationCqrs> {
    let store = EventLog::<Medication>::default();

    Arc::new(CqrsFramework::new(store, vec![Box::new(query)], services))
}

/// Medication aggregate
pub mod aggregate;

/// Commands
pub mod commands;

/// Events
pub mod events;

/// Input DTOs
pub mod inputs;

/// Treatment duration rules
pub mod policy;

/// Next-dose and urgency derivation
pub mod schedule;

/// Dose ledger
pub mod history;

/// View (read model)
pub mod view;

/// CQRS setup
pub mod cqrs;

/// Registry facade
pub mod registry;

/// Ordering, summary and reminders
pub mod ordering;

pub use aggregate::{Medication, MedicationImage, Services, AGGREGATE_TYPE};
pub use commands::Command;
pub use events::Event;
pub use history::{HistoryRecord, Ledger};
pub use inputs::{CreateMedicationInput, NewMedication};
pub use ordering::{
    due_reminders, history_text, next_dose_label, ordered_view, summary_text, OrderedView,
    Reminder, ScheduledMedication, SummaryOptions,
};
pub use policy::{DurationKind, DurationPolicy};
pub use registry::Registry;
pub use schedule::{next_dose_time, status, DoseStatus};
pub use view::{Query, RegistryState};

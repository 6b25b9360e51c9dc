//! Pillbox Domain Models

/// Injectable time source
pub mod clock;

/// Domain errors
pub mod errors;

/// Medication aggregate, scheduling and derived views
pub mod medications;

/// In-process event store
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::Error;

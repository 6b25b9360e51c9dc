//! HTTP host for the medication engine.

pub mod config;

mod routes;

use std::sync::Arc;

use pillbox_domain::medications::{Registry, SummaryOptions};

pub use routes::router;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub summary: SummaryOptions,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, summary: SummaryOptions) -> Self {
        Self { registry, summary }
    }
}

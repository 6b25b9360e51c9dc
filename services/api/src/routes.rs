use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use pillbox_domain::{
    medications::{
        due_reminders, next_dose_label, summary_text, CreateMedicationInput, NewMedication,
        ScheduledMedication,
    },
    Error,
};
use serde_json::{json, Value};

use crate::AppState;

type ApiError = (StatusCode, Json<Value>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/medications", post(create_medication).get(list_medications))
        .route(
            "/medications/:id",
            get(get_medication).delete(delete_medication),
        )
        .route("/medications/:id/doses", post(take_dose))
        .route("/history", get(history))
        .route("/summary", get(summary))
        .route("/reminders", get(reminders))
        .route("/next-dose", get(next_dose))
        .with_state(state)
}

fn reject(err: Error) -> ApiError {
    let status = match err {
        Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Command failed: {}", err);
    }
    (status, Json(json!({ "error": err.to_string() })))
}

// Create medication
async fn create_medication(
    State(state): State<AppState>,
    Json(input): Json<CreateMedicationInput>,
) -> Result<impl IntoResponse, ApiError> {
    let new = NewMedication::try_from(input).map_err(reject)?;
    let medication = state.registry.create(new).await.map_err(reject)?;

    tracing::info!(
        medication_id = %medication.id,
        "Medication {} created",
        medication.name
    );

    Ok((StatusCode::CREATED, Json(medication)))
}

// Ordered list with derived status
async fn list_medications(State(state): State<AppState>) -> impl IntoResponse {
    let now = state.registry.now();
    Json(state.registry.ordered_view(now))
}

// Get medication
async fn get_medication(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let medication = state.registry.get(&id).map_err(reject)?;
    let now = state.registry.now();

    Ok(Json(ScheduledMedication::derive(medication, now)))
}

// Delete medication; its history stays
async fn delete_medication(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    state.registry.delete(&id).await.map_err(reject)?;

    tracing::info!(medication_id = %id, "Medication deleted");

    Ok(StatusCode::NO_CONTENT)
}

// Take a dose now
async fn take_dose(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let now = state.registry.now();
    let medication = state.registry.take_dose(&id, now).await.map_err(reject)?;

    tracing::info!(
        medication_id = %id,
        doses_taken = medication.doses_taken,
        "Dose taken"
    );

    Ok(Json(medication))
}

async fn history(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.history())
}

async fn summary(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.registry.ordered_view(state.registry.now());
    let text = summary_text(&view, &state.summary);

    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text)
}

async fn reminders(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.registry.ordered_view(state.registry.now());
    Json(due_reminders(&view))
}

async fn next_dose(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.registry.ordered_view(state.registry.now());

    Json(json!({
        "next_dose": view.next_upcoming_dose(),
        "label": next_dose_label(&view, &state.summary.offset),
    }))
}

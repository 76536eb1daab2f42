// rest_api/src/prescriptions.rs

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use lib::payload::Payload;
use models::medical::{PopulatedPrescription, Prescription, PrescriptionDraft, PrescriptionUpdate};
use security::AuthenticatedActor;

use crate::{AppState, RestApiError};

const SERVER_ERROR: &str = "Server error";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/prescriptions",
            get(list_prescriptions_handler).post(create_prescription_handler),
        )
        .route(
            "/api/prescriptions/:id",
            get(get_prescription_handler)
                .put(update_prescription_handler)
                .patch(update_prescription_handler)
                .delete(delete_prescription_handler),
        )
}

// Handler for POST /api/prescriptions
// Bodies stay raw bytes here; the service decodes them after its access checks.
async fn create_prescription_handler(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    body: Bytes,
) -> Result<(StatusCode, Json<PopulatedPrescription>), RestApiError> {
    let draft = Payload::<PrescriptionDraft>::from_slice(&body);
    let prescription = state.service.create(&actor, draft).await.map_err(|e| {
        RestApiError::from_access(e, "creating prescription", "Server error while creating prescription")
    })?;
    Ok((StatusCode::CREATED, Json(prescription)))
}

// Handler for GET /api/prescriptions
async fn list_prescriptions_handler(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> Result<Json<Vec<PopulatedPrescription>>, RestApiError> {
    let prescriptions = state
        .service
        .list(&actor)
        .await
        .map_err(|e| RestApiError::from_access(e, "fetching prescriptions", SERVER_ERROR))?;
    Ok(Json(prescriptions))
}

// Handler for GET /api/prescriptions/:id
async fn get_prescription_handler(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
) -> Result<Json<PopulatedPrescription>, RestApiError> {
    let prescription = state
        .service
        .get_by_id(&actor, &id)
        .await
        .map_err(|e| RestApiError::from_access(e, "fetching prescription", SERVER_ERROR))?;
    Ok(Json(prescription))
}

// Handler for PUT and PATCH /api/prescriptions/:id
async fn update_prescription_handler(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Prescription>, RestApiError> {
    let update = Payload::<PrescriptionUpdate>::from_slice(&body);
    let prescription = state
        .service
        .update(&actor, &id, update)
        .await
        .map_err(|e| RestApiError::from_access(e, "updating prescription", SERVER_ERROR))?;
    Ok(Json(prescription))
}

// Handler for DELETE /api/prescriptions/:id
async fn delete_prescription_handler(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<String>,
) -> Result<Json<Value>, RestApiError> {
    state
        .service
        .delete(&actor, &id)
        .await
        .map_err(|e| RestApiError::from_access(e, "deleting prescription", SERVER_ERROR))?;
    Ok(Json(json!({ "message": "Prescription removed" })))
}

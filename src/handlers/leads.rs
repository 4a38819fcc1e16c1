// src/handlers/leads.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::lead::{LeadUpdate, ListLeadsQuery, NewLead, UpdateStatusPayload},
};

// POST /api/leads
pub async fn create_lead(
    State(app_state): State<AppState>,
    Json(payload): Json<NewLead>,
) -> Result<impl IntoResponse, AppError> {
    let lead = app_state
        .lead_service
        .create_lead(&app_state.db_pool, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// GET /api/leads?status=NEW&limit=20
pub async fn list_leads(
    State(app_state): State<AppState>,
    Query(query): Query<ListLeadsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let leads = app_state
        .lead_service
        .list_leads(&app_state.db_pool, query.status.as_deref(), query.effective_limit())
        .await?;

    Ok((StatusCode::OK, Json(leads)))
}

// GET /api/leads/{id}
pub async fn get_lead(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let lead = app_state.lead_service.get_lead(&app_state.db_pool, id).await?;

    Ok((StatusCode::OK, Json(lead)))
}

// PATCH /api/leads/{id}
pub async fn update_lead(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<LeadUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let lead = app_state
        .lead_service
        .update_lead(&app_state.db_pool, id, payload)
        .await?;

    Ok((StatusCode::OK, Json(lead)))
}

// PUT /api/leads/{id}/status
pub async fn change_status(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let lead = app_state
        .lead_service
        .change_status(&app_state.db_pool, id, &payload.status)
        .await?;

    Ok((StatusCode::OK, Json(lead)))
}

// GET /api/leads/by-telegram/{telegram_id}
pub async fn list_by_telegram_id(
    State(app_state): State<AppState>,
    Path(telegram_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let leads = app_state
        .lead_service
        .list_for_telegram_user(&app_state.db_pool, telegram_id)
        .await?;

    Ok((StatusCode::OK, Json(leads)))
}

// GET /api/leads/export
pub async fn export_leads(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let (count, bytes) = app_state.lead_service.export_csv().await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"leads.csv\"".to_string(),
            ),
            (
                header::HeaderName::from_static("x-lead-count"),
                count.to_string(),
            ),
        ],
        bytes,
    ))
}

pub async fn health() -> &'static str {
    "ok"
}

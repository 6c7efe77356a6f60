use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::session_dto::SaveAnswersRequest;
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::AppState;

#[axum::debug_handler]
pub async fn start_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(template_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let started = state
        .session_service
        .start_session(template_id, &claims.sub)
        .await?;
    Ok((StatusCode::CREATED, Json(started)))
}

#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let view = state
        .session_service
        .get_session(session_id, &claims.sub)
        .await?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn save_answers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SaveAnswersRequest>,
) -> Result<impl IntoResponse> {
    req.validate()?;
    let view = state
        .session_service
        .save_answers(session_id, req.answers, &claims.sub)
        .await?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn check_answers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let result = state
        .session_service
        .check_answers(session_id, &claims.sub)
        .await?;
    Ok(Json(result))
}

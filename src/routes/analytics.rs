use axum::{
    extract::{Extension, Path, Query, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::dto::analytics_dto::AnalyticsQuery;
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::AppState;

#[axum::debug_handler]
pub async fn get_template_analytics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(template_id): Path<Uuid>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse> {
    let analytics = state
        .analytics_service
        .summarize(
            template_id,
            query.history.unwrap_or(false),
            claims.is_admin(),
        )
        .await?;
    Ok(Json(analytics))
}

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::AppState;

/// Roles allowed to read template analytics.
pub const ANALYTICS_ROLES: &[&str] = &["admin", "teacher"];

/// Token claims. `sub` is the user id that owns sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    pub fn has_role(&self, allowed: &[&str]) -> bool {
        let role = self.role.as_deref().unwrap_or_default();
        allowed.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(&["admin"])
    }
}

pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return unauthorized("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized("unsupported_scheme");
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) if !data.claims.sub.trim().is_empty() => {
            req.extensions_mut().insert(data.claims);
            next.run(req).await
        }
        Ok(_) => unauthorized("missing_subject"),
        Err(_) => unauthorized("invalid_token"),
    }
}

/// Runs behind `require_bearer_auth`; rejects callers whose role is not in `allowed`.
pub async fn require_roles(req: Request, next: Next, allowed: &[&str]) -> Response {
    let Some(claims) = req.extensions().get::<Claims>() else {
        return unauthorized("missing_authorization");
    };
    if !claims.has_role(allowed) {
        return (StatusCode::FORBIDDEN, Json(json!({ "error": "forbidden" }))).into_response();
    }
    next.run(req).await
}

pub async fn require_analytics_access(req: Request, next: Next) -> Response {
    require_roles(req, next, ANALYTICS_ROLES).await
}

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

/// Signs an HS256 token for `user_id`, valid for `ttl`.
pub fn issue_token(
    secret: &str,
    user_id: &str,
    role: Option<&str>,
    ttl: Duration,
) -> Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + ttl).timestamp().max(0) as usize,
        role: role.map(str::to_string),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}

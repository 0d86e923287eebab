//! JWT Authentication Middleware
//!
//! Extracts the session JWT from an HTTP-only cookie or the Authorization
//! header, validates it, and makes the authenticated user available to
//! handlers via Axum's Extension. The role claim it carries is advisory;
//! privileged handlers re-read the role from the user row.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use carebridge_auth::{JwtValidator, Role};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::ErrorResponse;

/// Authenticated user context extracted from a session JWT
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User id from the `sub` claim
    pub user_id: Uuid,
    /// Email the session was issued for
    pub email: String,
    /// Role at session issue time
    pub role: Role,
}

/// JWT validation state shared across middleware instances
#[derive(Clone)]
pub struct JwtState {
    pub validator: Arc<JwtValidator>,
}

impl JwtState {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            validator: Arc::new(JwtValidator::new(secret)),
        }
    }
}

fn unauthorized(message: &str, code: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
            code: Some(code.to_string()),
        }),
    )
}

/// Authentication middleware that validates session tokens
///
/// Returns 401 Unauthorized if the token is missing, malformed, expired,
/// signed with the wrong secret, or not a session token.
pub async fn require_auth(
    state: axum::extract::State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    // Cookie first (web app), Authorization header as fallback (API clients)
    let cookie_token = request
        .headers()
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(|c| c.trim())
                .find_map(|c| c.strip_prefix("session_token="))
        })
        .map(|t| t.to_string());

    let token = match cookie_token {
        Some(t) => t,
        None => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| {
                    unauthorized(
                        "Missing authentication token (cookie or Authorization header)",
                        "MISSING_AUTH",
                    )
                })?;

            auth_header
                .strip_prefix("Bearer ")
                .ok_or_else(|| {
                    unauthorized(
                        "Invalid Authorization header format. Expected 'Bearer <token>'",
                        "INVALID_AUTH_FORMAT",
                    )
                })?
                .to_string()
        }
    };

    let claims = state
        .validator
        .validate(&token)
        .map_err(|e| unauthorized(&format!("Invalid or expired token: {}", e), "INVALID_TOKEN"))?;

    if claims.token_type != "session" {
        return Err(unauthorized(
            &format!(
                "Invalid token type '{}'. Expected 'session' token for API access",
                claims.token_type
            ),
            "INVALID_TOKEN_TYPE",
        ));
    }

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| unauthorized("Token 'sub' claim is not a valid user id", "INVALID_SUBJECT"))?;

    let auth_user = AuthUser {
        user_id,
        email: claims.email,
        role: claims.role,
    };

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

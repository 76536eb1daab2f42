// security/src/middleware.rs

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use models::medical::Actor;

use crate::{validate_jwt_token, AuthError, JwtSecret};

/// The actor resolved from the request's `Authorization: Bearer` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedActor(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedActor
where
    JwtSecret: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let secret = JwtSecret::from_ref(state);
        let jwt = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|hv| hv.to_str().ok())
            .and_then(|auth| auth.strip_prefix("Bearer "))
            .ok_or(AuthError::MissingToken)?;

        let claims = validate_jwt_token(jwt, &secret)?;
        let actor = claims.actor()?;
        Ok(AuthenticatedActor(actor))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Not authorized, no token"),
            AuthError::InvalidToken(reason) => {
                warn!("Rejected bearer token: {}", reason);
                (StatusCode::UNAUTHORIZED, "Not authorized, token failed")
            }
            AuthError::UnknownRole(reason) => {
                warn!("Rejected token role: {}", reason);
                (StatusCode::FORBIDDEN, "Unauthorized role")
            }
            AuthError::JwtError(reason) => {
                error!("Token processing failed: {}", reason);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        };

        let body = Json(json!({
            "status": "error",
            "message": message,
        }));

        (status, body).into_response()
    }
}

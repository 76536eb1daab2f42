// security/src/lib.rs

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use models::medical::{Actor, Role};

pub mod middleware;

pub use middleware::AuthenticatedActor;

/// Claims for JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user id)
    pub role: String,
    pub iat: u64, // Issued at
    pub exp: u64, // Expiration time
}

impl Claims {
    /// Resolves the acting user named by these claims.
    pub fn actor(&self) -> Result<Actor, AuthError> {
        let id = Uuid::parse_str(&self.sub)
            .map_err(|e| AuthError::InvalidToken(format!("Subject is not a user id: {}", e)))?;
        let role = self
            .role
            .parse::<Role>()
            .map_err(AuthError::UnknownRole)?;
        Ok(Actor::new(id, role))
    }
}

/// Shared HMAC secret used to sign and verify tokens.
#[derive(Clone)]
pub struct JwtSecret(Arc<Vec<u8>>);

impl JwtSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        JwtSecret(Arc::new(secret.into()))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("JwtSecret(..)")
    }
}

/// Custom authentication errors.
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken(String),
    UnknownRole(String),
    JwtError(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "No bearer token supplied"),
            AuthError::InvalidToken(msg) => write!(f, "Invalid token: {}", msg),
            AuthError::UnknownRole(msg) => write!(f, "{}", msg),
            AuthError::JwtError(msg) => write!(f, "JWT error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

fn now_secs() -> Result<u64, AuthError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AuthError::JwtError(format!("System time error: {}", e)))?
        .as_secs())
}

/// Generates a JWT token for `actor`, valid for `ttl_hours`.
pub fn issue_token(actor: &Actor, secret: &JwtSecret, ttl_hours: u64) -> Result<String, AuthError> {
    let now = now_secs()?;
    let exp = ttl_hours
        .checked_mul(60 * 60)
        .and_then(|ttl_secs| now.checked_add(ttl_secs))
        .ok_or_else(|| AuthError::JwtError(format!("Token lifetime of {} hours is out of range", ttl_hours)))?;
    let claims = Claims {
        sub: actor.id.to_string(),
        role: actor.role.to_string(),
        iat: now,
        exp,
    };
    encode_claims(&claims, secret)
}

/// Signs arbitrary claims.
pub fn encode_claims(claims: &Claims, secret: &JwtSecret) -> Result<String, AuthError> {
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::JwtError(format!("Failed to encode JWT: {}", e)))
}

/// Decodes and validates a JWT token.
pub fn validate_jwt_token(token: &str, secret: &JwtSecret) -> Result<Claims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidToken(format!("Failed to decode or validate JWT: {}", e)))
}

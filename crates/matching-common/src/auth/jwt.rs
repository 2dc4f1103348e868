//! Actor tokens
//!
//! Identity is owned by an external service; this engine only verifies the
//! HS256 Bearer tokens it issues and turns their claims into an [`Actor`].

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use matching_core::{Actor, ActorRole, Snowflake};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (member ID)
    pub sub: String,
    /// Role the member acts in
    pub role: ActorRole,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Convert to the actor presented to the core.
    ///
    /// # Errors
    /// Returns `InvalidToken` for a malformed subject or a `SYSTEM` role,
    /// which is reserved for internal callers.
    pub fn actor(&self) -> Result<Actor, AppError> {
        let id = Snowflake::parse(&self.sub).map_err(|_| AppError::InvalidToken)?;
        match self.role {
            ActorRole::System => Err(AppError::InvalidToken),
            role => Ok(Actor::new(id, role)),
        }
    }
}

/// Verifies (and, for tooling and tests, issues) actor tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for `actor` valid for `ttl_secs`
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue(&self, actor: Actor, ttl_secs: i64) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: actor.id.to_string(),
            role: actor.role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(anyhow::anyhow!("failed to encode token: {e}")))
    }

    /// Decode and validate a token
    ///
    /// # Errors
    /// Returns an error if the token is invalid or expired
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            })
    }

    /// Validate a token and return the actor it names
    ///
    /// # Errors
    /// Returns an error if the token is invalid, expired, or names no valid actor
    pub fn verify_actor(&self, token: &str) -> Result<Actor, AppError> {
        self.decode_token(token)?.actor()
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService").finish_non_exhaustive()
    }
}

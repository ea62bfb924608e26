//! Bearer tokens: HS256 JWTs whose subject is the user id.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::ServerError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Signing secret and lifetime of issued tokens.
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenConfig {
    /// `ttl_hours` is clamped to `1..=MAX_TOKEN_TTL_HOURS`.
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::hours(ttl_hours.clamp(1, MAX_TOKEN_TTL_HOURS)),
        }
    }

    pub fn issue(&self, user_id: i32) -> Result<String, ServerError> {
        self.issue_at(user_id, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: i32,
        issued_at: DateTime<Utc>,
    ) -> Result<String, ServerError> {
        if self.secret.is_empty() {
            return Err(ServerError::Internal("JWT secret is empty".to_string()));
        }
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ServerError::Internal("token expiry out of range".to_string()))?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|err| ServerError::Internal(format!("token generation failed: {err}")))
    }

    /// Decode a token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<i32, ServerError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => ServerError::Unauthorized("Token expired".to_string()),
            _ => ServerError::Unauthorized("Invalid token".to_string()),
        })?;

        data.claims
            .sub
            .parse()
            .map_err(|_| ServerError::Unauthorized("Invalid token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unauthorized_message(err: ServerError) -> String {
        match err {
            ServerError::Unauthorized(msg) => msg,
            other => panic!("expected unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn issued_token_carries_user_id() {
        let config = TokenConfig::new("secret", 1);
        let token = config.issue(42).unwrap();
        assert_eq!(config.verify(&token).unwrap(), 42);
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = TokenConfig::new("secret", 1);
        let token = config
            .issue_at(42, Utc::now() - Duration::hours(2))
            .unwrap();
        assert_eq!(
            unauthorized_message(config.verify(&token).unwrap_err()),
            "Token expired"
        );
    }

    #[test]
    fn huge_ttl_is_clamped_to_a_year() {
        let config = TokenConfig::new("secret", i64::MAX);
        assert_eq!(config.ttl, Duration::hours(MAX_TOKEN_TTL_HOURS));
        let token = config.issue(7).unwrap();
        assert_eq!(config.verify(&token).unwrap(), 7);
    }

    #[test]
    fn expiry_overflow_is_an_error() {
        let err = TokenConfig::new("secret", 1)
            .issue_at(7, DateTime::<Utc>::MAX_UTC)
            .unwrap_err();
        assert!(matches!(err, ServerError::Internal(_)));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = TokenConfig::new("other", 1).issue(42).unwrap();
        let err = TokenConfig::new("secret", 1).verify(&token).unwrap_err();
        assert_eq!(unauthorized_message(err), "Invalid token");
    }

    #[test]
    fn garbage_is_rejected() {
        let err = TokenConfig::new("secret", 1).verify("not.a.jwt").unwrap_err();
        assert_eq!(unauthorized_message(err), "Invalid token");
    }

    #[test]
    fn non_numeric_subject_is_rejected() {
        let now = Utc::now();
        let claims = Claims {
            sub: "alice".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        let err = TokenConfig::new("secret", 1).verify(&token).unwrap_err();
        assert_eq!(unauthorized_message(err), "Invalid token");
    }
}

//! Signed token issuance and verification
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(payload).base64url(signature)`.
//! The payload carries `{sub, roles, iat, exp}` with `iat`/`exp` in epoch milliseconds.
//! Expiry is checked by [`TokenCodec::check`], never by [`TokenCodec::parse`].

use crate::{config::AppConfig, error::AppError, models::identity::Identity};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Granted roles, in identity order
    pub roles: Vec<String>,

    /// Issued at (epoch milliseconds)
    pub iat: i64,

    /// Expiration (epoch milliseconds)
    pub exp: i64,
}

impl Claims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.iat)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.exp)
    }
}

/// Token lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("identity has an empty username")]
    InvalidIdentity,

    #[error("token is malformed")]
    MalformedToken,

    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token has expired")]
    ExpiredToken,

    #[error("token subject does not match")]
    SubjectMismatch,

    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// HMAC key material derived once from the configured secret.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Issues and verifies tokens with a fixed key and TTL.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug)]
pub struct TokenCodec {
    key: SigningKey,
    ttl_ms: i64,
    header: Header,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(key: SigningKey, ttl_ms: u64) -> Result<Self, AppError> {
        let ttl_ms = i64::try_from(ttl_ms)
            .map_err(|_| AppError::Config("token TTL is too large".to_string()))?;
        if ttl_ms <= 0 {
            return Err(AppError::Config("token TTL must be positive".to_string()));
        }

        // exp 以毫秒计，jsonwebtoken 的内置时间校验按秒计算，因此关闭后自行检查
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            key,
            ttl_ms,
            header: Header::new(Algorithm::HS256),
            validation,
        })
    }

    /// Create codec from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.jwt_secret.expose_secret();
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        Self::new(
            SigningKey::from_secret(secret.as_bytes()),
            config.security.token_ttl_ms,
        )
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// Issue a token for `identity`, valid from now for the configured TTL.
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String, TokenError> {
        if identity.username.is_empty() {
            return Err(TokenError::InvalidIdentity);
        }

        let issued_at = now.timestamp_millis();
        let expires_at = issued_at.checked_add(self.ttl_ms).ok_or_else(|| {
            TokenError::Encoding("expiry is beyond the representable range".to_string())
        })?;
        let claims = Claims {
            sub: identity.username.clone(),
            roles: identity.roles.clone(),
            iat: issued_at,
            exp: expires_at,
        };

        encode(&self.header, &claims, &self.key.encoding).map_err(|e| {
            tracing::error!("Failed to encode token: {:?}", e);
            TokenError::Encoding(e.to_string())
        })
    }

    /// Decode the three segments and verify the signature over `header.payload`.
    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.key.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => {
                    tracing::debug!("Token parse failed: {:?}", e);
                    TokenError::MalformedToken
                }
            })
    }

    /// True iff `exp <= now`.
    pub fn is_expired(&self, claims: &Claims) -> bool {
        Self::is_expired_at(claims, Utc::now())
    }

    pub fn is_expired_at(claims: &Claims, now: DateTime<Utc>) -> bool {
        claims.exp <= now.timestamp_millis()
    }

    /// Check already-parsed claims against the expected subject and the clock.
    pub fn check(&self, claims: Claims, expected_username: &str) -> Result<Claims, TokenError> {
        self.check_at(claims, expected_username, Utc::now())
    }

    pub fn check_at(
        &self,
        claims: Claims,
        expected_username: &str,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        if claims.sub != expected_username {
            return Err(TokenError::SubjectMismatch);
        }
        if Self::is_expired_at(&claims, now) {
            return Err(TokenError::ExpiredToken);
        }
        Ok(claims)
    }

    /// Parse + check, with every failure collapsed to `false`.
    pub fn validate(&self, token: &str, expected_username: &str) -> bool {
        self.validate_at(token, expected_username, Utc::now())
    }

    pub fn validate_at(&self, token: &str, expected_username: &str, now: DateTime<Utc>) -> bool {
        match self
            .parse(token)
            .and_then(|claims| self.check_at(claims, expected_username, now))
        {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Token validation failed");
                false
            }
        }
    }
}

//! JWT session token issuance and verification.
//!
//! Two token kinds share one secret and one claim layout:
//! - Access tokens: short-lived (configurable, minutes), presented as bearer tokens
//! - Refresh tokens: long-lived (30 days), exchanged for a fresh pair
//!
//! Tokens are self-contained; nothing is persisted server-side and there is no
//! revocation list. Expiry is the only way a token stops being valid.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::Role;

/// Token kind, carried in the `typ` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims shared by access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (numeric identity id, decimal string)
    pub sub: String,
    /// Role at issuance time. Advisory: refresh re-reads the stored role.
    pub role: Role,
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    /// JWT ID, makes every issued token unique
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Default access token duration: 60 minutes
pub const DEFAULT_ACCESS_TOKEN_DURATION_SECS: u64 = 60 * 60;

/// Refresh token duration: 30 days
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 30 * 24 * 60 * 60;

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Decoded, signature-checked token contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verified {
    pub subject: i64,
    pub role: Role,
    pub kind: TokenKind,
}

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
    #[error("wrong token type")]
    WrongKind,
    #[error("failed to sign token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    #[error("system time error")]
    TimeError,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Signs and verifies session tokens. Sole holder of the signing secret.
///
/// Built once at startup and shared behind an `Arc`; it holds no mutable state.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_duration: u64,
}

impl TokenCodec {
    /// Create a codec with the given secret and access token lifetime in seconds.
    pub fn new(secret: &[u8], access_duration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_duration: access_duration_secs,
        }
    }

    /// Mint an access and a refresh token for the same subject and role.
    pub fn issue(&self, subject: i64, role: Role) -> Result<TokenPair, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TokenError::TimeError)?
            .as_secs();

        let access_token = self.sign(subject, role, TokenKind::Access, now, self.access_duration)?;
        let refresh_token = self.sign(
            subject,
            role,
            TokenKind::Refresh,
            now,
            REFRESH_TOKEN_DURATION_SECS,
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    fn sign(
        &self,
        subject: i64,
        role: Role,
        kind: TokenKind,
        now: u64,
        duration: u64,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            role,
            kind,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(duration),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    /// Verify signature, algorithm and expiry, and decode subject and role.
    pub fn verify(&self, token: &str) -> Result<Verified, TokenError> {
        // Only HS256 is accepted; any other `alg` header fails as InvalidAlgorithm.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)?;
        let subject = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::Malformed)?;

        Ok(Verified {
            subject,
            role: data.claims.role,
            kind: data.claims.kind,
        })
    }

    /// Verify a token and require it to be an access token.
    pub fn verify_access(&self, token: &str) -> Result<Verified, TokenError> {
        let verified = self.verify(token)?;
        if verified.kind != TokenKind::Access {
            return Err(TokenError::WrongKind);
        }
        Ok(verified)
    }

    /// Verify a token and require it to be a refresh token.
    pub fn verify_refresh(&self, token: &str) -> Result<Verified, TokenError> {
        let verified = self.verify(token)?;
        if verified.kind != TokenKind::Refresh {
            return Err(TokenError::WrongKind);
        }
        Ok(verified)
    }
}

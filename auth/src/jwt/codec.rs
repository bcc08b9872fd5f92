use chrono::DateTime;
use chrono::Duration;
use chrono::SubsecRound;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::claims::Claims;
use super::errors::TokenError;
use crate::principal::Principal;

/// HMAC algorithm used to sign tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    #[default]
    #[serde(rename = "HS256")]
    Hs256,
    #[serde(rename = "HS384")]
    Hs384,
    #[serde(rename = "HS512")]
    Hs512,
}

impl From<SigningAlgorithm> for Algorithm {
    fn from(algorithm: SigningAlgorithm) -> Self {
        match algorithm {
            SigningAlgorithm::Hs256 => Algorithm::HS256,
            SigningAlgorithm::Hs384 => Algorithm::HS384,
            SigningAlgorithm::Hs512 => Algorithm::HS512,
        }
    }
}

/// A freshly signed token together with its validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies compact JWS access tokens.
///
/// The codec holds only the process-wide signing secret and is safe to share
/// across threads. Validation consults no server-side state; the caller
/// supplies the current time so expiry is checked against an explicit clock.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenCodec {
    /// Create a new codec.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    /// * `algorithm` - HMAC variant used for signing and the only one accepted
    /// * `ttl` - Lifetime of every issued token
    ///
    /// # Security Notes
    /// - The secret should be at least as long as the digest (32 bytes for HS256)
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8], algorithm: SigningAlgorithm, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: algorithm.into(),
            ttl,
        }
    }

    /// Lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `principal`, valid from `now` until `now + ttl`.
    ///
    /// `now` is truncated to whole seconds so the reported window matches the
    /// `iat`/`exp` claims exactly.
    ///
    /// # Errors
    /// * `EncodingFailed` - Expiry out of range or token encoding failed
    pub fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::EncodingFailed("token expiry out of range".to_string()))?;
        let claims = Claims::for_principal(principal, issued_at, self.ttl)
            .ok_or_else(|| TokenError::EncodingFailed("token expiry out of range".to_string()))?;
        let header = Header::new(self.algorithm);

        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Verify a token's signature and expiry at `now`.
    ///
    /// Only the configured algorithm is accepted, so unsigned tokens and
    /// tokens declaring `alg: none` are always rejected.
    ///
    /// # Errors
    /// * `Malformed` - Token structure, encoding or claims are invalid
    /// * `InvalidSignature` - Signature does not match or algorithm differs
    /// * `Expired` - `now` is past the `exp` claim
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below against the caller's clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })?;

        let claims = token_data.claims;
        if claims.is_expired(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::models::AuthenticatedUser;
use crate::error::AppError;

/// Claims read from an identity-provider session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// The user id.
    pub sub: String,
    /// Expiration (Unix seconds).
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Verifies session JWTs.
///
/// Production tokens are RS256-signed by the identity provider and checked
/// against its PEM public key, without a network round trip. An HMAC secret
/// is accepted for local setups and tests.
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SessionVerifier {
    /// Verify RS256 tokens with the provider's PEM-encoded public key.
    pub fn from_rsa_pem(pem: &str) -> Result<Self, AppError> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AppError::Internal(format!("Invalid session public key: {e}")))?;
        Ok(Self::with_key(key, Algorithm::RS256))
    }

    /// Verify HS256 tokens with a shared secret.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::with_key(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    fn with_key(key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        // Provider session tokens carry no audience.
        validation.validate_aud = false;
        Self { key, validation }
    }

    /// Check the signature and expiry of `token` and extract the caller.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation)
            .map_err(|e| AppError::Auth(format!("Invalid session token: {e}")))?;

        if data.claims.sub.is_empty() {
            return Err(AppError::Auth("Session token has no subject".into()));
        }

        Ok(AuthenticatedUser {
            user_id: data.claims.sub,
            email: data.claims.email,
        })
    }
}

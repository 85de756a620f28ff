//! Verify-only HS256 access credential
//!
//! The pipeline's `requireSession` step (C8) needs a session id before it
//! can do anything; this is how it gets one out of the `accessToken`
//! cookie without trusting the client. No signing key lives here — only
//! the shared secret used to check a signature someone else produced.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("token expired")]
    Expired,
    #[error("token invalid: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject id.
    pub sub: Uuid,
    /// Session id — the claim the pipeline actually needs.
    pub sid: Uuid,
    /// Tenant id, carried here because `buildPolicyInput` needs a
    /// `TenantContext` before `requireSession` has resolved the session
    /// record it would otherwise come from.
    pub tid: Uuid,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

/// Verify `token`'s signature, expiry, and audience against `secret` and
/// `expected_audience`. Returns the decoded claims on success.
pub fn verify_access_token(
    token: &str,
    secret: &Secret<String>,
    expected_audience: &str,
) -> Result<AccessTokenClaims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[expected_audience]);
    validation.validate_exp = true;

    let decoding_key = DecodingKey::from_secret(secret.expose_secret().as_bytes());

    let token_data = decode::<AccessTokenClaims>(token, &decoding_key, &validation).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            other => JwtError::Invalid(other.to_string()),
        }
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn sign(claims: &AccessTokenClaims, secret: &str) -> String {
        encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn sample_claims(exp_offset_secs: i64) -> AccessTokenClaims {
        let now = chrono::Utc::now().timestamp();
        AccessTokenClaims {
            sub: Uuid::new_v4(),
            sid: Uuid::new_v4(),
            tid: Uuid::new_v4(),
            iss: "authz-gateway".into(),
            aud: "authz-gateway".into(),
            exp: now + exp_offset_secs,
            iat: now,
        }
    }

    #[test]
    fn verifies_a_well_formed_token() {
        let claims = sample_claims(900);
        let token = sign(&claims, "test-secret");
        let secret = Secret::new("test-secret".to_string());

        let verified = verify_access_token(&token, &secret, "authz-gateway").unwrap();
        assert_eq!(verified.sid, claims.sid);
        assert_eq!(verified.sub, claims.sub);
    }

    #[test]
    fn rejects_expired_token() {
        let claims = sample_claims(-10);
        let token = sign(&claims, "test-secret");
        let secret = Secret::new("test-secret".to_string());

        let result = verify_access_token(&token, &secret, "authz-gateway");
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn rejects_token_signed_with_wrong_secret() {
        let claims = sample_claims(900);
        let token = sign(&claims, "wrong-secret");
        let secret = Secret::new("test-secret".to_string());

        let result = verify_access_token(&token, &secret, "authz-gateway");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_wrong_audience() {
        let claims = sample_claims(900);
        let token = sign(&claims, "test-secret");
        let secret = Secret::new("test-secret".to_string());

        let result = verify_access_token(&token, &secret, "some-other-audience");
        assert!(result.is_err());
    }
}

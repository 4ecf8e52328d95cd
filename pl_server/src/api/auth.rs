//! Bearer token verification.
//!
//! Identity is owned by an external provider; the server only checks the
//! HS256 signature and expiry of the access tokens it is handed and reads
//! the user id from `sub`.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use poker_ledger::game::UserId;
use serde::{Deserialize, Serialize};

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Verifies access tokens with a shared secret
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify an access token
    ///
    /// # Errors
    ///
    /// Returns the decoding error for bad signatures, malformed tokens and
    /// expired tokens.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Sign a token the way the identity provider does
    ///
    /// Used by local tooling and tests.
    pub fn issue(
        &self,
        user_id: UserId,
        email: Option<String>,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id,
            email,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }
}

/// Identity attached to a request by the auth middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: Option<String>,
}

impl From<AccessTokenClaims> for AuthenticatedUser {
    fn from(claims: AccessTokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_issue_and_verify() {
        let verifier = TokenVerifier::new(SECRET);
        let user = Uuid::new_v4();

        let token = verifier
            .issue(user, Some("a@b.c".to_string()), Duration::minutes(15))
            .unwrap();
        let claims = verifier.verify(&token).unwrap();

        assert_eq!(claims.sub, user);
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenVerifier::new(SECRET);
        let verifier = TokenVerifier::new("ffffffffffffffffffffffffffffffff");

        let token = issuer
            .issue(Uuid::new_v4(), None, Duration::minutes(15))
            .unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = TokenVerifier::new(SECRET);
        // Well past the default leeway
        let token = verifier
            .issue(Uuid::new_v4(), None, Duration::minutes(-10))
            .unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let verifier = TokenVerifier::new(SECRET);
        assert!(verifier.verify("not.a.token").is_err());
    }
}

//! Identity token issuance and validation.
//!
//! Tokens are compact HS256 JWTs signed with one process-wide secret. They
//! carry the user id (`sub`), an optional organization id (`org_id`), and
//! `iat`/`exp` as unix seconds. Nothing is stored server-side.
//!
//! # Example
//!
//! ```rust,ignore
//! use orgauth::auth::TokenIssuer;
//! use std::time::Duration;
//!
//! let issuer = TokenIssuer::new("your-secret-key");
//! let token = issuer.issue("user-123", Some("org-a"), Duration::from_secs(3600))?;
//! let claims = issuer.validate(&token)?;
//! assert_eq!(claims.subject, "user-123");
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::OrgAuthError;

const EXPECTED_ALGORITHM: &str = "HS256";

/// Why a token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no token presented")]
    Missing,

    #[error("token is malformed")]
    Malformed,

    #[error("token signed with unexpected algorithm '{0}'")]
    WrongAlgorithm(String),

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is missing the '{0}' claim")]
    MissingClaim(&'static str),

    #[error("token has expired")]
    Expired,

    #[error("token could not be signed: {0}")]
    Encoding(String),
}

impl From<AuthError> for OrgAuthError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Encoding(msg) => OrgAuthError::internal(msg),
            _ => OrgAuthError::unauthorized("not authorized"),
        }
    }
}

/// Claims recovered from a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: String,
    pub org_id: Option<String>,
    pub issued_at: u64,
    pub expires_at: u64,
}

#[derive(Serialize)]
struct OutgoingClaims<'a> {
    sub: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    org_id: Option<&'a str>,
    iat: u64,
    exp: u64,
}

/// Claims as found on the wire; presence is checked after signature
/// verification so a missing claim gets its own error.
#[derive(Deserialize)]
struct IncomingClaims {
    sub: Option<String>,
    org_id: Option<String>,
    iat: Option<u64>,
    exp: Option<u64>,
}

#[derive(Deserialize)]
struct PeekHeader {
    alg: String,
}

/// Mints and validates identity tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry and claim presence are checked by hand against an explicit
        // clock with zero leeway.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token valid for `ttl` from now.
    pub fn issue(
        &self,
        subject: &str,
        org_id: Option<&str>,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        self.issue_at(subject, org_id, ttl, current_timestamp())
    }

    /// Issue a token as if the current time were `now` (unix seconds).
    pub fn issue_at(
        &self,
        subject: &str,
        org_id: Option<&str>,
        ttl: Duration,
        now: u64,
    ) -> Result<String, AuthError> {
        let claims = OutgoingClaims {
            sub: subject,
            org_id,
            iat: now,
            exp: now.saturating_add(ttl.as_secs()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    /// Validate a token against the system clock.
    pub fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.validate_at(token, current_timestamp())
    }

    /// Validate a token as if the current time were `now` (unix seconds).
    ///
    /// Order of checks: header algorithm, signature, claim presence, expiry.
    pub fn validate_at(&self, token: &str, now: u64) -> Result<TokenClaims, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Missing);
        }

        let alg = peek_algorithm(token)?;
        if alg != EXPECTED_ALGORITHM {
            return Err(AuthError::WrongAlgorithm(alg));
        }

        let data = decode::<IncomingClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => AuthError::WrongAlgorithm(alg.clone()),
                _ => AuthError::Malformed,
            })?;

        let claims = data.claims;
        let subject = claims
            .sub
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingClaim("sub"))?;
        let expires_at = claims.exp.ok_or(AuthError::MissingClaim("exp"))?;

        if now >= expires_at {
            return Err(AuthError::Expired);
        }

        Ok(TokenClaims {
            subject,
            org_id: claims.org_id,
            issued_at: claims.iat.unwrap_or(0),
            expires_at,
        })
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &EXPECTED_ALGORITHM)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Read the `alg` header field without trusting anything else in the token.
fn peek_algorithm(token: &str) -> Result<String, AuthError> {
    let mut parts = token.split('.');
    let (Some(header), Some(_payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::Malformed)?;
    let header: PeekHeader = serde_json::from_slice(&bytes).map_err(|_| AuthError::Malformed)?;

    Ok(header.alg)
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-for-hs256-tokens";
    const HOUR: Duration = Duration::from_secs(3600);
    const T0: u64 = 1_700_000_000;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET)
    }

    fn b64(json: &str) -> String {
        URL_SAFE_NO_PAD.encode(json)
    }

    #[test]
    fn test_round_trip_before_expiry() {
        let issuer = issuer();
        let token = issuer.issue_at("user-1", Some("org-a"), HOUR, T0).unwrap();

        let claims = issuer.validate_at(&token, T0 + 3599).unwrap();
        assert_eq!(claims.subject, "user-1");
        assert_eq!(claims.org_id.as_deref(), Some("org-a"));
        assert_eq!(claims.issued_at, T0);
        assert_eq!(claims.expires_at, T0 + 3600);
    }

    #[test]
    fn test_expired_at_exact_boundary() {
        let issuer = issuer();
        let token = issuer.issue_at("user-1", None, HOUR, T0).unwrap();

        assert_eq!(issuer.validate_at(&token, T0 + 3600), Err(AuthError::Expired));
        assert_eq!(issuer.validate_at(&token, T0 + 7200), Err(AuthError::Expired));
    }

    #[test]
    fn test_org_claim_is_optional() {
        let issuer = issuer();
        let token = issuer.issue_at("user-1", None, HOUR, T0).unwrap();
        let claims = issuer.validate_at(&token, T0).unwrap();
        assert_eq!(claims.org_id, None);
    }

    #[test]
    fn test_system_clock_round_trip() {
        let issuer = issuer();
        let token = issuer.issue("user-9", None, HOUR).unwrap();
        assert_eq!(issuer.validate(&token).unwrap().subject, "user-9");
    }

    #[test]
    fn test_different_secret_rejected() {
        let token = TokenIssuer::new("some-other-secret")
            .issue_at("user-1", None, HOUR, T0)
            .unwrap();

        assert_eq!(
            issuer().validate_at(&token, T0),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_algorithm_confusion_attack_rejected() {
        let claims = OutgoingClaims {
            sub: "user-1",
            org_id: None,
            iat: T0,
            exp: T0 + 3600,
        };
        let hs384 = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(
            issuer().validate_at(&hs384, T0),
            Err(AuthError::WrongAlgorithm("HS384".to_string()))
        );
    }

    #[test]
    fn test_none_algorithm_rejected() {
        let token = format!(
            "{}.{}.",
            b64(r#"{"alg":"none","typ":"JWT"}"#),
            b64(r#"{"sub":"user-1","exp":9999999999}"#)
        );

        assert_eq!(
            issuer().validate_at(&token, T0),
            Err(AuthError::WrongAlgorithm("none".to_string()))
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        let issuer = issuer();
        assert_eq!(issuer.validate_at("abc", T0), Err(AuthError::Malformed));
        assert_eq!(issuer.validate_at("a.b.c", T0), Err(AuthError::Malformed));
        assert_eq!(issuer.validate_at("a.b.c.d", T0), Err(AuthError::Malformed));
        assert_eq!(issuer.validate_at("", T0), Err(AuthError::Missing));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let issuer = issuer();
        let token = issuer.issue_at("user-1", None, HOUR, T0).unwrap();
        let forged = b64(&format!(r#"{{"sub":"admin","iat":{T0},"exp":{}}}"#, T0 + 3600));
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged;
        let tampered = parts.join(".");

        assert_eq!(
            issuer.validate_at(&tampered, T0),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_missing_claims_rejected() {
        #[derive(Serialize)]
        struct OnlyExp {
            exp: u64,
        }
        #[derive(Serialize)]
        struct OnlySub {
            sub: &'static str,
        }

        let key = EncodingKey::from_secret(SECRET);
        let header = Header::new(Algorithm::HS256);

        let no_sub = encode(&header, &OnlyExp { exp: T0 + 60 }, &key).unwrap();
        assert_eq!(
            issuer().validate_at(&no_sub, T0),
            Err(AuthError::MissingClaim("sub"))
        );

        let no_exp = encode(&header, &OnlySub { sub: "user-1" }, &key).unwrap();
        assert_eq!(
            issuer().validate_at(&no_exp, T0),
            Err(AuthError::MissingClaim("exp"))
        );
    }

    #[test]
    fn test_auth_errors_map_to_unauthorized() {
        for err in [
            AuthError::Missing,
            AuthError::Malformed,
            AuthError::WrongAlgorithm("RS256".to_string()),
            AuthError::InvalidSignature,
            AuthError::MissingClaim("sub"),
            AuthError::Expired,
        ] {
            assert!(matches!(
                OrgAuthError::from(err),
                OrgAuthError::Unauthorized(_)
            ));
        }
        assert!(matches!(
            OrgAuthError::from(AuthError::Encoding("boom".to_string())),
            OrgAuthError::Internal(_)
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", issuer());
        assert!(!debug.contains("test-secret"));
    }
}

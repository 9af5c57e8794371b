//! Bearer token issue and verification
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).base64url(mac)`.
//! Only HS256 is accepted; the header is checked, not trusted.

use super::error::{AuthRejection, ConfigError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried by an issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    /// Issued at, Unix seconds
    pub iat: i64,
    /// Expiry, Unix seconds
    pub exp: i64,
}

/// Issues and verifies tokens for the read API
#[derive(Clone)]
pub struct TokenAuthority {
    key: HmacSha256,
    ttl: Duration,
    admin_username: String,
    admin_password: String,
}

impl TokenAuthority {
    pub fn new(
        secret: &str,
        ttl: Duration,
        admin_username: &str,
        admin_password: &str,
    ) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::InvalidValue(
                "token secret must not be empty".to_string(),
            ));
        }
        let key = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| ConfigError::InvalidValue(format!("token secret: {}", e)))?;

        Ok(Self {
            key,
            ttl,
            admin_username: admin_username.to_string(),
            admin_password: admin_password.to_string(),
        })
    }

    /// Whether a login attempt matches the configured account
    pub fn check_credentials(&self, username: &str, password: &str) -> bool {
        username == self.admin_username && password == self.admin_password
    }

    /// Sign a token for `username` valid for the configured lifetime
    pub fn issue(&self, username: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        self.sign(&Claims {
            username: username.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        })
    }

    /// Verify an `Authorization` header value
    ///
    /// `Missing` when there is no header or no token after the scheme;
    /// everything else that fails is `Invalid`.
    pub fn verify_header(&self, header: Option<&str>) -> Result<Claims, AuthRejection> {
        let token = header
            .and_then(|value| value.split_whitespace().nth(1))
            .ok_or(AuthRejection::Missing)?;
        self.verify(token)
    }

    /// Verify a bare token
    pub fn verify(&self, token: &str) -> Result<Claims, AuthRejection> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("malformed token"));
        };

        let signature = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| invalid("malformed signature"))?;

        let mut mac = self.key.clone();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| invalid("signature mismatch"))?;

        let header: Header = decode_segment(header_b64)?;
        if header.alg != "HS256" {
            return Err(invalid("unsupported algorithm"));
        }

        let claims: Claims = decode_segment(claims_b64)?;
        if claims.exp <= chrono::Utc::now().timestamp() {
            return Err(invalid("token expired"));
        }

        Ok(claims)
    }

    fn sign(&self, claims: &Claims) -> String {
        let header = Header {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };
        let signing_input = format!("{}.{}", encode_segment(&header), encode_segment(claims));

        let mut mac = self.key.clone();
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature)
    }
}

fn invalid(reason: &str) -> AuthRejection {
    AuthRejection::Invalid(reason.to_string())
}

fn encode_segment<T: Serialize>(value: &T) -> String {
    // Header and Claims serialize infallibly
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap_or_default())
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, AuthRejection> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| invalid("malformed segment"))?;
    serde_json::from_slice(&bytes).map_err(|_| invalid("malformed segment"))
}

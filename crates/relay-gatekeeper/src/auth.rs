//! Shared-secret authentication.

use crate::error::GatekeeperError;
use axum::http::HeaderMap;
use std::fmt;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// The configured secret. Compared by exact equality, never trimmed.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn verify(&self, headers: &HeaderMap) -> Result<(), GatekeeperError> {
        let presented = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !self.0.is_empty() && presented == self.0 {
            Ok(())
        } else {
            Err(GatekeeperError::Unauthorized)
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(v) = value {
            headers.insert(API_KEY_HEADER, HeaderValue::from_str(v).unwrap());
        }
        headers
    }

    #[test]
    fn test_exact_match_only() {
        let key = ApiKey::new("MY_SECRET_KEY_123");
        assert!(key.verify(&headers(Some("MY_SECRET_KEY_123"))).is_ok());
        assert!(key.verify(&headers(Some("my_secret_key_123"))).is_err());
        assert!(key.verify(&headers(Some("MY_SECRET_KEY_123 "))).is_err());
        assert!(key.verify(&headers(Some(""))).is_err());
        assert!(key.verify(&headers(None)).is_err());
    }

    #[test]
    fn test_empty_key_never_matches() {
        let key = ApiKey::new("");
        assert!(key.verify(&headers(None)).is_err());
        assert!(key.verify(&headers(Some(""))).is_err());
    }

    #[test]
    fn test_debug_redacts() {
        assert_eq!(format!("{:?}", ApiKey::new("s3cret")), "ApiKey(<redacted>)");
    }
}

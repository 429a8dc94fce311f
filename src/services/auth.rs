use axum::http::{header, HeaderMap};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::AuthScheme;
use crate::error::{AppError, AppResult, ErrorCode};

type HmacSha256 = Hmac<Sha256>;

/// Checks the bearer token kiosks send with every request.
#[derive(Clone)]
pub struct DeviceAuthenticator {
    verifier: Verifier,
}

#[derive(Clone)]
enum Verifier {
    ConnectCode { code: String, secret: String },
    // The configured token is kept only as a MAC under a per-process key.
    StaticToken { key: [u8; 32], expected: Vec<u8> },
}

impl std::fmt::Debug for DeviceAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scheme = match self.verifier {
            Verifier::ConnectCode { .. } => "connect_code",
            Verifier::StaticToken { .. } => "static_token",
        };
        f.debug_struct("DeviceAuthenticator")
            .field("scheme", &scheme)
            .finish()
    }
}

fn hmac(key: &[u8], message: &[u8]) -> AppResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| {
        tracing::error!("Failed to create HMAC");
        AppError::new(ErrorCode::Default)
    })?;
    mac.update(message);
    Ok(mac)
}

/// The token a kiosk must present for a connect code.
pub fn device_token(code: &str, secret: &str) -> AppResult<String> {
    let mac = hmac(secret.as_bytes(), code.as_bytes())?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

impl DeviceAuthenticator {
    pub fn new(scheme: &AuthScheme) -> AppResult<Self> {
        let verifier = match scheme {
            AuthScheme::ConnectCode { code, secret } => Verifier::ConnectCode {
                code: code.clone(),
                secret: secret.clone(),
            },
            AuthScheme::StaticToken(token) => {
                let key: [u8; 32] = rand::random();
                let expected = hmac(&key, token.as_bytes())?
                    .finalize()
                    .into_bytes()
                    .to_vec();
                Verifier::StaticToken { key, expected }
            }
        };

        Ok(Self { verifier })
    }

    /// Validate the `Authorization: Bearer <token>` header.
    pub fn authenticate(&self, headers: &HeaderMap) -> AppResult<()> {
        let value = headers.get(header::AUTHORIZATION).ok_or_else(|| {
            tracing::debug!("Missing Authorization header");
            AppError::new(ErrorCode::AuthMissingToken)
        })?;

        let value = value.to_str().map_err(|_| {
            tracing::debug!("Authorization header is not valid ASCII");
            AppError::new(ErrorCode::AuthInvalidToken)
        })?;

        let token = bearer_token(value).ok_or_else(|| {
            tracing::debug!("Authorization header doesn't carry a bearer token");
            AppError::new(ErrorCode::AuthInvalidToken)
        })?;

        if self.verify(token)? {
            Ok(())
        } else {
            tracing::debug!("Device presented an invalid token");
            Err(AppError::new(ErrorCode::AuthInvalidToken))
        }
    }

    fn verify(&self, token: &str) -> AppResult<bool> {
        match &self.verifier {
            Verifier::ConnectCode { code, secret } => {
                let presented = match hex::decode(token) {
                    Ok(bytes) => bytes,
                    Err(_) => return Ok(false),
                };
                let mac = hmac(secret.as_bytes(), code.as_bytes())?;
                Ok(mac.verify_slice(&presented).is_ok())
            }
            Verifier::StaticToken { key, expected } => {
                let mac = hmac(key, token.as_bytes())?;
                Ok(mac.verify_slice(expected).is_ok())
            }
        }
    }
}

fn bearer_token(value: &str) -> Option<&str> {
    let prefix = value.get(..7)?;
    if !prefix.eq_ignore_ascii_case("bearer ") {
        return None;
    }

    let token = value[7..].trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = auth {
            headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    fn connect_code() -> DeviceAuthenticator {
        DeviceAuthenticator::new(&AuthScheme::ConnectCode {
            code: "123456".to_string(),
            secret: "s3cret".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn device_token_is_hex_hmac() {
        let token = device_token("123456", "s3cret").unwrap();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token, device_token("123456", "s3cret").unwrap());
        assert_ne!(token, device_token("123456", "other").unwrap());
    }

    #[test]
    fn connect_code_accepts_derived_token() {
        let auth = connect_code();
        let token = device_token("123456", "s3cret").unwrap();
        assert!(auth.authenticate(&headers(Some(&format!("Bearer {}", token)))).is_ok());
        assert!(auth.authenticate(&headers(Some(&format!("bearer {}", token)))).is_ok());
        assert!(auth
            .authenticate(&headers(Some(&format!("Bearer {}", token.to_uppercase()))))
            .is_ok());
    }

    #[test]
    fn missing_header() {
        let err = connect_code().authenticate(&headers(None)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AuthMissingToken);
    }

    #[test]
    fn malformed_headers_are_invalid() {
        let auth = connect_code();
        for value in ["Bearer", "Bearer   ", "Basic abc", "Token x", "Bearer not-hex"] {
            let err = auth.authenticate(&headers(Some(value))).unwrap_err();
            assert_eq!(err.code(), ErrorCode::AuthInvalidToken, "{}", value);
        }
    }

    #[test]
    fn static_token_scheme() {
        let auth =
            DeviceAuthenticator::new(&AuthScheme::StaticToken("kiosk-token".to_string())).unwrap();
        assert!(auth.authenticate(&headers(Some("Bearer kiosk-token"))).is_ok());

        let err = auth.authenticate(&headers(Some("Bearer kiosk-tokem"))).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AuthInvalidToken);
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}

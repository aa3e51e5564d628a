//! HTTP Basic-auth middleware for operator requests.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use crate::error::Error;

/// Operator credentials accepted by this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Verify Basic credentials in `headers` against `config`.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  if username != config.username {
    return Err(Error::Unauthorized);
  }

  let parsed_hash = PasswordHash::new(&config.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(())
}

/// Middleware rejecting every request without valid operator credentials.
pub async fn require_auth(
  State(config): State<Arc<AuthConfig>>,
  req: Request,
  next: Next,
) -> Result<Response, Error> {
  if let Err(e) = verify_auth(req.headers(), &config) {
    tracing::warn!(path = %req.uri().path(), "rejected unauthenticated request");
    return Err(e);
  }
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::{HeaderValue, header};

  fn make_config(password: &str) -> AuthConfig {
    use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
    use rand_core::OsRng;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    AuthConfig { username: "ops".to_string(), password_hash: hash }
  }

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  #[test]
  fn correct_credentials() {
    let config = make_config("secret");
    assert!(verify_auth(&headers(&basic("ops", "secret")), &config).is_ok());
  }

  #[test]
  fn wrong_password() {
    let config = make_config("secret");
    let result = verify_auth(&headers(&basic("ops", "wrong")), &config);
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn wrong_username() {
    let config = make_config("secret");
    let result = verify_auth(&headers(&basic("root", "secret")), &config);
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn missing_header() {
    let config = make_config("secret");
    let result = verify_auth(&HeaderMap::new(), &config);
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn invalid_base64() {
    let config = make_config("secret");
    let result = verify_auth(&headers("Basic !!!not-base64!!!"), &config);
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn malformed_stored_hash() {
    let config = AuthConfig {
      username:      "ops".to_string(),
      password_hash: "not-a-phc-string".to_string(),
    };
    let result = verify_auth(&headers(&basic("ops", "secret")), &config);
    assert!(matches!(result, Err(Error::Unauthorized)));
  }
}

//! Push-secret verification for the batch-push endpoint.
//!
//! The config stores an argon2 PHC hash of the secret, never the secret
//! itself; `--hash-secret` on the server binary generates one.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::http::HeaderMap;

/// Verify a presented secret against the configured PHC hash. A missing
/// hash disables the endpoint entirely.
pub fn verify_push_secret(presented: Option<&str>, phc_hash: Option<&str>) -> bool {
  let (Some(presented), Some(phc_hash)) = (presented, phc_hash) else {
    return false;
  };
  let Ok(parsed) = PasswordHash::new(phc_hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(presented.as_bytes(), &parsed)
    .is_ok()
}

/// The secret arrives as an `X-Push-Secret` header or a `?secret=` query
/// parameter; the header wins when both are present.
pub fn presented_secret<'a>(
  headers: &'a HeaderMap,
  query_secret: Option<&'a str>,
) -> Option<&'a str> {
  headers
    .get("x-push-secret")
    .and_then(|v| v.to_str().ok())
    .or(query_secret)
}

#[cfg(test)]
mod tests {
  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use rand_core::OsRng;

  use super::*;

  fn hash(secret: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(secret.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  #[test]
  fn correct_secret_verifies() {
    let phc = hash("hush");
    assert!(verify_push_secret(Some("hush"), Some(&phc)));
    assert!(!verify_push_secret(Some("wrong"), Some(&phc)));
  }

  #[test]
  fn missing_hash_rejects_everything() {
    assert!(!verify_push_secret(Some("anything"), None));
    assert!(!verify_push_secret(None, Some("$argon2id$bogus")));
  }

  #[test]
  fn header_takes_precedence_over_query() {
    let mut headers = HeaderMap::new();
    headers.insert("x-push-secret", "from-header".parse().unwrap());
    assert_eq!(
      presented_secret(&headers, Some("from-query")),
      Some("from-header")
    );
    assert_eq!(
      presented_secret(&HeaderMap::new(), Some("from-query")),
      Some("from-query")
    );
  }
}

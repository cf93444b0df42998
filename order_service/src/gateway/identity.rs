// topup-order-service/src/gateway/identity.rs

//! Buyer identity carried by an incoming request.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerIdentity {
  Anonymous,
  Bearer(String),
}

impl CallerIdentity {
  /// Any `Authorization` value that is not `Bearer <token>` is kept as an
  /// unverifiable credential rather than silently treated as anonymous.
  pub fn from_authorization_header(value: Option<&str>) -> Self {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
      None => CallerIdentity::Anonymous,
      Some(raw) => match raw.strip_prefix("Bearer ") {
        Some(token) => CallerIdentity::Bearer(token.trim().to_string()),
        None => CallerIdentity::Bearer(raw.to_string()),
      },
    }
  }
}

#[derive(Debug, Deserialize)]
struct UserClaims {
  sub: String,
}

/// Verifies user bearer tokens issued by the auth service.
pub struct UserTokenDecoder {
  key: DecodingKey,
  validation: Validation,
}

impl UserTokenDecoder {
  pub fn new(secret: &str) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);
    Self {
      key: DecodingKey::from_secret(secret.as_bytes()),
      validation,
    }
  }

  /// The user id in `sub`, or `None` if the token is invalid, expired or
  /// carries a non-numeric subject.
  pub fn user_id(&self, token: &str) -> Option<i64> {
    match jsonwebtoken::decode::<UserClaims>(token, &self.key, &self.validation) {
      Ok(data) => data.claims.sub.parse::<i64>().ok(),
      Err(e) => {
        tracing::debug!(error = %e, "User token rejected.");
        None
      }
    }
  }
}

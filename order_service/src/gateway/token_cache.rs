// topup-order-service/src/gateway/token_cache.rs

//! Cached service-to-service JWT.

use crate::gateway::GatewayError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const TOKEN_LIFETIME_MINUTES: i64 = 15;
/// A token is reused until this long after issue, leaving a minute of headroom
/// before the collaborator would reject it.
const TOKEN_REUSE_MINUTES: i64 = 14;

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceClaims {
  pub service: String,
  pub iat: i64,
  pub nbf: i64,
  pub exp: i64,
}

struct CachedToken {
  token: String,
  issued_at: DateTime<Utc>,
}

/// Owns the current service token. All access goes through one mutex, so
/// concurrent requests either reuse the same token or one of them re-signs it.
pub struct ServiceTokenCache {
  service_name: String,
  encoding_key: EncodingKey,
  clock: Arc<dyn Clock>,
  cached: Mutex<Option<CachedToken>>,
}

impl ServiceTokenCache {
  pub fn new(service_name: impl Into<String>, secret: &str, clock: Arc<dyn Clock>) -> Self {
    Self {
      service_name: service_name.into(),
      encoding_key: EncodingKey::from_secret(secret.as_bytes()),
      clock,
      cached: Mutex::new(None),
    }
  }

  pub fn token(&self) -> Result<String, GatewayError> {
    let now = self.clock.now();
    let mut cached = self.cached.lock();

    if let Some(current) = cached.as_ref() {
      if now < current.issued_at + Duration::minutes(TOKEN_REUSE_MINUTES) {
        return Ok(current.token.clone());
      }
    }

    let claims = ServiceClaims {
      service: self.service_name.clone(),
      iat: now.timestamp(),
      nbf: now.timestamp(),
      exp: (now + Duration::minutes(TOKEN_LIFETIME_MINUTES)).timestamp(),
    };
    let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
      .map_err(|e| GatewayError::Unavailable(format!("failed to sign service token: {}", e)))?;

    tracing::debug!(service = %self.service_name, "Issued new service token.");
    *cached = Some(CachedToken {
      token: token.clone(),
      issued_at: now,
    });
    Ok(token)
  }
}

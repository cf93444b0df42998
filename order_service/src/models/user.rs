// topup-order-service/src/models/user.rs

use serde::Deserialize;

/// The subset of the user service's record this service reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
  pub id: i64,
  #[serde(default)]
  pub name: String,
  pub email: String,
  #[serde(default)]
  pub phone_number: Option<String>,
}

impl User {
  /// Mobile number to forward to the payment gateway, if the user has one.
  pub fn mobile_number(&self) -> Option<&str> {
    self.phone_number.as_deref().map(str::trim).filter(|p| !p.is_empty())
  }
}

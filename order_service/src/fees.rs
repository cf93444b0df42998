// topup-order-service/src/fees.rs

//! Service-charge computation per payment channel.
//!
//! All arithmetic is integer arithmetic on the smallest currency unit. Rates
//! are expressed per mille and rounded up with a ceiling division, so the
//! total never undercharges the buyer.

use serde::Serialize;
use thiserror::Error;

/// Platform surcharge applied to every channel.
pub const APP_FEE: i64 = 1000;
/// Flat fee charged by every virtual-account channel.
pub const VA_FLAT_FEE: i64 = 4000;
/// 4%
pub const EWALLET_RATE_PER_MILLE: i64 = 40;
/// 0.7%
pub const QRIS_RATE_PER_MILLE: i64 = 7;

const EWALLET_CODES: &[&str] = &["OVO", "DANA", "LINKAJA", "SHOPEEPAY", "ASTRAPAY", "JENIUSPAY", "SAKUKU"];
const VIRTUAL_ACCOUNT_CODES: &[&str] = &[
  "BCA",
  "BNI",
  "BRI",
  "MANDIRI",
  "PERMATA",
  "BSI",
  "CIMB",
  "SAHABAT_SAMPOERNA",
  "BJB",
];
const QRIS_CODES: &[&str] = &["QRIS"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeeError {
  #[error("Invalid channel code: {0}")]
  InvalidChannelCode(String),

  #[error("Product price must not be negative, got {0}")]
  NegativePrice(i64),

  #[error("Amount overflow while computing fees for price {0}")]
  Overflow(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeePolicy {
  /// `ceil(price * per_mille / 1000)`
  Percentage { per_mille: i64 },
  Flat { amount: i64 },
}

/// A supported payment channel. The variant fixes the fee policy; the payload
/// is the channel code as the payment gateway names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentChannel {
  Ewallet(&'static str),
  VirtualAccount(&'static str),
  Qris(&'static str),
}

impl PaymentChannel {
  pub fn from_code(code: &str) -> Option<Self> {
    let lookup = |codes: &'static [&'static str]| codes.iter().copied().find(|c| *c == code);

    lookup(EWALLET_CODES)
      .map(PaymentChannel::Ewallet)
      .or_else(|| lookup(VIRTUAL_ACCOUNT_CODES).map(PaymentChannel::VirtualAccount))
      .or_else(|| lookup(QRIS_CODES).map(PaymentChannel::Qris))
  }

  pub fn code(&self) -> &'static str {
    match self {
      PaymentChannel::Ewallet(code) | PaymentChannel::VirtualAccount(code) | PaymentChannel::Qris(code) => *code,
    }
  }

  pub fn fee_policy(&self) -> FeePolicy {
    match self {
      PaymentChannel::Ewallet(_) => FeePolicy::Percentage {
        per_mille: EWALLET_RATE_PER_MILLE,
      },
      PaymentChannel::VirtualAccount(_) => FeePolicy::Flat { amount: VA_FLAT_FEE },
      PaymentChannel::Qris(_) => FeePolicy::Percentage {
        per_mille: QRIS_RATE_PER_MILLE,
      },
    }
  }

  /// Every channel this service accepts, in catalogue order.
  pub fn all() -> impl Iterator<Item = PaymentChannel> {
    EWALLET_CODES
      .iter()
      .copied()
      .map(PaymentChannel::Ewallet)
      .chain(VIRTUAL_ACCOUNT_CODES.iter().copied().map(PaymentChannel::VirtualAccount))
      .chain(QRIS_CODES.iter().copied().map(PaymentChannel::Qris))
  }
}

/// Fee breakdown for one request. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMethodDetails {
  pub channel_code: String,
  pub service_charge: i64,
  pub total_amount: i64,
}

pub fn compute_fee(channel_code: &str, product_price: i64) -> Result<PaymentMethodDetails, FeeError> {
  let channel =
    PaymentChannel::from_code(channel_code).ok_or_else(|| FeeError::InvalidChannelCode(channel_code.to_string()))?;
  if product_price < 0 {
    return Err(FeeError::NegativePrice(product_price));
  }

  let channel_fee = match channel.fee_policy() {
    FeePolicy::Percentage { per_mille } => product_price
      .checked_mul(per_mille)
      .map(|scaled| ceil_div(scaled, 1000))
      .ok_or(FeeError::Overflow(product_price))?,
    FeePolicy::Flat { amount } => amount,
  };

  let service_charge = channel_fee
    .checked_add(APP_FEE)
    .ok_or(FeeError::Overflow(product_price))?;
  let total_amount = product_price
    .checked_add(service_charge)
    .ok_or(FeeError::Overflow(product_price))?;

  Ok(PaymentMethodDetails {
    channel_code: channel.code().to_string(),
    service_charge,
    total_amount,
  })
}

/// Ceiling division for non-negative numerators.
fn ceil_div(numerator: i64, denominator: i64) -> i64 {
  numerator / denominator + i64::from(numerator % denominator != 0)
}

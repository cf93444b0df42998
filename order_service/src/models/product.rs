// topup-order-service/src/models/product.rs

use serde::{Deserialize, Deserializer};

/// A catalog item as returned by the product service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
  pub id: i64,
  #[serde(default)]
  pub ref_id: String,
  #[serde(default)]
  pub product_type_id: i64,
  pub name: String,
  #[serde(default)]
  pub code: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub image_url: String,
  #[serde(deserialize_with = "deserialize_price")]
  pub price: i64,
}

/// The catalog encodes prices as JSON numbers that may carry a fraction;
/// fractions are rounded up to the next whole unit.
fn deserialize_price<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
  D: Deserializer<'de>,
{
  let number = serde_json::Number::deserialize(deserializer)?;
  if let Some(whole) = number.as_i64() {
    return Ok(whole);
  }
  match number.as_f64() {
    Some(value) if value.is_finite() && value.abs() < i64::MAX as f64 => Ok(value.ceil() as i64),
    _ => Err(serde::de::Error::custom(format!("price out of range: {}", number))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn price_accepts_integer_and_fractional_numbers() {
    let whole: Product = serde_json::from_str(r#"{"id": 1, "name": "Diamonds", "price": 10000}"#).unwrap();
    assert_eq!(whole.price, 10_000);

    let fractional: Product = serde_json::from_str(r#"{"id": 1, "name": "Diamonds", "price": 9999.5}"#).unwrap();
    assert_eq!(fractional.price, 10_000);
  }
}

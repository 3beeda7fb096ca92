// src/common/lenient.rs
//
// Deserializers para payloads vindos do frontend: números podem chegar como
// número ou string, e "" / null contam como campo ausente.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

fn raw_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Some(other) => Err(D::Error::custom(format!("expected a number, got {}", other))),
    }
}

pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

pub fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match raw_value(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_decimal(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid number: {}", raw))),
    }
}

pub fn optional_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match raw_value(deserializer)? {
        None => Ok(None),
        Some(raw) => {
            if let Ok(value) = raw.parse::<i32>() {
                return Ok(Some(value));
            }
            // "2.5" vira 2, como um parseInt.
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && v.abs() <= i32::MAX as f64)
                .map(|v| Some(v.trunc() as i32))
                .ok_or_else(|| D::Error::custom(format!("invalid integer: {}", raw)))
        }
    }
}

pub fn optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(s.trim())
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid id: {}", s))),
    }
}

/// Strings vazias contam como ausentes.
pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(default, deserialize_with = "optional_decimal")]
        amount: Option<Decimal>,
        #[serde(default, deserialize_with = "optional_i32")]
        quantity: Option<i32>,
        #[serde(default, deserialize_with = "optional_string")]
        name: Option<String>,
    }

    fn parse(json: &str) -> Payload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn numbers_and_numeric_strings_are_accepted() {
        let p = parse(r#"{"amount": 1000, "quantity": "3"}"#);
        assert_eq!(p.amount, Some(Decimal::new(1000, 0)));
        assert_eq!(p.quantity, Some(3));

        let p = parse(r#"{"amount": "12.5", "quantity": 2.9}"#);
        assert_eq!(p.amount, Some(Decimal::new(125, 1)));
        assert_eq!(p.quantity, Some(2));
    }

    #[test]
    fn zero_is_a_value_but_empty_and_null_are_absent() {
        assert_eq!(parse(r#"{"amount": 0}"#).amount, Some(Decimal::ZERO));
        assert_eq!(parse(r#"{"amount": ""}"#).amount, None);
        assert_eq!(parse(r#"{"amount": null}"#).amount, None);
        assert_eq!(parse(r#"{}"#).amount, None);
        assert_eq!(parse(r#"{"name": "   "}"#).name, None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(serde_json::from_str::<Payload>(r#"{"amount": "abc"}"#).is_err());
        assert!(serde_json::from_str::<Payload>(r#"{"quantity": true}"#).is_err());
    }
}

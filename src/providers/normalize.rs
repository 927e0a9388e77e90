//! Raw-record normalization — the only place provider field aliases exist.
//!
//! Providers disagree on field names (`price` vs `value`, `airline` vs
//! `gate`, `departure_at` vs `departure_at_iso`); everything downstream of
//! this module sees only the canonical [`Offer`] shape.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;

use crate::model::{IataCode, Offer};

/// Normalize one raw provider record into a canonical offer.
///
/// Returns `None` only for records that are not objects at all; an object
/// with missing fields still yields an offer (absent price stays absent,
/// it is never coerced to zero).
pub fn normalize(
    raw: &Value,
    origin: IataCode,
    destination: IataCode,
    currency: &str,
) -> Option<Offer> {
    if !raw.is_object() {
        return None;
    }

    let price = first_field(raw, &["price", "value"]).and_then(as_decimal);
    let airline = first_field(raw, &["airline", "gate"])
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let departure_at = first_field(raw, &["departure_at", "departure_at_iso"])
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let flight_number = raw
        .get("flight_number")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let transfer_count = first_field(raw, &["transfers", "transfer_count"])
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;
    let purchase_link = first_field(raw, &["link", "deeplink"])
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Some(Offer {
        price,
        currency: currency.to_string(),
        airline,
        flight_number,
        departure_at,
        transfer_count,
        origin,
        destination,
        purchase_link,
    })
}

fn first_field<'a>(raw: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| raw.get(*name))
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    if let Some(i) = value.as_i64() {
        return Some(Decimal::from(i));
    }
    value.as_f64().and_then(Decimal::from_f64)
}

//! Canonical data model: IATA codes, offers, search requests, result sets.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A three-letter airport/city code, normalized to uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IataCode([u8; 3]);

impl IataCode {
    /// Parse a raw code. Accepts any case, rejects anything that is not
    /// exactly three ASCII letters.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_alphabetic()) {
            return Err(ValidationError::BadIata(raw.to_string()));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
        ]))
    }
}

impl std::fmt::Display for IataCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in self.0 {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for IataCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IataCode> for String {
    fn from(code: IataCode) -> Self {
        code.to_string()
    }
}

/// One normalized flight-price record from one provider for one date.
///
/// An offer with an absent price is still valid; it just ranks last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub price: Option<Decimal>,
    pub currency: String,
    pub airline: String,
    pub flight_number: String,
    /// Departure timestamp as the provider formatted it.
    pub departure_at: String,
    pub transfer_count: u32,
    pub origin: IataCode,
    pub destination: IataCode,
    /// Provider-supplied purchase link, preferred over template deeplinks.
    pub purchase_link: Option<String>,
}

impl Offer {
    /// Deduplication key: flight number when the provider gave one,
    /// otherwise the airline, paired with the departure timestamp.
    pub fn dedup_key(&self) -> (String, String) {
        let carrier = if self.flight_number.is_empty() {
            self.airline.clone()
        } else {
            self.flight_number.clone()
        };
        (carrier, self.departure_at.clone())
    }
}

/// One user search: route, departure date, flex window, result cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub origin: IataCode,
    pub destination: IataCode,
    pub depart_date: NaiveDate,
    pub date_flex_days: u32,
    pub result_limit: usize,
}

impl SearchRequest {
    pub fn new(
        origin: IataCode,
        destination: IataCode,
        depart_date: NaiveDate,
        date_flex_days: u32,
        result_limit: usize,
    ) -> Result<Self, ValidationError> {
        if origin == destination {
            return Err(ValidationError::SameRoute(origin.to_string()));
        }
        if depart_date < Utc::now().date_naive() {
            // Soft validation: past dates get a warning, not a rejection.
            tracing::warn!(%origin, %destination, date = %depart_date, "search date is in the past");
        }
        Ok(Self {
            origin,
            destination,
            depart_date,
            date_flex_days,
            result_limit,
        })
    }

    /// Every date in the `[-flex, +flex]` window around the departure date.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let flex = self.date_flex_days as i64;
        (-flex..=flex)
            .map(|shift| self.depart_date + chrono::Duration::days(shift))
            .collect()
    }

    /// Canonical serialization used for attribution hashing. Stable across
    /// renders of the same search.
    pub fn canonical_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.origin, self.destination, self.depart_date, self.date_flex_days
        )
    }
}

/// Ordered, deduplicated offers for one search. Replaced wholesale on every
/// new search, never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedResultSet {
    pub offers: Vec<Offer>,
}

impl RankedResultSet {
    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Offer> {
        self.offers.get(index)
    }
}

//! Pure merge step: dedup, rank, truncate.
//!
//! Dedup key policy: flight number when present, airline otherwise, paired
//! with the departure timestamp. Collapsing cross-provider duplicates that
//! carry no flight number is deliberately lossy in favor of display
//! cleanliness; distinct flight numbers on the same airline/slot survive.

use std::collections::HashSet;

use crate::model::{Offer, RankedResultSet};

/// Merge a flat pool of canonical offers into a ranked result set.
///
/// First-seen-wins dedup in pool order, then a stable ascending price sort
/// (absent price ranks last), then truncation to `limit`. Idempotent:
/// merging an already-merged set with itself yields the same set.
pub fn merge_offers(pool: Vec<Offer>, limit: usize) -> RankedResultSet {
    let mut seen = HashSet::new();
    let mut unique: Vec<Offer> = Vec::with_capacity(pool.len());
    for offer in pool {
        if seen.insert(offer.dedup_key()) {
            unique.push(offer);
        }
    }

    // Stable sort keeps pool order for price ties, so repeated runs on
    // identical input are deterministic.
    unique.sort_by(|a, b| match (a.price, b.price) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    unique.truncate(limit);
    RankedResultSet { offers: unique }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::model::IataCode;

    fn offer(price: Option<i64>, airline: &str, flight: &str, departure: &str) -> Offer {
        Offer {
            price: price.map(Decimal::from),
            currency: "uzs".into(),
            airline: airline.into(),
            flight_number: flight.into(),
            departure_at: departure.into(),
            transfer_count: 0,
            origin: IataCode::parse("TAS").unwrap(),
            destination: IataCode::parse("DXB").unwrap(),
            purchase_link: None,
        }
    }

    #[test]
    fn sorts_ascending_by_price() {
        let merged = merge_offers(
            vec![
                offer(Some(300), "A", "A-1", "t1"),
                offer(Some(100), "B", "B-1", "t2"),
                offer(Some(200), "C", "C-1", "t3"),
            ],
            10,
        );
        let prices: Vec<_> = merged.offers.iter().map(|o| o.price.unwrap()).collect();
        assert_eq!(
            prices,
            vec![Decimal::from(100), Decimal::from(200), Decimal::from(300)]
        );
    }

    #[test]
    fn absent_price_ranks_strictly_last() {
        let merged = merge_offers(
            vec![
                offer(None, "A", "A-1", "t1"),
                offer(Some(900), "B", "B-1", "t2"),
                offer(None, "C", "C-1", "t3"),
            ],
            10,
        );
        assert_eq!(merged.offers[0].airline, "B");
        assert!(merged.offers[1].price.is_none());
        assert!(merged.offers[2].price.is_none());
    }

    #[test]
    fn ties_keep_pool_order() {
        let merged = merge_offers(
            vec![
                offer(Some(100), "first", "F-1", "t1"),
                offer(Some(100), "second", "S-1", "t2"),
                offer(Some(100), "third", "T-1", "t3"),
            ],
            10,
        );
        let airlines: Vec<_> = merged.offers.iter().map(|o| o.airline.as_str()).collect();
        assert_eq!(airlines, vec!["first", "second", "third"]);
    }

    #[test]
    fn cross_provider_duplicate_keeps_first_seen_price() {
        // Two providers, same airline and departure slot, no flight numbers.
        let merged = merge_offers(
            vec![
                offer(Some(100), "X", "", "2025-11-05T08:00"),
                offer(Some(120), "X", "", "2025-11-05T08:00"),
            ],
            10,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.offers[0].price, Some(Decimal::from(100)));
    }

    #[test]
    fn distinct_flight_numbers_survive_same_slot() {
        let merged = merge_offers(
            vec![
                offer(Some(100), "X", "X-1", "2025-11-05T08:00"),
                offer(Some(120), "X", "X-2", "2025-11-05T08:00"),
            ],
            10,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_is_idempotent() {
        let pool = vec![
            offer(Some(300), "A", "", "t1"),
            offer(None, "B", "", "t2"),
            offer(Some(100), "C", "", "t3"),
            offer(Some(100), "C", "", "t3"),
            offer(Some(200), "D", "", "t4"),
        ];
        let once = merge_offers(pool, 3);
        let twice = merge_offers(once.offers.clone(), 3);
        assert_eq!(once, twice);
    }

    #[test]
    fn truncates_to_limit() {
        let pool = (0..20)
            .map(|i| offer(Some(i), "A", &format!("A-{i}"), &format!("t{i}")))
            .collect();
        let merged = merge_offers(pool, 10);
        assert_eq!(merged.len(), 10);
    }

    #[test]
    fn repeated_merge_is_byte_identical() {
        let pool: Vec<_> = [
            (Some(500), "E"),
            (Some(100), "A"),
            (None, "Z"),
            (Some(100), "B"),
        ]
        .iter()
        .enumerate()
        .map(|(i, (p, a))| offer(*p, a, "", &format!("t{i}")))
        .collect();

        let a = serde_json::to_vec(&merge_offers(pool.clone(), 10)).unwrap();
        let b = serde_json::to_vec(&merge_offers(pool, 10)).unwrap();
        assert_eq!(a, b);
    }
}

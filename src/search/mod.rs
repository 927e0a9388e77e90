//! Search orchestration — concurrent fan-out across providers and dates.

pub mod merge;

use std::sync::Arc;

use crate::model::{RankedResultSet, SearchRequest};
use crate::providers::ProviderAdapter;

/// Fans one search out over every configured provider and every date in the
/// flex window, then merges whatever came back.
///
/// Partial failure is the normal case: a failing or empty adapter call
/// contributes zero offers and never aborts the others. An all-empty
/// fan-out yields an empty result set, not an error.
pub struct SearchOrchestrator {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl SearchOrchestrator {
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self { adapters }
    }

    pub async fn search(&self, request: &SearchRequest) -> RankedResultSet {
        let mut calls = Vec::new();
        for date in request.dates() {
            for adapter in &self.adapters {
                let adapter = Arc::clone(adapter);
                let (origin, destination) = (request.origin, request.destination);
                let limit = request.result_limit;
                calls.push(async move { adapter.fetch(origin, destination, date, limit).await });
            }
        }

        let pools = futures::future::join_all(calls).await;
        let pool: Vec<_> = pools.into_iter().flatten().collect();

        tracing::debug!(
            origin = %request.origin,
            destination = %request.destination,
            date = %request.depart_date,
            flex = request.date_flex_days,
            collected = pool.len(),
            "provider fan-out complete"
        );

        merge::merge_offers(pool, request.result_limit)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{IataCode, Offer};

    /// Stub source returning one offer per queried date, recording calls.
    struct OnePerDay {
        calls: Mutex<Vec<NaiveDate>>,
    }

    #[async_trait]
    impl ProviderAdapter for OnePerDay {
        fn name(&self) -> &str {
            "one-per-day"
        }

        async fn fetch(
            &self,
            origin: IataCode,
            destination: IataCode,
            date: NaiveDate,
            _limit: usize,
        ) -> Vec<Offer> {
            self.calls.lock().unwrap().push(date);
            vec![Offer {
                price: Some(rust_decimal::Decimal::from(100)),
                currency: "usd".into(),
                airline: "XX".into(),
                flight_number: format!("XX-{date}"),
                departure_at: format!("{date}T08:00"),
                transfer_count: 0,
                origin,
                destination,
                purchase_link: None,
            }]
        }
    }

    struct AlwaysEmpty;

    #[async_trait]
    impl ProviderAdapter for AlwaysEmpty {
        fn name(&self) -> &str {
            "empty"
        }

        async fn fetch(
            &self,
            _origin: IataCode,
            _destination: IataCode,
            _date: NaiveDate,
            _limit: usize,
        ) -> Vec<Offer> {
            Vec::new()
        }
    }

    fn request(flex: u32) -> SearchRequest {
        SearchRequest::new(
            IataCode::parse("TAS").unwrap(),
            IataCode::parse("DXB").unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 5).unwrap(),
            flex,
            40,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn flex_window_collects_one_offer_per_day() {
        let adapter = Arc::new(OnePerDay {
            calls: Mutex::new(Vec::new()),
        });
        let orchestrator = SearchOrchestrator::new(vec![adapter.clone()]);

        let results = orchestrator.search(&request(3)).await;

        // Distinct flight numbers per day, so nothing dedups away.
        assert_eq!(results.len(), 7);
        assert_eq!(adapter.calls.lock().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn empty_providers_yield_empty_set_not_error() {
        let orchestrator =
            SearchOrchestrator::new(vec![Arc::new(AlwaysEmpty), Arc::new(AlwaysEmpty)]);
        let results = orchestrator.search(&request(2)).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn one_failing_source_does_not_hide_the_other() {
        let good = Arc::new(OnePerDay {
            calls: Mutex::new(Vec::new()),
        });
        let orchestrator =
            SearchOrchestrator::new(vec![Arc::new(AlwaysEmpty), good]);
        let results = orchestrator.search(&request(0)).await;
        assert_eq!(results.len(), 1);
    }
}

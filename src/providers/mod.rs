//! Provider adapters — one bounded-time price query per (route, date).
//!
//! Adapters never let a failure past their boundary: timeouts, bad
//! statuses, and malformed payloads all collapse to an empty offer list.

pub mod aviasales;
pub mod normalize;
pub mod travelpayouts;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::ProviderError;
use crate::model::{IataCode, Offer};

pub use aviasales::AviasalesAdapter;
pub use travelpayouts::TravelpayoutsAdapter;

/// One external travel-price source.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch offers for one route and date. Returns an empty list on any
    /// failure; never errors.
    async fn fetch(
        &self,
        origin: IataCode,
        destination: IataCode,
        date: NaiveDate,
        limit: usize,
    ) -> Vec<Offer>;
}

/// Run a provider call with a single jittered retry, collapsing any
/// remaining failure to an empty list.
pub(crate) async fn fetch_with_retry<F, Fut>(name: &str, backoff: Duration, op: F) -> Vec<Offer>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Vec<Offer>, ProviderError>>,
{
    match op().await {
        Ok(offers) => return offers,
        Err(err) => {
            tracing::warn!(provider = name, %err, "provider call failed, retrying once");
        }
    }

    let jitter = {
        use rand::Rng;
        rand::thread_rng().gen_range(0..250)
    };
    tokio::time::sleep(backoff + Duration::from_millis(jitter)).await;

    match op().await {
        Ok(offers) => offers,
        Err(err) => {
            tracing::warn!(provider = name, %err, "provider call failed after retry, treating as empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn retry_recovers_from_one_failure() {
        let calls = AtomicU32::new(0);
        let offers = fetch_with_retry("test", Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ProviderError::RequestFailed {
                        name: "test".into(),
                        reason: "transient".into(),
                    })
                } else {
                    Ok(Vec::new())
                }
            }
        })
        .await;
        assert!(offers.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn persistent_failure_collapses_to_empty() {
        let offers = fetch_with_retry("test", Duration::from_millis(1), || async {
            Err(ProviderError::BadStatus {
                name: "test".into(),
                status: 503,
            })
        })
        .await;
        assert!(offers.is_empty());
    }
}

//! Affiliate deeplink construction.
//!
//! Links are deterministic: identical (offer, request, user) inputs always
//! yield the identical URL, so re-rendering a result page never fragments
//! attribution tracking.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::model::{Offer, SearchRequest};

const SEARCH_BASE: &str = "https://www.aviasales.com/search";

/// Builds attribution-tagged purchase links.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    marker: String,
    sub_id: Option<String>,
    currency: String,
    locale: String,
}

impl LinkBuilder {
    pub fn new(marker: String, sub_id: Option<String>, currency: String, locale: String) -> Self {
        Self {
            marker,
            sub_id,
            currency,
            locale,
        }
    }

    /// Build a purchase link for one offer.
    ///
    /// A provider-supplied purchase link wins verbatim; otherwise a search
    /// deeplink is assembled from the route, date, marker, and a stable
    /// attribution token. The returned string is only ever rendered as an
    /// opaque button URL, never as message text.
    pub fn build(&self, offer: &Offer, request: &SearchRequest, user_id: &str) -> String {
        if let Some(link) = &offer.purchase_link {
            return link.clone();
        }

        let token = attribution_token(user_id, request);
        let sub_id = match &self.sub_id {
            Some(prefix) => format!("{prefix}-{token:x}"),
            None => format!("{token:x}"),
        };
        let ddmm = request.depart_date.format("%d%m");

        format!(
            "{SEARCH_BASE}/{}{}{ddmm}?marker={}&currency={}&locale={}&sub_id={sub_id}",
            request.origin, request.destination, self.marker, self.currency, self.locale
        )
    }
}

/// Stable attribution token derived from the user and the canonical
/// serialization of the request.
pub fn attribution_token(user_id: &str, request: &SearchRequest) -> u64 {
    let mut hasher = DefaultHasher::new();
    user_id.hash(&mut hasher);
    request.canonical_key().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::IataCode;

    fn request() -> SearchRequest {
        SearchRequest::new(
            IataCode::parse("TAS").unwrap(),
            IataCode::parse("DXB").unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 5).unwrap(),
            3,
            40,
        )
        .unwrap()
    }

    fn offer(purchase_link: Option<&str>) -> Offer {
        Offer {
            price: None,
            currency: "uzs".into(),
            airline: "HY".into(),
            flight_number: "HY-601".into(),
            departure_at: "2025-11-05T08:00".into(),
            transfer_count: 0,
            origin: IataCode::parse("TAS").unwrap(),
            destination: IataCode::parse("DXB").unwrap(),
            purchase_link: purchase_link.map(String::from),
        }
    }

    fn builder() -> LinkBuilder {
        LinkBuilder::new(
            "12345".into(),
            Some("tg".into()),
            "uzs".into(),
            "ru".into(),
        )
    }

    #[test]
    fn identical_inputs_yield_identical_links() {
        let b = builder();
        let first = b.build(&offer(None), &request(), "user-1");
        let second = b.build(&offer(None), &request(), "user-1");
        assert_eq!(first, second);
    }

    #[test]
    fn different_users_get_different_tokens() {
        let b = builder();
        let a = b.build(&offer(None), &request(), "user-1");
        let c = b.build(&offer(None), &request(), "user-2");
        assert_ne!(a, c);
    }

    #[test]
    fn provider_link_wins_verbatim() {
        let b = builder();
        let link = b.build(&offer(Some("https://example.com/buy?x=1")), &request(), "u");
        assert_eq!(link, "https://example.com/buy?x=1");
    }

    #[test]
    fn template_link_carries_route_date_and_marker() {
        let link = builder().build(&offer(None), &request(), "user-1");
        assert!(link.starts_with("https://www.aviasales.com/search/TASDXB0511?"));
        assert!(link.contains("marker=12345"));
        assert!(link.contains("sub_id=tg-"));
    }

    #[test]
    fn token_is_stable_for_equal_requests() {
        assert_eq!(
            attribution_token("u", &request()),
            attribution_token("u", &request())
        );
    }
}

//! Rendering: reply texts, result cards, and button sets.
//!
//! Purchase links never appear in message bodies; they only ever ride on
//! URL buttons.

use rust_decimal::Decimal;

use crate::catalog;
use crate::error::ValidationError;
use crate::flow::{Event, FlowState};
use crate::model::{IataCode, Offer, RankedResultSet, SearchRequest};
use crate::tiering::PageView;

/// A labeled actionable element attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Opaque callback payload routed back as an [`Event`].
    Callback(String),
    /// External URL opened by the chat client.
    Url(String),
}

impl Button {
    pub fn callback(label: impl Into<String>, event: &Event) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(event.callback_data()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }
}

/// One rendered reply: text, buttons, optional popup alert, and whether the
/// client should offer a contact-share keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub text: String,
    pub buttons: Vec<Button>,
    pub alert: Option<String>,
    pub request_contact: bool,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }

    /// A popup-only reply (answers the callback, sends no message).
    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            alert: Some(text.into()),
            ..Default::default()
        }
    }

    /// An intentionally empty reply, used to drop stale results silently.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn is_silent(&self) -> bool {
        self.text.is_empty() && self.buttons.is_empty() && self.alert.is_none()
    }
}

// ── Flow prompts ────────────────────────────────────────────────────

pub fn origin_prompt() -> Reply {
    Reply::text("✈️ Choose a <b>departure city</b>:").with_buttons(city_buttons(None, "origin"))
}

pub fn idle_prompt() -> Reply {
    Reply::text("Hi! I find the cheapest flights on your routes.\nThe top 3 results are free; the rest unlock after a small service fee.")
        .with_buttons(vec![Button::callback("Start a search 🔍", &Event::Start)])
}

pub fn destination_prompt(origin: IataCode) -> Reply {
    Reply::text(format!(
        "Departure: <b>{origin}</b>\nNow choose an <b>arrival city</b>:"
    ))
    .with_buttons(city_buttons(Some(origin), "dest"))
}

pub fn same_route_prompt(origin: IataCode) -> Reply {
    let mut reply = destination_prompt(origin);
    reply.alert = Some("Destination must differ from the origin".to_string());
    reply
}

pub fn date_prompt(origin: IataCode, destination: IataCode) -> Reply {
    Reply::text(format!(
        "Route: <b>{origin} → {destination}</b>\nPick a departure date, or send one as <code>YYYY-MM-DD</code>:"
    ))
    .with_buttons(vec![
        Button {
            label: "Today".into(),
            action: ButtonAction::Callback("date:today".into()),
        },
        Button {
            label: "Tomorrow".into(),
            action: ButtonAction::Callback("date:tomorrow".into()),
        },
        Button::callback("↩️ Start over", &Event::Start),
    ])
}

/// Corrective prompt for an event that is valid somewhere, just not here.
pub fn corrective(state: FlowState) -> Reply {
    let hint = match state {
        FlowState::Idle => "Send /start to begin a search.",
        FlowState::SelectingOrigin => "Please choose a departure city first.",
        FlowState::SelectingDestination => "Please choose an arrival city first.",
        FlowState::SelectingDate => "Please pick a departure date first.",
        FlowState::ShowingResults => "Pick one of the offers above, or start a new search.",
        FlowState::AwaitingContact => "Please share a phone number to finish, or start a new search.",
    };
    Reply::text(hint).with_buttons(vec![Button::callback("New search", &Event::Start)])
}

/// Data-integrity fault: prerequisites missing, instruct a restart.
pub fn restart_prompt() -> Reply {
    Reply::text("Something went wrong with this search. Please start again.")
        .with_buttons(vec![Button::callback("Start over", &Event::Start)])
}

pub fn validation_prompt(err: &ValidationError) -> Reply {
    let example = match err {
        ValidationError::BadIata(_) => "Example: TAS",
        ValidationError::SameRoute(_) => "Choose a different arrival city.",
    };
    Reply::text(format!("{err}\n{example}"))
}

pub fn no_results(request: &SearchRequest) -> Reply {
    Reply::text(format!(
        "{}\n\nNothing found. Try another date or route.",
        route_header(request)
    ))
    .with_buttons(vec![Button::callback("New search", &Event::Start)])
}

pub fn no_more_results_alert() -> Reply {
    Reply::alert("No more results")
}

pub fn out_of_range_alert() -> Reply {
    Reply::alert("That offer is not available")
}

/// One page of ranked results with buy buttons, paging, and the gated-tail
/// notice for free-tier users.
pub fn results_page(
    request: &SearchRequest,
    results: &RankedResultSet,
    view: &PageView,
    pay_link: Option<&str>,
) -> Reply {
    let mut text = route_header(request);
    text.push_str("\n\n");

    let mut lines = Vec::new();
    for (i, offer) in results.offers[view.start..view.end].iter().enumerate() {
        lines.push(offer_card(view.start + i + 1, offer));
    }
    text.push_str(&lines.join("\n\n"));

    let mut buttons: Vec<Button> = (view.start..view.end)
        .map(|idx| Button::callback(format!("Buy #{} 💳", idx + 1), &Event::SelectOffer(idx)))
        .collect();

    if view.gated_count > 0 {
        text.push_str(&format!(
            "\n\n🔒 {} more offer(s) available after the service fee.",
            view.gated_count
        ));
        if let Some(link) = pay_link {
            buttons.push(Button::url("Pay the service fee 💳", link));
        }
    }

    if view.has_more {
        buttons.push(Button::callback("Show more", &Event::ShowMore));
    }
    buttons.push(Button::callback("New search", &Event::Start));

    Reply::text(text).with_buttons(buttons)
}

/// Selection summary with the purchase-link button and a contact request.
pub fn contact_prompt(number: usize, offer: &Offer, purchase_url: String) -> Reply {
    let mut reply = Reply::text(format!(
        "You picked option #{number}:\n{}\n\nShare a phone number and our manager will arrange the purchase.",
        offer_card(number, offer)
    ));
    reply.buttons = vec![Button::url("Open on the site ✈️", purchase_url)];
    reply.request_contact = true;
    reply
}

pub fn thanks() -> Reply {
    Reply::text("Thank you! Our manager will contact you shortly.")
        .with_buttons(vec![Button::callback("New search", &Event::Start)])
}

fn city_buttons(exclude: Option<IataCode>, stage: &str) -> Vec<Button> {
    let exclude = exclude.map(|c| c.to_string());
    catalog::CITIES
        .iter()
        .filter(|city| exclude.as_deref() != Some(city.code))
        .map(|city| Button {
            label: format!("{} ({})", city.label, city.code),
            action: ButtonAction::Callback(format!("{stage}:{}", city.code)),
        })
        .collect()
}

// ── Formatting helpers ──────────────────────────────────────────────

fn route_header(request: &SearchRequest) -> String {
    format!(
        "✈️ <b>{} → {}</b>\n📅 {}",
        request.origin,
        request.destination,
        request.depart_date.format("%d.%m.%Y")
    )
}

fn offer_card(number: usize, offer: &Offer) -> String {
    let transfers = match offer.transfer_count {
        0 => "direct".to_string(),
        n => format!("{n} transfer(s)"),
    };
    let flight = if offer.flight_number.is_empty() {
        offer.airline.clone()
    } else if offer.airline.is_empty() {
        offer.flight_number.clone()
    } else {
        format!("{} {}", offer.airline, offer.flight_number)
    };
    format!(
        "{number}. 💸 <b>{}</b> • {transfers}\n   ✈️ {flight}\n   🛫 {}",
        fmt_price(offer.price.as_ref(), &offer.currency),
        fmt_departure(&offer.departure_at),
    )
}

/// "1 250 000 UZS", or an em-dash-free placeholder for absent prices.
pub fn fmt_price(price: Option<&Decimal>, currency: &str) -> String {
    match price {
        None => "n/a".to_string(),
        Some(p) => format!(
            "{} {}",
            group_thousands(&p.trunc().to_string()),
            currency.to_uppercase()
        ),
    }
}

/// Trim a provider timestamp to "YYYY-MM-DD HH:MM" for display.
pub fn fmt_departure(raw: &str) -> String {
    if raw.is_empty() {
        return "n/a".to_string();
    }
    raw.chars().take(16).map(|c| if c == 'T' { ' ' } else { c }).collect()
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    format!("{sign}{grouped}")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;

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

    fn offers(n: usize) -> RankedResultSet {
        RankedResultSet {
            offers: (0..n)
                .map(|i| Offer {
                    price: Some(Decimal::from(100_000 * (i as i64 + 1))),
                    currency: "uzs".into(),
                    airline: "HY".into(),
                    flight_number: format!("HY-{i}"),
                    departure_at: "2025-11-05T08:00:00".into(),
                    transfer_count: 0,
                    origin: IataCode::parse("TAS").unwrap(),
                    destination: IataCode::parse("DXB").unwrap(),
                    purchase_link: None,
                })
                .collect(),
        }
    }

    #[test]
    fn price_formatting() {
        assert_eq!(
            fmt_price(Some(&Decimal::from(1_250_000)), "uzs"),
            "1 250 000 UZS"
        );
        assert_eq!(fmt_price(Some(&Decimal::from(950)), "usd"), "950 USD");
        assert_eq!(fmt_price(None, "uzs"), "n/a");
    }

    #[test]
    fn departure_formatting() {
        assert_eq!(fmt_departure("2025-11-05T08:30:00+05:00"), "2025-11-05 08:30");
        assert_eq!(fmt_departure(""), "n/a");
    }

    #[test]
    fn gated_notice_reveals_count_but_no_content() {
        let results = offers(10);
        let policy = crate::tiering::TierPolicy::default();
        let view = policy.page(10, false, 0);
        let reply = results_page(&request(), &results, &view, None);

        assert!(reply.text.contains("7 more offer(s)"));
        // Gated offers' prices must not leak.
        assert!(!reply.text.contains("400 000"));
        assert!(reply.text.contains("100 000"));
        assert!(reply.text.contains("300 000"));
    }

    #[test]
    fn pay_button_only_when_link_exists() {
        let results = offers(10);
        let policy = crate::tiering::TierPolicy::default();
        let view = policy.page(10, false, 0);

        let without = results_page(&request(), &results, &view, None);
        assert!(without.buttons.iter().all(|b| !matches!(b.action, ButtonAction::Url(_))));

        let with = results_page(&request(), &results, &view, Some("https://pay.example"));
        assert!(with.buttons.iter().any(|b| matches!(
            &b.action,
            ButtonAction::Url(u) if u == "https://pay.example"
        )));
    }

    #[test]
    fn show_more_button_tracks_has_more() {
        let results = offers(12);
        let policy = crate::tiering::TierPolicy::default();

        let page0 = results_page(&request(), &results, &policy.page(12, true, 0), None);
        assert!(page0.buttons.iter().any(|b| b.label == "Show more"));

        let page2 = results_page(&request(), &results, &policy.page(12, true, 2), None);
        assert!(page2.buttons.iter().all(|b| b.label != "Show more"));
    }

    #[test]
    fn buy_buttons_carry_global_indices() {
        let results = offers(12);
        let policy = crate::tiering::TierPolicy::default();
        let reply = results_page(&request(), &results, &policy.page(12, true, 1), None);

        let callbacks: Vec<_> = reply
            .buttons
            .iter()
            .filter_map(|b| match &b.action {
                ButtonAction::Callback(c) if c.starts_with("buy:") => Some(c.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(callbacks, vec!["buy:5", "buy:6", "buy:7", "buy:8", "buy:9"]);
    }

    #[test]
    fn contact_prompt_puts_link_on_button_not_in_text() {
        let results = offers(1);
        let reply = contact_prompt(1, &results.offers[0], "https://buy.example/x".into());
        assert!(reply.request_contact);
        assert!(!reply.text.contains("https://buy.example/x"));
        assert!(matches!(
            &reply.buttons[0].action,
            ButtonAction::Url(u) if u == "https://buy.example/x"
        ));
    }
}

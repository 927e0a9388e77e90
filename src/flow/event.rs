//! Discrete UI events, parsed from callback payloads at the transport
//! boundary into a closed enum. Dispatch is exhaustive matching, never
//! string comparison in handlers.

use chrono::{NaiveDate, Utc};

use crate::model::IataCode;

/// One user event, exactly as the state machine consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin a new search (also valid mid-flow, restarts from origin).
    Start,
    /// Discard the session and return to idle.
    Reset,
    OriginChosen(IataCode),
    DestinationChosen(IataCode),
    DateChosen(NaiveDate),
    ShowMore,
    /// Select offer by zero-based index into the ranked set.
    SelectOffer(usize),
    /// Contact phone captured from the user.
    ContactProvided(String),
}

impl Event {
    /// Parse a callback payload. Unknown or malformed payloads yield `None`
    /// and are dropped at the transport with a warning.
    ///
    /// `date:today` and `date:tomorrow` shortcuts resolve against the
    /// current UTC date.
    pub fn from_callback(data: &str) -> Option<Event> {
        match data {
            "start" => return Some(Event::Start),
            "reset" => return Some(Event::Reset),
            "more" => return Some(Event::ShowMore),
            _ => {}
        }

        let (tag, rest) = data.split_once(':')?;
        match tag {
            "origin" => IataCode::parse(rest).ok().map(Event::OriginChosen),
            "dest" => IataCode::parse(rest).ok().map(Event::DestinationChosen),
            "date" => match rest {
                "today" => Some(Event::DateChosen(Utc::now().date_naive())),
                "tomorrow" => Some(Event::DateChosen(
                    Utc::now().date_naive() + chrono::Duration::days(1),
                )),
                iso => NaiveDate::parse_from_str(iso, "%Y-%m-%d")
                    .ok()
                    .map(Event::DateChosen),
            },
            "buy" => rest.parse().ok().map(Event::SelectOffer),
            "contact" => Some(Event::ContactProvided(rest.to_string())),
            _ => None,
        }
    }

    /// The callback payload carried by a button for this event.
    pub fn callback_data(&self) -> String {
        match self {
            Event::Start => "start".to_string(),
            Event::Reset => "reset".to_string(),
            Event::ShowMore => "more".to_string(),
            Event::OriginChosen(code) => format!("origin:{code}"),
            Event::DestinationChosen(code) => format!("dest:{code}"),
            Event::DateChosen(date) => format!("date:{date}"),
            Event::SelectOffer(index) => format!("buy:{index}"),
            Event::ContactProvided(phone) => format!("contact:{phone}"),
        }
    }

    /// Short tag for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::Reset => "reset",
            Event::OriginChosen(_) => "origin_chosen",
            Event::DestinationChosen(_) => "destination_chosen",
            Event::DateChosen(_) => "date_chosen",
            Event::ShowMore => "show_more",
            Event::SelectOffer(_) => "select_offer",
            Event::ContactProvided(_) => "contact_provided",
        }
    }
}

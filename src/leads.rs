//! Lead capture — the handoff to a human follow-up process.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChannelError;
use crate::model::IataCode;
use crate::render;

/// A captured contact plus the selected-offer summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub user_id: String,
    /// Handle/full-name line for the managers message.
    pub user_display: String,
    pub origin: IataCode,
    pub destination: IataCode,
    pub depart_date: NaiveDate,
    /// 1-based option number as the user saw it.
    pub option_number: usize,
    pub price: Option<Decimal>,
    pub currency: String,
    pub airline: String,
    pub departure_at: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    /// Message body posted to the managers chat.
    pub fn summary(&self) -> String {
        format!(
            "🧾 Ticket purchase request\n\
             Route: {} → {}\n\
             Date: {}\n\
             Option: #{}\n\
             Price: {}\n\
             Airline: {}\n\
             Departure: {}\n\
             Phone: {}\n\
             User: {}",
            self.origin,
            self.destination,
            self.depart_date.format("%d.%m.%Y"),
            self.option_number,
            render::fmt_price(self.price.as_ref(), &self.currency),
            self.airline,
            render::fmt_departure(&self.departure_at),
            self.phone,
            self.user_display,
        )
    }
}

/// Where completed leads go.
#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn submit(&self, lead: Lead) -> Result<(), ChannelError>;
}

/// Posts lead summaries to a Telegram managers chat.
pub struct TelegramLeadSink {
    client: reqwest::Client,
    bot_token: String,
    chat_id: i64,
}

impl TelegramLeadSink {
    pub fn new(client: reqwest::Client, bot_token: String, chat_id: i64) -> Self {
        Self {
            client,
            bot_token,
            chat_id,
        }
    }
}

#[async_trait]
impl LeadSink for TelegramLeadSink {
    async fn submit(&self, lead: Lead) -> Result<(), ChannelError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": lead.summary(),
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "managers-chat".into(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ChannelError::SendFailed {
                name: "managers-chat".into(),
                reason: format!("sendMessage returned {status}"),
            });
        }

        tracing::info!(lead = %lead.id, "lead delivered to managers chat");
        Ok(())
    }
}

/// Fallback sink when no managers chat is configured: leads land in the log.
pub struct LogLeadSink;

#[async_trait]
impl LeadSink for LogLeadSink {
    async fn submit(&self, lead: Lead) -> Result<(), ChannelError> {
        tracing::info!(lead = %lead.id, summary = %lead.summary(), "lead captured");
        Ok(())
    }
}

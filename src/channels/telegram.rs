//! Telegram transport — long-polls the Bot API for messages and callbacks.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::channels::{ChatTransport, EventStream, IncomingEvent};
use crate::error::ChannelError;
use crate::flow::{Event, UserRef};
use crate::render::{Button, ButtonAction, Reply};

/// Telegram Bot API transport.
pub struct TelegramTransport {
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramTransport {
    pub fn new(bot_token: String, client: reqwest::Client) -> Self {
        Self { bot_token, client }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    /// Send an HTML message, falling back to plain text if Telegram rejects
    /// the markup.
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_markup: Option<Value>,
    ) -> Result<(), ChannelError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        if let Some(markup) = &reply_markup {
            body["reply_markup"] = markup.clone();
        }

        let response = self.post("sendMessage", &body).await?;
        if response.status().is_success() {
            return Ok(());
        }

        let html_status = response.status();
        tracing::warn!(status = ?html_status, "sendMessage with HTML failed, retrying without parse_mode");

        let mut plain = json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        if let Some(markup) = reply_markup {
            plain["reply_markup"] = markup;
        }
        let response = self.post("sendMessage", &plain).await?;
        if !response.status().is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!("sendMessage failed (html: {html_status}, plain: {reason})"),
            });
        }
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        alert: Option<&str>,
    ) -> Result<(), ChannelError> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = alert {
            body["text"] = json!(text);
            body["show_alert"] = json!(true);
        }
        self.post("answerCallbackQuery", &body).await.map(|_| ())
    }

    async fn post(&self, method: &str, body: &Value) -> Result<reqwest::Response, ChannelError> {
        self.client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let bot_token = self.bot_token.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;
            tracing::info!("Telegram transport listening for updates...");

            loop {
                let url = format!("https://api.telegram.org/bot{bot_token}/getUpdates");
                let body = json!({
                    "offset": offset,
                    "timeout": 30,
                    "allowed_updates": ["message", "callback_query"],
                });

                let response = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let data: Value = match response.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let Some(updates) = data.get("result").and_then(Value::as_array) else {
                    continue;
                };

                for update in updates {
                    if let Some(update_id) = update.get("update_id").and_then(Value::as_i64) {
                        offset = update_id + 1;
                    }
                    let Some(incoming) = decode_update(update) else {
                        // Free-form text we could not understand still gets
                        // a corrective example; bad callbacks are just logged.
                        let unparsed_text = update
                            .get("message")
                            .filter(|m| m.get("text").is_some())
                            .and_then(|m| m.get("chat"))
                            .and_then(|c| c.get("id"))
                            .and_then(Value::as_i64);
                        if let Some(chat_id) = unparsed_text {
                            let hint = json!({
                                "chat_id": chat_id,
                                "text": "I did not understand that. Send a date as YYYY-MM-DD, or use the buttons.",
                            });
                            let url =
                                format!("https://api.telegram.org/bot{bot_token}/sendMessage");
                            if let Err(e) = client.post(&url).json(&hint).send().await {
                                tracing::debug!("hint send failed: {e}");
                            }
                        }
                        continue;
                    };
                    if tx.send(incoming).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });
        Ok(Box::pin(stream))
    }

    async fn deliver(&self, incoming: &IncomingEvent, reply: Reply) -> Result<(), ChannelError> {
        // Always acknowledge the callback so the client stops its spinner;
        // carry the alert text when the reply is a popup.
        if let Some(callback_id) = &incoming.callback_id {
            self.answer_callback(callback_id, reply.alert.as_deref())
                .await?;
        } else if let Some(alert) = &reply.alert {
            // No callback to attach the popup to: degrade to a message.
            self.send_message(&incoming.chat_id, alert, None).await?;
        }

        if reply.text.is_empty() {
            return Ok(());
        }

        let markup = inline_keyboard(&reply.buttons);
        self.send_message(&incoming.chat_id, &reply.text, markup)
            .await?;

        // Inline and reply keyboards cannot share a message, so the contact
        // request goes out as a short follow-up.
        if reply.request_contact {
            self.send_message(
                &incoming.chat_id,
                "Tap below to share your phone number:",
                Some(contact_keyboard()),
            )
            .await?;
        }
        Ok(())
    }

    async fn notify_busy(&self, incoming: &IncomingEvent) -> Result<(), ChannelError> {
        let body = json!({ "chat_id": incoming.chat_id, "action": "typing" });
        let _ = self.post("sendChatAction", &body).await;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let response = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", response.status()),
            })
        }
    }
}

// ── Update decoding ─────────────────────────────────────────────────

/// Decode one Bot API update into an event the engine understands.
/// Unknown payloads are dropped with a warning.
fn decode_update(update: &Value) -> Option<IncomingEvent> {
    if let Some(callback) = update.get("callback_query") {
        let data = callback.get("data").and_then(Value::as_str)?;
        let Some(event) = Event::from_callback(data) else {
            tracing::warn!(data, "ignoring unknown callback payload");
            return None;
        };
        let user = user_ref(callback.get("from")?)?;
        let chat_id = callback
            .get("message")
            .and_then(|m| m.get("chat"))
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64)?
            .to_string();
        let callback_id = callback.get("id").and_then(Value::as_str).map(String::from);
        return Some(IncomingEvent {
            user,
            chat_id,
            event,
            callback_id,
        });
    }

    let message = update.get("message")?;
    let user = user_ref(message.get("from")?)?;
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(Value::as_i64)?
        .to_string();

    let event = if let Some(contact) = message.get("contact") {
        let phone = contact.get("phone_number").and_then(Value::as_str)?;
        Event::ContactProvided(phone.to_string())
    } else {
        let text = message.get("text").and_then(Value::as_str)?.trim();
        match text {
            "/start" => Event::Start,
            "/reset" => Event::Reset,
            // Manual date entry while picking a date.
            other => Event::from_callback(&format!("date:{other}"))?,
        }
    };

    Some(IncomingEvent {
        user,
        chat_id,
        event,
        callback_id: None,
    })
}

fn user_ref(from: &Value) -> Option<UserRef> {
    let id = from.get("id").and_then(Value::as_i64)?;
    let username = from
        .get("username")
        .and_then(Value::as_str)
        .map(String::from);
    let first = from.get("first_name").and_then(Value::as_str);
    let last = from.get("last_name").and_then(Value::as_str);
    let full_name = match (first, last) {
        (Some(f), Some(l)) => Some(format!("{f} {l}")),
        (Some(f), None) => Some(f.to_string()),
        (None, Some(l)) => Some(l.to_string()),
        (None, None) => None,
    };
    Some(UserRef {
        id: id.to_string(),
        username,
        full_name,
    })
}

// ── Keyboards ───────────────────────────────────────────────────────

fn inline_keyboard(buttons: &[Button]) -> Option<Value> {
    if buttons.is_empty() {
        return None;
    }
    let rows: Vec<Value> = buttons
        .iter()
        .map(|button| match &button.action {
            ButtonAction::Callback(data) => {
                json!([{ "text": button.label, "callback_data": data }])
            }
            ButtonAction::Url(url) => json!([{ "text": button.label, "url": url }]),
        })
        .collect();
    Some(json!({ "inline_keyboard": rows }))
}

fn contact_keyboard() -> Value {
    json!({
        "keyboard": [[{ "text": "Share phone number 📱", "request_contact": true }]],
        "resize_keyboard": true,
        "one_time_keyboard": true,
    })
}

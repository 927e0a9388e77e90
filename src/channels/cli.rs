//! CLI transport — stdin/stdout REPL for local testing.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{ChatTransport, EventStream, IncomingEvent};
use crate::error::ChannelError;
use crate::flow::{Event, UserRef};
use crate::render::{ButtonAction, Reply};

/// A simple CLI transport that reads events from stdin and prints replies.
pub struct CliTransport;

impl CliTransport {
    pub fn new() -> Self {
        Self
    }
}

/// Accepts the same payloads the inline buttons would send ("origin:TAS",
/// "more", "buy:0"), plus the conveniences a human would type.
fn parse_line(line: &str) -> Option<Event> {
    match line {
        "/start" | "start" => Some(Event::Start),
        "/reset" | "reset" => Some(Event::Reset),
        other if other.starts_with('+') => Some(Event::ContactProvided(other.to_string())),
        other => Event::from_callback(other).or_else(|| Event::from_callback(&format!("date:{other}"))),
    }
}

#[async_trait]
impl ChatTransport for CliTransport {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let Some(event) = parse_line(line) else {
                            eprintln!("unrecognized input: {line}");
                            eprint!("> ");
                            continue;
                        };
                        let incoming = IncomingEvent {
                            user: UserRef::new("local-user"),
                            chat_id: "local".into(),
                            event,
                            callback_id: None,
                        };
                        if tx.send(incoming).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn deliver(&self, _incoming: &IncomingEvent, reply: Reply) -> Result<(), ChannelError> {
        if let Some(alert) = &reply.alert {
            eprintln!("⚠️  {alert}");
        }
        if !reply.text.is_empty() {
            println!("\n{}", reply.text);
        }
        for button in &reply.buttons {
            match &button.action {
                ButtonAction::Callback(data) => println!("  [{}] → {data}", button.label),
                ButtonAction::Url(url) => println!("  [{}] → {url}", button.label),
            }
        }
        if reply.request_contact {
            println!("  (type your phone number starting with + to share it)");
        }
        eprint!("> ");
        Ok(())
    }
}

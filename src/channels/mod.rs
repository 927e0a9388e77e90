//! Chat transport abstraction — event in, rendered reply out.

pub mod cli;
pub mod telegram;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;
use crate::flow::{Event, UserRef};
use crate::render::Reply;

pub use cli::CliTransport;
pub use telegram::TelegramTransport;

/// One decoded user event with enough context to answer it.
#[derive(Debug, Clone)]
pub struct IncomingEvent {
    pub user: UserRef,
    pub chat_id: String,
    pub event: Event,
    /// Callback-query id to acknowledge, when the event came from a button.
    pub callback_id: Option<String>,
}

pub type EventStream = Pin<Box<dyn Stream<Item = IncomingEvent> + Send>>;

/// A chat transport delivering events to the engine and replies back.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    fn name(&self) -> &str;

    /// Start listening; returns the stream of decoded events.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    /// Render one reply back to the chat the event came from.
    async fn deliver(&self, incoming: &IncomingEvent, reply: Reply) -> Result<(), ChannelError>;

    /// Optional "working on it" indicator while a search runs.
    async fn notify_busy(&self, _incoming: &IncomingEvent) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

//! Console adapter for development/testing

use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::IncomingEvent;
use crate::domain::traits::{GroupParticipant, Transport};

/// Console transport for local development: sends are printed, reactions
/// are shown inline, group metadata is empty.
pub struct ConsoleTransport;

impl ConsoleTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), BotError> {
        println!("[BOT -> {}] {}", chat_id, text);
        Ok(())
    }

    async fn mark_reaction(&self, event: &IncomingEvent, indicator: &str) -> Result<(), BotError> {
        println!("[BOT react {} on {}]", indicator, event.id);
        Ok(())
    }

    async fn fetch_group_metadata(
        &self,
        _chat_id: &str,
    ) -> Result<Vec<GroupParticipant>, BotError> {
        Ok(Vec::new())
    }
}

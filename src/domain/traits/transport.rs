use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::IncomingEvent;

/// One member of a group chat, with its role resolved.
#[derive(Debug, Clone)]
pub struct GroupParticipant {
    pub id: String,
    pub is_admin: bool,
}

/// Transport trait - abstraction over the messaging-network collaborator.
///
/// The dispatcher treats these purely as capabilities; connection
/// lifecycle, pairing and media belong to the adapter behind this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message to a chat.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), BotError>;

    /// Attach an indicator reaction (e.g. "❌") to the given event.
    async fn mark_reaction(&self, event: &IncomingEvent, indicator: &str) -> Result<(), BotError>;

    /// Fetch the participant list of a group chat, with roles.
    async fn fetch_group_metadata(&self, chat_id: &str) -> Result<Vec<GroupParticipant>, BotError>;
}

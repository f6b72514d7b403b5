use chrono::{DateTime, Utc};

/// An inbound event from the messaging network.
///
/// Constructed once by the host from whatever the transport delivered and
/// read-only from then on; the dispatcher never mutates it.
#[derive(Debug, Clone)]
pub struct IncomingEvent {
    pub id: String,
    pub raw_text: String,
    pub sender_id: String,
    pub chat_id: String,
    pub is_group: bool,
    pub is_admin: bool,
    pub is_bot_admin: bool,
    /// Emoji payload when this event is a reaction rather than typed text.
    pub reaction_text: Option<String>,
    /// Set when the bot itself authored the event; such events are ignored.
    pub from_me: bool,
    pub push_name: String,
    pub timestamp: DateTime<Utc>,
}

impl IncomingEvent {
    pub fn new(chat_id: impl Into<String>, sender_id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            raw_text: raw_text.into(),
            sender_id: sender_id.into(),
            chat_id: chat_id.into(),
            is_group: false,
            is_admin: false,
            is_bot_admin: false,
            reaction_text: None,
            from_me: false,
            push_name: "User".to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_group(mut self, is_group: bool) -> Self {
        self.is_group = is_group;
        self
    }

    pub fn with_admin_flags(mut self, is_admin: bool, is_bot_admin: bool) -> Self {
        self.is_admin = is_admin;
        self.is_bot_admin = is_bot_admin;
        self
    }

    pub fn with_reaction(mut self, reaction: impl Into<String>) -> Self {
        self.reaction_text = Some(reaction.into());
        self
    }

    pub fn with_from_me(mut self, from_me: bool) -> Self {
        self.from_me = from_me;
        self
    }

    pub fn with_push_name(mut self, name: impl Into<String>) -> Self {
        self.push_name = name.into();
        self
    }

    /// True when there is nothing to dispatch: no reaction payload and no
    /// non-whitespace text.
    pub fn is_empty(&self) -> bool {
        self.reaction_text.is_none() && self.raw_text.trim().is_empty()
    }
}

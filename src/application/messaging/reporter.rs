//! Error reporter - Contains handler failures, never propagates them

use std::sync::Arc;

use crate::application::errors::BotError;
use crate::domain::entities::IncomingEvent;
use crate::domain::traits::Transport;

const FAILURE_NOTICE: &str = "⚠️ Something went wrong while processing the command. Try again later.";

/// Contains unhandled failures from the dispatch pipeline: the sender gets
/// one generic notice, a fixed administrative identity gets the
/// diagnostic, and the event is marked with a failure indicator.
pub struct ErrorReporter {
    transport: Arc<dyn Transport>,
    admin_contact: String,
}

impl ErrorReporter {
    pub fn new(transport: Arc<dyn Transport>, admin_contact: impl Into<String>) -> Self {
        Self {
            transport,
            admin_contact: admin_contact.into(),
        }
    }

    /// Report one failure. Secondary failures while sending the
    /// notifications are logged and swallowed; this never returns an error.
    pub async fn report(&self, event: &IncomingEvent, error: &BotError) {
        tracing::error!(
            chat = %event.chat_id,
            sender = %event.sender_id,
            %error,
            "dispatch failed"
        );

        if let Err(e) = self.transport.send_message(&event.chat_id, FAILURE_NOTICE).await {
            tracing::warn!(%e, "failed to deliver failure notice");
        }

        let diagnostic = format!(
            "Dispatch error for {} in {}: {}\ntext: {}",
            event.sender_id, event.chat_id, error, event.raw_text
        );
        if let Err(e) = self.transport.send_message(&self.admin_contact, &diagnostic).await {
            tracing::warn!(%e, "failed to forward diagnostic to admin");
        }

        if let Err(e) = self.transport.mark_reaction(event, "❌").await {
            tracing::warn!(%e, "failed to mark failure indicator");
        }
    }
}

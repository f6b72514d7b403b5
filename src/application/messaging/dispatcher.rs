//! Dispatcher - Drives one event through resolve, match, authorize,
//! execute and bookkeeping

use std::sync::Arc;

use crate::application::errors::DenyReason;
use crate::domain::entities::{
    CommandMode, ExecContext, IncomingEvent, PluginDescriptor, ResolvedCommand,
};
use crate::domain::traits::Transport;
use crate::infrastructure::plugins::PluginRegistry;
use crate::infrastructure::storage::UsageStore;
use super::reporter::ErrorReporter;
use super::resolver::CommandResolver;

/// Terminal state of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No resolved command or no matching descriptor; silent, no side
    /// effects.
    Ignored,
    /// An authorization check turned the invocation away.
    Denied(DenyReason),
    /// The handler ran and returned normally.
    Completed,
    /// The handler failed; the error was contained and reported.
    Failed,
}

/// Orchestrates the per-event pipeline. One event runs to a terminal
/// outcome before its future completes; no timeout or cancellation is
/// imposed on handler execution.
pub struct Dispatcher {
    resolver: CommandResolver,
    registry: Arc<PluginRegistry>,
    store: Arc<UsageStore>,
    transport: Arc<dyn Transport>,
    reporter: ErrorReporter,
    owner_id: String,
}

impl Dispatcher {
    pub fn new(
        resolver: CommandResolver,
        registry: Arc<PluginRegistry>,
        store: Arc<UsageStore>,
        transport: Arc<dyn Transport>,
        reporter: ErrorReporter,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            registry,
            store,
            transport,
            reporter,
            owner_id: owner_id.into(),
        }
    }

    pub async fn dispatch(&self, event: &IncomingEvent) -> DispatchOutcome {
        if event.from_me || event.is_empty() {
            return DispatchOutcome::Ignored;
        }

        // Resolving
        let Some(command) = self.resolver.resolve(event) else {
            return DispatchOutcome::Ignored;
        };

        // Matched. The snapshot is captured once; a reload during this
        // dispatch leaves it untouched.
        let snapshot = self.registry.snapshot();
        let Some(descriptor) = snapshot.find(&command.token, command.mode) else {
            tracing::debug!(
                token = %command.display_token(),
                mode = %command.mode,
                "no descriptor for token"
            );
            return DispatchOutcome::Ignored;
        };

        tracing::debug!(
            plugin = %descriptor.name,
            category = %descriptor.category,
            token = %command.token,
            mode = %command.mode,
            "running plugin"
        );

        // Authorizing, prefixed invocations only; first failure wins and
        // the remaining checks are skipped.
        if command.mode == CommandMode::Prefixed {
            if let Some(reason) = self.authorize(event, &descriptor).await {
                self.deny(event, reason).await;
                return DispatchOutcome::Denied(reason);
            }
        }

        // Executing. The handler's return value is not inspected beyond
        // success or failure.
        let ctx = ExecContext {
            command: command.clone(),
            is_admin: event.is_admin,
            is_bot_admin: event.is_bot_admin,
            store: self.store.shared(),
            transport: Arc::clone(&self.transport),
        };
        if let Err(e) = descriptor.handler.invoke(event, &ctx).await {
            self.reporter.report(event, &e).await;
            return DispatchOutcome::Failed;
        }

        // Bookkeeping, skipped entirely for reactions.
        if command.mode != CommandMode::Reaction {
            self.bookkeep(event, &command, &descriptor).await;
        }

        DispatchOutcome::Completed
    }

    async fn authorize(
        &self,
        event: &IncomingEvent,
        descriptor: &PluginDescriptor,
    ) -> Option<DenyReason> {
        if descriptor.flags.limit && self.store.remaining_limit(&event.sender_id).await <= 0 {
            return Some(DenyReason::QuotaExceeded);
        }
        if descriptor.flags.owner && event.sender_id != self.owner_id {
            return Some(DenyReason::Forbidden);
        }
        if descriptor.flags.group && !event.is_group {
            return Some(DenyReason::ContextMismatch);
        }
        None
    }

    async fn deny(&self, event: &IncomingEvent, reason: DenyReason) {
        if let Err(e) = self
            .transport
            .send_message(&event.chat_id, reason.user_notice())
            .await
        {
            tracing::warn!(%e, "failed to deliver denial notice");
        }
        if let Err(e) = self.transport.mark_reaction(event, "❌").await {
            tracing::warn!(%e, "failed to mark denial indicator");
        }
    }

    async fn bookkeep(
        &self,
        event: &IncomingEvent,
        command: &ResolvedCommand,
        descriptor: &PluginDescriptor,
    ) {
        self.store.record_hit(&command.token).await;
        if command.mode == CommandMode::Prefixed && descriptor.flags.limit {
            let remaining = self.store.consume_quota(&event.sender_id).await;
            tracing::debug!(sender = %event.sender_id, remaining, "quota consumed");
        }
        // Durable state catches up on the next flush interval.
    }
}

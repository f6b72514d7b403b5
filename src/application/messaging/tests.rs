//! Integration tests for the dispatch pipeline

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::sync::{Notify, RwLock};

    use crate::application::errors::{BotError, DenyReason, StorageError};
    use crate::application::messaging::{CommandResolver, DispatchOutcome, Dispatcher, ErrorReporter};
    use crate::domain::entities::{
        ExecContext, IncomingEvent, Matcher, PluginDescriptor, PluginFlags, PluginHandler,
        UsageData, UserQuotaRecord,
    };
    use crate::domain::traits::{GroupParticipant, Persistence, Transport};
    use crate::infrastructure::plugins::{PluginRegistry, StaticSource};
    use crate::infrastructure::storage::UsageStore;

    const OWNER: &str = "owner@local";
    const SENDER: &str = "alice@local";
    const ADMIN_CONTACT: &str = "admin@local";
    const CHAT: &str = "chat@local";

    /// Transport that records everything it is asked to send.
    struct RecordingTransport {
        sent: Mutex<Vec<(String, String)>>,
        reactions: Mutex<Vec<String>>,
    }

    impl RecordingTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                reactions: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }

        fn reactions(&self) -> Vec<String> {
            self.reactions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), BotError> {
            self.sent
                .lock()
                .unwrap()
                .push((chat_id.to_string(), text.to_string()));
            Ok(())
        }

        async fn mark_reaction(
            &self,
            _event: &IncomingEvent,
            indicator: &str,
        ) -> Result<(), BotError> {
            self.reactions.lock().unwrap().push(indicator.to_string());
            Ok(())
        }

        async fn fetch_group_metadata(
            &self,
            _chat_id: &str,
        ) -> Result<Vec<GroupParticipant>, BotError> {
            Ok(Vec::new())
        }
    }

    struct MemoryPersistence {
        data: RwLock<Option<UsageData>>,
    }

    impl MemoryPersistence {
        fn new() -> Self {
            Self {
                data: RwLock::new(None),
            }
        }
    }

    #[async_trait]
    impl Persistence for MemoryPersistence {
        async fn read(&self) -> Result<Option<UsageData>, StorageError> {
            Ok(self.data.read().await.clone())
        }

        async fn write(&self, data: &UsageData) -> Result<(), StorageError> {
            *self.data.write().await = Some(data.clone());
            Ok(())
        }
    }

    /// Handler that counts its invocations.
    struct CountingHandler {
        calls: AtomicUsize,
    }

    impl CountingHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PluginHandler for CountingHandler {
        async fn invoke(&self, _event: &IncomingEvent, _ctx: &ExecContext) -> Result<(), BotError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl PluginHandler for FailingHandler {
        async fn invoke(&self, _event: &IncomingEvent, _ctx: &ExecContext) -> Result<(), BotError> {
            Err(BotError::Handler("boom".to_string()))
        }
    }

    struct Harness {
        dispatcher: Dispatcher,
        registry: Arc<PluginRegistry>,
        store: Arc<UsageStore>,
        transport: Arc<RecordingTransport>,
    }

    fn harness(descriptors: Vec<PluginDescriptor>, default_allowance: i64) -> Harness {
        let transport = RecordingTransport::new();
        let store = Arc::new(UsageStore::new(
            Arc::new(MemoryPersistence::new()),
            default_allowance,
        ));
        let registry = Arc::new(PluginRegistry::new(Box::new(StaticSource::new(descriptors))));
        registry.load();
        let dispatcher = Dispatcher::new(
            CommandResolver::new(['.', '#', '!']),
            Arc::clone(&registry),
            Arc::clone(&store),
            transport.clone(),
            ErrorReporter::new(transport.clone(), ADMIN_CONTACT),
            OWNER,
        );
        Harness {
            dispatcher,
            registry,
            store,
            transport,
        }
    }

    fn descriptor(
        name: &str,
        tokens: &[&str],
        flags: PluginFlags,
        handler: Arc<dyn PluginHandler>,
    ) -> PluginDescriptor {
        PluginDescriptor::new(name, Matcher::tokens(tokens.iter().copied()), handler)
            .with_flags(flags)
    }

    fn event(text: &str) -> IncomingEvent {
        IncomingEvent::new(CHAT, SENDER, text)
    }

    #[tokio::test]
    async fn unknown_token_is_silent_with_no_side_effects() {
        let h = harness(vec![], 10);
        let outcome = h.dispatcher.dispatch(&event(".nosuch")).await;
        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert!(h.transport.sent().is_empty());
        assert!(h.transport.reactions().is_empty());
        assert_eq!(h.store.hit_count("nosuch").await, 0);
    }

    #[tokio::test]
    async fn empty_and_whitespace_text_is_ignored() {
        let handler = CountingHandler::new();
        let h = harness(
            vec![descriptor("ping", &["ping"], PluginFlags::default(), handler.clone())],
            10,
        );
        assert_eq!(h.dispatcher.dispatch(&event("")).await, DispatchOutcome::Ignored);
        assert_eq!(h.dispatcher.dispatch(&event("   ")).await, DispatchOutcome::Ignored);
        assert_eq!(handler.calls(), 0);
    }

    #[tokio::test]
    async fn events_from_the_bot_itself_are_ignored() {
        let handler = CountingHandler::new();
        let h = harness(
            vec![descriptor("ping", &["ping"], PluginFlags::default(), handler.clone())],
            10,
        );
        let ev = event(".ping").with_from_me(true);
        assert_eq!(h.dispatcher.dispatch(&ev).await, DispatchOutcome::Ignored);
        assert_eq!(handler.calls(), 0);
    }

    #[tokio::test]
    async fn prefixed_ping_runs_once_and_counts() {
        let handler = CountingHandler::new();
        let h = harness(
            vec![descriptor("ping", &["ping"], PluginFlags::default(), handler.clone())],
            10,
        );

        let outcome = h.dispatcher.dispatch(&event(".ping")).await;
        assert_eq!(outcome, DispatchOutcome::Completed);
        assert_eq!(handler.calls(), 1);
        assert_eq!(h.store.hit_count("ping").await, 1);
        assert!(h.transport.reactions().is_empty());
    }

    #[tokio::test]
    async fn no_prefix_ping_runs_once_and_counts() {
        let handler = CountingHandler::new();
        let flags = PluginFlags {
            no_prefix: true,
            ..Default::default()
        };
        let h = harness(vec![descriptor("ping", &["ping"], flags, handler.clone())], 10);

        let outcome = h.dispatcher.dispatch(&event("ping")).await;
        assert_eq!(outcome, DispatchOutcome::Completed);
        assert_eq!(handler.calls(), 1);
        assert_eq!(h.store.hit_count("ping").await, 1);
    }

    #[tokio::test]
    async fn owner_restricted_command_denies_non_owner() {
        let handler = CountingHandler::new();
        let flags = PluginFlags {
            owner: true,
            ..Default::default()
        };
        let h = harness(
            vec![descriptor("broadcast", &["broadcast"], flags, handler.clone())],
            10,
        );

        let outcome = h.dispatcher.dispatch(&event(".broadcast hello")).await;
        assert_eq!(outcome, DispatchOutcome::Denied(DenyReason::Forbidden));
        assert_eq!(handler.calls(), 0);

        let sent = h.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, CHAT);
        assert_eq!(sent[0].1, DenyReason::Forbidden.user_notice());
        assert_eq!(h.transport.reactions(), vec!["❌"]);
        assert_eq!(h.store.hit_count("broadcast").await, 0);
    }

    #[tokio::test]
    async fn owner_passes_the_owner_gate() {
        let handler = CountingHandler::new();
        let flags = PluginFlags {
            owner: true,
            ..Default::default()
        };
        let h = harness(
            vec![descriptor("broadcast", &["broadcast"], flags, handler.clone())],
            10,
        );

        let ev = IncomingEvent::new(CHAT, OWNER, ".broadcast hello");
        assert_eq!(h.dispatcher.dispatch(&ev).await, DispatchOutcome::Completed);
        assert_eq!(handler.calls(), 1);
    }

    #[tokio::test]
    async fn exhausted_quota_denies_and_leaves_counters_untouched() {
        let handler = CountingHandler::new();
        let flags = PluginFlags {
            limit: true,
            ..Default::default()
        };
        let h = harness(vec![descriptor("sticker", &["sticker"], flags, handler.clone())], 0);

        let outcome = h.dispatcher.dispatch(&event(".sticker")).await;
        assert_eq!(outcome, DispatchOutcome::Denied(DenyReason::QuotaExceeded));
        assert_eq!(handler.calls(), 0);
        assert_eq!(h.store.hit_count("sticker").await, 0);
        assert_eq!(h.store.remaining_limit(SENDER).await, 0);

        let sent = h.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, DenyReason::QuotaExceeded.user_notice());
    }

    #[tokio::test]
    async fn quota_check_runs_before_owner_check() {
        // Both gates would fail; quota is first, first failure wins.
        let handler = CountingHandler::new();
        let flags = PluginFlags {
            limit: true,
            owner: true,
            ..Default::default()
        };
        let h = harness(vec![descriptor("vip", &["vip"], flags, handler.clone())], 0);

        let outcome = h.dispatcher.dispatch(&event(".vip")).await;
        assert_eq!(outcome, DispatchOutcome::Denied(DenyReason::QuotaExceeded));
        assert_eq!(h.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn group_only_command_denies_direct_chats() {
        let handler = CountingHandler::new();
        let flags = PluginFlags {
            group: true,
            ..Default::default()
        };
        let h = harness(vec![descriptor("kick", &["kick"], flags, handler.clone())], 10);

        let outcome = h.dispatcher.dispatch(&event(".kick @bob")).await;
        assert_eq!(outcome, DispatchOutcome::Denied(DenyReason::ContextMismatch));
        assert_eq!(handler.calls(), 0);

        let ev = event(".kick @bob").with_group(true);
        assert_eq!(h.dispatcher.dispatch(&ev).await, DispatchOutcome::Completed);
        assert_eq!(handler.calls(), 1);
    }

    #[tokio::test]
    async fn authorization_is_skipped_for_no_prefix_mode() {
        // Owner-gated no-prefix plugin still runs for a non-owner; the
        // gates only apply to explicit prefixed invocations.
        let handler = CountingHandler::new();
        let flags = PluginFlags {
            no_prefix: true,
            owner: true,
            ..Default::default()
        };
        let h = harness(vec![descriptor("hi", &["hi"], flags, handler.clone())], 10);

        assert_eq!(h.dispatcher.dispatch(&event("hi")).await, DispatchOutcome::Completed);
        assert_eq!(handler.calls(), 1);
    }

    #[tokio::test]
    async fn successful_limited_command_consumes_exactly_one_unit() {
        let handler = CountingHandler::new();
        let flags = PluginFlags {
            limit: true,
            ..Default::default()
        };
        let h = harness(vec![descriptor("sticker", &["sticker"], flags, handler.clone())], 10);

        let outcome = h.dispatcher.dispatch(&event(".sticker")).await;
        assert_eq!(outcome, DispatchOutcome::Completed);
        assert_eq!(handler.calls(), 1);
        assert_eq!(h.store.hit_count("sticker").await, 1);
        assert_eq!(h.store.remaining_limit(SENDER).await, 9);
    }

    #[tokio::test]
    async fn concurrent_dispatches_never_lose_updates() {
        let handler = CountingHandler::new();
        let flags = PluginFlags {
            limit: true,
            ..Default::default()
        };
        let h = Arc::new(harness(
            vec![descriptor("sticker", &["sticker"], flags, handler.clone())],
            100,
        ));

        let mut tasks = Vec::new();
        for _ in 0..20 {
            let h2 = Arc::clone(&h);
            tasks.push(tokio::spawn(async move {
                h2.dispatcher.dispatch(&event(".sticker")).await
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap(), DispatchOutcome::Completed);
        }
        assert_eq!(handler.calls(), 20);
        assert_eq!(h.store.hit_count("sticker").await, 20);
        assert_eq!(h.store.remaining_limit(SENDER).await, 80);
    }

    #[tokio::test]
    async fn reaction_dispatch_runs_but_never_bookkeeps() {
        let handler = CountingHandler::new();
        let flags = PluginFlags {
            reaction: true,
            limit: true,
            ..Default::default()
        };
        let h = harness(vec![descriptor("like", &["👍"], flags, handler.clone())], 10);

        let ev = event("").with_reaction("👍");
        assert_eq!(h.dispatcher.dispatch(&ev).await, DispatchOutcome::Completed);
        assert_eq!(handler.calls(), 1);
        assert_eq!(h.store.hit_count("👍").await, 0);
        // No quota record was ever touched for the sender.
        let data = h.store.shared();
        assert!(!data.read().await.users.contains_key(SENDER));
    }

    #[tokio::test]
    async fn handler_failure_is_contained_and_reported() {
        let flags = PluginFlags::default();
        let h = harness(
            vec![descriptor("crash", &["crash"], flags, Arc::new(FailingHandler))],
            10,
        );

        let outcome = h.dispatcher.dispatch(&event(".crash")).await;
        assert_eq!(outcome, DispatchOutcome::Failed);

        // Generic notice to the chat, diagnostic to the admin contact.
        let sent = h.transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, CHAT);
        assert_eq!(sent[1].0, ADMIN_CONTACT);
        assert!(sent[1].1.contains("boom"));
        assert_eq!(h.transport.reactions(), vec!["❌"]);

        // Bookkeeping is skipped for the failed attempt.
        assert_eq!(h.store.hit_count("crash").await, 0);
    }

    #[tokio::test]
    async fn exhausted_sender_is_denied_once_the_last_unit_is_spent() {
        // Pre-seed a record at 1, run twice: the second run is denied and
        // nothing drops below zero through dispatch alone.
        let handler = CountingHandler::new();
        let flags = PluginFlags {
            limit: true,
            ..Default::default()
        };
        let h = harness(vec![descriptor("sticker", &["sticker"], flags, handler.clone())], 10);
        h.store
            .shared()
            .write()
            .await
            .users
            .insert(SENDER.to_string(), UserQuotaRecord { limit: 1 });

        assert_eq!(
            h.dispatcher.dispatch(&event(".sticker")).await,
            DispatchOutcome::Completed
        );
        assert_eq!(h.store.remaining_limit(SENDER).await, 0);
        assert_eq!(
            h.dispatcher.dispatch(&event(".sticker")).await,
            DispatchOutcome::Denied(DenyReason::QuotaExceeded)
        );
        assert_eq!(h.store.remaining_limit(SENDER).await, 0);
        assert_eq!(handler.calls(), 1);
    }

    /// Handler that parks until released, to hold a dispatch in flight.
    struct ParkedHandler {
        release: Arc<Notify>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PluginHandler for ParkedHandler {
        async fn invoke(&self, _event: &IncomingEvent, _ctx: &ExecContext) -> Result<(), BotError> {
            self.release.notified().await;
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn reload_mid_dispatch_does_not_disturb_the_in_flight_event() {
        let release = Arc::new(Notify::new());
        let parked = Arc::new(ParkedHandler {
            release: Arc::clone(&release),
            calls: AtomicUsize::new(0),
        });
        let h = harness(
            vec![descriptor("slow", &["slow"], PluginFlags::default(), parked.clone())],
            10,
        );
        let h = Arc::new(h);

        let h2 = Arc::clone(&h);
        let in_flight =
            tokio::spawn(async move { h2.dispatcher.dispatch(&event(".slow")).await });

        // Let the dispatch reach the parked handler, then swap the
        // registry underneath it.
        tokio::task::yield_now().await;
        h.registry.reload();
        release.notify_one();

        assert_eq!(in_flight.await.unwrap(), DispatchOutcome::Completed);
        assert_eq!(parked.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.store.hit_count("slow").await, 1);
    }
}

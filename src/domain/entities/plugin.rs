use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::{CommandMode, IncomingEvent, ResolvedCommand, SharedUsage};
use crate::application::errors::BotError;
use crate::domain::traits::Transport;

/// What a plugin answers to: an ordered set of literal tokens, or a single
/// whole-token pattern.
#[derive(Debug, Clone)]
pub enum Matcher {
    Tokens(Vec<String>),
    Pattern(Regex),
}

impl Matcher {
    /// Build a token-set matcher; tokens are case-folded up front so
    /// membership tests are exact.
    pub fn tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Matcher::Tokens(tokens.into_iter().map(|t| t.into().to_lowercase()).collect())
    }

    /// Build a pattern matcher. The pattern is anchored here so that a
    /// match always covers the whole token, never a substring.
    pub fn pattern(src: &str) -> Result<Self, regex_lite::Error> {
        let anchored = format!("^(?:{})$", src);
        Ok(Matcher::Pattern(Regex::new(&anchored)?))
    }

    pub fn accepts(&self, token: &str) -> bool {
        match self {
            Matcher::Tokens(set) => set.iter().any(|t| t == token),
            Matcher::Pattern(re) => re.is_match(token),
        }
    }
}

/// Restriction flags a plugin declares on itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginFlags {
    /// Matches bare text instead of prefixed commands.
    pub no_prefix: bool,
    /// Matches reaction payloads instead of typed text.
    pub reaction: bool,
    /// Only the configured owner identity may invoke it.
    pub owner: bool,
    /// Only usable inside a group chat.
    pub group: bool,
    /// Consumes one unit of the sender's quota per invocation.
    pub limit: bool,
}

/// Read-only context handed to a plugin handler.
#[derive(Clone)]
pub struct ExecContext {
    pub command: ResolvedCommand,
    pub is_admin: bool,
    pub is_bot_admin: bool,
    /// Handle to the shared persistent usage document.
    pub store: SharedUsage,
    pub transport: Arc<dyn Transport>,
}

impl ExecContext {
    pub fn args(&self) -> &[String] {
        &self.command.args
    }
}

/// The behavior capability a plugin exports.
#[async_trait]
pub trait PluginHandler: Send + Sync {
    async fn invoke(&self, event: &IncomingEvent, ctx: &ExecContext) -> Result<(), BotError>;
}

#[async_trait]
impl<F, Fut> PluginHandler for F
where
    F: Fn(IncomingEvent, ExecContext) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<(), BotError>> + Send,
{
    async fn invoke(&self, event: &IncomingEvent, ctx: &ExecContext) -> Result<(), BotError> {
        self(event.clone(), ctx.clone()).await
    }
}

/// One loaded behavior unit. Immutable after load; the registry replaces
/// the whole active set on reload instead of editing descriptors in place.
#[derive(Clone)]
pub struct PluginDescriptor {
    pub name: String,
    pub category: String,
    pub matcher: Matcher,
    pub flags: PluginFlags,
    pub handler: Arc<dyn PluginHandler>,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>, matcher: Matcher, handler: Arc<dyn PluginHandler>) -> Self {
        Self {
            name: name.into(),
            category: "misc".to_string(),
            matcher,
            flags: PluginFlags::default(),
            handler,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_flags(mut self, flags: PluginFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Whether this descriptor serves the given dispatch mode. Flag pairs
    /// must match exactly: a reaction plugin never answers typed text and
    /// a no-prefix plugin never answers a prefixed invocation.
    pub fn matches_mode(&self, mode: CommandMode) -> bool {
        match mode {
            CommandMode::Reaction => self.flags.reaction && !self.flags.no_prefix,
            CommandMode::NoPrefix => self.flags.no_prefix && !self.flags.reaction,
            CommandMode::Prefixed => !self.flags.no_prefix && !self.flags.reaction,
        }
    }

    pub fn accepts(&self, token: &str, mode: CommandMode) -> bool {
        self.matches_mode(mode) && self.matcher.accepts(token)
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("matcher", &self.matcher)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

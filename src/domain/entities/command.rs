use std::fmt;

/// How an event addressed the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandMode {
    /// Triggered by an emoji reaction payload.
    Reaction,
    /// Bare first word, no prefix character.
    NoPrefix,
    /// Explicit invocation: prefix character followed by the command word.
    Prefixed,
}

impl fmt::Display for CommandMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandMode::Reaction => write!(f, "reaction"),
            CommandMode::NoPrefix => write!(f, "no-prefix"),
            CommandMode::Prefixed => write!(f, "prefixed"),
        }
    }
}

/// The command shape extracted from one event.
///
/// At most one of these is produced per event; the token is already
/// case-folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub mode: CommandMode,
    pub prefix_char: Option<char>,
    pub token: String,
    pub args: Vec<String>,
}

impl ResolvedCommand {
    pub fn reaction(token: impl Into<String>) -> Self {
        Self {
            mode: CommandMode::Reaction,
            prefix_char: None,
            token: token.into(),
            args: Vec::new(),
        }
    }

    pub fn no_prefix(token: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            mode: CommandMode::NoPrefix,
            prefix_char: None,
            token: token.into(),
            args,
        }
    }

    pub fn prefixed(prefix: char, token: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            mode: CommandMode::Prefixed,
            prefix_char: Some(prefix),
            token: token.into(),
            args,
        }
    }

    /// Display form of the full invocation, e.g. `.ping` or `ping`.
    pub fn display_token(&self) -> String {
        match self.prefix_char {
            Some(p) => format!("{}{}", p, self.token),
            None => self.token.clone(),
        }
    }
}

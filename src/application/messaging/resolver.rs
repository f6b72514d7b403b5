//! Command resolver - Turns raw event text into a resolved command shape

use crate::domain::entities::{IncomingEvent, ResolvedCommand};

/// Pure resolver from event text (or reaction payload) to a command.
pub struct CommandResolver {
    prefixes: Vec<char>,
}

impl CommandResolver {
    pub fn new<I: IntoIterator<Item = char>>(prefixes: I) -> Self {
        Self {
            prefixes: prefixes.into_iter().collect(),
        }
    }

    /// Resolve one event. Priority: reaction payload, then prefixed text,
    /// then bare text. Whitespace-only text yields `None`.
    ///
    /// Only the first character of the trimmed text is consulted for
    /// prefix detection; stacked prefix characters are not special-cased.
    pub fn resolve(&self, event: &IncomingEvent) -> Option<ResolvedCommand> {
        if let Some(reaction) = &event.reaction_text {
            let token = reaction.trim().to_lowercase();
            if token.is_empty() {
                return None;
            }
            return Some(ResolvedCommand::reaction(token));
        }

        let text = event.raw_text.trim();
        if text.is_empty() {
            return None;
        }

        let mut chars = text.chars();
        let first = chars.next()?;
        let rest = chars.as_str();

        // A prefix only counts when a non-whitespace character follows it
        // immediately; ". ping" falls through to plain-text resolution.
        if self.prefixes.contains(&first) {
            if let Some(next) = rest.chars().next() {
                if !next.is_whitespace() {
                    let mut words = rest.split_whitespace();
                    let token = words.next()?.to_lowercase();
                    let args = words.map(str::to_string).collect();
                    return Some(ResolvedCommand::prefixed(first, token, args));
                }
            }
        }

        let mut words = text.split_whitespace();
        let token = words.next()?.to_lowercase();
        let args = words.map(str::to_string).collect();
        Some(ResolvedCommand::no_prefix(token, args))
    }
}

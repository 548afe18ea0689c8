use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person at the keyboard.
    User,
    /// The model, or a message synthesized on its behalf.
    Bot,
}

/// Identifier of a turn, unique within a session.
///
/// Millisecond wall-clock time with a random tiebreaker for turns created in
/// the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TurnId {
    /// Milliseconds since the Unix epoch.
    pub millis: i64,
    /// Random tiebreaker.
    pub nonce: u32,
}

impl TurnId {
    /// Generates an id for a turn created now.
    pub fn generate() -> Self {
        let millis = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        Self {
            millis,
            nonce: rand::random(),
        }
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:08x}", self.millis, self.nonce)
    }
}

/// One message exchanged in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Unique identifier.
    pub id: TurnId,
    /// The message text.  Bot text is markdown.
    pub text: String,
    /// Who produced the turn.
    pub sender: Sender,
}

impl Turn {
    /// Creates a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: TurnId::generate(),
            text: text.into(),
            sender: Sender::User,
        }
    }

    /// Creates a bot turn.
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            id: TurnId::generate(),
            text: text.into(),
            sender: Sender::Bot,
        }
    }

    /// Returns true if the user wrote this turn.
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    /// Returns true if the bot produced this turn.
    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }
}

/// Append-only, insertion-ordered sequence of turns.
#[derive(Debug, Clone, Default)]
pub struct TurnLog {
    turns: Vec<Turn>,
}

impl TurnLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn, re-rolling its id if it collides with an existing one.
    pub fn push(&mut self, mut turn: Turn) -> &Turn {
        while self.turns.iter().any(|existing| existing.id == turn.id) {
            turn.id.nonce = rand::random();
        }
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    /// The turns in insertion order.
    pub fn as_slice(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent turn.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if there are no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        let turn = Turn::user("hello");
        assert!(turn.is_user());
        assert!(!turn.is_bot());
        assert_eq!(turn.text, "hello");
        assert!(Turn::bot("hi").is_bot());
    }

    #[test]
    fn colliding_ids_are_rerolled() {
        let mut log = TurnLog::new();
        let first = Turn::user("a");
        let mut second = Turn::bot("b");
        second.id = first.id;
        log.push(first.clone());
        let pushed = log.push(second).clone();
        assert_ne!(pushed.id, first.id);
        assert_eq!(pushed.id.millis, first.id.millis);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn ids_unique_in_burst() {
        let mut log = TurnLog::new();
        for i in 0..256 {
            log.push(Turn::user(format!("{i}")));
        }
        let mut ids: Vec<_> = log.as_slice().iter().map(|t| t.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 256);
    }

    #[test]
    fn sender_serialization() {
        assert_eq!(serde_json::to_string(&Sender::Bot).unwrap(), r#""bot""#);
        assert_eq!(serde_json::to_string(&Sender::User).unwrap(), r#""user""#);
    }
}

//! Append-only conversation log shared by the terminal and web surfaces.

use serde::{Deserialize, Serialize};

use crate::constants::{SEED_ACKNOWLEDGEMENT, SYSTEM_PROMPT};

/// Number of persona turns every log starts with.
pub const SEED_TURNS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Ordered turns of one session, seeded with the persona pair.
///
/// Turns can only be appended, and only as complete user/model exchanges, so a
/// failed turn never leaves a dangling user entry behind.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationLog {
    pub fn new() -> Self {
        Self {
            turns: vec![
                Turn::user(SYSTEM_PROMPT),
                Turn::model(SEED_ACKNOWLEDGEMENT),
            ],
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns after the persona seed, i.e. what a user should see.
    pub fn history(&self) -> &[Turn] {
        &self.turns[SEED_TURNS..]
    }

    /// Copy of the turns with one extra user turn at the end. The log itself is
    /// left untouched.
    pub fn with_pending(&self, text: &str) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(self.turns.len() + 1);
        turns.extend_from_slice(&self.turns);
        turns.push(Turn::user(text));
        turns
    }

    pub fn record_exchange(&mut self, user_text: impl Into<String>, reply: impl Into<String>) {
        self.turns.push(Turn::user(user_text));
        self.turns.push(Turn::model(reply));
    }
}

//! The in-memory form of the chat log document.
use crate::types::RichText;
use serde::{Deserialize, Serialize};

/// The full chat log: sent-command history and rich-text messages, both
/// insertion-ordered with the oldest entry at index 0.
///
/// Field order matters: serializing emits `history` before `messages`, which
/// keeps the on-disk object's keys sorted and the output deterministic.
/// Unknown keys are rejected so a file with a different shape surfaces as a
/// decode error instead of silently losing data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogDocument {
    history: Vec<String>,
    messages: Vec<RichText>,
}

impl LogDocument {
    /// Appends a message, first evicting the oldest one if the sequence is
    /// over `max`.
    ///
    /// The bound is enforced lazily: eviction only happens once the count
    /// *exceeds* `max`, so the sequence can sit at `max + 1` entries between
    /// calls. This mirrors the host's long-standing behavior and is relied
    /// upon by existing files; the hard `<= max` trim happens on decode.
    pub fn add_message(&mut self, msg: RichText, max: usize) {
        if self.messages.len() > max {
            self.messages.remove(0);
        }
        self.messages.push(msg);
    }

    /// Appends a sent-history string with the same lazy eviction policy as
    /// [`LogDocument::add_message`].
    pub fn add_history(&mut self, cmd: impl Into<String>, max: usize) {
        if self.history.len() > max {
            self.history.remove(0);
        }
        self.history.push(cmd.into());
    }

    /// Drops the oldest entries of both sequences so neither exceeds `max`.
    pub fn keep_newest(&mut self, max: usize) {
        if self.messages.len() > max {
            self.messages.drain(..self.messages.len() - max);
        }
        if self.history.len() > max {
            self.history.drain(..self.history.len() - max);
        }
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn history_count(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.history.is_empty()
    }

    /// Read-only view of the messages, oldest first.
    pub fn messages(&self) -> &[RichText] {
        &self.messages
    }

    /// Read-only view of the sent history, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

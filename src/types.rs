//! Value types shared between the log and the host UI.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A structured chat text value (style, content, nested siblings).
///
/// The tree's internal layout is owned by the host UI; this component only
/// guarantees that it round-trips losslessly through the on-disk document,
/// so it is kept as an opaque JSON value rather than a typed mirror of the
/// host's text format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(Value);

impl RichText {
    /// Wraps a raw JSON tree produced by the host UI.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Borrows the underlying JSON tree.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Builds a plain unstyled text value, mainly useful for tests and
    /// hosts that only log literal strings.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self(serde_json::json!({ "text": text }))
    }
}

impl From<Value> for RichText {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A visual marker the host UI attaches to a message when displaying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageIndicator {
    /// Packed RGB color of the indicator bar.
    pub color: u32,
    /// Translation key for the indicator's hover label.
    pub label: &'static str,
}

/// The indicator attached to every message re-inserted from a previous
/// session. Carries only a color and a label, no click or hover actions.
pub const RESTORED_INDICATOR: MessageIndicator = MessageIndicator {
    color: 0x382fb5,
    label: "chatlog.restored",
};

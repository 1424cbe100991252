//! Pushes a loaded document back into the host UI.
use crate::log::ChatLog;
use crate::types::{MessageIndicator, RichText, RESTORED_INDICATOR};
use std::cell::Cell;
use tracing::info;

/// The seam between the log and the host's live chat UI.
///
/// Implementors receive borrowed entries only; nothing handed to a sink
/// aliases the log's internal storage mutably.
pub trait ChatUiSink {
    /// Appends one previously sent command/message to the UI's input history.
    fn add_to_history(&mut self, entry: &str);

    /// Appends one chat message to the UI, tagged with the given indicator.
    fn add_message(&mut self, message: &RichText, indicator: &MessageIndicator);
}

/// Scoped raise/lower of the restore-in-progress flag. Dropping the guard
/// lowers the flag, so it is reset on every exit path.
struct RestoreGuard<'a>(&'a Cell<bool>);

impl<'a> RestoreGuard<'a> {
    fn raise(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl ChatLog {
    /// Feeds the loaded document into the host UI: sent history first, then
    /// messages, each oldest-first, with messages tagged by the fixed
    /// "restored" indicator.
    ///
    /// While this runs, [`ChatLog::is_restoring`] reports true so the host's
    /// own append hooks can tell these insertions apart from live chat and
    /// skip re-logging them. Calling restore twice duplicates every entry in
    /// the UI; call it at most once per load.
    pub fn restore(&self, sink: &mut dyn ChatUiSink) {
        let _guard = RestoreGuard::raise(&self.restoring);

        for entry in self.document().history() {
            sink.add_to_history(entry);
        }
        for message in self.document().messages() {
            sink.add_message(message, &RESTORED_INDICATOR);
        }

        info!(
            "Restored {} messages and {} history messages from '{}'",
            self.message_count(),
            self.history_count(),
            self.path().display()
        );
    }

    /// Whether a restore is currently feeding entries into the UI.
    pub fn is_restoring(&self) -> bool {
        self.restoring.get()
    }
}

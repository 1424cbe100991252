//! The stateful chat log service: loading, saving, backups, autosave
//! ticking, and the mutation API the host's chat hooks call into.
pub mod codec;
pub mod document;
pub mod restore;

pub use document::LogDocument;

use crate::config::ChatLogConfig;
use crate::types::RichText;
use anyhow::{Context, Result};
use chrono::Local;
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Simulation ticks per minute at the host's fixed 20 ticks-per-second rate.
pub const TICKS_PER_MINUTE: u32 = 20 * 60;

/// Canonical text of an empty document; used whenever a broken file has to
/// be replaced with something readable.
const EMPTY_DATA: &str = "{\"history\":[],\"messages\":[]}";

/// The chat log service.
///
/// Owns the in-memory document and every flag that governs persistence.
/// Construct one instance at startup, call [`ChatLog::load`] once, drive
/// [`ChatLog::on_tick`] from the host's tick hook, and wire
/// [`ChatLog::save`] with `crashing = true` into the crash hook. All
/// operations run on the host's single simulation thread; none of them
/// propagate errors - persistence failures are logged and swallowed so the
/// host can never be taken down by its chat log.
pub struct ChatLog {
    path: PathBuf,
    config: ChatLogConfig,
    data: LogDocument,
    loaded: bool,
    saved_after_crash: bool,
    restoring: Cell<bool>,
    last_message_count: Option<usize>,
    last_history_count: Option<usize>,
    ticks_until_save: i64,
}

impl ChatLog {
    /// Creates an empty, not-yet-loaded log backed by the given file path.
    pub fn new(path: impl Into<PathBuf>, config: ChatLogConfig) -> Self {
        let ticks_until_save =
            i64::from(config.save_interval_minutes) * i64::from(TICKS_PER_MINUTE);

        Self {
            path: path.into(),
            config,
            data: LogDocument::default(),
            loaded: false,
            saved_after_crash: false,
            restoring: Cell::new(false),
            last_message_count: None,
            last_history_count: None,
            ticks_until_save,
        }
    }

    /// Reads and parses the backing file, replacing the in-memory document.
    ///
    /// A missing file loads as an empty document. Files that are not valid
    /// UTF-8 are re-encoded in place (lossily, replacement characters
    /// included) and re-read; if even that fails the file is reset to the
    /// canonical empty text. A document that then fails to parse is backed
    /// up and replaced with an empty one. Every failure path ends with a
    /// valid in-memory document and `loaded` set, and none of them surface
    /// an error to the caller.
    pub fn load(&mut self) {
        if !self.path.exists() {
            self.data = LogDocument::default();
            self.loaded = true;
            return;
        }

        let raw = self.read_raw();

        match codec::decode(&raw, self.config.max_messages) {
            Ok(doc) => {
                self.data = doc;
                self.loaded = true;
                self.last_message_count = Some(self.data.message_count());
                self.last_history_count = Some(self.data.history_count());
                info!(
                    "Read the chat log containing {} messages and {} sent messages from '{}'",
                    self.data.message_count(),
                    self.data.history_count(),
                    self.path.display()
                );
            }
            Err(e) => {
                error!("Found an error while reading the chat log, backing it up and loading an empty one: {}", e);
                self.backup();
                self.data = LogDocument::default();
                self.loaded = true;
            }
        }
    }

    /// Reads the backing file as text, repairing or resetting it when the
    /// bytes are not valid UTF-8 and falling back to the canonical empty
    /// text on any other I/O failure.
    fn read_raw(&self) -> String {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(
                    "Couldn't access the chat log at '{}': {}",
                    self.path.display(),
                    e
                );
                return EMPTY_DATA.to_owned();
            }
        };

        match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Chat log file at '{}' was not UTF-8 encoded. Complex text characters may have been replaced with '\u{FFFD}'.",
                    self.path.display()
                );

                // Force the file back to UTF-8 so the next load is clean.
                let text = String::from_utf8_lossy(e.as_bytes()).into_owned();
                if let Err(rewrite_err) = fs::write(&self.path, &text) {
                    error!(
                        "Couldn't rewrite the chat log at '{}', resetting: {}",
                        self.path.display(),
                        rewrite_err
                    );
                    if let Err(reset_err) = fs::write(&self.path, EMPTY_DATA) {
                        error!(
                            "Couldn't reset the chat log at '{}': {}",
                            self.path.display(),
                            reset_err
                        );
                    }
                    return EMPTY_DATA.to_owned();
                }
                text
            }
        }
    }

    /// Writes the document to the backing file.
    ///
    /// Skipped entirely when persistence is disabled, when `crashing` and a
    /// crash save has already run, when there is nothing to save, or when
    /// neither sequence's length changed since the last successful save. An
    /// I/O failure is logged together with a dump of the in-memory data for
    /// manual recovery and then discarded. Whenever `crashing` is set and
    /// the guards were passed, the crash save is marked complete so a
    /// repeated crash hook doesn't attempt (and fail) twice.
    pub fn save(&mut self, crashing: bool) {
        if !self.config.enabled || (crashing && self.saved_after_crash) {
            return;
        }
        if self.data.is_empty() {
            return;
        }
        if Some(self.data.message_count()) == self.last_message_count
            && Some(self.data.history_count()) == self.last_history_count
        {
            return;
        }

        match self.write_document() {
            Ok(()) => {
                self.last_message_count = Some(self.data.message_count());
                self.last_history_count = Some(self.data.history_count());
                info!(
                    "Saved the chat log containing {} messages and {} sent messages to '{}'",
                    self.data.message_count(),
                    self.data.history_count(),
                    self.path.display()
                );
            }
            Err(e) => {
                error!("An I/O error occurred while trying to save the chat log: {:#}", e);
                debug!("Dumped data:\n{:?}", self.data);
            }
        }

        if crashing {
            self.saved_after_crash = true;
        }
    }

    fn write_document(&self) -> Result<()> {
        let text = codec::encode(&self.data).context("couldn't encode the chat log")?;
        fs::write(&self.path, text)
            .with_context(|| format!("couldn't write '{}'", self.path.display()))?;
        Ok(())
    }

    /// Copies the backing file to a timestamped `chatlog_<time>.json`
    /// sibling. Never touches the live file or the in-memory document; a
    /// failure (including a missing source file) only logs a warning.
    pub fn backup(&self) {
        let stamp = Local::now().format("%Y-%m-%d_%H.%M.%S");
        let target = self.path.with_file_name(format!("chatlog_{stamp}.json"));

        if let Err(e) = fs::copy(&self.path, &target) {
            warn!(
                "Couldn't backup the chat log at '{}': {}",
                self.path.display(),
                e
            );
        }
    }

    /// Counts down to the next autosave; call once per simulation tick.
    ///
    /// Fires a non-crash save when the configured interval is positive and
    /// the countdown hits zero, then wraps the countdown back to the full
    /// interval. With an interval of zero the countdown still decrements
    /// and wraps but the save guard never passes, so autosave is off.
    pub fn on_tick(&mut self) {
        if self.config.save_interval_minutes > 0 && self.ticks_until_save == 0 {
            self.save(false);
        }

        self.ticks_until_save -= 1;

        if self.ticks_until_save < 0 {
            self.ticks_until_save =
                i64::from(self.config.save_interval_minutes) * i64::from(TICKS_PER_MINUTE);
        }
    }

    /// Final clean-exit save. Hosts with a graceful shutdown hook should
    /// call this instead of a bare `save(false)` for intent's sake.
    pub fn shutdown(&mut self) {
        self.save(false);
    }

    /// Appends a chat message, evicting the oldest one first when the
    /// sequence is over the configured cap.
    pub fn add_message(&mut self, msg: RichText) {
        self.data.add_message(msg, self.config.max_messages);
    }

    /// Appends a sent command/message to the input history with the same
    /// eviction policy as [`ChatLog::add_message`].
    pub fn add_history(&mut self, cmd: impl Into<String>) {
        self.data.add_history(cmd, self.config.max_messages);
    }

    /// Empties the message sequence in memory; the file is untouched until
    /// the next save.
    pub fn clear_messages(&mut self) {
        self.data.clear_messages();
    }

    /// Empties the history sequence in memory.
    pub fn clear_history(&mut self) {
        self.data.clear_history();
    }

    pub fn message_count(&self) -> usize {
        self.data.message_count()
    }

    pub fn history_count(&self) -> usize {
        self.data.history_count()
    }

    /// Whether the initial load (or its fallback-to-empty) has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Read-only view of the current document.
    pub fn document(&self) -> &LogDocument {
        &self.data
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

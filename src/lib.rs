//! A bounded, file-backed chat log for game clients.
//!
//! The log keeps two insertion-ordered sequences - rich-text chat messages
//! and plain sent-history strings - in a single JSON document on disk,
//! restores them on startup, and saves them periodically, on demand, and as
//! a last resort while the host is crashing.
mod config;
pub mod log;
mod types;

pub use config::ChatLogConfig;
pub use log::codec::{decode, encode, DecodeError};
pub use log::restore::ChatUiSink;
pub use log::{ChatLog, LogDocument, TICKS_PER_MINUTE};
pub use types::{MessageIndicator, RichText, RESTORED_INDICATOR};

//! The settings this component reads from the host's configuration.
use serde::{Deserialize, Serialize};

/// The chat log settings consumed from the host's configuration system.
///
/// The host owns the full configuration surface; only the three values the
/// log actually reads are modeled here. Serde derives let hosts embed this
/// struct directly in their own config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatLogConfig {
    /// Whether chat log persistence is enabled at all. When false every
    /// save becomes a no-op; loading and in-memory bookkeeping still work.
    pub enabled: bool,
    /// Maximum number of retained entries, applied separately to the
    /// message and history sequences.
    pub max_messages: usize,
    /// Minutes between automatic saves. Zero disables autosave.
    pub save_interval_minutes: u32,
}

impl Default for ChatLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_messages: 100,
            save_interval_minutes: 0,
        }
    }
}

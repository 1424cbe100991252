//! End-to-end session scenarios: a host loading the log at startup,
//! chatting, crashing, and restoring everything in the next session.
use chatlog::{ChatLog, ChatLogConfig, ChatUiSink, MessageIndicator, RichText, RESTORED_INDICATOR};
use std::fs;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

fn config(max_messages: usize) -> ChatLogConfig {
    ChatLogConfig {
        enabled: true,
        max_messages,
        save_interval_minutes: 0,
    }
}

#[derive(Default)]
struct FakeChatHud {
    history: Vec<String>,
    messages: Vec<(RichText, u32)>,
}

impl ChatUiSink for FakeChatHud {
    fn add_to_history(&mut self, entry: &str) {
        self.history.push(entry.to_owned());
    }

    fn add_message(&mut self, message: &RichText, indicator: &MessageIndicator) {
        self.messages.push((message.clone(), indicator.color));
    }
}

#[test]
fn crash_then_restore_next_session() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chatlog.json");

    // First session: chat a bit, then the host crashes. The crash hook may
    // fire more than once; only the first attempt writes.
    let mut log = ChatLog::new(&path, config(100));
    log.load();
    log.add_message(RichText::plain("<Alice> hi"));
    log.add_message(RichText::plain("<Bob> hey"));
    log.add_history("/msg Bob hey");
    log.save(true);
    log.save(true);

    // Second session: everything comes back, tagged as restored.
    let mut log = ChatLog::new(&path, config(100));
    log.load();
    assert_eq!(log.message_count(), 2);
    assert_eq!(log.history_count(), 1);

    let mut hud = FakeChatHud::default();
    log.restore(&mut hud);

    assert_eq!(hud.history, ["/msg Bob hey"]);
    assert_eq!(hud.messages.len(), 2);
    assert!(hud
        .messages
        .iter()
        .all(|(_, color)| *color == RESTORED_INDICATOR.color));
    assert_eq!(hud.messages[0].0, RichText::plain("<Alice> hi"));
}

#[test]
fn legacy_file_from_an_old_install_still_loads() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chatlog.json");

    // A prettified pre-migration file with UUIDs as int arrays.
    fs::write(
        &path,
        r#"{
  "history": ["/help"],
  "messages": [
    { "text": "<Alice> hi", "id": [ -132296786, 2112623056, -1486552928, -920753162 ] }
  ]
}"#,
    )
    .unwrap();

    let mut log = ChatLog::new(&path, config(100));
    log.load();

    assert_eq!(log.message_count(), 1);
    assert_eq!(log.history_count(), 1);
    let id = &log.document().messages()[0].as_value()["id"];
    assert!(id.is_string(), "legacy id should now be a string: {id}");
    assert_eq!(id.as_str().unwrap().matches('-').count(), 4);

    // Saving writes the migrated form; a fresh load needs no rewrite.
    log.add_history("/seen");
    log.save(false);
    let saved = fs::read_to_string(&path).unwrap();
    assert!(!saved.contains("\"id\":["), "no legacy id arrays should remain");

    let mut reloaded = ChatLog::new(&path, config(100));
    reloaded.load();
    assert_eq!(reloaded.document(), log.document());
}

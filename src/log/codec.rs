//! Converts the chat log document to and from its on-disk JSON text, and
//! repairs the legacy UUID-array format older files still carry.
use crate::log::document::LogDocument;
use std::borrow::Cow;
use thiserror::Error;
use uuid::Uuid;

/// A structural or type error while parsing the on-disk document.
#[derive(Debug, Error)]
#[error("malformed chat log document: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// Parses the raw file text into a document.
///
/// Inputs that clearly hold no data (shorter than two characters, or not
/// starting with `{`) are treated as an absent file and decode to an empty
/// document rather than an error. Before structural parsing the legacy
/// UUID-array rewrite runs over the text, so the parser itself only ever
/// sees the canonical schema. After a successful parse each sequence is
/// trimmed to its newest `max_entries` entries.
pub fn decode(raw: &str, max_entries: usize) -> Result<LogDocument, DecodeError> {
    if raw.len() < 2 || !raw.starts_with('{') {
        return Ok(LogDocument::default());
    }

    let repaired = rewrite_legacy_uuid_fields(raw);
    let mut doc: LogDocument = serde_json::from_str(&repaired)?;
    doc.keep_newest(max_entries);

    Ok(doc)
}

/// Serializes a document to its deterministic on-disk text: a key-sorted
/// JSON object with both arrays oldest-first.
pub fn encode(doc: &LogDocument) -> serde_json::Result<String> {
    serde_json::to_string(doc)
}

/// Rewrites every legacy `"id": [i0,i1,i2,i3]` field to the equivalent
/// `"id":"<dashed-uuid>"` form.
///
/// Older files stored message sender UUIDs as arrays of four signed 32-bit
/// integers. A single left-to-right scan collects all non-overlapping
/// occurrences (whitespace-tolerant, so prettified files match too); text
/// that merely resembles the pattern is copied through untouched. Returns
/// the input unchanged when no legacy field is present.
fn rewrite_legacy_uuid_fields(raw: &str) -> Cow<'_, str> {
    let bytes = raw.as_bytes();
    let mut rewritten: Option<String> = None;
    let mut copied_to = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'"' && raw[i..].starts_with("\"id\"") {
            if let Some((end, uuid)) = match_uuid_array(raw, i + 4) {
                let out = rewritten.get_or_insert_with(|| String::with_capacity(raw.len()));
                out.push_str(&raw[copied_to..i]);
                out.push_str("\"id\":\"");
                out.push_str(&uuid.to_string());
                out.push('"');
                copied_to = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }

    match rewritten {
        None => Cow::Borrowed(raw),
        Some(mut out) => {
            out.push_str(&raw[copied_to..]);
            Cow::Owned(out)
        }
    }
}

/// Matches `: [i0, i1, i2, i3]` starting at `from` (just past the `"id"`
/// key). Returns the index one past the closing bracket and the assembled
/// UUID, or `None` if the text is not a well-formed four-integer array.
fn match_uuid_array(raw: &str, from: usize) -> Option<(usize, Uuid)> {
    let bytes = raw.as_bytes();

    let mut i = skip_whitespace(bytes, from);
    if bytes.get(i) != Some(&b':') {
        return None;
    }
    i = skip_whitespace(bytes, i + 1);
    if bytes.get(i) != Some(&b'[') {
        return None;
    }
    i += 1;

    let mut ints = [0i32; 4];
    for (n, slot) in ints.iter_mut().enumerate() {
        i = skip_whitespace(bytes, i);
        let start = i;
        if bytes.get(i) == Some(&b'-') {
            i += 1;
        }
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        *slot = raw[start..i].parse().ok()?;
        i = skip_whitespace(bytes, i);
        if n < 3 {
            if bytes.get(i) != Some(&b',') {
                return None;
            }
            i += 1;
        }
    }

    if bytes.get(i) != Some(&b']') {
        return None;
    }

    Some((i + 1, uuid_from_int_array(ints)))
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Standard 4x32-bit to 128-bit UUID assembly: the first two integers form
/// the most significant half, the last two the least significant.
fn uuid_from_int_array(ints: [i32; 4]) -> Uuid {
    let msb = (u64::from(ints[0] as u32) << 32) | u64::from(ints[1] as u32);
    let lsb = (u64::from(ints[2] as u32) << 32) | u64::from(ints[3] as u32);
    Uuid::from_u64_pair(msb, lsb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RichText;
    use serde_json::json;

    #[test]
    fn decode_of_encode_is_identity() {
        let mut doc = LogDocument::default();
        doc.add_history("/tp 0 64 0", 100);
        doc.add_history("hello there", 100);
        doc.add_message(RichText::plain("hello there"), 100);
        doc.add_message(
            RichText::from_value(json!({
                "text": "styled",
                "color": "gold",
                "extra": [{"text": " sibling", "italic": true}]
            })),
            100,
        );

        let text = encode(&doc).unwrap();
        assert_eq!(decode(&text, 100).unwrap(), doc);
    }

    #[test]
    fn encoded_keys_are_sorted() {
        let text = encode(&LogDocument::default()).unwrap();
        assert_eq!(text, "{\"history\":[],\"messages\":[]}");
    }

    #[test]
    fn blank_input_is_an_empty_document() {
        for raw in ["", "{", "not json at all", "[1,2,3]"] {
            let doc = decode(raw, 100).unwrap();
            assert!(doc.is_empty(), "expected empty document for {raw:?}");
        }
    }

    #[test]
    fn malformed_object_is_an_error() {
        assert!(decode("{\"history\":[]}", 100).is_err());
        assert!(decode("{\"history\":[],\"messages\":[],\"extra\":1}", 100).is_err());
        assert!(decode("{\"history\":[7],\"messages\":[]}", 100).is_err());
        assert!(decode("{\"history\":[], \"messages\":", 100).is_err());
    }

    #[test]
    fn decode_keeps_only_the_newest_entries() {
        let history: Vec<String> = (0..150).map(|n| format!("cmd {n}")).collect();
        let raw = format!(
            "{{\"history\":{},\"messages\":[]}}",
            serde_json::to_string(&history).unwrap()
        );

        let doc = decode(&raw, 100).unwrap();
        assert_eq!(doc.history_count(), 100);
        assert_eq!(doc.history().first().map(String::as_str), Some("cmd 50"));
        assert_eq!(doc.history().last().map(String::as_str), Some("cmd 149"));
    }

    #[test]
    fn legacy_uuid_array_is_rewritten() {
        let raw = "{\"messages\":[{\"text\":\"hi\",\"id\":[1,2,3,4]}],\"history\":[]}";
        let fixed = rewrite_legacy_uuid_fields(raw);
        assert_eq!(
            fixed,
            "{\"messages\":[{\"text\":\"hi\",\"id\":\"00000001-0000-0002-0000-000300000004\"}],\"history\":[]}"
        );

        // The repaired text parses as a normal document.
        let doc = decode(raw, 100).unwrap();
        assert_eq!(doc.message_count(), 1);
        assert_eq!(
            doc.messages()[0].as_value()["id"],
            json!("00000001-0000-0002-0000-000300000004")
        );
    }

    #[test]
    fn legacy_rewrite_tolerates_whitespace_and_negatives() {
        let raw = "{ \"id\" :\n[ -1 , -2 ,\t-3 , -4 ] }";
        let fixed = rewrite_legacy_uuid_fields(raw);
        assert_eq!(fixed, "{ \"id\":\"ffffffff-ffff-fffe-ffff-fffdfffffffc\" }");
    }

    #[test]
    fn legacy_rewrite_handles_every_occurrence() {
        let raw = "{\"a\":{\"id\":[1,2,3,4]},\"b\":{\"id\":[5,6,7,8]}}";
        let fixed = rewrite_legacy_uuid_fields(raw);
        assert!(!fixed.contains('['));
        assert!(fixed.contains("\"id\":\"00000001-0000-0002-0000-000300000004\""));
        assert!(fixed.contains("\"id\":\"00000005-0000-0006-0000-000700000008\""));
    }

    #[test]
    fn near_misses_are_left_alone() {
        for raw in [
            "{\"id\":[1,2,3]}",          // too few integers
            "{\"id\":[1,2,3,4,5]}",      // too many
            "{\"id\":[1,2,3,\"4\"]}",    // not an integer
            "{\"id\":\"already-fine\"}", // already a string
            "{\"uid\":[1,2,3,4]}",       // different key
        ] {
            assert_eq!(rewrite_legacy_uuid_fields(raw), raw);
        }
    }
}

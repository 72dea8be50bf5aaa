//! Storage key assignment.
//!
//! Keys have the form `{stamp}-{name}` where `stamp` is a millisecond wall-clock
//! stamp forced to be strictly increasing within the process, and `name` is the
//! uploaded file name percent-encoded down to a path-safe alphabet. The
//! encoding is reversible, so downloads can offer the name as uploaded.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Bytes escaped in the name portion of a key.
const KEY_NAME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'-').remove(b'_');

/// Bytes escaped in an RFC 5987 `filename*` value.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Longest file name portion kept in a key.
const MAX_NAME_LEN: usize = 200;
/// Longest key accepted by the backends.
const MAX_KEY_LEN: usize = 255;

/// Assigns unique storage keys to incoming files.
#[derive(Debug, Default)]
pub struct IdentityGenerator {
    last_stamp: AtomicU64,
}

impl IdentityGenerator {
    /// Create a new generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a key for a file with the given original name.
    ///
    /// Two calls on the same generator never return the same key, even for
    /// identical names within the same millisecond.
    pub fn assign(&self, original_name: &str) -> String {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        format!("{}-{}", self.next_stamp(now), encode_name(original_name))
    }

    fn next_stamp(&self, now: u64) -> u64 {
        let (Ok(prev) | Err(prev)) =
            self.last_stamp
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                    Some(now.max(last + 1))
                });
        now.max(prev + 1)
    }
}

/// Recover the file name a key was assigned for.
///
/// Falls back to the whole key when it carries no stamp.
#[must_use]
pub fn original_name(key: &str) -> Cow<'_, str> {
    let name = match key.split_once('-') {
        Some((stamp, name))
            if !stamp.is_empty() && !name.is_empty() && stamp.bytes().all(|b| b.is_ascii_digit()) =>
        {
            name
        }
        _ => key,
    };
    percent_decode_str(name).decode_utf8_lossy()
}

/// `Content-Disposition` value offering `file_name` as a download.
///
/// Names outside printable ASCII get an underscored `filename` fallback plus the
/// exact name as `filename*`.
#[must_use]
pub fn attachment_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            ' ' => c,
            c if c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();

    if fallback == file_name {
        format!("attachment; filename=\"{file_name}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            utf8_percent_encode(file_name, ATTR_CHAR)
        )
    }
}

/// Whether `key` uses only the alphabet [`IdentityGenerator`] emits.
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.starts_with('.')
        && key.chars().all(is_key_char)
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '%')
}

/// Percent-encode a file name for use in a key.
///
/// Over-long names lose characters from the front so the extension survives.
/// Characters are dropped whole, never leaving a partial escape behind.
fn encode_name(filename: &str) -> String {
    let mut kept = Vec::new();
    let mut len = 0;
    for c in filename.chars().rev() {
        let mut buf = [0u8; 4];
        let piece = utf8_percent_encode(c.encode_utf8(&mut buf), KEY_NAME).to_string();
        if len + piece.len() > MAX_NAME_LEN {
            break;
        }
        len += piece.len();
        kept.push(piece);
    }

    if kept.is_empty() {
        "file".to_string()
    } else {
        kept.iter().rev().map(String::as_str).collect()
    }
}

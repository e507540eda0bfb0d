//! Remote object naming
//!
//! Objects are stored as
//! `{user_id}/campaign-backup-{timestamp}[-{suffix}].json`, where the
//! timestamp is ISO-8601 with milliseconds and `:`/`.` replaced by `-`
//! (`2024-03-01T10-15-30-123Z`).

use chrono::{DateTime, SecondsFormat, Utc};

/// File name prefix of every remote backup
pub const FILE_PREFIX: &str = "campaign-backup-";

/// File extension of every remote backup
pub const FILE_EXTENSION: &str = ".json";

/// Longest suffix kept in a file name
pub const MAX_SUFFIX_LEN: usize = 50;

/// Length of an encoded timestamp (`2024-03-01T10-15-30-123Z`)
const ENCODED_TIMESTAMP_LEN: usize = 24;

/// Turn a user-supplied label into a file name suffix
///
/// Lowercases, collapses every run of non-alphanumerics into one dash, trims
/// dashes at both ends and caps the length.
#[must_use]
pub fn sanitize_suffix(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_dash = false;

    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out.truncate(MAX_SUFFIX_LEN);
    out.trim_end_matches('-').to_string()
}

/// Encode a timestamp for use in a file name
#[must_use]
pub fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// File name (without the user folder) for a backup taken at `at`
#[must_use]
pub fn backup_file_name(at: DateTime<Utc>, label: Option<&str>) -> String {
    let suffix = label.map(sanitize_suffix).unwrap_or_default();
    if suffix.is_empty() {
        format!("{FILE_PREFIX}{}{FILE_EXTENSION}", encode_timestamp(at))
    } else {
        format!("{FILE_PREFIX}{}-{suffix}{FILE_EXTENSION}", encode_timestamp(at))
    }
}

/// Full object path in the user's folder
#[must_use]
pub fn object_path(user_id: &str, file_name: &str) -> String {
    format!("{user_id}/{file_name}")
}

/// Human label for a remote file name
#[must_use]
pub fn display_label(file_name: &str) -> String {
    let base = file_name.rsplit('/').next().unwrap_or(file_name);
    let stem = base.strip_suffix(FILE_EXTENSION).unwrap_or(base);
    let rest = stem.strip_prefix(FILE_PREFIX).unwrap_or(stem);

    if !is_encoded_timestamp(rest) {
        return rest.to_string();
    }

    let custom = rest[ENCODED_TIMESTAMP_LEN..].trim_start_matches('-');
    if custom.is_empty() {
        render_timestamp(&rest[..ENCODED_TIMESTAMP_LEN])
    } else {
        custom.to_string()
    }
}

fn is_encoded_timestamp(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() < ENCODED_TIMESTAMP_LEN {
        return false;
    }

    bytes[..ENCODED_TIMESTAMP_LEN]
        .iter()
        .enumerate()
        .all(|(i, b)| match i {
            4 | 7 | 13 | 16 | 19 => *b == b'-',
            10 => *b == b'T',
            23 => *b == b'Z',
            _ => b.is_ascii_digit(),
        })
}

// `2024-03-01T10-15-30-123Z` -> `2024-03-01 10:15:30`
fn render_timestamp(encoded: &str) -> String {
    format!(
        "{} {}:{}:{}",
        &encoded[..10],
        &encoded[11..13],
        &encoded[14..16],
        &encoded[17..19]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 30).unwrap()
            + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn sanitize_collapses_punctuation() {
        assert_eq!(sanitize_suffix("My Backup!! 2024"), "my-backup-2024");
        assert_eq!(sanitize_suffix("--Before the Boss--"), "before-the-boss");
        assert_eq!(sanitize_suffix("!!!"), "");
    }

    #[test]
    fn sanitize_caps_length_without_trailing_dash() {
        let long = format!("{} tail", "a".repeat(49));
        let suffix = sanitize_suffix(&long);
        assert_eq!(suffix, "a".repeat(49));
        assert!(suffix.len() <= MAX_SUFFIX_LEN);
    }

    #[test]
    fn file_name_encodes_timestamp() {
        assert_eq!(
            backup_file_name(at(), None),
            "campaign-backup-2024-03-01T10-15-30-123Z.json"
        );
        assert_eq!(
            backup_file_name(at(), Some("Session 12")),
            "campaign-backup-2024-03-01T10-15-30-123Z-session-12.json"
        );
        assert_eq!(
            object_path("user-1", "campaign-backup-x.json"),
            "user-1/campaign-backup-x.json"
        );
    }

    #[test]
    fn label_prefers_custom_segment() {
        assert_eq!(
            display_label("campaign-backup-2024-03-01T10-15-30-123Z-session-12.json"),
            "session-12"
        );
        assert_eq!(
            display_label("user-1/campaign-backup-2024-03-01T10-15-30-123Z.json"),
            "2024-03-01 10:15:30"
        );
        assert_eq!(display_label("campaign-backup-legacy.json"), "legacy");
        assert_eq!(display_label("notes.json"), "notes");
    }
}

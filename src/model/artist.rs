use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use super::{bool_or, opt_str, opt_timestamp, req_i64, req_str, DecodeError};

/// One row for the `artists` relation plus the alias strings that expand
/// into `artists_aliases` rows at write time.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistEntry {
    pub id: i64,
    pub name: String,
    pub group_name: Option<String>,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub is_deleted: bool,
    pub is_banned: bool,
    pub other_names: Vec<String>,
}

/// One row for the `artists_urls` relation.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistUrlEntry {
    pub id: i64,
    pub artist_id: i64,
    pub url: String,
    pub is_active: bool,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

pub fn decode_artist(raw: &Value) -> Result<ArtistEntry, DecodeError> {
    // Empty alias strings are dropped the same way empty tag tokens are.
    let other_names = match raw.get("other_names").and_then(Value::as_array) {
        Some(names) => names
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned)
            .collect(),
        None => Vec::new(),
    };

    Ok(ArtistEntry {
        id: req_i64(raw, "id")?,
        name: req_str(raw, "name")?,
        group_name: opt_str(raw, "group_name")?,
        created_at: opt_timestamp(raw, "created_at")?,
        updated_at: opt_timestamp(raw, "updated_at")?,
        is_deleted: bool_or(raw, "is_deleted", false)?,
        is_banned: bool_or(raw, "is_banned", false)?,
        other_names,
    })
}

pub fn decode_artist_url(raw: &Value) -> Result<ArtistUrlEntry, DecodeError> {
    Ok(ArtistUrlEntry {
        id: req_i64(raw, "id")?,
        artist_id: req_i64(raw, "artist_id")?,
        url: req_str(raw, "url")?,
        is_active: bool_or(raw, "is_active", true)?,
        created_at: opt_timestamp(raw, "created_at")?,
        updated_at: opt_timestamp(raw, "updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_artist_with_aliases() {
        let artist = decode_artist(&json!({
            "id": 31,
            "name": "houshou",
            "group_name": null,
            "created_at": "2020-06-01T00:00:00.000-04:00",
            "updated_at": "2021-01-01T00:00:00.000-05:00",
            "is_deleted": false,
            "is_banned": false,
            "other_names": ["hoshou", " housyou ", ""],
        }))
        .unwrap();
        assert_eq!(artist.id, 31);
        assert_eq!(artist.group_name, None);
        assert_eq!(artist.other_names, vec!["hoshou", "housyou"]);
    }

    #[test]
    fn test_artist_without_other_names() {
        let artist = decode_artist(&json!({"id": 1, "name": "solo"})).unwrap();
        assert!(artist.other_names.is_empty());
        assert!(!artist.is_deleted);
    }

    #[test]
    fn test_artist_requires_id() {
        let err = decode_artist(&json!({"name": "anon"})).unwrap_err();
        assert_eq!(err, DecodeError::MissingField("id"));
    }

    #[test]
    fn test_decode_artist_url_defaults_active() {
        let url = decode_artist_url(&json!({
            "id": 5,
            "artist_id": 31,
            "url": "https://example.net/houshou",
        }))
        .unwrap();
        assert!(url.is_active);
        assert_eq!(url.created_at, None);
    }

    #[test]
    fn test_artist_url_requires_artist_id() {
        let err = decode_artist_url(&json!({"id": 5, "url": "https://x"})).unwrap_err();
        assert_eq!(err, DecodeError::MissingField("artist_id"));
    }
}

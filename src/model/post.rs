use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use super::{
    bool_or, opt_i64, opt_str, opt_timestamp, req_i64, split_tag_string, DecodeError,
};

/// One row for the `posts` relation. Only `id` is required in the source
/// record; every other field degrades to NULL or its documented default.
#[derive(Debug, Clone, PartialEq)]
pub struct PostEntry {
    pub id: i64,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub uploader_id: Option<i64>,
    pub score: i64,
    pub up_score: i64,
    pub down_score: i64,
    pub fav_count: i64,
    pub source: Option<String>,
    pub md5: Option<String>,
    pub rating: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub file_ext: Option<String>,
    pub file_size: Option<i64>,
    pub parent_id: Option<i64>,
    pub pixiv_id: Option<i64>,
    pub has_children: bool,
    pub is_pending: bool,
    pub is_flagged: bool,
    pub is_deleted: bool,
    pub is_banned: bool,
}

/// One row for `posts_media_variants`, expanded from
/// `media_asset.variants[]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaVariantEntry {
    pub post_id: i64,
    pub variant_type: Option<String>,
    pub url: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// One row for `posts_file_urls`; all three URL columns are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUrlEntry {
    pub post_id: i64,
    pub file_url: Option<String>,
    pub large_file_url: Option<String>,
    pub preview_file_url: Option<String>,
}

/// Everything one raw post record expands into: the post row, its media
/// variant rows, its file-URL row, and the tag names referenced by its
/// `tag_string` (resolved to ids at write time).
#[derive(Debug, Clone, PartialEq)]
pub struct PostBundle {
    pub post: PostEntry,
    pub variants: Vec<MediaVariantEntry>,
    pub file_urls: FileUrlEntry,
    pub tag_names: Vec<String>,
}

pub fn decode_post(raw: &Value) -> Result<PostBundle, DecodeError> {
    let id = req_i64(raw, "id")?;

    let post = PostEntry {
        id,
        created_at: opt_timestamp(raw, "created_at")?,
        updated_at: opt_timestamp(raw, "updated_at")?,
        uploader_id: opt_i64(raw, "uploader_id")?,
        score: opt_i64(raw, "score")?.unwrap_or(0),
        up_score: opt_i64(raw, "up_score")?.unwrap_or(0),
        down_score: opt_i64(raw, "down_score")?.unwrap_or(0),
        fav_count: opt_i64(raw, "fav_count")?.unwrap_or(0),
        source: opt_str(raw, "source")?,
        md5: opt_str(raw, "md5")?,
        rating: opt_str(raw, "rating")?,
        width: opt_i64(raw, "image_width")?,
        height: opt_i64(raw, "image_height")?,
        file_ext: opt_str(raw, "file_ext")?,
        file_size: opt_i64(raw, "file_size")?,
        parent_id: opt_i64(raw, "parent_id")?,
        pixiv_id: opt_i64(raw, "pixiv_id")?,
        has_children: bool_or(raw, "has_children", false)?,
        is_pending: bool_or(raw, "is_pending", false)?,
        is_flagged: bool_or(raw, "is_flagged", false)?,
        is_deleted: bool_or(raw, "is_deleted", false)?,
        is_banned: bool_or(raw, "is_banned", false)?,
    };

    let file_urls = FileUrlEntry {
        post_id: id,
        file_url: opt_str(raw, "file_url")?,
        large_file_url: opt_str(raw, "large_file_url")?,
        preview_file_url: opt_str(raw, "preview_file_url")?,
    };

    let tag_names = match opt_str(raw, "tag_string")? {
        Some(s) => split_tag_string(&s),
        None => Vec::new(),
    };

    Ok(PostBundle {
        post,
        variants: decode_variants(raw, id)?,
        file_urls,
        tag_names,
    })
}

/// A missing `media_asset` or `variants` collection means zero children,
/// not an error.
fn decode_variants(raw: &Value, post_id: i64) -> Result<Vec<MediaVariantEntry>, DecodeError> {
    let variants = match raw
        .get("media_asset")
        .and_then(|m| m.get("variants"))
        .and_then(Value::as_array)
    {
        Some(vs) => vs,
        None => return Ok(Vec::new()),
    };

    variants
        .iter()
        .map(|v| {
            Ok(MediaVariantEntry {
                post_id,
                variant_type: opt_str(v, "type")?,
                url: opt_str(v, "url")?,
                width: opt_i64(v, "width")?,
                height: opt_i64(v, "height")?,
            })
        })
        .collect()
}

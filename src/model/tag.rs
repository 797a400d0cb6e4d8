use serde_json::Value;

use super::{bool_or, opt_i64, req_i64, req_str, DecodeError};

/// One row for the `tags` relation. `name` is the key the resolution
/// cache indexes by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub id: i64,
    pub name: String,
    pub category: Option<i64>,
    pub is_deprecated: bool,
}

/// One alias or implication row. The two relations share a shape; the
/// destination is chosen at write time, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPairEntry {
    pub id: i64,
    pub antecedent_name: String,
    pub consequent_name: String,
}

pub fn decode_tag(raw: &Value) -> Result<TagEntry, DecodeError> {
    Ok(TagEntry {
        id: req_i64(raw, "id")?,
        name: req_str(raw, "name")?,
        // Category codes pass through unvalidated so new ones keep loading.
        category: opt_i64(raw, "category")?,
        is_deprecated: bool_or(raw, "is_deprecated", false)?,
    })
}

pub fn decode_tag_pair(raw: &Value) -> Result<TagPairEntry, DecodeError> {
    Ok(TagPairEntry {
        id: req_i64(raw, "id")?,
        antecedent_name: req_str(raw, "antecedent_name")?,
        consequent_name: req_str(raw, "consequent_name")?,
    })
}

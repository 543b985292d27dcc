use serde_json::{Map, Value};

// Lookup tables for the field names payloads use. Earlier entries win.

pub const NODE_ID_KEYS: &[&str] = &["id", "gid", "elementId", "element_id"];

pub const NODE_NAME_KEYS: &[&str] = &[
    "name",
    "title",
    "Entity Name",
    "entity_name",
    "relationship_name",
    "Relationship NAME",
    "summary",
    "Summary",
];

/// `labels` is handled separately: its first element is used when none of these is present.
pub const NODE_TYPE_KEYS: &[&str] = &["node_type", "nodeType", "type"];

pub const NODE_CATEGORY_KEYS: &[&str] = &["category"];

pub const LINK_ID_KEYS: &[&str] = &["id", "gid", "elementId", "element_id"];

pub const LINK_SOURCE_KEYS: &[&str] = &["sourceId", "source", "from_gid"];

pub const LINK_TARGET_KEYS: &[&str] = &["targetId", "target", "to_gid"];

pub const LINK_LABEL_KEYS: &[&str] = &[
    "label",
    "relationship_summary",
    "summary",
    "Relationship Summary",
    "type",
];

pub const LINK_TYPE_KEYS: &[&str] = &["type", "link_type", "relationship_type"];

pub const LINK_TITLE_KEYS: &[&str] = &["title", "article_title", "Article Title", "Source Title"];

pub const LINK_URL_KEYS: &[&str] = &["url", "article_url", "Article URL", "Source URL"];

/// First key of `keys` present in `entry` with a usable scalar value, and that value as text.
/// Nested objects resolve through their own `id`-like keys, so `{"source": {"id": 7}}` gives `"7"`.
pub fn first_alias(
    entry: &Map<String, Value>,
    keys: &[&'static str],
) -> Option<(&'static str, String)> {
    resolve_alias(entry, keys).map(|resolved| (keys[resolved.position], resolved.text))
}

pub(super) struct ResolvedAlias {
    pub(super) position: usize,
    pub(super) text: String,
}

impl ResolvedAlias {
    /// Keys of `keys` examined before (and including) the winner. The earlier ones were absent
    /// or blank.
    pub(super) fn examined<'k>(&self, keys: &'k [&'static str]) -> &'k [&'static str] {
        &keys[..=self.position]
    }
}

pub(super) fn resolve_alias(entry: &Map<String, Value>, keys: &[&'static str]) -> Option<ResolvedAlias> {
    keys.iter().enumerate().find_map(|(position, key)| {
        entry
            .get(*key)
            .and_then(scalar_text)
            .map(|text| ResolvedAlias { position, text })
    })
}

pub(super) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Object(nested) => first_alias(nested, NODE_ID_KEYS).map(|(_, text)| text),
        Value::Null | Value::Array(_) => None,
    }
}

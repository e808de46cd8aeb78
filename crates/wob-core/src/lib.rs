//! Core domain model for normalized Wob disclosure items.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "wob-core";

/// Rights string emitted for every item.
pub const RIGHTS: &str = "Undefined";

/// Collection name emitted for every item.
pub const COLLECTION: &str = "Utrecht";

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Value type of a field in the combined index schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexFieldType {
    Boolean,
    String,
    DateTime,
    List,
}

/// Field schema declared to the index collaborator.
pub const INDEX_FIELD_SCHEMA: &[(&str, IndexFieldType)] = &[
    ("hidden", IndexFieldType::Boolean),
    ("title", IndexFieldType::String),
    ("description", IndexFieldType::String),
    ("start_date", IndexFieldType::DateTime),
    ("end_date", IndexFieldType::DateTime),
    ("authors", IndexFieldType::List),
    ("media_urls", IndexFieldType::List),
    ("all_text", IndexFieldType::String),
    ("id", IndexFieldType::String),
    ("status", IndexFieldType::String),
    ("sender", IndexFieldType::String),
    ("categories", IndexFieldType::List),
];

pub type ItemDate = DateTime<FixedOffset>;

/// Attachment reference extracted from a disclosure page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUrl {
    pub url: String,
    pub content_type: String,
    pub label: String,
}

/// Where an item was published. Both fields are absent for records without a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SourceUrls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<String>,
}

impl SourceUrls {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_none() && self.archived.is_none()
    }
}

/// Fields handed to the combined index. A field a record variant does not
/// produce is omitted rather than written as null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IndexFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<ItemDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<ItemDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_urls: Option<Vec<MediaUrl>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

/// Canonical representation of one raw record, built once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalItem {
    /// Hashed, namespace-qualified identifier. Always present.
    pub object_id: String,
    /// Identifier as resolved from the title or structured input, before hashing.
    pub original_id: Option<String>,
    pub collection: String,
    pub rights: String,
    pub source_urls: SourceUrls,
    pub all_text: String,
    pub index: IndexFields,
}

/// One entry of the source registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    pub source_id: String,
    /// Namespace used when hashing identifiers.
    pub index_name: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Record bundle path, relative to the workspace root.
    pub bundle: String,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_fields_omit_absent_values() {
        let fields = IndexFields {
            categories: Some(vec!["Wonen".to_string()]),
            ..Default::default()
        };
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json, serde_json::json!({ "categories": ["Wonen"] }));
    }

    #[test]
    fn empty_source_urls_serialize_as_empty_mapping() {
        let json = serde_json::to_string(&SourceUrls::empty()).unwrap();
        assert_eq!(json, "{}");
        assert!(SourceUrls::empty().is_empty());
    }

    #[test]
    fn schema_lists_every_index_field_once() {
        let mut names: Vec<_> = INDEX_FIELD_SCHEMA.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), INDEX_FIELD_SCHEMA.len());
    }

    #[test]
    fn source_definition_defaults() {
        let def: SourceDefinition = serde_json::from_str(
            r#"{"source_id":"utrecht","index_name":"utrecht","bundle":"fixtures/x.json"}"#,
        )
        .unwrap();
        assert!(def.enabled);
        assert!(!def.hidden);
        assert_eq!(def.notes, None);
    }
}

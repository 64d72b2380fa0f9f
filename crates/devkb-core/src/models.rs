//! Core data models for DevKB.
//!
//! A [`KnowledgeEntry`] is the only stored entity. It is serialized as
//! camelCase JSON so the same shape is used by the HTTP API, the web
//! frontend, and the CLI's flat-file records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::store::EntryError;

/// Fixed classification of a knowledge entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Code,
    Documentation,
    Conversation,
    Decision,
    Architecture,
    Process,
}

impl EntryType {
    pub const ALL: [EntryType; 6] = [
        EntryType::Code,
        EntryType::Documentation,
        EntryType::Conversation,
        EntryType::Decision,
        EntryType::Architecture,
        EntryType::Process,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Code => "code",
            EntryType::Documentation => "documentation",
            EntryType::Conversation => "conversation",
            EntryType::Decision => "decision",
            EntryType::Architecture => "architecture",
            EntryType::Process => "process",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no [`EntryType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entry type: {0}")]
pub struct ParseEntryTypeError(pub String);

impl FromStr for EntryType {
    type Err = ParseEntryTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(EntryType::Code),
            // `doc` is the short form the CLI advertises.
            "documentation" | "doc" => Ok(EntryType::Documentation),
            "conversation" => Ok(EntryType::Conversation),
            "decision" => Ok(EntryType::Decision),
            "architecture" => Ok(EntryType::Architecture),
            "process" => Ok(EntryType::Process),
            other => Err(ParseEntryTypeError(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for EntryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Accepts a missing, `null`, or empty `type` as "not supplied".
fn deserialize_optional_type<'de, D>(deserializer: D) -> Result<Option<EntryType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// A stored knowledge record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub title: String,
    pub content: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Payload for creating an entry.
///
/// Every field is optional on the wire so that a missing `type`, `title`,
/// or `content` is reported as a validation error rather than a decode
/// failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    #[serde(rename = "type", default, deserialize_with = "deserialize_optional_type")]
    pub entry_type: Option<EntryType>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_path: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl NewEntry {
    /// Builds a fresh entry with a new UUID and `created_at == updated_at`.
    ///
    /// `default_source` is used when the payload carries no `source`.
    pub fn into_entry(
        self,
        default_source: &str,
        now: DateTime<Utc>,
    ) -> Result<KnowledgeEntry, EntryError> {
        let (entry_type, title, content) = match (
            self.entry_type,
            non_empty(self.title),
            non_empty(self.content),
        ) {
            (Some(t), Some(title), Some(content)) => (t, title, content),
            _ => return Err(EntryError::MissingRequired),
        };

        Ok(KnowledgeEntry {
            id: uuid::Uuid::new_v4().to_string(),
            entry_type,
            title,
            content,
            source: non_empty(self.source).unwrap_or_else(|| default_source.to_string()),
            source_path: non_empty(self.source_path),
            tags: self.tags.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            metadata: self.metadata,
        })
    }
}

/// Partial update payload with merge semantics.
///
/// Absent fields, and empty strings for text fields, keep the prior value.
/// A supplied `tags` array or `metadata` object replaces the prior one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    #[serde(rename = "type", default, deserialize_with = "deserialize_optional_type")]
    pub entry_type: Option<EntryType>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_path: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl EntryPatch {
    /// Merges this patch into `entry` and refreshes `updated_at`.
    pub fn apply(&self, entry: &mut KnowledgeEntry, now: DateTime<Utc>) {
        if let Some(t) = self.entry_type {
            entry.entry_type = t;
        }
        if let Some(title) = non_empty_ref(&self.title) {
            entry.title = title.to_string();
        }
        if let Some(content) = non_empty_ref(&self.content) {
            entry.content = content.to_string();
        }
        if let Some(source) = non_empty_ref(&self.source) {
            entry.source = source.to_string();
        }
        if let Some(path) = non_empty_ref(&self.source_path) {
            entry.source_path = Some(path.to_string());
        }
        if let Some(ref tags) = self.tags {
            entry.tags = tags.clone();
        }
        if let Some(ref metadata) = self.metadata {
            entry.metadata = Some(metadata.clone());
        }
        entry.updated_at = now.max(entry.created_at);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn non_empty_ref(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

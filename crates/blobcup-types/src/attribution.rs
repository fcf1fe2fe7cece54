use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::candidate::{Candidate, CandidateId};
use crate::error::TypeError;

/// Who uploaded a blob, and when.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploaderRecord {
    pub email: String,
    #[serde(rename = "uploadTime", serialize_with = "serialize_millis")]
    pub upload_time: DateTime<Utc>,
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
fn serialize_millis<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Uploader attribution for every blob of one container.
///
/// Persisted as `{ "<key>": { "email": ..., "uploadTime": ... } }`. Records
/// are appended on upload and never pruned, so the index may mention keys
/// that no longer exist in the container.
///
/// Records are kept as raw JSON. One that does not decode as an
/// [`UploaderRecord`] (odd timestamp, missing field) is still carried
/// through a rewrite untouched; it just reports no uploader.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributionIndex {
    records: BTreeMap<CandidateId, Value>,
}

impl AttributionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails only when the text is not a JSON object.
    pub fn from_json(text: &str) -> Result<Self, TypeError> {
        serde_json::from_str(text).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String, TypeError> {
        serde_json::to_string_pretty(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Record (or overwrite) the uploader of `id`.
    pub fn record(&mut self, id: CandidateId, email: impl Into<String>, at: DateTime<Utc>) {
        let mut record = serde_json::Map::new();
        record.insert("email".into(), Value::String(email.into()));
        record.insert(
            "uploadTime".into(),
            Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        self.records.insert(id, Value::Object(record));
    }

    /// The decoded record of `id`, if present and well formed.
    pub fn get(&self, id: &str) -> Option<UploaderRecord> {
        serde_json::from_value(self.records.get(id)?.clone()).ok()
    }

    /// Uploader e-mail of `id`. Read straight from the raw record, so it
    /// survives a timestamp that does not parse.
    pub fn email_for(&self, id: &str) -> Option<&str> {
        self.records.get(id)?.get("email")?.as_str()
    }

    /// Fill in `uploader` on every candidate this index knows about.
    pub fn annotate(&self, candidates: &mut [Candidate]) {
        for candidate in candidates {
            if let Some(email) = self.email_for(candidate.id.as_str()) {
                candidate.uploader = Some(email.to_string());
            }
        }
    }

    /// Number of records, including ones that do not decode.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

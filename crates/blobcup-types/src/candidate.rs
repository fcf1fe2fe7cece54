use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blob::BlobEntry;
use crate::error::TypeError;

/// Opaque key of an uploaded item inside a container.
///
/// Candidate ids are the store keys themselves (e.g. `1700000000000_cat.png`).
/// They are created once on upload and never change afterwards.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    /// Wrap a store key. Empty keys are rejected.
    pub fn new(key: impl Into<String>) -> Result<Self, TypeError> {
        let key = key.into();
        if key.is_empty() {
            return Err(TypeError::EmptyId);
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Borrow<str> for CandidateId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CandidateId({})", self.0)
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An item that can be voted on or entered into a bracket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    /// Dereferenceable location of the content (a URL for remote stores).
    pub locator: String,
    /// Uploader e-mail, when the upload carried one.
    pub uploader: Option<String>,
}

impl Candidate {
    pub fn new(id: CandidateId, locator: impl Into<String>) -> Self {
        Self {
            id,
            locator: locator.into(),
            uploader: None,
        }
    }

    pub fn with_uploader(mut self, email: impl Into<String>) -> Self {
        self.uploader = Some(email.into());
        self
    }

    /// Build a candidate from a listing row. Returns `None` for rows whose
    /// name is not a usable id.
    pub fn from_entry(entry: &BlobEntry) -> Option<Self> {
        let id = CandidateId::new(entry.name.clone()).ok()?;
        Some(Self::new(id, entry.locator.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn empty_id_is_rejected() {
        assert_eq!(CandidateId::new(""), Err(TypeError::EmptyId));
    }

    #[test]
    fn display_is_raw_key() {
        let id = CandidateId::new("1700_cat.png").unwrap();
        assert_eq!(id.to_string(), "1700_cat.png");
        assert_eq!(format!("{id:?}"), "CandidateId(1700_cat.png)");
    }

    #[test]
    fn serializes_as_plain_map_key() {
        let mut map = BTreeMap::new();
        map.insert(CandidateId::new("a.png").unwrap(), 3u64);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"a.png":3}"#);

        let back: BTreeMap<CandidateId, u64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("a.png"), Some(&3));
    }

    #[test]
    fn candidate_from_entry_keeps_locator() {
        let entry = BlobEntry {
            name: "x.jpg".into(),
            size: 10,
            content_type: "image/jpeg".into(),
            last_modified: None,
            locator: "https://acct.blob.core.windows.net/images/x.jpg?sig".into(),
        };
        let c = Candidate::from_entry(&entry).unwrap();
        assert_eq!(c.id.as_str(), "x.jpg");
        assert_eq!(c.locator, entry.locator);
        assert!(c.uploader.is_none());
    }

    #[test]
    fn candidate_from_nameless_entry_is_none() {
        let entry = BlobEntry {
            name: String::new(),
            size: 0,
            content_type: String::new(),
            last_modified: None,
            locator: String::new(),
        };
        assert!(Candidate::from_entry(&entry).is_none());
    }
}

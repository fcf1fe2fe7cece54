use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of a container listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobEntry {
    /// Key of the blob inside its container.
    pub name: String,
    /// Content length in bytes.
    pub size: u64,
    /// MIME type as reported by the store (may be empty).
    pub content_type: String,
    pub last_modified: Option<DateTime<Utc>>,
    /// Dereferenceable location of the blob.
    pub locator: String,
}

impl BlobEntry {
    pub fn kind(&self) -> ContentKind {
        ContentKind::from_mime(&self.content_type)
    }

    pub fn is_image(&self) -> bool {
        self.kind() == ContentKind::Image
    }
}

/// Coarse classification of a MIME type, used to filter candidates and to
/// label file listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Image,
    Video,
    Audio,
    Pdf,
    Word,
    Spreadsheet,
    Presentation,
    Archive,
    Text,
    Other,
}

impl ContentKind {
    /// Classify a MIME type. Prefix rules win over substring rules, and the
    /// substring rules are checked in a fixed order.
    pub fn from_mime(content_type: &str) -> Self {
        let ct = content_type.to_ascii_lowercase();
        if ct.starts_with("image/") {
            return Self::Image;
        }
        if ct.starts_with("video/") {
            return Self::Video;
        }
        if ct.starts_with("audio/") {
            return Self::Audio;
        }
        if ct.contains("pdf") {
            Self::Pdf
        } else if ct.contains("word") {
            Self::Word
        } else if ct.contains("excel") || ct.contains("spreadsheet") {
            Self::Spreadsheet
        } else if ct.contains("powerpoint") || ct.contains("presentation") {
            Self::Presentation
        } else if ct.contains("zip") || ct.contains("rar") {
            Self::Archive
        } else if ct.contains("text") {
            Self::Text
        } else {
            Self::Other
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Image => "🖼️",
            Self::Video => "🎥",
            Self::Audio => "🎵",
            Self::Pdf => "📕",
            Self::Word => "📘",
            Self::Spreadsheet => "📊",
            Self::Presentation => "📙",
            Self::Archive => "📦",
            Self::Text => "📄",
            Self::Other => "📎",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Pdf => "pdf",
            Self::Word => "word",
            Self::Spreadsheet => "spreadsheet",
            Self::Presentation => "presentation",
            Self::Archive => "archive",
            Self::Text => "text",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size with a 1024 base and at most two decimals.
///
/// Anything at or above 1024 GB is still reported in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{rounded} {}", SIZE_UNITS[unit])
}

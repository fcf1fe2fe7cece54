use std::fmt;
use std::path::{Path, PathBuf};

use blobcup_store::StoreConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SdkError, SdkResult};

/// Overrides `store.account_name`.
pub const ACCOUNT_ENV: &str = "BLOBCUP_ACCOUNT";
/// Overrides `store.sas_token`.
pub const SAS_TOKEN_ENV: &str = "BLOBCUP_SAS_TOKEN";

/// What a category is for. Decides which view a front end renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Upload,
    Gallery,
    Filelist,
    Voting,
    Worldcup,
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Upload => "upload",
            Self::Gallery => "gallery",
            Self::Filelist => "filelist",
            Self::Voting => "voting",
            Self::Worldcup => "worldcup",
        };
        f.write_str(s)
    }
}

/// A named view over one container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub kind: CategoryKind,
    pub container: String,
}

impl Category {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: CategoryKind,
        container: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            container: container.into(),
        }
    }
}

/// Application configuration, read from TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub categories: Vec<Category>,
    /// Local profile file. Defaults to `~/.blobcup/profile.json`.
    pub profile_path: Option<PathBuf>,
    /// Ledger blob name inside every voting container.
    pub votes_blob: String,
    /// Attribution blob name inside every upload container.
    pub metadata_blob: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            categories: default_categories(),
            profile_path: None,
            votes_blob: blobcup_ledger::DEFAULT_LEDGER_BLOB.to_string(),
            metadata_blob: "metadata.json".to_string(),
        }
    }
}

fn default_categories() -> Vec<Category> {
    use CategoryKind::*;
    vec![
        Category::new("upload-images", "Upload Images", Upload, "images"),
        Category::new("upload-docs", "Upload Documents", Upload, "documents"),
        Category::new("gallery", "Gallery", Gallery, "images"),
        Category::new("file-list", "File List", Filelist, "documents"),
        Category::new("voting", "Image Voting", Voting, "images"),
        Category::new("worldcup", "Image World Cup", Worldcup, "worldcup"),
        Category::new("worldcupgallery", "World Cup Entries", Gallery, "worldcup"),
    ]
}

impl AppConfig {
    /// Read `path`, then apply environment overrides. A missing file
    /// yields the defaults.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text).map_err(|reason| SdkError::Config {
                path: path.to_path_buf(),
                reason,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(source) => {
                return Err(SdkError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        config.apply_overrides(
            std::env::var(ACCOUNT_ENV).ok(),
            std::env::var(SAS_TOKEN_ENV).ok(),
        );
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Replace store credentials with non-empty overrides.
    pub fn apply_overrides(&mut self, account: Option<String>, sas_token: Option<String>) {
        if let Some(account) = account.filter(|a| !a.is_empty()) {
            self.store.account_name = account;
        }
        if let Some(token) = sas_token.filter(|t| !t.is_empty()) {
            self.store.sas_token = token;
        }
    }

    pub fn category(&self, id: &str) -> SdkResult<&Category> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| SdkError::UnknownCategory(id.to_string()))
    }

    pub fn resolved_profile_path(&self) -> PathBuf {
        if let Some(path) = &self.profile_path {
            return path.clone();
        }
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        home.join(".blobcup").join("profile.json")
    }

    /// Default config file location, `~/.blobcup/config.toml`.
    pub fn default_path() -> PathBuf {
        Self::default()
            .resolved_profile_path()
            .with_file_name("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = AppConfig::default();
        assert_eq!(c.categories.len(), 7);
        assert_eq!(c.votes_blob, "votes.json");
        assert_eq!(c.metadata_blob, "metadata.json");
        assert!(c.profile_path.is_none());

        let voting = c.category("voting").unwrap();
        assert_eq!(voting.kind, CategoryKind::Voting);
        assert_eq!(voting.container, "images");
        assert_eq!(c.category("worldcupgallery").unwrap().kind, CategoryKind::Gallery);
    }

    #[test]
    fn unknown_category() {
        let c = AppConfig::default();
        assert!(matches!(c.category("nope"), Err(SdkError::UnknownCategory(id)) if id == "nope"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = AppConfig::from_toml(
            r#"
            votes_blob = "ballots.json"

            [store]
            account_name = "dncstorage"
            sas_token = "sv=1&sig=abc"

            [store.retry]
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(c.votes_blob, "ballots.json");
        assert_eq!(c.metadata_blob, "metadata.json");
        assert_eq!(c.store.account_name, "dncstorage");
        assert_eq!(c.store.retry.max_attempts, 5);
        assert_eq!(c.store.retry.base_backoff_ms, 120);
        assert_eq!(c.categories.len(), 7);
    }

    #[test]
    fn categories_replace_defaults() {
        let c = AppConfig::from_toml(
            r#"
            [[categories]]
            id = "cats"
            name = "Cats"
            kind = "worldcup"
            container = "cats"
            "#,
        )
        .unwrap();
        assert_eq!(
            c.categories,
            vec![Category::new("cats", "Cats", CategoryKind::Worldcup, "cats")]
        );
    }

    #[test]
    fn bad_kind_is_rejected() {
        let err = AppConfig::from_toml(
            r#"
            [[categories]]
            id = "x"
            name = "X"
            kind = "slideshow"
            container = "x"
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn overrides_ignore_empty_values() {
        let mut c = AppConfig::default();
        c.store.account_name = "file".into();
        c.apply_overrides(Some(String::new()), Some("?sv=2".into()));
        assert_eq!(c.store.account_name, "file");
        assert_eq!(c.store.sas_token, "?sv=2");
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(c.categories.len(), 7);
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "votes_blob = [").unwrap();
        match AppConfig::load(&path) {
            Err(SdkError::Config { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn explicit_profile_path_wins() {
        let c = AppConfig {
            profile_path: Some(PathBuf::from("/tmp/p.json")),
            ..AppConfig::default()
        };
        assert_eq!(c.resolved_profile_path(), PathBuf::from("/tmp/p.json"));
        assert!(AppConfig::default().resolved_profile_path().ends_with(".blobcup/profile.json"));
    }

    #[test]
    fn kind_display_matches_serde() {
        assert_eq!(CategoryKind::Filelist.to_string(), "filelist");
        assert_eq!(CategoryKind::Worldcup.to_string(), "worldcup");
    }
}

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use blobcup_types::{CandidateId, VoterId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{IdentityError, IdentityResult};
use crate::fingerprint::Fingerprint;
use crate::traits::IdentityProvider;

/// Everything blobcup remembers about this device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalProfile {
    pub browser_id: Option<VoterId>,
    /// Scope -> candidate this device last voted for.
    pub ballots: BTreeMap<String, CandidateId>,
}

/// Identity provider backed by a JSON profile file.
///
/// The profile is read once on open and rewritten atomically (temp file +
/// rename) on every change. An unreadable or corrupt profile is treated as
/// empty; the next change replaces it.
pub struct FileIdentityStore {
    path: PathBuf,
    profile: RwLock<LocalProfile>,
    fingerprint: fn() -> VoterId,
}

impl FileIdentityStore {
    pub fn open(path: impl Into<PathBuf>) -> IdentityResult<Self> {
        Self::open_with(path, Fingerprint::detect)
    }

    /// Open with a custom id generator (used when a front end has richer
    /// traits than the process environment).
    pub fn open_with(
        path: impl Into<PathBuf>,
        fingerprint: fn() -> VoterId,
    ) -> IdentityResult<Self> {
        let path = path.into();
        let profile = load_profile(&path)?;
        Ok(Self {
            path,
            profile: RwLock::new(profile),
            fingerprint,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> LocalProfile {
        self.profile.read().expect("lock poisoned").clone()
    }

    fn persist(&self, profile: &LocalProfile) -> IdentityResult<()> {
        let io_err = |source| IdentityError::Io {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(io_err)?;

        let json = serde_json::to_vec_pretty(profile)
            .map_err(|e| IdentityError::Serialization(e.to_string()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        debug!(path = %self.path.display(), "profile saved");
        Ok(())
    }
}

fn load_profile(path: &Path) -> IdentityResult<LocalProfile> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LocalProfile::default()),
        Err(source) => {
            return Err(IdentityError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(profile) => Ok(profile),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt profile, starting fresh");
            Ok(LocalProfile::default())
        }
    }
}

impl IdentityProvider for FileIdentityStore {
    fn voter_id(&self) -> IdentityResult<VoterId> {
        if let Some(id) = &self.profile.read().expect("lock poisoned").browser_id {
            return Ok(id.clone());
        }
        let mut profile = self.profile.write().expect("lock poisoned");
        // Another caller may have generated it while we waited for the lock.
        if let Some(id) = &profile.browser_id {
            return Ok(id.clone());
        }
        let id = (self.fingerprint)();
        let mut next = profile.clone();
        next.browser_id = Some(id.clone());
        self.persist(&next)?;
        *profile = next;
        Ok(id)
    }

    fn local_ballot(&self, scope: &str) -> IdentityResult<Option<CandidateId>> {
        Ok(self
            .profile
            .read()
            .expect("lock poisoned")
            .ballots
            .get(scope)
            .cloned())
    }

    fn set_local_ballot(&self, scope: &str, candidate: &CandidateId) -> IdentityResult<()> {
        let mut profile = self.profile.write().expect("lock poisoned");
        if profile.ballots.get(scope) == Some(candidate) {
            return Ok(());
        }
        let mut next = profile.clone();
        next.ballots.insert(scope.to_string(), candidate.clone());
        self.persist(&next)?;
        *profile = next;
        Ok(())
    }
}

impl std::fmt::Debug for FileIdentityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileIdentityStore")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_id() -> VoterId {
        VoterId::new("fp_fixed").unwrap()
    }

    fn other_id() -> VoterId {
        VoterId::new("fp_other").unwrap()
    }

    #[test]
    fn missing_profile_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileIdentityStore::open_with(dir.path().join("p.json"), fixed_id).unwrap();
        assert_eq!(store.snapshot(), LocalProfile::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn voter_id_is_generated_once_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/profile.json");

        let store = FileIdentityStore::open_with(&path, fixed_id).unwrap();
        assert_eq!(store.voter_id().unwrap(), fixed_id());
        assert!(path.exists());

        // A different generator must not rotate the stored id.
        let reopened = FileIdentityStore::open_with(&path, other_id).unwrap();
        assert_eq!(reopened.voter_id().unwrap(), fixed_id());
    }

    #[test]
    fn ballots_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let cat = CandidateId::new("cat.png").unwrap();

        let store = FileIdentityStore::open_with(&path, fixed_id).unwrap();
        assert_eq!(store.local_ballot("voting").unwrap(), None);
        store.set_local_ballot("voting", &cat).unwrap();

        let reopened = FileIdentityStore::open_with(&path, fixed_id).unwrap();
        assert_eq!(reopened.local_ballot("voting").unwrap(), Some(cat));
        assert_eq!(reopened.local_ballot("other").unwrap(), None);
    }

    #[test]
    fn corrupt_profile_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileIdentityStore::open_with(&path, fixed_id).unwrap();
        assert_eq!(store.voter_id().unwrap(), fixed_id());

        let text = std::fs::read_to_string(&path).unwrap();
        let profile: LocalProfile = serde_json::from_str(&text).unwrap();
        assert_eq!(profile.browser_id, Some(fixed_id()));
    }

    #[test]
    fn profile_json_shape() {
        let mut profile = LocalProfile::default();
        profile.browser_id = Some(fixed_id());
        profile
            .ballots
            .insert("voting".into(), CandidateId::new("a.png").unwrap());
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["browser_id"], "fp_fixed");
        assert_eq!(json["ballots"]["voting"], "a.png");
    }
}

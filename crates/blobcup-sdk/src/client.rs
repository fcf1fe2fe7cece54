use std::sync::Arc;

use blobcup_identity::{FileIdentityStore, IdentityProvider};
use blobcup_ledger::{VoteBook, VoteOutcome, VoteScope, VotingSession};
use blobcup_store::azure::encode_component;
use blobcup_store::{AzureBlobStore, BlobAttributes, ObjectStore, StoreResult};
use blobcup_types::{AttributionIndex, BlobEntry, Candidate, CandidateId, VoterId};
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, Category};
use crate::error::{SdkError, SdkResult};
use crate::worldcup::WorldCup;

/// Result of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Key the blob was stored under, `<unix-millis>_<file name>`.
    pub key: String,
    pub locator: String,
    pub email: Option<String>,
}

/// One candidate on a voting board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardEntry {
    pub candidate: Candidate,
    pub votes: u64,
    /// This device's ballot is on the candidate.
    pub mine: bool,
}

/// Everything a voting view renders for one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VotingBoard {
    pub category: Category,
    pub voter: VoterId,
    /// Image candidates in listing order.
    pub entries: Vec<BoardEntry>,
    pub my_vote: Option<CandidateId>,
    /// Sum over every tally in the ledger, including candidates whose
    /// blobs are gone.
    pub total_votes: u64,
}

impl VotingBoard {
    /// Entries by descending vote count; ties keep listing order.
    pub fn ranked(&self) -> Vec<&BoardEntry> {
        let mut ranked: Vec<&BoardEntry> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.votes.cmp(&a.votes));
        ranked
    }
}

/// High-level blobcup API over one store and one local identity.
pub struct Blobcup<S: ?Sized, I: ?Sized> {
    config: AppConfig,
    store: Arc<S>,
    session: VotingSession<S, I>,
}

impl Blobcup<AzureBlobStore, FileIdentityStore> {
    /// Connect to the configured remote store with the on-disk profile.
    pub fn connect(config: AppConfig) -> SdkResult<Self> {
        let store = Arc::new(AzureBlobStore::new(config.store.clone())?);
        let identity = Arc::new(FileIdentityStore::open(config.resolved_profile_path())?);
        Ok(Self::new(config, store, identity))
    }
}

impl<S, I> Blobcup<S, I>
where
    S: ObjectStore + ?Sized,
    I: IdentityProvider + ?Sized,
{
    pub fn new(config: AppConfig, store: Arc<S>, identity: Arc<I>) -> Self {
        let book = VoteBook::with_blob_name(store.clone(), config.votes_blob.clone());
        Self {
            config,
            store,
            session: VotingSession::new(book, identity),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn session(&self) -> &VotingSession<S, I> {
        &self.session
    }

    pub fn voter_id(&self) -> SdkResult<VoterId> {
        Ok(self.session.identity().voter_id()?)
    }

    pub fn category(&self, id: &str) -> SdkResult<&Category> {
        self.config.category(id)
    }

    /// Ballot scope of a category: local ballots are keyed by category id,
    /// tallies live in the category's container.
    pub fn scope(&self, category: &Category) -> VoteScope {
        VoteScope::new(category.id.clone(), category.container.clone())
    }

    // ---- Listing ----

    /// Every user blob in the category's container. The ledger and
    /// attribution blobs are hidden. A failed listing degrades to no
    /// entries.
    pub async fn list(&self, category_id: &str) -> SdkResult<Vec<BlobEntry>> {
        let category = self.category(category_id)?;
        let entries = match self.store.list(&category.container).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(category = %category.id, error = %e, "listing failed");
                return Ok(Vec::new());
            }
        };
        Ok(entries
            .into_iter()
            .filter(|e| e.name != self.config.votes_blob && e.name != self.config.metadata_blob)
            .collect())
    }

    /// Uploader attribution for a container. Unreadable or malformed
    /// attribution degrades to an empty index.
    pub async fn attribution(&self, container: &str) -> AttributionIndex {
        match self.fetch_attribution(container).await {
            Ok(index) => index,
            Err(e) => {
                warn!(container, error = %e, "attribution unavailable");
                AttributionIndex::new()
            }
        }
    }

    async fn fetch_attribution(&self, container: &str) -> StoreResult<AttributionIndex> {
        let Some(text) = self
            .store
            .read_text_if_exists(container, &self.config.metadata_blob)
            .await?
        else {
            return Ok(AttributionIndex::new());
        };
        Ok(AttributionIndex::from_json(&text).unwrap_or_else(|e| {
            warn!(container, error = %e, "malformed attribution, starting over");
            AttributionIndex::new()
        }))
    }

    /// Image blobs of a category as candidates, annotated with their
    /// uploaders. A failed listing degrades to no candidates.
    pub async fn candidates(&self, category_id: &str) -> SdkResult<Vec<Candidate>> {
        let category = self.category(category_id)?;
        let entries = match self.store.list(&category.container).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(category = %category.id, error = %e, "listing failed");
                return Ok(Vec::new());
            }
        };
        let mut candidates: Vec<Candidate> = entries
            .iter()
            .filter(|e| e.is_image())
            .filter_map(Candidate::from_entry)
            .collect();
        self.attribution(&category.container)
            .await
            .annotate(&mut candidates);
        debug!(category = %category.id, count = candidates.len(), "candidates loaded");
        Ok(candidates)
    }

    // ---- Upload ----

    /// Store a file in the category's container.
    ///
    /// With an e-mail, the blob carries `uploader` / `uploadtime`
    /// attributes and an attribution record is appended to the container's
    /// metadata blob. A failed attribution write is logged; the upload
    /// itself still succeeds.
    pub async fn upload(
        &self,
        category_id: &str,
        file_name: &str,
        data: Bytes,
        content_type: &str,
        email: Option<&str>,
    ) -> SdkResult<UploadReceipt> {
        self.upload_at(category_id, file_name, data, content_type, email, Utc::now())
            .await
    }

    async fn upload_at(
        &self,
        category_id: &str,
        file_name: &str,
        data: Bytes,
        content_type: &str,
        email: Option<&str>,
        at: DateTime<Utc>,
    ) -> SdkResult<UploadReceipt> {
        let category = self.category(category_id)?;
        if file_name.is_empty() {
            return Err(SdkError::InvalidInput("file name must not be empty".into()));
        }
        let email = email.filter(|e| !e.is_empty());
        let key = format!("{}_{file_name}", at.timestamp_millis());

        let mut attributes = BlobAttributes::new();
        if let Some(email) = email {
            attributes.insert("uploader".into(), encode_component(email));
            attributes.insert(
                "uploadtime".into(),
                at.to_rfc3339_opts(SecondsFormat::Millis, true),
            );
        }

        let size = data.len();
        let key = self
            .store
            .write_binary(&category.container, &key, data, content_type, &attributes)
            .await?;
        info!(container = %category.container, key = %key, size, "uploaded");

        if let Some(email) = email {
            if let Err(e) = self.record_uploader(&category.container, &key, email, at).await {
                warn!(
                    container = %category.container,
                    key = %key,
                    error = %e,
                    "attribution not saved"
                );
            }
        }

        Ok(UploadReceipt {
            locator: self.store.locator(&category.container, &key),
            key,
            email: email.map(str::to_string),
        })
    }

    async fn record_uploader(
        &self,
        container: &str,
        key: &str,
        email: &str,
        at: DateTime<Utc>,
    ) -> SdkResult<()> {
        let mut index = self.fetch_attribution(container).await?;
        index.record(CandidateId::new(key)?, email, at);
        self.store
            .write_text(container, &self.config.metadata_blob, &index.to_json_pretty()?)
            .await?;
        Ok(())
    }

    // ---- Voting ----

    /// Candidates with their tallies and this device's ballot.
    pub async fn board(&self, category_id: &str) -> SdkResult<VotingBoard> {
        let category = self.category(category_id)?.clone();
        let candidates = self.candidates(&category.id).await?;
        let view = self.session.view(&self.scope(&category)).await?;

        let entries = candidates
            .into_iter()
            .map(|candidate| BoardEntry {
                votes: view.ledger.tally(candidate.id.as_str()),
                mine: view.my_vote.as_ref() == Some(&candidate.id),
                candidate,
            })
            .collect();

        Ok(VotingBoard {
            total_votes: view.ledger.total_votes(),
            category,
            voter: view.voter,
            entries,
            my_vote: view.my_vote,
        })
    }

    /// Put this device's ballot in the category on `candidate`.
    pub async fn vote(&self, category_id: &str, candidate: &str) -> SdkResult<VoteOutcome> {
        let category = self.category(category_id)?;
        let candidate = CandidateId::new(candidate)?;
        let outcome = self.session.vote(&self.scope(category), &candidate).await?;
        if let VoteOutcome::Recorded { previous, .. } = &outcome {
            debug!(category = %category.id, %candidate, moved_from = ?previous, "vote applied");
        }
        Ok(outcome)
    }

    // ---- World cup ----

    /// Start a world cup over the category's image candidates.
    pub async fn world_cup(&self, category_id: &str) -> SdkResult<WorldCup> {
        let category = self.category(category_id)?.clone();
        let candidates = self.candidates(&category.id).await?;
        Ok(WorldCup::new(category, candidates))
    }
}

impl<S: ?Sized, I: ?Sized> std::fmt::Debug for Blobcup<S, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blobcup")
            .field("categories", &self.config.categories.len())
            .finish_non_exhaustive()
    }
}

// Campaign persistence
//
// Updates are applied per call under the store's own lock (memory) or as a
// whole-file replace (JSON directory). Two concurrent updates to the same
// campaign resolve last-write-wins.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::orchestration::types::{Campaign, CampaignUpdate};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Campaign not found: {0}")]
    NotFound(String),

    #[error("Campaign already exists: {0}")]
    Duplicate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Read/write contract the pipeline needs from persistence
#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn insert(&self, campaign: Campaign) -> Result<Campaign, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Campaign>, StoreError>;

    /// Newest first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Campaign>, StoreError>;

    /// Apply `update` and return the stored result
    async fn update(&self, id: &str, update: CampaignUpdate) -> Result<Campaign, StoreError>;
}

fn newest_first(campaigns: &mut [Campaign]) {
    campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    campaigns: RwLock<HashMap<String, Campaign>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignStore for MemoryStore {
    async fn insert(&self, campaign: Campaign) -> Result<Campaign, StoreError> {
        let mut campaigns = self.campaigns.write().await;
        if campaigns.contains_key(&campaign.id) {
            return Err(StoreError::Duplicate(campaign.id));
        }
        campaigns.insert(campaign.id.clone(), campaign.clone());
        Ok(campaign)
    }

    async fn get(&self, id: &str) -> Result<Option<Campaign>, StoreError> {
        Ok(self.campaigns.read().await.get(id).cloned())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Campaign>, StoreError> {
        let mut found: Vec<Campaign> = self
            .campaigns
            .read()
            .await
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut found);
        Ok(found)
    }

    async fn update(&self, id: &str, update: CampaignUpdate) -> Result<Campaign, StoreError> {
        let mut campaigns = self.campaigns.write().await;
        let campaign = campaigns
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        update.apply(campaign);
        Ok(campaign.clone())
    }
}

/// One pretty-printed JSON file per campaign
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ids that could escape the directory never map to a file
    fn path_for(&self, id: &str) -> Option<PathBuf> {
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        safe.then(|| self.dir.join(format!("{}.json", id)))
    }

    async fn read(path: &Path) -> Result<Option<Campaign>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(path: &Path, campaign: &Campaign) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(campaign)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl CampaignStore for JsonDirStore {
    async fn insert(&self, campaign: Campaign) -> Result<Campaign, StoreError> {
        let path = self
            .path_for(&campaign.id)
            .ok_or_else(|| StoreError::NotFound(campaign.id.clone()))?;
        if tokio::fs::try_exists(&path).await? {
            return Err(StoreError::Duplicate(campaign.id));
        }
        Self::write(&path, &campaign).await?;
        tracing::debug!(campaign_id = %campaign.id, path = %path.display(), "Stored campaign");
        Ok(campaign)
    }

    async fn get(&self, id: &str) -> Result<Option<Campaign>, StoreError> {
        match self.path_for(id) {
            Some(path) => Self::read(&path).await,
            None => Ok(None),
        }
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Campaign>, StoreError> {
        let mut found = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path).await {
                Ok(Some(campaign)) if campaign.user_id == user_id => found.push(campaign),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Skipping unreadable campaign file: {}", e);
                }
            }
        }
        newest_first(&mut found);
        Ok(found)
    }

    async fn update(&self, id: &str, update: CampaignUpdate) -> Result<Campaign, StoreError> {
        let path = self
            .path_for(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let mut campaign = Self::read(&path)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        update.apply(&mut campaign);
        Self::write(&path, &campaign).await?;
        Ok(campaign)
    }
}

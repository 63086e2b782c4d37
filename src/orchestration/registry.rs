// Campaign registry - ownership-checked access to stored campaigns

use super::orchestrator::PipelineError;
use super::types::{Campaign, CampaignBrief, CampaignUpdate};
use crate::store::CampaignStore;
use std::sync::Arc;

/// Campaign CRUD that needs no model access
#[derive(Clone)]
pub struct CampaignRegistry {
    store: Arc<dyn CampaignStore>,
}

impl CampaignRegistry {
    pub fn new(store: Arc<dyn CampaignStore>) -> Self {
        Self { store }
    }

    /// Validate the brief and persist a fresh draft
    pub async fn create(&self, user_id: &str, brief: CampaignBrief) -> Result<Campaign, PipelineError> {
        brief.validate().map_err(PipelineError::Validation)?;
        let campaign = self.store.insert(Campaign::new(user_id, brief)).await?;
        tracing::info!(campaign_id = %campaign.id, user_id, "Created campaign");
        Ok(campaign)
    }

    /// Load a campaign, rejecting other users' campaigns
    pub async fn get(&self, user_id: &str, id: &str) -> Result<Campaign, PipelineError> {
        let campaign = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(id.to_string()))?;

        if campaign.user_id != user_id {
            tracing::warn!(campaign_id = id, user_id, "Rejected access to another user's campaign");
            return Err(PipelineError::Forbidden(id.to_string()));
        }
        Ok(campaign)
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Campaign>, PipelineError> {
        Ok(self.store.list_by_user(user_id).await?)
    }

    pub(crate) async fn update(&self, id: &str, update: CampaignUpdate) -> Result<Campaign, PipelineError> {
        Ok(self.store.update(id, update).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn brief() -> CampaignBrief {
        CampaignBrief::new(
            "Launch a new eco-friendly sneaker",
            "Awareness",
            "Gen Z outdoor enthusiasts",
            vec!["Instagram Post".to_string()],
        )
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let registry = CampaignRegistry::new(Arc::new(MemoryStore::new()));
        let created = registry.create("alice", brief()).await.unwrap();

        let fetched = registry.get("alice", &created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(registry.list("alice").await.unwrap().len(), 1);
        assert!(registry.list("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ownership_and_existence() {
        let registry = CampaignRegistry::new(Arc::new(MemoryStore::new()));
        let created = registry.create("alice", brief()).await.unwrap();

        assert!(matches!(
            registry.get("bob", &created.id).await,
            Err(PipelineError::Forbidden(_))
        ));
        assert!(matches!(
            registry.get("alice", "nope").await,
            Err(PipelineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_brief_not_persisted() {
        let registry = CampaignRegistry::new(Arc::new(MemoryStore::new()));
        let mut bad = brief();
        bad.ad_formats.clear();

        assert!(matches!(
            registry.create("alice", bad).await,
            Err(PipelineError::Validation(_))
        ));
        assert!(registry.list("alice").await.unwrap().is_empty());
    }
}

// Orchestrator - sequences the campaign experts and persists each stage

use super::experts::{
    default_text_layers, renderable_layers, short_id, CreativeSynthesizer, IdeaEvaluator,
    IdeaGenerator, ImageGenerator, ImageRequest, MIN_SELECTION, UPLOADS_PREFIX,
};
use super::registry::CampaignRegistry;
use super::types::{Campaign, CampaignBrief, CampaignStatus, CampaignUpdate, ImageOptions, Stage};
use crate::config::PipelineConfig;
use crate::store::{CampaignStore, StoreError};
use gemini::{ImageModel, TextModel};
use imagent::{FontResolver, ImagentError};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Campaign not found: {0}")]
    NotFound(String),

    #[error("Not authorized to access campaign {0}")]
    Forbidden(String),

    #[error("Invalid selected idea index {index} ({available} top ideas available)")]
    InvalidIdeaIndex { index: usize, available: usize },

    #[error("Ad copy must be generated first")]
    AdCopyMissing,

    #[error("Campaign has no image to composite onto")]
    ImageMissing,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Image source error: {0}")]
    ImageSource(String),

    #[error("Compositor error: {0}")]
    Compositor(#[from] ImagentError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task error: {0}")]
    Task(String),
}

fn stage_span(stage: Stage, campaign_id: &str) -> tracing::Span {
    tracing::info_span!(
        "pipeline",
        stage = stage.as_str(),
        description = stage.description(),
        campaign_id
    )
}

/// Runs pipeline stages against stored campaigns.
///
/// Each operation loads the campaign, checks ownership, runs exactly one
/// stage and writes the stage output back in a single update.
pub struct Orchestrator {
    registry: CampaignRegistry,
    generator: IdeaGenerator,
    evaluator: IdeaEvaluator,
    synthesizer: CreativeSynthesizer,
    imager: ImageGenerator,
    config: PipelineConfig,
    client: reqwest::Client,
}

impl Orchestrator {
    pub fn new(
        text_model: Arc<dyn TextModel>,
        image_model: Arc<dyn ImageModel>,
        store: Arc<dyn CampaignStore>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            registry: CampaignRegistry::new(store),
            generator: IdeaGenerator::new(text_model.clone()),
            evaluator: IdeaEvaluator::new(text_model.clone()),
            synthesizer: CreativeSynthesizer::new(text_model),
            imager: ImageGenerator::new(image_model, config.upload_dir.clone()),
            config,
            client,
        })
    }

    pub fn campaigns(&self) -> &CampaignRegistry {
        &self.registry
    }

    pub async fn create_campaign(
        &self,
        user_id: &str,
        brief: CampaignBrief,
    ) -> Result<Campaign, PipelineError> {
        self.registry.create(user_id, brief).await
    }

    pub async fn get_campaign(&self, user_id: &str, id: &str) -> Result<Campaign, PipelineError> {
        self.registry.get(user_id, id).await
    }

    pub async fn list_campaigns(&self, user_id: &str) -> Result<Vec<Campaign>, PipelineError> {
        self.registry.list(user_id).await
    }

    /// Generate, score and select ideas
    pub async fn generate_ideas(&self, user_id: &str, id: &str) -> Result<Campaign, PipelineError> {
        let span = stage_span(Stage::Ideation, id);
        self.run_ideas(user_id, id).instrument(span).await
    }

    /// Write ad copy for `top_ideas[selected_idea_index]`
    pub async fn generate_ad_copy(
        &self,
        user_id: &str,
        id: &str,
        selected_idea_index: usize,
    ) -> Result<Campaign, PipelineError> {
        let span = stage_span(Stage::Synthesis, id);
        self.run_ad_copy(user_id, id, selected_idea_index)
            .instrument(span)
            .await
    }

    /// Generate or regenerate the poster image; status is unchanged
    pub async fn generate_image(
        &self,
        user_id: &str,
        id: &str,
        options: ImageOptions,
    ) -> Result<Campaign, PipelineError> {
        let span = stage_span(Stage::Imaging, id);
        self.run_image(user_id, id, options).instrument(span).await
    }

    /// Bake the stored headline/CTA layers onto the current image
    pub async fn composite_text(&self, user_id: &str, id: &str) -> Result<Campaign, PipelineError> {
        let span = stage_span(Stage::Compositing, id);
        self.run_composite(user_id, id).instrument(span).await
    }

    async fn run_ideas(&self, user_id: &str, id: &str) -> Result<Campaign, PipelineError> {
        let campaign = self.registry.get(user_id, id).await?;

        let mut all_ideas = self.generator.generate(&campaign.brief).await;
        let mut top_ideas = self
            .evaluator
            .evaluate(&mut all_ideas, &campaign.brief, self.config.idea_threshold)
            .instrument(stage_span(Stage::Evaluation, id))
            .await;

        if top_ideas.is_empty() {
            top_ideas = all_ideas.iter().take(MIN_SELECTION).cloned().collect();
        }
        top_ideas.truncate(MIN_SELECTION);

        let update = CampaignUpdate {
            all_ideas: Some(all_ideas),
            top_ideas: Some(top_ideas),
            status: Some(campaign.status.advance(CampaignStatus::IdeasGenerated)),
            ..Default::default()
        };
        let updated = self.registry.update(id, update).await?;
        tracing::info!(top_ideas = updated.top_ideas.len(), "Ideas stage complete");
        Ok(updated)
    }

    async fn run_ad_copy(
        &self,
        user_id: &str,
        id: &str,
        selected_idea_index: usize,
    ) -> Result<Campaign, PipelineError> {
        let campaign = self.registry.get(user_id, id).await?;
        let idea = campaign
            .top_ideas
            .get(selected_idea_index)
            .ok_or(PipelineError::InvalidIdeaIndex {
                index: selected_idea_index,
                available: campaign.top_ideas.len(),
            })?;

        let mut ad_copy = self.synthesizer.synthesize(&campaign.brief, idea).await;
        ad_copy.image_url = None;

        let update = CampaignUpdate {
            selected_idea_index: Some(selected_idea_index),
            ad_copy: Some(ad_copy),
            status: Some(campaign.status.advance(CampaignStatus::AdCopyGenerated)),
            ..Default::default()
        };
        let updated = self.registry.update(id, update).await?;
        tracing::info!(selected_idea_index, "Ad copy stage complete");
        Ok(updated)
    }

    async fn run_image(
        &self,
        user_id: &str,
        id: &str,
        options: ImageOptions,
    ) -> Result<Campaign, PipelineError> {
        let campaign = self.registry.get(user_id, id).await?;
        let ad_copy = campaign.ad_copy.clone().ok_or(PipelineError::AdCopyMissing)?;

        let headline = options
            .text
            .as_ref()
            .and_then(|t| t.headline.as_deref())
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or(ad_copy.headline.as_str());

        let request = ImageRequest {
            visual_direction: &ad_copy.visual_direction,
            headline,
            campaign_brief: &campaign.brief.campaign_brief,
            bake_text: options.bake_text,
        };

        let Some(url) = self.imager.generate(&request).await else {
            tracing::warn!(
                previous = ?ad_copy.image_url,
                "Image generation produced nothing, keeping previous image"
            );
            return Ok(campaign);
        };

        let update = CampaignUpdate {
            ad_copy: Some(ad_copy.with_image_url(url)),
            ..Default::default()
        };
        Ok(self.registry.update(id, update).await?)
    }

    async fn run_composite(&self, user_id: &str, id: &str) -> Result<Campaign, PipelineError> {
        let campaign = self.registry.get(user_id, id).await?;
        let ad_copy = campaign.ad_copy.ok_or(PipelineError::AdCopyMissing)?;
        let source = ad_copy.image_url.clone().ok_or(PipelineError::ImageMissing)?;

        let mut layers = renderable_layers(ad_copy.text_layers.as_deref().unwrap_or_default());
        if layers.is_empty() {
            layers = default_text_layers(&ad_copy.headline, &ad_copy.call_to_action);
        }

        let bytes = self.load_source(&source).await?;
        let filename = format!("ad_final_{}.jpg", short_id());
        let output = self.config.upload_dir.join(&filename);
        let fonts = FontResolver::new(self.config.font_dirs.clone());

        tokio::task::spawn_blocking(move || imagent::bake_text_layers(&bytes, &layers, &output, fonts))
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))??;

        let url = format!("{}{}", UPLOADS_PREFIX, filename);
        tracing::info!(source = %source, url = %url, "Composited text onto image");

        let update = CampaignUpdate {
            ad_copy: Some(ad_copy.with_image_url(url)),
            ..Default::default()
        };
        Ok(self.registry.update(id, update).await?)
    }

    /// Map an image URL onto the upload directory.
    ///
    /// `None` for absolute paths and anything with `.` or `..` segments, so a
    /// stored URL can never name a file outside the upload directory.
    pub fn resolve_upload_path(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(UPLOADS_PREFIX).unwrap_or(url);
        let relative = Path::new(name);
        let contained = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        contained.then(|| self.config.upload_dir.join(relative))
    }

    async fn load_source(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| PipelineError::ImageSource(format!("Failed to fetch {}: {}", url, e)))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| PipelineError::ImageSource(format!("Failed to read {}: {}", url, e)))?;
            return Ok(bytes.to_vec());
        }

        let path = self.resolve_upload_path(url).ok_or_else(|| {
            PipelineError::ImageSource(format!("Image path outside the upload directory: {}", url))
        })?;
        tokio::fs::read(&path).await.map_err(|e| {
            PipelineError::ImageSource(format!("Image file not found: {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::experts::testing::{ScriptedImage, ScriptedText};
    use crate::orchestration::types::TextPayload;
    use crate::store::MemoryStore;
    use base64::Engine;
    use gemini::ModalityHint;
    use serde_json::json;

    const IDEAS: &str = r#"[
        {"title": "Trail Ready", "description": "Sneakers built for muddy weekends"},
        {"title": "Step Lightly", "description": "Every step leaves a smaller footprint"},
        {"title": "Made From Bottles", "description": "Recycled plastic turned into performance"}
    ]"#;

    const SCORES: &str = r#"[
        {"id": 1, "score": 8.0, "reasoning": "Fits the audience"},
        {"id": 2, "score": 9.1, "reasoning": "Memorable"},
        {"id": 3, "score": 7.4, "reasoning": "Clear benefit"},
        {"id": 4, "score": 2.0, "reasoning": "Generic"}
    ]"#;

    const COPY: &str = r#"{
        "headline": "Walk the Walk",
        "body": "Recycled materials, real comfort.",
        "call_to_action": "Shop Now",
        "visual_direction": "Sneakers on a forest trail, green and earth tones"
    }"#;

    fn text_model() -> ScriptedText {
        ScriptedText::new()
            .reply("Creative Team", IDEAS)
            .reply("Creative Director", SCORES)
            .reply("Copywriter", COPY)
    }

    fn png_response() -> serde_json::Value {
        let img = image::RgbImage::from_pixel(200, 160, image::Rgb([20, 120, 60]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        let encoded = base64::engine::general_purpose::STANDARD.encode(buf.into_inner());
        json!({"candidates": [{"content": {"parts": [
            {"inlineData": {"mimeType": "image/png", "data": encoded}}
        ]}}]})
    }

    fn brief() -> CampaignBrief {
        CampaignBrief::new(
            "Launch a new eco-friendly sneaker",
            "Awareness",
            "Gen Z outdoor enthusiasts",
            vec!["Instagram Post".to_string()],
        )
    }

    struct Fixture {
        orchestrator: Orchestrator,
        store: Arc<MemoryStore>,
        image: Arc<ScriptedImage>,
        dir: tempfile::TempDir,
    }

    fn fixture(image: ScriptedImage) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let image = Arc::new(image);
        let config = PipelineConfig {
            upload_dir: dir.path().join("uploads"),
            font_dirs: Vec::new(),
            ..PipelineConfig::default()
        };
        let orchestrator =
            Orchestrator::new(Arc::new(text_model()), image.clone(), store.clone(), config).unwrap();
        Fixture {
            orchestrator,
            store,
            image,
            dir,
        }
    }

    #[tokio::test]
    async fn test_ideas_stage_persists_scores_and_top_three() {
        let f = fixture(ScriptedImage::new(png_response()));
        let created = f.orchestrator.create_campaign("alice", brief()).await.unwrap();

        let campaign = f.orchestrator.generate_ideas("alice", &created.id).await.unwrap();

        assert_eq!(campaign.status, CampaignStatus::IdeasGenerated);
        assert_eq!(campaign.all_ideas.len(), 10);
        let top: Vec<&str> = campaign.top_ideas.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(top, vec!["Step Lightly", "Trail Ready", "Made From Bottles"]);
        assert_eq!(campaign.all_ideas[1].score, 9.1);

        let stored = f.store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(stored, campaign);
    }

    #[tokio::test]
    async fn test_ad_copy_requires_valid_index() {
        let f = fixture(ScriptedImage::new(png_response()));
        let created = f.orchestrator.create_campaign("alice", brief()).await.unwrap();

        let err = f.orchestrator.generate_ad_copy("alice", &created.id, 0).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidIdeaIndex { index: 0, available: 0 }));

        f.orchestrator.generate_ideas("alice", &created.id).await.unwrap();
        let err = f.orchestrator.generate_ad_copy("alice", &created.id, 3).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidIdeaIndex { index: 3, available: 3 }));

        let campaign = f.orchestrator.generate_ad_copy("alice", &created.id, 1).await.unwrap();
        assert_eq!(campaign.selected_idea_index, Some(1));
        assert_eq!(campaign.status, CampaignStatus::AdCopyGenerated);
        let copy = campaign.ad_copy.unwrap();
        assert_eq!(copy.headline, "Walk the Walk");
        assert!(copy.image_url.is_none());
        assert_eq!(copy.text_layers.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rerunning_ideas_does_not_regress_status() {
        let f = fixture(ScriptedImage::new(png_response()));
        let created = f.orchestrator.create_campaign("alice", brief()).await.unwrap();
        f.orchestrator.generate_ideas("alice", &created.id).await.unwrap();
        f.orchestrator.generate_ad_copy("alice", &created.id, 0).await.unwrap();

        let campaign = f.orchestrator.generate_ideas("alice", &created.id).await.unwrap();
        assert_eq!(campaign.status, CampaignStatus::AdCopyGenerated);
    }

    #[tokio::test]
    async fn test_image_stage_preconditions_and_ownership() {
        let f = fixture(ScriptedImage::new(png_response()));
        let created = f.orchestrator.create_campaign("alice", brief()).await.unwrap();

        let err = f
            .orchestrator
            .generate_image("alice", &created.id, ImageOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::AdCopyMissing));

        let err = f.orchestrator.generate_ideas("mallory", &created.id).await.unwrap_err();
        assert!(matches!(err, PipelineError::Forbidden(_)));
        assert!(f.image.attempts.lock().unwrap().is_empty());

        f.orchestrator.generate_ideas("alice", &created.id).await.unwrap();
        f.orchestrator.generate_ad_copy("alice", &created.id, 0).await.unwrap();
        let err = f.orchestrator.composite_text("alice", &created.id).await.unwrap_err();
        assert!(matches!(err, PipelineError::ImageMissing));
    }

    #[tokio::test]
    async fn test_image_then_composite() {
        let f = fixture(ScriptedImage::new(png_response()));
        let created = f.orchestrator.create_campaign("alice", brief()).await.unwrap();
        f.orchestrator.generate_ideas("alice", &created.id).await.unwrap();
        f.orchestrator.generate_ad_copy("alice", &created.id, 0).await.unwrap();

        let options = ImageOptions {
            bake_text: true,
            text: Some(TextPayload {
                headline: Some("Own the Trail".to_string()),
            }),
        };
        let campaign = f.orchestrator.generate_image("alice", &created.id, options).await.unwrap();
        let poster = campaign.ad_copy.as_ref().unwrap().image_url.clone().unwrap();
        assert!(poster.starts_with("/uploads/ad_poster_") && poster.ends_with(".png"));
        assert!(f.image.prompts.lock().unwrap()[0].contains("\"Own the Trail\""));
        assert_eq!(campaign.status, CampaignStatus::AdCopyGenerated);

        let campaign = f.orchestrator.composite_text("alice", &created.id).await.unwrap();
        let final_url = campaign.ad_copy.unwrap().image_url.unwrap();
        assert!(final_url.starts_with("/uploads/ad_final_") && final_url.ends_with(".jpg"));

        let path = f.orchestrator.resolve_upload_path(&final_url).unwrap();
        assert!(path.starts_with(f.dir.path()));
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 160));
    }

    #[tokio::test]
    async fn test_failed_regeneration_keeps_previous_image() {
        let f = fixture(ScriptedImage::new(png_response()));
        let created = f.orchestrator.create_campaign("alice", brief()).await.unwrap();
        f.orchestrator.generate_ideas("alice", &created.id).await.unwrap();
        f.orchestrator.generate_ad_copy("alice", &created.id, 0).await.unwrap();
        let first = f
            .orchestrator
            .generate_image("alice", &created.id, ImageOptions::default())
            .await
            .unwrap();

        let broken = Orchestrator::new(
            Arc::new(text_model()),
            Arc::new(ScriptedImage::new(json!({})).failing(&ModalityHint::ATTEMPT_ORDER)),
            f.store.clone(),
            PipelineConfig {
                upload_dir: f.dir.path().join("uploads"),
                ..PipelineConfig::default()
            },
        )
        .unwrap();
        let second = broken
            .generate_image("alice", &created.id, ImageOptions::default())
            .await
            .unwrap();

        assert_eq!(
            second.ad_copy.unwrap().image_url,
            first.ad_copy.unwrap().image_url
        );
    }

    async fn with_image_url(f: &Fixture, user: &str, url: &str) -> String {
        let id = f.orchestrator.create_campaign(user, brief()).await.unwrap().id;
        f.orchestrator.generate_ideas(user, &id).await.unwrap();
        f.orchestrator.generate_ad_copy(user, &id, 0).await.unwrap();

        let campaign = f.store.get(&id).await.unwrap().unwrap();
        let copy = campaign.ad_copy.unwrap().with_image_url(url);
        f.store
            .update(
                &id,
                CampaignUpdate {
                    ad_copy: Some(copy),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn test_composite_with_missing_source_file() {
        let f = fixture(ScriptedImage::new(png_response()));
        let id = with_image_url(&f, "alice", "/uploads/gone.png").await;

        let err = f.orchestrator.composite_text("alice", &id).await.unwrap_err();
        assert!(matches!(err, PipelineError::ImageSource(_)));
    }

    #[tokio::test]
    async fn test_composite_with_unreachable_remote_source() {
        let f = fixture(ScriptedImage::new(png_response()));
        let id = with_image_url(&f, "alice", "http://127.0.0.1:1/x.png").await;

        let err = f.orchestrator.composite_text("alice", &id).await.unwrap_err();
        match err {
            PipelineError::ImageSource(msg) => assert!(msg.contains("http://127.0.0.1:1/x.png")),
            other => panic!("unexpected error: {other:?}"),
        }

        let stored = f.store.get(&id).await.unwrap().unwrap();
        assert_eq!(
            stored.ad_copy.unwrap().image_url.as_deref(),
            Some("http://127.0.0.1:1/x.png")
        );
    }

    #[tokio::test]
    async fn test_composite_refuses_paths_outside_uploads() {
        let f = fixture(ScriptedImage::new(png_response()));
        let secret = f.dir.path().join("secret.png");
        std::fs::write(&secret, b"not for compositing").unwrap();

        for url in [
            "/uploads/../secret.png".to_string(),
            "../secret.png".to_string(),
            secret.display().to_string(),
        ] {
            let id = with_image_url(&f, "alice", &url).await;
            let err = f.orchestrator.composite_text("alice", &id).await.unwrap_err();
            match err {
                PipelineError::ImageSource(msg) => assert!(msg.contains("outside the upload")),
                other => panic!("unexpected error for {url}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_resolve_upload_path() {
        let f = fixture(ScriptedImage::new(json!({})));
        let uploads = f.dir.path().join("uploads");
        let resolve = |url: &str| f.orchestrator.resolve_upload_path(url);

        assert_eq!(resolve("/uploads/a.png"), Some(uploads.join("a.png")));
        assert_eq!(resolve("b.png"), Some(uploads.join("b.png")));
        assert_eq!(resolve("nested/c.png"), Some(uploads.join("nested/c.png")));

        assert_eq!(resolve("/srv/images/c.png"), None);
        assert_eq!(resolve("/uploads/../../etc/passwd"), None);
        assert_eq!(resolve("nested/../../d.png"), None);
        assert_eq!(resolve("/uploads/"), None);
        assert_eq!(resolve(""), None);
    }
}

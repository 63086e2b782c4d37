// Core types for the campaign pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use imagent::{FontStyle, FontWeight, LayerKind, TextAlign, TextLayer};

/// A candidate campaign concept
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignIdea {
    pub title: String,
    pub description: String,

    /// 0.0 until the evaluator scores it
    #[serde(default)]
    pub score: f64,

    #[serde(default)]
    pub reasoning: Option<String>,
}

impl CampaignIdea {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            score: 0.0,
            reasoning: None,
        }
    }
}

/// Copy and visual direction for the selected idea
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdCopy {
    pub headline: String,
    pub body: String,
    pub call_to_action: String,

    /// Text-free image description, reused as the image prompt
    pub visual_direction: String,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub text_layers: Option<Vec<TextLayer>>,
}

impl AdCopy {
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// Campaign lifecycle; ordering follows the pipeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    IdeasGenerated,
    AdCopyGenerated,
    Completed,
}

impl CampaignStatus {
    /// Move to `next` unless that would go backwards
    pub fn advance(self, next: CampaignStatus) -> CampaignStatus {
        self.max(next)
    }

    pub fn as_str(&self) -> &str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::IdeasGenerated => "ideas_generated",
            CampaignStatus::AdCopyGenerated => "ad_copy_generated",
            CampaignStatus::Completed => "completed",
        }
    }
}

/// What the user asked for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignBrief {
    pub campaign_brief: String,
    pub objective: String,
    pub target_audience: String,
    pub ad_formats: Vec<String>,
}

impl CampaignBrief {
    pub fn new(
        campaign_brief: impl Into<String>,
        objective: impl Into<String>,
        target_audience: impl Into<String>,
        ad_formats: Vec<String>,
    ) -> Self {
        Self {
            campaign_brief: campaign_brief.into(),
            objective: objective.into(),
            target_audience: target_audience.into(),
            ad_formats,
        }
    }

    /// Length limits are counted in characters, after trimming
    pub fn validate(&self) -> Result<(), String> {
        check_len("campaign_brief", &self.campaign_brief, 10, 1000)?;
        check_len("objective", &self.objective, 2, 100)?;
        check_len("target_audience", &self.target_audience, 5, 500)?;

        if self.ad_formats.iter().all(|f| f.trim().is_empty()) {
            return Err("ad_formats must contain at least one format".to_string());
        }
        Ok(())
    }
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(format!(
            "{} must be between {} and {} characters (got {})",
            field, min, max, len
        ));
    }
    Ok(())
}

/// The persisted aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    pub id: String,
    pub user_id: String,

    #[serde(flatten)]
    pub brief: CampaignBrief,

    #[serde(default)]
    pub all_ideas: Vec<CampaignIdea>,

    #[serde(default)]
    pub top_ideas: Vec<CampaignIdea>,

    /// Index into `top_ideas`
    #[serde(default)]
    pub selected_idea_index: Option<usize>,

    #[serde(default)]
    pub ad_copy: Option<AdCopy>,

    #[serde(default)]
    pub status: CampaignStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(user_id: impl Into<String>, brief: CampaignBrief) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            brief,
            all_ideas: Vec::new(),
            top_ideas: Vec::new(),
            selected_idea_index: None,
            ad_copy: None,
            status: CampaignStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial-field patch applied by `CampaignStore::update`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignUpdate {
    pub all_ideas: Option<Vec<CampaignIdea>>,
    pub top_ideas: Option<Vec<CampaignIdea>>,
    pub selected_idea_index: Option<usize>,
    pub ad_copy: Option<AdCopy>,
    pub status: Option<CampaignStatus>,
}

impl CampaignUpdate {
    pub fn apply(self, campaign: &mut Campaign) {
        if let Some(all_ideas) = self.all_ideas {
            campaign.all_ideas = all_ideas;
        }
        if let Some(top_ideas) = self.top_ideas {
            campaign.top_ideas = top_ideas;
        }
        if let Some(index) = self.selected_idea_index {
            campaign.selected_idea_index = Some(index);
        }
        if let Some(ad_copy) = self.ad_copy {
            campaign.ad_copy = Some(ad_copy);
        }
        if let Some(status) = self.status {
            campaign.status = status;
        }
        campaign.updated_at = Utc::now();
    }
}

/// Optional copy for the bake-text image mode
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextPayload {
    /// Replaces the generated headline; body and CTA never go on the poster
    #[serde(default)]
    pub headline: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageOptions {
    /// Let the image model render the headline into the poster
    pub bake_text: bool,
    pub text: Option<TextPayload>,
}

/// Pipeline stages, used to tag tracing spans
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Stage {
    Ideation,
    Evaluation,
    Synthesis,
    Imaging,
    Compositing,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Ideation,
        Stage::Evaluation,
        Stage::Synthesis,
        Stage::Imaging,
        Stage::Compositing,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Stage::Ideation => "ideation",
            Stage::Evaluation => "evaluation",
            Stage::Synthesis => "synthesis",
            Stage::Imaging => "imaging",
            Stage::Compositing => "compositing",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Stage::Ideation => "Generates a batch of candidate campaign ideas",
            Stage::Evaluation => "Scores, filters and ranks the candidate ideas",
            Stage::Synthesis => "Writes ad copy, visual direction and text layers",
            Stage::Imaging => "Generates the poster image",
            Stage::Compositing => "Bakes text layers onto the poster image",
        }
    }
}

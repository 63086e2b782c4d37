// Idea Generator - brainstorms a fixed-size batch of campaign ideas

use super::{parse_model_json, ExpertError};
use crate::orchestration::types::{CampaignBrief, CampaignIdea};
use gemini::TextModel;
use serde::Deserialize;
use std::sync::Arc;

/// Number of ideas every generation returns
pub const IDEA_BATCH_SIZE: usize = 10;

const UNTITLED: &str = "Untitled Campaign";
const NO_DESCRIPTION: &str = "No description provided";

/// Built-in catalog used when the model output is unusable
const CATALOG: [(&str, &str); IDEA_BATCH_SIZE] = [
    (
        "Brand Awareness Campaign",
        "A comprehensive campaign focused on increasing brand visibility through engaging content and strategic messaging.",
    ),
    (
        "Product Launch Campaign",
        "An exciting campaign designed to introduce new products with compelling visuals and clear value propositions.",
    ),
    (
        "Customer Engagement Campaign",
        "Interactive campaign focused on building relationships with customers through personalized content and experiences.",
    ),
    (
        "Social Media Blitz",
        "High-energy social media campaign with trending content and influencer partnerships for maximum reach.",
    ),
    (
        "Storytelling Campaign",
        "Emotional campaign that tells authentic brand stories to create deeper connections with the audience.",
    ),
    (
        "Limited-Time Offer",
        "Urgency-driven campaign promoting exclusive deals and time-sensitive offers to drive immediate action.",
    ),
    (
        "Community Building Campaign",
        "Campaign focused on creating a sense of belonging and fostering a loyal brand community.",
    ),
    (
        "Innovation Showcase",
        "Campaign highlighting cutting-edge features and innovations that set the brand apart from competitors.",
    ),
    (
        "Customer Testimonials",
        "Trust-building campaign featuring real customer success stories and authentic reviews.",
    ),
    (
        "Seasonal Campaign",
        "Timely campaign aligned with seasonal trends and holidays to maximize relevance and engagement.",
    ),
];

/// The full fallback catalog, unscored
pub fn default_ideas() -> Vec<CampaignIdea> {
    CATALOG
        .iter()
        .map(|(title, description)| CampaignIdea::new(*title, *description))
        .collect()
}

#[derive(Deserialize)]
struct RawIdea {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

fn non_blank(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Creative team: produces `IDEA_BATCH_SIZE` ideas from a brief
pub struct IdeaGenerator {
    model: Arc<dyn TextModel>,
}

impl IdeaGenerator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Always returns exactly `IDEA_BATCH_SIZE` unscored ideas
    pub async fn generate(&self, brief: &CampaignBrief) -> Vec<CampaignIdea> {
        match self.try_generate(brief).await {
            Ok(ideas) => ideas,
            Err(e) => {
                tracing::warn!(
                    model = self.model.text_model_name(),
                    "Idea generation failed, using built-in catalog: {}",
                    e
                );
                default_ideas()
            }
        }
    }

    async fn try_generate(&self, brief: &CampaignBrief) -> Result<Vec<CampaignIdea>, ExpertError> {
        let prompt = self.build_prompt(brief);
        let text = self.model.complete_text(&prompt).await?;
        let raw: Vec<RawIdea> = parse_model_json(&text)?;

        if raw.is_empty() {
            return Err(ExpertError::Parse("model returned no ideas".to_string()));
        }

        let mut ideas: Vec<CampaignIdea> = raw
            .into_iter()
            .take(IDEA_BATCH_SIZE)
            .map(|idea| {
                CampaignIdea::new(
                    non_blank(idea.title, UNTITLED),
                    non_blank(idea.description, NO_DESCRIPTION),
                )
            })
            .collect();

        if ideas.len() < IDEA_BATCH_SIZE {
            tracing::debug!(received = ideas.len(), "Padding idea batch from catalog");
            pad_from_catalog(&mut ideas);
        }

        tracing::info!(count = ideas.len(), "Generated campaign ideas");
        Ok(ideas)
    }

    fn build_prompt(&self, brief: &CampaignBrief) -> String {
        format!(
            r#"You are a Creative Team working on an advertising campaign. Your job is to generate {count} diverse and creative campaign ideas.

Campaign Brief: {brief}
Objective: {objective}
Target Audience: {audience}
Ad Formats: {formats}

Generate {count} unique campaign ideas. Each idea should be creative, relevant, and aligned with the campaign objective.

Return ONLY a valid JSON array with {count} objects, each containing:
- "title": A catchy campaign title (max 60 characters)
- "description": A detailed description of the campaign concept (max 200 characters)

Example format:
[
  {{"title": "Summer Vibes Campaign", "description": "A vibrant campaign showcasing summer activities with bright colors and energetic content."}},
  {{"title": "Eco Warriors Unite", "description": "Focus on sustainability and environmental consciousness with green-themed visuals."}}
]

Return ONLY the JSON array, no additional text or markdown formatting."#,
            count = IDEA_BATCH_SIZE,
            brief = brief.campaign_brief,
            objective = brief.objective,
            audience = brief.target_audience,
            formats = brief.ad_formats.join(", "),
        )
    }
}

fn pad_from_catalog(ideas: &mut Vec<CampaignIdea>) {
    for idea in default_ideas() {
        if ideas.len() >= IDEA_BATCH_SIZE {
            break;
        }
        if ideas.iter().any(|i| i.title.eq_ignore_ascii_case(&idea.title)) {
            continue;
        }
        ideas.push(idea);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::experts::testing::ScriptedText;

    fn brief() -> CampaignBrief {
        CampaignBrief::new(
            "Launch a new eco-friendly sneaker",
            "Awareness",
            "Gen Z outdoor enthusiasts",
            vec!["Instagram Post".to_string(), "Story".to_string()],
        )
    }

    fn model_ideas(n: usize) -> String {
        let items: Vec<String> = (1..=n)
            .map(|i| format!(r#"{{"title": "Idea {i}", "description": "Concept {i}"}}"#))
            .collect();
        format!("[{}]", items.join(","))
    }

    #[test]
    fn test_catalog_size() {
        let ideas = default_ideas();
        assert_eq!(ideas.len(), IDEA_BATCH_SIZE);
        assert!(ideas.iter().all(|i| i.score == 0.0 && i.reasoning.is_none()));
    }

    #[tokio::test]
    async fn test_parses_fenced_model_output() {
        let model = ScriptedText::new().reply(
            "Creative Team",
            format!("```json\n{}\n```", model_ideas(12)),
        );
        let ideas = IdeaGenerator::new(Arc::new(model)).generate(&brief()).await;

        assert_eq!(ideas.len(), IDEA_BATCH_SIZE);
        assert_eq!(ideas[0].title, "Idea 1");
        assert_eq!(ideas[9].title, "Idea 10");
    }

    #[tokio::test]
    async fn test_prompt_carries_brief() {
        let model = Arc::new(ScriptedText::new().reply("Creative Team", model_ideas(10)));
        IdeaGenerator::new(model.clone()).generate(&brief()).await;

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Launch a new eco-friendly sneaker"));
        assert!(prompts[0].contains("Instagram Post, Story"));
    }

    #[tokio::test]
    async fn test_missing_fields_get_defaults_and_batch_is_padded() {
        let model = ScriptedText::new().reply(
            "Creative Team",
            r#"[{"title": "Trail Ready"}, {"description": "Just a description"}, {"title": "Brand Awareness Campaign", "description": "dup"}]"#,
        );
        let ideas = IdeaGenerator::new(Arc::new(model)).generate(&brief()).await;

        assert_eq!(ideas.len(), IDEA_BATCH_SIZE);
        assert_eq!(ideas[0].description, NO_DESCRIPTION);
        assert_eq!(ideas[1].title, UNTITLED);
        let awareness = ideas
            .iter()
            .filter(|i| i.title == "Brand Awareness Campaign")
            .count();
        assert_eq!(awareness, 1);
    }

    #[tokio::test]
    async fn test_unparseable_or_failed_calls_use_catalog() {
        for model in [
            ScriptedText::new().reply("Creative Team", "Here are some great ideas!"),
            ScriptedText::new().reply("Creative Team", "[]"),
            ScriptedText::new().reply("Creative Team", r#"{"title": "not a list"}"#),
            ScriptedText::new().fail("Creative Team"),
        ] {
            let ideas = IdeaGenerator::new(Arc::new(model)).generate(&brief()).await;
            assert_eq!(ideas, default_ideas());
        }
    }
}

// Creative Synthesizer - ad copy, visual direction and text layers for one idea

use super::{parse_model_json, ExpertError};
use crate::orchestration::types::{
    AdCopy, CampaignBrief, CampaignIdea, FontStyle, FontWeight, LayerKind, TextAlign, TextLayer,
};
use gemini::TextModel;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

pub const HEADLINE_MAX_CHARS: usize = 60;
pub const CTA_MAX_CHARS: usize = 30;

const ELLIPSIS: &str = "...";

const DEFAULT_HEADLINE: &str = "Experience the Difference";
const DEFAULT_BODY: &str = "Discover our innovative products designed to enhance your lifestyle. Quality meets style in every detail.";
const DEFAULT_CTA: &str = "Learn More";
const DEFAULT_VISUAL_DIRECTION: &str = "Modern, clean design with vibrant colors, professional photography showcasing product visuals, optimistic mood, concept-based imagery with relevant visual elements representing the product or service";

const LAYER_FONT_SIZE: (u32, u32, u32) = (8, 32, 200);
const LAYER_POSITION: f32 = 50.0;
const LAYER_FAMILY: &str = "Arial";

/// Cut to `max` characters, ending in "..." when shortened
pub fn truncate_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str(ELLIPSIS);
    cut
}

fn default_fill(kind: LayerKind) -> &'static str {
    match kind {
        LayerKind::Cta => "#FFFFFF",
        LayerKind::Headline | LayerKind::Body => "#1A1A1A",
    }
}

fn max_chars(kind: LayerKind) -> Option<usize> {
    match kind {
        LayerKind::Headline => Some(HEADLINE_MAX_CHARS),
        LayerKind::Cta => Some(CTA_MAX_CHARS),
        LayerKind::Body => None,
    }
}

/// Headline near the top, CTA near the bottom
pub fn default_text_layers(headline: &str, call_to_action: &str) -> Vec<TextLayer> {
    vec![
        TextLayer {
            text: truncate_chars(headline, HEADLINE_MAX_CHARS),
            kind: LayerKind::Headline,
            font_size: 48,
            font_family: "Impact".to_string(),
            fill: default_fill(LayerKind::Headline).to_string(),
            left: 50.0,
            top: 10.0,
            font_weight: FontWeight::Bold,
            font_style: FontStyle::Normal,
            text_align: TextAlign::Center,
        },
        TextLayer {
            text: truncate_chars(call_to_action, CTA_MAX_CHARS),
            kind: LayerKind::Cta,
            font_size: 28,
            font_family: LAYER_FAMILY.to_string(),
            fill: default_fill(LayerKind::Cta).to_string(),
            left: 50.0,
            top: 90.0,
            font_weight: FontWeight::Bold,
            font_style: FontStyle::Normal,
            text_align: TextAlign::Center,
        },
    ]
}

/// Body copy never goes on the image
pub fn renderable_layers(layers: &[TextLayer]) -> Vec<TextLayer> {
    layers
        .iter()
        .filter(|l| l.kind != LayerKind::Body)
        .cloned()
        .collect()
}

/// Built-in copy used when the model output is unusable
pub fn default_ad_copy() -> AdCopy {
    AdCopy {
        headline: DEFAULT_HEADLINE.to_string(),
        body: DEFAULT_BODY.to_string(),
        call_to_action: DEFAULT_CTA.to_string(),
        visual_direction: DEFAULT_VISUAL_DIRECTION.to_string(),
        image_url: None,
        text_layers: Some(default_text_layers(DEFAULT_HEADLINE, DEFAULT_CTA)),
    }
}

#[derive(Deserialize)]
struct RawAdCopy {
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    call_to_action: Option<String>,
    #[serde(default)]
    visual_direction: Option<String>,
    #[serde(default)]
    text_layers: Value,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawLayer {
    #[serde(default)]
    text: Value,
    #[serde(default, rename = "type")]
    kind: Value,
    #[serde(default)]
    font_size: Value,
    #[serde(default)]
    font_family: Value,
    #[serde(default)]
    fill: Value,
    #[serde(default)]
    left: Value,
    #[serde(default)]
    top: Value,
    #[serde(default)]
    font_weight: Value,
    #[serde(default)]
    font_style: Value,
    #[serde(default)]
    text_align: Value,
}

fn text_of(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn number_of(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches("px").trim_end_matches('%').parse().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn filled(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Validate one model-supplied layer; body or unknown kinds yield `None`
fn normalize_layer(raw: RawLayer, copy: &AdCopy) -> Option<TextLayer> {
    let kind = text_of(&raw.kind).and_then(LayerKind::parse)?;
    if kind == LayerKind::Body {
        return None;
    }

    let fallback_text = match kind {
        LayerKind::Cta => copy.call_to_action.as_str(),
        _ => copy.headline.as_str(),
    };
    let text = text_of(&raw.text).unwrap_or(fallback_text);
    let text = match max_chars(kind) {
        Some(max) => truncate_chars(text, max),
        None => text.to_string(),
    };

    let (min_px, default_px, max_px) = LAYER_FONT_SIZE;
    let font_size = number_of(&raw.font_size)
        .map(|n| (n.round() as i64).clamp(min_px as i64, max_px as i64) as u32)
        .unwrap_or(default_px);

    let fill = text_of(&raw.fill)
        .filter(|f| imagent::try_parse_color(f).is_some())
        .unwrap_or(default_fill(kind))
        .to_string();

    let position = |value: &Value| {
        number_of(value)
            .map(|n| (n as f32).clamp(0.0, 100.0))
            .unwrap_or(LAYER_POSITION)
    };

    Some(TextLayer {
        text,
        kind,
        font_size,
        font_family: text_of(&raw.font_family).unwrap_or(LAYER_FAMILY).to_string(),
        fill,
        left: position(&raw.left),
        top: position(&raw.top),
        font_weight: text_of(&raw.font_weight)
            .and_then(FontWeight::parse)
            .unwrap_or_default(),
        font_style: text_of(&raw.font_style)
            .and_then(FontStyle::parse)
            .unwrap_or_default(),
        text_align: text_of(&raw.text_align)
            .and_then(TextAlign::parse)
            .unwrap_or_default(),
    })
}

/// Copywriter and art director for the selected idea
pub struct CreativeSynthesizer {
    model: Arc<dyn TextModel>,
}

impl CreativeSynthesizer {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Never fails; `image_url` is always left unset
    pub async fn synthesize(&self, brief: &CampaignBrief, idea: &CampaignIdea) -> AdCopy {
        match self.try_synthesize(brief, idea).await {
            Ok(copy) => copy,
            Err(e) => {
                tracing::warn!(
                    model = self.model.text_model_name(),
                    "Ad copy generation failed, using default copy: {}",
                    e
                );
                default_ad_copy()
            }
        }
    }

    async fn try_synthesize(
        &self,
        brief: &CampaignBrief,
        idea: &CampaignIdea,
    ) -> Result<AdCopy, ExpertError> {
        let prompt = self.build_prompt(brief, idea);
        let text = self.model.complete_text(&prompt).await?;
        let raw: RawAdCopy = parse_model_json(&text)?;

        let mut copy = AdCopy {
            headline: filled(raw.headline, DEFAULT_HEADLINE),
            body: filled(raw.body, DEFAULT_BODY),
            call_to_action: filled(raw.call_to_action, DEFAULT_CTA),
            visual_direction: filled(raw.visual_direction, DEFAULT_VISUAL_DIRECTION),
            image_url: None,
            text_layers: None,
        };

        let offered = match raw.text_layers {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        let offered_count = offered.len();
        let layers: Vec<TextLayer> = offered
            .into_iter()
            .filter_map(|item| serde_json::from_value::<RawLayer>(item).ok())
            .filter_map(|raw| normalize_layer(raw, &copy))
            .collect();

        copy.text_layers = Some(if layers.is_empty() {
            tracing::debug!(offered = offered_count, "Synthesizing default text layers");
            default_text_layers(&copy.headline, &copy.call_to_action)
        } else {
            layers
        });

        tracing::info!(headline = %copy.headline, "Generated ad copy");
        Ok(copy)
    }

    fn build_prompt(&self, brief: &CampaignBrief, idea: &CampaignIdea) -> String {
        format!(
            r##"You are a Creative Copywriter and Art Director working on an advertising campaign. Your job is to create compelling ad copy, visual direction and text layout.

Campaign Brief: {brief}
Objective: {objective}
Target Audience: {audience}
Selected Campaign Idea: {title}
Idea Description: {description}
Ad Formats Needed: {formats}

Create professional ad copy and visual direction. Focus on the selected campaign idea.

IMPORTANT for visual_direction: This will be used to generate a PURELY VISUAL image with NO TEXT. Describe only visual elements - objects, scenes, colors, mood, composition - that represent the product/service concept. DO NOT mention any text, words, letters, numbers, or typography.

Return ONLY a valid JSON object with:
- "headline": A compelling headline (max 100 characters, catchy and attention-grabbing)
- "body": The main body copy (max 300 characters, persuasive and engaging)
- "call_to_action": A clear call-to-action (max 50 characters, action-oriented)
- "visual_direction": Description of ONLY visual elements (objects, scenes, colors, mood, composition, visual metaphors) with ABSOLUTELY NO TEXT (max 280 characters)
- "text_layers": Text to place on the poster. Use ONLY the headline and the call to action, never the body. Each layer has:
  "text", "type" ("headline" or "cta"), "fontSize" (pixels for an 800px image), "fontFamily",
  "fill" (hex color like "#FFFFFF"), "left" and "top" (percent 0-100), "fontWeight" ("normal" or "bold"),
  "fontStyle" ("normal" or "italic"), "textAlign" ("left", "center" or "right")

Example format:
{{
  "headline": "Walk the Walk, Change the World",
  "body": "Your every step can make a difference. Our new eco-friendly sneakers are crafted from 100% recycled materials, combining sustainable style with unparalleled comfort. Join the movement.",
  "call_to_action": "Shop Now",
  "visual_direction": "Vibrant outdoor scene with diverse people walking in eco-friendly sneakers on a nature trail surrounded by lush green trees and clear blue sky, bright green and earth tones, optimistic mood",
  "text_layers": [
    {{"text": "Walk the Walk, Change the World", "type": "headline", "fontSize": 48, "fontFamily": "Impact", "fill": "#1A1A1A", "left": 50, "top": 10, "fontWeight": "bold", "fontStyle": "normal", "textAlign": "center"}},
    {{"text": "Shop Now", "type": "cta", "fontSize": 28, "fontFamily": "Arial", "fill": "#FFFFFF", "left": 50, "top": 90, "fontWeight": "bold", "fontStyle": "normal", "textAlign": "center"}}
  ]
}}

Return ONLY the JSON object, no additional text or markdown formatting."##,
            brief = brief.campaign_brief,
            objective = brief.objective,
            audience = brief.target_audience,
            title = idea.title,
            description = idea.description,
            formats = brief.ad_formats.join(", "),
        )
    }
}

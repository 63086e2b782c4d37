// Idea Evaluator - creative director scoring and selection

use super::{parse_model_json, ExpertError};
use crate::orchestration::types::{CampaignBrief, CampaignIdea};
use gemini::TextModel;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Fewer passing ideas than this and the threshold is ignored
pub const MIN_SELECTION: usize = 3;

const FALLBACK_START: f64 = 8.0;
const FALLBACK_STEP: f64 = 0.5;
const FALLBACK_REASONING: &str = "Default scoring due to evaluation error";

#[derive(Deserialize)]
struct RawEvaluation {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    score: Value,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Models sometimes quote numbers
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

/// Rank `scored` descending; apply the threshold unless that leaves fewer
/// than `MIN_SELECTION`, in which case take the top `MIN_SELECTION`
pub fn select_top_ideas(scored: Vec<CampaignIdea>, threshold: f64) -> Vec<CampaignIdea> {
    let mut ranked = scored;
    // stable: ties keep their original order
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    let passing = ranked.iter().filter(|i| i.score >= threshold).count();
    if passing >= MIN_SELECTION {
        ranked.truncate(passing);
    } else {
        ranked.truncate(MIN_SELECTION);
    }
    ranked
}

/// Creative director: scores ideas and picks the strongest
pub struct IdeaEvaluator {
    model: Arc<dyn TextModel>,
}

impl IdeaEvaluator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Score `ideas` in place and return the ranked selection.
    ///
    /// Ideas the model did not score keep their previous score but are left
    /// out of the ranking. When nothing usable comes back every idea gets a
    /// descending synthetic score and the top `MIN_SELECTION` are returned
    /// regardless of `threshold`.
    pub async fn evaluate(
        &self,
        ideas: &mut [CampaignIdea],
        brief: &CampaignBrief,
        threshold: f64,
    ) -> Vec<CampaignIdea> {
        if ideas.is_empty() {
            return Vec::new();
        }

        let scores = match self.score(ideas, brief).await {
            Ok(scores) => scores,
            Err(e) => {
                tracing::warn!(
                    model = self.model.text_model_name(),
                    "Idea evaluation failed, using default scoring: {}",
                    e
                );
                for (i, idea) in ideas.iter_mut().enumerate() {
                    idea.score = (FALLBACK_START - FALLBACK_STEP * i as f64).max(0.0);
                    idea.reasoning = Some(FALLBACK_REASONING.to_string());
                }
                let mut ranked = ideas.to_vec();
                ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
                ranked.truncate(MIN_SELECTION);
                return ranked;
            }
        };

        let mut scored = Vec::with_capacity(scores.len());
        for (index, (score, reasoning)) in scores {
            let idea = &mut ideas[index];
            idea.score = score;
            idea.reasoning = Some(reasoning);
            scored.push(idea.clone());
        }

        let selected = select_top_ideas(scored, threshold);
        tracing::info!(
            scored = ideas.len(),
            selected = selected.len(),
            threshold,
            "Evaluated campaign ideas"
        );
        selected
    }

    /// Index -> (clamped score, reasoning), keyed in idea order
    async fn score(
        &self,
        ideas: &[CampaignIdea],
        brief: &CampaignBrief,
    ) -> Result<BTreeMap<usize, (f64, String)>, ExpertError> {
        let prompt = self.build_prompt(ideas, brief);
        let text = self.model.complete_text(&prompt).await?;
        let evaluations: Vec<RawEvaluation> = parse_model_json(&text)?;

        let mut scores = BTreeMap::new();
        for evaluation in evaluations {
            let Some(id) = number(&evaluation.id) else { continue };
            let Some(score) = number(&evaluation.score) else { continue };
            if id.fract() != 0.0 || id < 1.0 || id > ideas.len() as f64 {
                tracing::debug!(id, "Ignoring evaluation for unknown idea id");
                continue;
            }
            // later entries for the same id win
            scores.insert(
                id as usize - 1,
                (score.clamp(0.0, 10.0), evaluation.reasoning.unwrap_or_default()),
            );
        }

        if scores.is_empty() {
            return Err(ExpertError::Parse("no usable scores in evaluation".to_string()));
        }
        Ok(scores)
    }

    fn build_prompt(&self, ideas: &[CampaignIdea], brief: &CampaignBrief) -> String {
        let listing: Vec<String> = ideas
            .iter()
            .enumerate()
            .map(|(i, idea)| {
                format!(
                    "{}. Title: {}\n   Description: {}",
                    i + 1,
                    idea.title,
                    idea.description
                )
            })
            .collect();

        format!(
            r#"You are a Creative Director evaluating campaign ideas. Your job is to critically assess each idea and assign a quality score from 1-10.

Campaign Brief: {brief}
Objective: {objective}
Target Audience: {audience}

Campaign Ideas to Evaluate:
{listing}

Evaluate each idea based on:
- Creativity and originality (30%)
- Alignment with campaign brief and objective (30%)
- Appeal to target audience (25%)
- Feasibility and clarity (15%)

For each of the {n} ideas, provide:
- "id": The idea number (1-{n})
- "score": A numerical score from 1.0 to 10.0 (use decimals for precision)
- "reasoning": Brief explanation of the score (max 150 characters)

Return ONLY a valid JSON array with {n} objects.

Example format:
[
  {{"id": 1, "score": 8.5, "reasoning": "Strong creative concept with clear target audience appeal."}},
  {{"id": 2, "score": 6.0, "reasoning": "Good idea but lacks originality and impact."}}
]

Return ONLY the JSON array, no additional text or markdown formatting."#,
            brief = brief.campaign_brief,
            objective = brief.objective,
            audience = brief.target_audience,
            listing = listing.join("\n"),
            n = ideas.len(),
        )
    }
}

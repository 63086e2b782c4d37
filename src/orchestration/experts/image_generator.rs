// Image Generator - poster image from the visual direction

use super::{short_id, ExpertError};
use gemini::{GenerateContentResponse, ImageModel, ModalityHint};
use std::path::PathBuf;
use std::sync::Arc;

/// URL prefix the upload directory is served under
pub const UPLOADS_PREFIX: &str = "/uploads/";

/// Inputs for one image generation
#[derive(Debug, Clone, Default)]
pub struct ImageRequest<'a> {
    pub visual_direction: &'a str,
    pub headline: &'a str,
    pub campaign_brief: &'a str,
    /// Let the model render the headline as part of the design
    pub bake_text: bool,
}

/// File extension for a declared MIME type
pub fn extension_for_mime(mime: &str) -> &'static str {
    let mime = mime.to_lowercase();
    if mime.contains("jpeg") || mime.contains("jpg") {
        "jpg"
    } else if mime.contains("webp") {
        "webp"
    } else {
        "png"
    }
}

/// First inline payload with non-empty bytes, plus its MIME type
fn extract_image(response: GenerateContentResponse) -> Option<(Vec<u8>, String)> {
    let parts = response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts);

    for (index, part) in parts.enumerate() {
        let Some(inline) = part.inline_data else {
            if let Some(text) = part.text.as_deref() {
                tracing::debug!(part = index, chars = text.len(), "Skipping text part");
            }
            continue;
        };

        let mime = inline.mime_type().to_string();
        match inline.data.into_bytes() {
            Ok(bytes) if !bytes.is_empty() => return Some((bytes, mime)),
            Ok(_) => tracing::debug!(part = index, "Inline payload is empty"),
            Err(e) => tracing::warn!(part = index, "Failed to decode inline payload: {}", e),
        }
    }
    None
}

/// Art department: turns visual direction into a saved poster image
pub struct ImageGenerator {
    model: Arc<dyn ImageModel>,
    upload_dir: PathBuf,
}

impl ImageGenerator {
    pub fn new(model: Arc<dyn ImageModel>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            model,
            upload_dir: upload_dir.into(),
        }
    }

    /// Best effort: `/uploads/<name>` on success, `None` on any failure
    pub async fn generate(&self, request: &ImageRequest<'_>) -> Option<String> {
        let prompt = if request.bake_text {
            baked_text_prompt(request.campaign_brief, request.visual_direction, request.headline)
        } else {
            no_text_prompt(request.campaign_brief, request.visual_direction)
        };

        tracing::info!(
            model = self.model.image_model_name(),
            bake_text = request.bake_text,
            prompt_chars = prompt.len(),
            "Generating poster image"
        );

        let response = self.request_image(&prompt).await?;
        let Some((bytes, mime)) = extract_image(response) else {
            tracing::warn!("No image data found in response");
            return None;
        };

        match self.save(&bytes, &mime).await {
            Ok(url) => {
                tracing::info!(url = %url, bytes = bytes.len(), mime = %mime, "Saved poster image");
                Some(url)
            }
            Err(e) => {
                tracing::warn!("Failed to save generated image: {}", e);
                None
            }
        }
    }

    /// Try each modality form until one call succeeds
    async fn request_image(&self, prompt: &str) -> Option<GenerateContentResponse> {
        for hint in ModalityHint::ATTEMPT_ORDER {
            tracing::debug!(attempt = hint.as_str(), "Requesting image");
            match self.model.complete_image(prompt, hint).await {
                Ok(response) => return Some(response),
                Err(e) => {
                    tracing::warn!(attempt = hint.as_str(), "Image request failed: {}", e);
                }
            }
        }
        tracing::warn!("All image request forms failed");
        None
    }

    async fn save(&self, bytes: &[u8], mime: &str) -> Result<String, ExpertError> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let filename = format!("ad_poster_{}.{}", short_id(), extension_for_mime(mime));
        tokio::fs::write(self.upload_dir.join(&filename), bytes).await?;
        Ok(format!("{}{}", UPLOADS_PREFIX, filename))
    }
}

fn no_text_prompt(campaign_brief: &str, visual_direction: &str) -> String {
    format!(
        r#"Create a professional, concept-based advertising image. This is a PURELY VISUAL image with ABSOLUTELY NO TEXT.

Campaign Context: {campaign_brief}
Visual Style Guide: {visual_direction}

CRITICAL REQUIREMENTS:
1. NO TEXT AT ALL: Do not include any words, letters, numbers, typography, text overlays, labels, or written content in the image
2. CONCEPT-BASED: Extract the core product/service concept from the campaign brief and represent it through visual imagery only
3. VISUAL REPRESENTATION: Use visual elements that clearly communicate the concept:
   - For food delivery apps: Show food items, delivery bags/boxes, people enjoying meals, restaurant settings, delivery vehicles, happy customers with food
   - For fashion brands: Show clothing items, models wearing clothes, fashion accessories, style settings
   - For tech products: Show the product in use, modern environments, people using the product, technology scenes
   - Use relevant visual metaphors and imagery that instantly communicate the product/service type
4. VISUAL QUALITY:
   - Professional photography or illustration style
   - Vibrant, appealing colors that match the visual direction
   - Clear composition that draws attention
   - Suitable for social media and print advertising
5. COMMUNICATION: The image must communicate the campaign concept purely through visual elements

Generate a high-quality advertising image using ONLY visual imagery - absolutely NO text, words, letters, numbers, or typography of any kind."#
    )
}

fn baked_text_prompt(campaign_brief: &str, visual_direction: &str, headline: &str) -> String {
    format!(
        r#"Create a polished, professional advertising poster. You are the lead designer and have full creative authority over typography, color palette, layout and composition.

Campaign Context: {campaign_brief}
Visual Style Guide: {visual_direction}
Headline: "{headline}"

DESIGN REQUIREMENTS:
1. The headline above is the ONLY text allowed on the poster. Render it exactly as written, spelled correctly, as an integral part of the design
2. Do not add body copy, taglines, calls to action, logos with lettering, prices or any other words
3. Choose typography, weight and placement that make the headline legible and striking over the imagery
4. Represent the product/service concept through strong visual imagery that supports the headline
5. Professional finish suitable for social media and print advertising

Generate a single high-quality poster that integrates the headline into the visual design."#
    )
}

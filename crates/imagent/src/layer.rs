// Text layer description shared by the copy synthesizer and the compositor

use serde::{Deserialize, Serialize};

/// What part of the ad copy a layer carries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Headline,
    Body,
    Cta,
}

impl LayerKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "headline" => Some(LayerKind::Headline),
            "body" => Some(LayerKind::Body),
            "cta" | "call_to_action" => Some(LayerKind::Cta),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Normal,
    #[default]
    Bold,
}

impl FontWeight {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "normal" | "regular" | "400" => Some(FontWeight::Normal),
            "bold" | "700" => Some(FontWeight::Bold),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

impl FontStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "normal" => Some(FontStyle::Normal),
            "italic" | "oblique" => Some(FontStyle::Italic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl TextAlign {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "left" => Some(TextAlign::Left),
            "center" | "centre" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            _ => None,
        }
    }
}

/// A styled run of text positioned in percent of the image size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    pub text: String,

    #[serde(rename = "type")]
    pub kind: LayerKind,

    /// Nominal size against an 800px reference image
    pub font_size: u32,

    pub font_family: String,

    /// Hex colour (`#RRGGBB`) or a basic colour name
    pub fill: String,

    /// Horizontal anchor, percent of width
    pub left: f32,

    /// Top edge, percent of height
    pub top: f32,

    #[serde(default)]
    pub font_weight: FontWeight,

    #[serde(default)]
    pub font_style: FontStyle,

    #[serde(default)]
    pub text_align: TextAlign,
}

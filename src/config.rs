// Settings - TOML file with environment overrides

use gemini::GeminiConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Top-level settings for the CLI and the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum evaluator score for an idea to pass the threshold filter
    #[serde(default = "default_idea_threshold")]
    pub idea_threshold: f64,

    /// Root served as `/uploads/`
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Searched for TrueType fonts when compositing
    #[serde(default = "default_font_dirs")]
    pub font_dirs: Vec<PathBuf>,

    /// Timeout for fetching remote source images
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

fn default_idea_threshold() -> f64 {
    7.0
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_font_dirs() -> Vec<PathBuf> {
    imagent::FontResolver::system().dirs().to_vec()
}

fn default_fetch_timeout_ms() -> u64 {
    30000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            idea_threshold: default_idea_threshold(),
            upload_dir: default_upload_dir(),
            font_dirs: default_font_dirs(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// One JSON file per campaign lives here
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("creative-flow").join("campaigns"))
        .unwrap_or_else(|| PathBuf::from("./data/campaigns"))
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Settings {
    /// Load from `path` (if given), then apply process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Override fields from variables resolved through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("GEMINI_API_KEY") {
            self.gemini.api_key = v;
        }
        if let Some(v) = var("GEMINI_ENDPOINT") {
            self.gemini.endpoint = v;
        }
        if let Some(v) = var("GEMINI_TEXT_MODEL") {
            self.gemini.text_model = v;
        }
        if let Some(v) = var("GEMINI_IMAGE_MODEL") {
            self.gemini.image_model = v;
        }
        if let Some(v) = var("MODEL_TIMEOUT_MS") {
            self.gemini.timeout_ms = v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "MODEL_TIMEOUT_MS",
                value: v.clone(),
            })?;
        }
        if let Some(v) = var("IDEA_THRESHOLD") {
            let threshold: f64 = v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "IDEA_THRESHOLD",
                value: v.clone(),
            })?;
            if !(0.0..=10.0).contains(&threshold) {
                return Err(ConfigError::Invalid {
                    key: "IDEA_THRESHOLD",
                    value: v,
                });
            }
            self.pipeline.idea_threshold = threshold;
        }
        if let Some(v) = var("UPLOAD_DIR") {
            self.pipeline.upload_dir = PathBuf::from(v);
        }
        if let Some(v) = var("FONT_DIRS") {
            self.pipeline.font_dirs = std::env::split_paths(&v).collect();
        }
        if let Some(v) = var("DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.pipeline.idea_threshold, 7.0);
        assert_eq!(settings.pipeline.upload_dir, PathBuf::from("uploads"));
        assert_eq!(settings.gemini.text_model, "gemini-flash-latest");
        assert_eq!(settings.gemini.image_model, "gemini-2.5-flash-image");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            [gemini]
            text_model = "gemini-2.5-pro"

            [pipeline]
            idea_threshold = 6.5
            "#,
        )
        .unwrap();

        assert_eq!(settings.gemini.text_model, "gemini-2.5-pro");
        assert_eq!(settings.gemini.timeout_ms, 120_000);
        assert_eq!(settings.pipeline.idea_threshold, 6.5);
        assert_eq!(settings.pipeline.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_env(env(&[
                ("GEMINI_API_KEY", "k-123"),
                ("UPLOAD_DIR", "/srv/uploads"),
                ("IDEA_THRESHOLD", "8"),
                ("MODEL_TIMEOUT_MS", "5000"),
                ("DATA_DIR", "/srv/data"),
                ("GEMINI_TEXT_MODEL", "  "),
            ]))
            .unwrap();

        assert_eq!(settings.gemini.api_key, "k-123");
        assert_eq!(settings.gemini.timeout_ms, 5000);
        assert_eq!(settings.gemini.text_model, "gemini-flash-latest");
        assert_eq!(settings.pipeline.idea_threshold, 8.0);
        assert_eq!(settings.pipeline.upload_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(settings.storage.data_dir, PathBuf::from("/srv/data"));
    }

    #[test]
    fn test_invalid_env_values_rejected() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(env(&[("IDEA_THRESHOLD", "eleven")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "IDEA_THRESHOLD", .. }));

        let err = settings
            .apply_env(env(&[("IDEA_THRESHOLD", "11")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

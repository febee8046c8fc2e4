//! Configuration structures for the document pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the idp pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdpConfig {
    /// Recognition engine configuration.
    pub ocr: OcrConfig,

    /// Image normalization configuration.
    pub preprocessing: PreprocessingConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Analytics constants.
    pub analytics: AnalyticsConfig,

    /// Extraction history configuration.
    pub history: HistoryConfig,
}

/// Recognition engine configuration.
///
/// Each flag only allows an engine to be tried at startup; an engine that
/// fails to initialize stays disabled for the rest of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Try to load the neural (ONNX) engine.
    pub enable_neural: bool,

    /// Try to use the classical (Tesseract) engine.
    pub enable_classical: bool,

    /// Directory containing the neural model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in neural output instead of replacing them with spaces.
    pub keep_unk: bool,

    /// Tesseract executable name or path.
    pub tesseract_binary: String,

    /// Tesseract language code.
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enable_neural: true,
            enable_classical: true,
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
            tesseract_binary: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

impl OcrConfig {
    /// Full path to a file in the model directory.
    pub fn model_path(&self, file_name: &str) -> PathBuf {
        self.model_dir.join(file_name)
    }
}

/// Image normalization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Run normalization before recognition.
    pub enabled: bool,

    /// Median filter radius used for denoising (0 disables the filter).
    pub denoise_radius: u32,

    /// Suffix appended to the file stem of the normalized image.
    pub output_suffix: String,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            denoise_radius: 1,
            output_suffix: "_processed".to_string(),
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// JSON rule file replacing the built-in pattern table.
    pub patterns: Option<PathBuf>,
}

/// Constants used by the analytics computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Minutes a person needs to process one document by hand.
    pub manual_minutes_per_document: f64,

    /// Days per month used for the monthly projection.
    pub days_per_month: u64,

    /// Reported error reduction percentage.
    pub error_reduction_percent: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            manual_minutes_per_document: 5.0,
            days_per_month: 30,
            error_reduction_percent: 85.0,
        }
    }
}

/// Extraction history configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// JSON-lines file the history is persisted to (in-memory only when unset).
    pub path: Option<PathBuf>,

    /// Maximum number of results kept; the oldest are evicted first.
    /// Zero is treated as unbounded.
    pub max_entries: Option<usize>,
}

impl IdpConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: IdpConfig =
            serde_json::from_str(r#"{"analytics": {"days_per_month": 22}}"#).unwrap();

        assert_eq!(config.analytics.days_per_month, 22);
        assert_eq!(config.analytics.manual_minutes_per_document, 5.0);
        assert_eq!(config.analytics.error_reduction_percent, 85.0);
        assert!(config.preprocessing.enabled);
        assert_eq!(config.ocr.language, "eng");
        assert!(config.history.path.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = IdpConfig::default();
        config.ocr.enable_neural = false;
        config.history.max_entries = Some(100);
        config.save(&path).unwrap();

        let loaded = IdpConfig::from_file(&path).unwrap();
        assert!(!loaded.ocr.enable_neural);
        assert_eq!(loaded.history.max_entries, Some(100));
        assert_eq!(loaded.ocr.model_path("det.onnx"), PathBuf::from("models/det.onnx"));
    }
}

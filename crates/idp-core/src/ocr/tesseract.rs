//! Tesseract OCR engine.
//!
//! Runs the `tesseract` command-line tool on a decoded copy of the image.

use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::RecognitionEngine;

/// Classical OCR backed by the Tesseract binary.
pub struct TesseractEngine {
    binary: String,
    language: String,
}

impl TesseractEngine {
    /// Create an engine without checking that the binary exists.
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            binary: config.tesseract_binary.clone(),
            language: config.language.clone(),
        }
    }

    /// Create an engine if `tesseract --version` succeeds.
    pub fn probe(config: &OcrConfig) -> Result<Self, OcrError> {
        let engine = Self::new(config);

        let output = Command::new(&engine.binary)
            .arg("--version")
            .output()
            .map_err(|e| Self::spawn_error(&engine.binary, e))?;

        if !output.status.success() {
            return Err(OcrError::BackendNotAvailable(format!(
                "{} --version exited with {}",
                engine.binary, output.status
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        info!(
            "Detected {}",
            version.lines().next().unwrap_or("tesseract").trim()
        );

        Ok(engine)
    }

    fn spawn_error(binary: &str, e: std::io::Error) -> OcrError {
        if e.kind() == std::io::ErrorKind::NotFound {
            OcrError::BackendNotAvailable(format!("{} not found (install tesseract-ocr)", binary))
        } else {
            OcrError::Io(e)
        }
    }

    fn run_tesseract(&self, image_path: &Path) -> Result<String, OcrError> {
        let output = Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .map_err(|e| Self::spawn_error(&self.binary, e))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(OcrError::Recognition(format!("tesseract failed: {}", stderr.trim())))
        }
    }
}

impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, image_path: &Path) -> Result<String, OcrError> {
        let image = image::open(image_path)
            .map_err(|e| OcrError::InvalidImage(format!("{}: {}", image_path.display(), e)))?;

        // Re-encode so tesseract always sees a format it can read.
        let temp_dir = tempfile::tempdir()?;
        let decoded_path = temp_dir.path().join("page.png");
        image
            .save(&decoded_path)
            .map_err(|e| OcrError::InvalidImage(format!("failed to re-encode image: {}", e)))?;

        debug!(
            "Running {} on {}x{} image",
            self.binary,
            image.width(),
            image.height()
        );

        self.run_tesseract(&decoded_path)
    }
}

//! Image normalization before recognition.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::median_filter;
use tracing::{debug, warn};

use crate::error::OcrError;
use crate::models::config::PreprocessingConfig;

/// Converts a document photo into a two-level image.
///
/// Grayscale, median denoise, then a global Otsu threshold. The result is
/// written into a caller-supplied work directory as `<stem><suffix>.<ext>`,
/// never next to the input.
pub struct ImageNormalizer {
    enabled: bool,
    denoise_radius: u32,
    output_suffix: String,
}

impl ImageNormalizer {
    /// Create a normalizer with default settings.
    pub fn new() -> Self {
        Self::from_config(&PreprocessingConfig::default())
    }

    pub fn from_config(config: &PreprocessingConfig) -> Self {
        Self {
            enabled: config.enabled,
            denoise_radius: config.denoise_radius,
            output_suffix: config.output_suffix.clone(),
        }
    }

    /// Normalize the image at `path`, writing the result into `work_dir`.
    ///
    /// Returns the path of the normalized image, or `path` itself when
    /// normalization is disabled or fails for any reason.
    pub fn normalize(&self, path: &Path, work_dir: &Path) -> PathBuf {
        if !self.enabled {
            return path.to_path_buf();
        }

        match self.try_normalize(path, work_dir) {
            Ok(processed) => {
                debug!("Normalized {} -> {}", path.display(), processed.display());
                processed
            }
            Err(e) => {
                warn!("Image preprocessing error for {}: {}", path.display(), e);
                path.to_path_buf()
            }
        }
    }

    fn try_normalize(&self, path: &Path, work_dir: &Path) -> Result<PathBuf, OcrError> {
        let image = image::open(path)
            .map_err(|e| OcrError::InvalidImage(format!("{}: {}", path.display(), e)))?;

        let binary = self.binarize(&image);
        let output = self.output_path(path, work_dir);

        binary
            .save(&output)
            .map_err(|e| OcrError::InvalidImage(format!("failed to write {}: {}", output.display(), e)))?;

        Ok(output)
    }

    /// Grayscale, denoise and threshold an in-memory image.
    pub fn binarize(&self, image: &DynamicImage) -> GrayImage {
        let gray = image.to_luma8();

        let denoised = if self.denoise_radius > 0 {
            median_filter(&gray, self.denoise_radius, self.denoise_radius)
        } else {
            gray
        };

        let level = otsu_level(&denoised);
        debug!("Otsu threshold level: {}", level);

        let mut binary = denoised;
        for pixel in binary.pixels_mut() {
            let value = if pixel[0] > level { 255 } else { 0 };
            *pixel = Luma([value]);
        }
        binary
    }

    /// Where the normalized version of `path` is written inside `work_dir`.
    pub fn output_path(&self, path: &Path, work_dir: &Path) -> PathBuf {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "png".to_string());

        work_dir.join(format!("{}{}.{}", stem, self.output_suffix, extension))
    }
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

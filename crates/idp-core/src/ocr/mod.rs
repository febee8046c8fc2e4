//! Text recognition: an ordered chain of engines with a synthetic fallback.
//!
//! Engines are constructed once, when the adapter is built. An engine that
//! cannot be initialized is left out of the chain for the rest of the
//! process; an engine that fails on a particular image only makes the adapter
//! move on to the next tier. When every tier is exhausted the deterministic
//! synthetic generator produces the transcript, so recognition never fails.

#[cfg(feature = "native")]
mod neural;
mod preprocessing;
mod synthetic;
mod tesseract;

#[cfg(feature = "native")]
pub use neural::NeuralEngine;
pub use preprocessing::ImageNormalizer;
pub use synthetic::{synthetic_transcript, SYNTHETIC_ENGINE};
pub use tesseract::TesseractEngine;

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// A text recognition backend.
///
/// Documents are processed one at a time, so engines are not required to be
/// shareable across threads.
pub trait RecognitionEngine {
    /// Short identifier recorded with every transcript the engine produces.
    fn name(&self) -> &'static str;

    /// Recognize the text in the image at `image_path`.
    fn recognize(&self, image_path: &Path) -> Result<String, OcrError>;
}

/// Text produced by the recognition stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Plain text.
    pub text: String,
    /// Name of the engine that produced it.
    pub engine: String,
}

/// Ordered fallback chain over recognition engines.
pub struct TextRecognitionAdapter {
    engines: Vec<Box<dyn RecognitionEngine>>,
}

impl TextRecognitionAdapter {
    /// Create an adapter over engines given in priority order.
    pub fn new(engines: Vec<Box<dyn RecognitionEngine>>) -> Self {
        Self { engines }
    }

    /// Adapter that always uses the synthetic generator.
    pub fn synthetic_only() -> Self {
        Self::new(Vec::new())
    }

    /// Initialize the engines allowed by `config`: neural first, then classical.
    pub fn from_config(config: &OcrConfig) -> Self {
        let mut engines: Vec<Box<dyn RecognitionEngine>> = Vec::new();

        if config.enable_neural {
            #[cfg(feature = "native")]
            match NeuralEngine::from_config(config) {
                Ok(engine) => engines.push(Box::new(engine)),
                Err(e) => warn!("Neural OCR engine disabled: {}", e),
            }

            #[cfg(not(feature = "native"))]
            debug!("Neural OCR engine not compiled in (feature `native` disabled)");
        }

        if config.enable_classical {
            match TesseractEngine::probe(config) {
                Ok(engine) => engines.push(Box::new(engine)),
                Err(e) => warn!("Classical OCR engine disabled: {}", e),
            }
        }

        if engines.is_empty() {
            warn!("No OCR engine available, using synthetic transcripts");
        }

        Self::new(engines)
    }

    /// Names of the available engines, in the order they are tried.
    pub fn engine_names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// Produce a transcript for the image at `image_path`.
    pub fn transcribe(&self, image_path: &Path) -> Transcript {
        for engine in &self.engines {
            let start = Instant::now();
            match engine.recognize(image_path) {
                Ok(text) => {
                    info!(
                        "{} recognized {} characters in {:?}",
                        engine.name(),
                        text.len(),
                        start.elapsed()
                    );
                    return Transcript {
                        text,
                        engine: engine.name().to_string(),
                    };
                }
                Err(e) => {
                    warn!(
                        "OCR engine {} failed on {}: {}",
                        engine.name(),
                        image_path.display(),
                        e
                    );
                }
            }
        }

        debug!("Using synthetic transcript for {}", image_path.display());
        Transcript {
            text: synthetic_transcript(image_path).to_string(),
            engine: SYNTHETIC_ENGINE.to_string(),
        }
    }
}

impl Default for TextRecognitionAdapter {
    fn default() -> Self {
        Self::synthetic_only()
    }
}

#[cfg(test)]
pub(crate) mod test_engines {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::RecognitionEngine;
    use crate::error::OcrError;

    /// Engine that always returns the same text.
    pub struct FixedEngine(pub &'static str);

    impl RecognitionEngine for FixedEngine {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn recognize(&self, _image_path: &Path) -> Result<String, OcrError> {
            Ok(self.0.to_string())
        }
    }

    /// Engine that always fails and counts its calls.
    #[derive(Default)]
    pub struct FailingEngine {
        pub calls: Arc<AtomicUsize>,
    }

    impl RecognitionEngine for FailingEngine {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn recognize(&self, _image_path: &Path) -> Result<String, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(OcrError::Recognition("engine crashed".to_string()))
        }
    }
}

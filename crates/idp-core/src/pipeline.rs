//! Document pipeline: normalize, recognize, extract, record.

use std::path::Path;
use std::time::Instant;

use chrono::Local;
use tracing::{debug, info};

use crate::analytics::AnalyticsSnapshot;
use crate::error::{IdpError, Result};
use crate::export;
use crate::extraction::{FieldExtractor, PatternTable};
use crate::history::{self, HistoryStore};
use crate::models::config::{AnalyticsConfig, IdpConfig};
use crate::models::result::ExtractionResult;
use crate::ocr::{ImageNormalizer, TextRecognitionAdapter};

/// Turns one document image into an [`ExtractionResult`].
pub struct DocumentPipeline {
    normalizer: ImageNormalizer,
    recognizer: TextRecognitionAdapter,
    extractor: FieldExtractor,
}

impl DocumentPipeline {
    pub fn new(
        normalizer: ImageNormalizer,
        recognizer: TextRecognitionAdapter,
        extractor: FieldExtractor,
    ) -> Self {
        Self {
            normalizer,
            recognizer,
            extractor,
        }
    }

    /// Build the pipeline described by `config`.
    ///
    /// Recognition engines are initialized here, once. A configured rule file
    /// replaces the built-in pattern table; failing to load it is an error.
    pub fn from_config(config: &IdpConfig) -> Result<Self> {
        let table = match &config.extraction.patterns {
            Some(path) => {
                info!("Loading extraction rules from {}", path.display());
                PatternTable::from_file(path)?
            }
            None => PatternTable::builtin(),
        };

        Ok(Self::new(
            ImageNormalizer::from_config(&config.preprocessing),
            TextRecognitionAdapter::from_config(&config.ocr),
            FieldExtractor::new(table),
        ))
    }

    /// Process the document image at `image_path`.
    ///
    /// The normalized image lives in a temporary directory removed when the
    /// call returns; nothing is written next to the input.
    pub fn process(&self, image_path: &Path) -> Result<ExtractionResult> {
        let start = Instant::now();

        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                IdpError::Pipeline(format!("{} has no file name", image_path.display()))
            })?;

        let work_dir = tempfile::tempdir()?;
        let normalized = self.normalizer.normalize(image_path, work_dir.path());
        let transcript = self.recognizer.transcribe(&normalized);
        let fields = self.extractor.extract(&transcript.text);

        let processing_time = start.elapsed().as_secs_f64();
        debug!(
            "Processed {} as {} via {} in {:.3}s",
            file_name, fields.document_type, transcript.engine, processing_time
        );

        Ok(ExtractionResult {
            fields,
            processing_time,
            timestamp: Local::now().naive_local(),
            file_name,
            ocr_engine: Some(transcript.engine),
        })
    }
}

/// Owns one pipeline and the history of everything it processed.
pub struct DocumentProcessor {
    pipeline: DocumentPipeline,
    history: Box<dyn HistoryStore>,
    analytics: AnalyticsConfig,
}

impl DocumentProcessor {
    pub fn new(
        pipeline: DocumentPipeline,
        history: Box<dyn HistoryStore>,
        analytics: AnalyticsConfig,
    ) -> Self {
        Self {
            pipeline,
            history,
            analytics,
        }
    }

    /// Build the pipeline and open the history store described by `config`.
    pub fn from_config(config: &IdpConfig) -> Result<Self> {
        let pipeline = DocumentPipeline::from_config(config)?;
        let history = history::open(&config.history)?;

        Ok(Self::new(pipeline, history, config.analytics.clone()))
    }

    pub fn history(&self) -> &dyn HistoryStore {
        self.history.as_ref()
    }

    /// Process a document and record the result.
    ///
    /// Nothing is recorded when processing fails.
    pub fn process_document(&self, image_path: &Path) -> Result<ExtractionResult> {
        let result = self.pipeline.process(image_path)?;
        self.history.append(result.clone())?;
        Ok(result)
    }

    /// Analytics over everything recorded so far.
    pub fn analytics(&self) -> Result<AnalyticsSnapshot> {
        let history = self.history.snapshot()?;
        Ok(AnalyticsSnapshot::compute(&history, &self.analytics))
    }

    /// Recorded results as CSV.
    pub fn export_csv(&self) -> Result<String> {
        let history = self.history.snapshot()?;
        Ok(export::to_csv(&history)?)
    }
}

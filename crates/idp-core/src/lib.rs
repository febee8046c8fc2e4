//! Core library for business document OCR processing.
//!
//! This crate provides:
//! - Image normalization (grayscale, denoise, Otsu binarization)
//! - Text recognition through an ordered chain of engines with a
//!   deterministic synthetic fallback
//! - Document classification and pattern-cascade field extraction
//! - Extraction history, analytics and CSV export

pub mod analytics;
pub mod error;
pub mod export;
pub mod extraction;
pub mod history;
pub mod models;
pub mod ocr;
pub mod pipeline;

pub use analytics::{AnalyticsSnapshot, ChartData};
pub use error::{IdpError, Result};
pub use extraction::{Field, FieldExtractor, PatternRule, PatternTable};
pub use history::{HistoryStore, JsonlHistory, MemoryHistory};
pub use models::config::IdpConfig;
pub use models::result::{DocumentType, ExtractedFields, ExtractionResult};
pub use ocr::{ImageNormalizer, RecognitionEngine, TextRecognitionAdapter, Transcript};
pub use pipeline::{DocumentPipeline, DocumentProcessor};

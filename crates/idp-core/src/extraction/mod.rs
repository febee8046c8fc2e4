//! Document classification and field extraction.

mod extractor;
pub mod patterns;

pub use extractor::{classify_document, FieldExtractor};
pub use patterns::{default_rules, Field, PatternRule, PatternTable};

//! Classification and pattern-cascade extraction over a transcript.

use tracing::debug;

use crate::models::result::{DocumentType, ExtractedFields};

use super::patterns::{Field, PatternTable};

/// Category tokens in priority order.
const CATEGORY_TOKENS: [(&str, DocumentType); 3] = [
    ("invoice", DocumentType::Invoice),
    ("receipt", DocumentType::Receipt),
    ("form", DocumentType::Form),
];

/// Classify a transcript by the first category token it contains.
pub fn classify_document(text: &str) -> DocumentType {
    let lower = text.to_lowercase();
    CATEGORY_TOKENS
        .iter()
        .find(|(token, _)| lower.contains(*token))
        .map(|(_, doc_type)| *doc_type)
        .unwrap_or(DocumentType::Unknown)
}

/// Extracts the named fields of a document from its transcript.
///
/// Extraction is a pure function of the text and the pattern table.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    table: PatternTable,
}

impl FieldExtractor {
    pub fn new(table: PatternTable) -> Self {
        Self { table }
    }

    /// Classify the document and run every field's cascade.
    pub fn extract(&self, text: &str) -> ExtractedFields {
        let mut fields = ExtractedFields {
            document_type: classify_document(text),
            raw_text: text.to_string(),
            ..Default::default()
        };

        for field in Field::ALL {
            let value = self.table.first_match(field, text).unwrap_or_default();
            match field {
                Field::InvoiceNumber => fields.invoice_number = value,
                Field::CompanyName => fields.company_name = value,
                Field::Date => fields.date = value,
                Field::Amount => fields.amount = value,
                Field::Tax => fields.tax = value,
            }
        }

        debug!(
            "Extracted {} fields from {} characters (type {})",
            [
                &fields.invoice_number,
                &fields.company_name,
                &fields.date,
                &fields.amount,
                &fields.tax,
            ]
            .iter()
            .filter(|v| !v.is_empty())
            .count(),
            text.len(),
            fields.document_type
        );

        fields
    }
}

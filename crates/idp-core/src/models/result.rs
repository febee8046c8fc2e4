//! Per-document extraction records.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Kind of business document, decided from the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum DocumentType {
    Invoice,
    Receipt,
    Form,
    #[default]
    Unknown,
}

impl DocumentType {
    /// Name used in exports and analytics.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "Invoice",
            DocumentType::Receipt => "Receipt",
            DocumentType::Form => "Form",
            DocumentType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields extracted from one transcript.
///
/// Every field is always present; a field no rule matched holds an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Classified document type.
    pub document_type: DocumentType,

    /// Issuing company or document title.
    pub company_name: String,

    /// Invoice, receipt or reference number.
    pub invoice_number: String,

    /// Document date as printed.
    pub date: String,

    /// Total amount as printed (without currency symbol).
    pub amount: String,

    /// Tax amount or rate as printed.
    pub tax: String,

    /// Full transcript the fields were extracted from.
    pub raw_text: String,
}

/// Record produced by the pipeline for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted fields and transcript.
    #[serde(flatten)]
    pub fields: ExtractedFields,

    /// Wall-clock processing time in seconds.
    pub processing_time: f64,

    /// Completion instant (local time).
    pub timestamp: NaiveDateTime,

    /// Base name of the source file.
    pub file_name: String,

    /// Recognition tier that produced the transcript.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_engine: Option<String>,
}

impl ExtractionResult {
    /// Date portion (`YYYY-MM-DD`) of the completion timestamp.
    pub fn date_key(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }

    pub fn document_type(&self) -> DocumentType {
        self.fields.document_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> ExtractionResult {
        ExtractionResult {
            fields: ExtractedFields {
                document_type: DocumentType::Receipt,
                company_name: "Coffee Corner".to_string(),
                amount: "13.00".to_string(),
                ..Default::default()
            },
            processing_time: 0.25,
            timestamp: NaiveDateTime::parse_from_str("2024-12-15 09:30:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            file_name: "receipt.png".to_string(),
            ocr_engine: Some("synthetic".to_string()),
        }
    }

    #[test]
    fn test_serialized_record_is_flat() {
        let value = serde_json::to_value(sample()).unwrap();
        let object = value.as_object().unwrap();

        for key in [
            "document_type",
            "company_name",
            "invoice_number",
            "date",
            "amount",
            "tax",
            "raw_text",
            "processing_time",
            "timestamp",
            "file_name",
        ] {
            assert!(object.contains_key(key), "missing key {key}");
        }
        assert_eq!(object["document_type"], "Receipt");
        assert_eq!(object["invoice_number"], "");
    }

    #[test]
    fn test_record_without_engine_deserializes() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value.as_object_mut().unwrap().remove("ocr_engine");

        let result: ExtractionResult = serde_json::from_value(value).unwrap();
        assert_eq!(result.ocr_engine, None);
        assert_eq!(result.date_key(), "2024-12-15");
        assert_eq!(result.document_type(), DocumentType::Receipt);
    }
}

//! Pattern cascades for field extraction.
//!
//! A [`PatternTable`] maps each [`Field`] to an ordered list of rules. Rules
//! are compiled once, case-insensitive and multi-line, and the table is never
//! mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// A named field extracted from a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    InvoiceNumber,
    CompanyName,
    Date,
    Amount,
    Tax,
}

impl Field {
    /// All fields in table order.
    pub const ALL: [Field; 5] = [
        Field::InvoiceNumber,
        Field::CompanyName,
        Field::Date,
        Field::Amount,
        Field::Tax,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::InvoiceNumber => "invoice_number",
            Field::CompanyName => "company_name",
            Field::Date => "date",
            Field::Amount => "amount",
            Field::Tax => "tax",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == s.trim())
            .ok_or_else(|| ExtractionError::UnknownField(s.to_string()))
    }
}

/// One extraction rule: a pattern and the capture group holding the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub pattern: String,
    #[serde(default = "default_group")]
    pub group: usize,
}

fn default_group() -> usize {
    1
}

impl PatternRule {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            group: default_group(),
        }
    }

    pub fn with_group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }
}

/// Rule file entry: either a bare pattern or a full rule.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleSpec {
    Pattern(String),
    Rule(PatternRule),
}

impl From<RuleSpec> for PatternRule {
    fn from(spec: RuleSpec) -> Self {
        match spec {
            RuleSpec::Pattern(pattern) => PatternRule::new(pattern),
            RuleSpec::Rule(rule) => rule,
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: PatternRule,
    regex: Regex,
}

impl CompiledRule {
    fn compile(field: Field, rule: PatternRule) -> Result<Self, ExtractionError> {
        let regex = RegexBuilder::new(&rule.pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|e| ExtractionError::InvalidPattern {
                field: field.to_string(),
                reason: e.to_string(),
            })?;

        // captures_len counts the implicit whole-match group 0
        if rule.group >= regex.captures_len() {
            return Err(ExtractionError::InvalidPattern {
                field: field.to_string(),
                reason: format!(
                    "capture group {} does not exist in `{}`",
                    rule.group, rule.pattern
                ),
            });
        }

        Ok(Self { rule, regex })
    }
}

/// Immutable field → ordered rules mapping.
#[derive(Debug, Clone)]
pub struct PatternTable {
    rules: [Vec<CompiledRule>; 5],
}

impl PatternTable {
    /// Compile a table. Fields without an entry get no rules.
    pub fn new<I>(rules: I) -> Result<Self, ExtractionError>
    where
        I: IntoIterator<Item = (Field, Vec<PatternRule>)>,
    {
        let mut compiled: [Vec<CompiledRule>; 5] = Default::default();

        for (field, field_rules) in rules {
            let slot = &mut compiled[field.index()];
            for rule in field_rules {
                slot.push(CompiledRule::compile(field, rule)?);
            }
        }

        Ok(Self { rules: compiled })
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        DEFAULT_TABLE.clone()
    }

    /// Parse a JSON rule file body.
    ///
    /// The format is an object keyed by field name whose values are lists of
    /// either pattern strings or `{"pattern": ..., "group": ...}` objects.
    pub fn from_json(json: &str) -> Result<Self, ExtractionError> {
        let raw: BTreeMap<String, Vec<RuleSpec>> =
            serde_json::from_str(json).map_err(|e| ExtractionError::Parse(e.to_string()))?;

        let mut rules = Vec::with_capacity(raw.len());
        for (name, specs) in raw {
            let field: Field = name.parse()?;
            rules.push((field, specs.into_iter().map(PatternRule::from).collect()));
        }

        Self::new(rules)
    }

    /// Load a JSON rule file.
    pub fn from_file(path: &Path) -> Result<Self, ExtractionError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ExtractionError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Rules for a field, in priority order.
    pub fn rules(&self, field: Field) -> Vec<&PatternRule> {
        self.rules[field.index()].iter().map(|c| &c.rule).collect()
    }

    /// Run the cascade for one field.
    ///
    /// The first rule matching anywhere in `text` wins; its capture group,
    /// trimmed, is returned. `None` when no rule matches.
    pub fn first_match(&self, field: Field, text: &str) -> Option<String> {
        self.rules[field.index()].iter().find_map(|compiled| {
            compiled.regex.captures(text).map(|caps| {
                caps.get(compiled.rule.group)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default()
            })
        })
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// The built-in rules, most specific first and bare currency forms last.
pub fn default_rules() -> Vec<(Field, Vec<PatternRule>)> {
    let rules = |patterns: &[&str]| patterns.iter().map(|p| PatternRule::new(*p)).collect();

    vec![
        (
            Field::InvoiceNumber,
            rules(&[
                r"(?:invoice|inv)[\s#:]*([A-Z0-9-]+)",
                r"(?:no|number)[\s#:]*([A-Z0-9-]+)",
                r"#([A-Z0-9-]+)",
            ]),
        ),
        (
            Field::CompanyName,
            rules(&[
                r"^([A-Za-z\s&.,]+?)(?:\n|$)",
                r"(?:from|bill\s*to)[\s:]*([A-Za-z\s&.,]+)",
                r"^([A-Za-z\s&.,]+?)(?:\s+invoice|\s+receipt)",
            ]),
        ),
        (
            Field::Date,
            rules(&[
                r"(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
                r"(\d{1,2}\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+\d{2,4})",
                r"(\d{4}[/-]\d{1,2}[/-]\d{1,2})",
            ]),
        ),
        (
            Field::Amount,
            rules(&[
                r"(?:total|amount|sum)[\s:]*[\$₹€£]?([\d,]+\.?\d*)",
                r"[\$₹€£]([\d,]+\.?\d*)",
                r"([\d,]+\.?\d*)\s*(?:dollars?|rupees?|euros?|pounds?)",
            ]),
        ),
        (
            Field::Tax,
            rules(&[
                r"(?:tax|vat|gst)[\s:]*[\$₹€£]?([\d,]+\.?\d*)",
                r"(\d+\.?\d*%)\s*(?:tax|vat|gst)",
            ]),
        ),
    ]
}

lazy_static! {
    static ref DEFAULT_TABLE: PatternTable = PatternTable::new(default_rules()).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_table_has_rules_for_every_field() {
        let table = PatternTable::builtin();
        for field in Field::ALL {
            assert!(!table.rules(field).is_empty(), "{field} has no rules");
        }
        assert_eq!(table.rules(Field::Tax).len(), 2);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let table = PatternTable::builtin();

        // labelled total is preferred over the first bare currency amount
        let text = "Coffee $4.50\nTOTAL $13.00";
        assert_eq!(table.first_match(Field::Amount, text), Some("13.00".to_string()));

        // falls through to the bare currency rule
        assert_eq!(
            table.first_match(Field::Amount, "Budget: $15,000"),
            Some("15,000".to_string())
        );

        assert_eq!(table.first_match(Field::Tax, "nothing here"), None);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let table = PatternTable::builtin();
        assert_eq!(
            table.first_match(Field::Tax, "vat: 12.50"),
            Some("12.50".to_string())
        );
        assert_eq!(
            table.first_match(Field::Date, "Issued 3 MARCH 2024"),
            Some("3 MARCH 2024".to_string())
        );
    }

    #[test]
    fn test_from_json_mixed_entries() {
        let table = PatternTable::from_json(
            r#"{
                "invoice_number": ["ref[:\\s]*(\\w+)"],
                "amount": [{"pattern": "(due)\\s+(\\d+)", "group": 2}]
            }"#,
        )
        .unwrap();

        assert_eq!(
            table.first_match(Field::InvoiceNumber, "REF: A17"),
            Some("A17".to_string())
        );
        assert_eq!(table.first_match(Field::Amount, "Due 450"), Some("450".to_string()));
        assert!(table.rules(Field::CompanyName).is_empty());
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        let err = PatternTable::from_json(r#"{"date": ["(\\d+"]}"#).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidPattern { .. }));

        let err = PatternTable::from_json(r#"{"total": ["(\\d+)"]}"#).unwrap_err();
        assert!(matches!(err, ExtractionError::UnknownField(_)));

        let err = PatternTable::new(vec![(
            Field::Date,
            vec![PatternRule::new(r"(\d+)").with_group(2)],
        )])
        .unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidPattern { .. }));
    }
}

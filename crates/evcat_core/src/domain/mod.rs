use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field pairs exactly as decoded from one reply, in source order.
///
/// Keys may differ in case, spelling or language between records; duplicates are allowed
/// and resolved during normalization.
pub type RawRecord = Vec<(String, String)>;

/// A record after key normalization: known keys renamed to their canonical column header,
/// unknown keys kept verbatim (trimmed), values whitespace-collapsed.
pub type CanonicalRecord = BTreeMap<String, String>;

/// The five fixed columns of the evidence table, in persisted order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceColumn {
    EvidenceType,
    Excerpt,
    Content,
    Summary,
    Reference,
}

impl EvidenceColumn {
    pub const ALL: [EvidenceColumn; 5] = [
        EvidenceColumn::EvidenceType,
        EvidenceColumn::Excerpt,
        EvidenceColumn::Content,
        EvidenceColumn::Summary,
        EvidenceColumn::Reference,
    ];

    /// Header text used in persisted tables and in canonical record keys.
    pub fn header(self) -> &'static str {
        match self {
            EvidenceColumn::EvidenceType => "Tipo de Evidência",
            EvidenceColumn::Excerpt => "Trecho",
            EvidenceColumn::Content => "Conteúdo",
            EvidenceColumn::Summary => "Resumo",
            EvidenceColumn::Reference => "Referência",
        }
    }

    pub fn from_header(header: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.header() == header)
    }
}

/// Canonical headers in column order.
pub fn canonical_headers() -> [&'static str; 5] {
    EvidenceColumn::ALL.map(EvidenceColumn::header)
}

/// One persisted row. All five columns are always present; absent values are empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EvidenceRow {
    #[serde(rename = "Tipo de Evidência")]
    pub evidence_type: String,
    #[serde(rename = "Trecho")]
    pub excerpt: String,
    #[serde(rename = "Conteúdo")]
    pub content: String,
    #[serde(rename = "Resumo")]
    pub summary: String,
    #[serde(rename = "Referência")]
    pub reference: String,
}

impl EvidenceRow {
    /// Project a record onto the fixed schema. Keys outside the schema are discarded here,
    /// which is the only way a record reaches the table.
    pub fn project(record: &CanonicalRecord) -> Self {
        let pick = |col: EvidenceColumn| record.get(col.header()).cloned().unwrap_or_default();
        Self {
            evidence_type: pick(EvidenceColumn::EvidenceType),
            excerpt: pick(EvidenceColumn::Excerpt),
            content: pick(EvidenceColumn::Content),
            summary: pick(EvidenceColumn::Summary),
            reference: pick(EvidenceColumn::Reference),
        }
    }

    /// Build a row from cells in canonical column order.
    pub fn from_cells(cells: [String; 5]) -> Self {
        let [evidence_type, excerpt, content, summary, reference] = cells;
        Self {
            evidence_type,
            excerpt,
            content,
            summary,
            reference,
        }
    }

    pub fn get(&self, column: EvidenceColumn) -> &str {
        match column {
            EvidenceColumn::EvidenceType => &self.evidence_type,
            EvidenceColumn::Excerpt => &self.excerpt,
            EvidenceColumn::Content => &self.content,
            EvidenceColumn::Summary => &self.summary,
            EvidenceColumn::Reference => &self.reference,
        }
    }

    pub fn cells(&self) -> [&str; 5] {
        EvidenceColumn::ALL.map(|c| self.get(c))
    }

    pub fn is_blank(&self) -> bool {
        self.cells().iter().all(|c| c.trim().is_empty())
    }
}

/// Non-fatal anomaly noticed while extracting or storing evidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionWarning {
    pub code: String,
    pub message: String,
    pub chunk_ordinal: Option<usize>,
    pub details: Option<String>,
}

impl ExtractionWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            chunk_ordinal: None,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn for_chunk(mut self, ordinal: usize) -> Self {
        self.chunk_ordinal = Some(ordinal);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_defaults_missing_columns_and_drops_unknown_keys() {
        let mut rec = CanonicalRecord::new();
        rec.insert("Trecho".to_string(), "fls. 12".to_string());
        rec.insert("Observação".to_string(), "ignored".to_string());

        let row = EvidenceRow::project(&rec);
        assert_eq!(row.excerpt, "fls. 12");
        assert_eq!(row.evidence_type, "");
        assert_eq!(row.cells(), ["", "fls. 12", "", "", ""]);
    }

    #[test]
    fn header_lookup_roundtrips_for_every_column() {
        for col in EvidenceColumn::ALL {
            assert_eq!(EvidenceColumn::from_header(col.header()), Some(col));
        }
        assert_eq!(EvidenceColumn::from_header("Notes"), None);
    }
}

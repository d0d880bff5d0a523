use crate::domain::{CanonicalRecord, EvidenceColumn, RawRecord};

/// Every known spelling of a column label, lower-cased. Lookups are exact after
/// `trim().to_lowercase()`; anything not listed passes through unchanged.
const KEY_SYNONYMS: &[(&str, EvidenceColumn)] = &[
    ("tipo", EvidenceColumn::EvidenceType),
    ("tipo de evidência", EvidenceColumn::EvidenceType),
    ("tipo de evidencia", EvidenceColumn::EvidenceType),
    ("tipo_de_evidencia", EvidenceColumn::EvidenceType),
    ("tipo_evidencia", EvidenceColumn::EvidenceType),
    ("evidence type", EvidenceColumn::EvidenceType),
    ("evidence_type", EvidenceColumn::EvidenceType),
    ("type", EvidenceColumn::EvidenceType),
    ("trecho", EvidenceColumn::Excerpt),
    ("trecho/página", EvidenceColumn::Excerpt),
    ("trecho / página", EvidenceColumn::Excerpt),
    ("trecho/pagina", EvidenceColumn::Excerpt),
    ("excerpt", EvidenceColumn::Excerpt),
    ("conteúdo", EvidenceColumn::Content),
    ("conteudo", EvidenceColumn::Content),
    ("content", EvidenceColumn::Content),
    ("resumo", EvidenceColumn::Summary),
    ("summary", EvidenceColumn::Summary),
    ("referência", EvidenceColumn::Reference),
    ("referencia", EvidenceColumn::Reference),
    ("página", EvidenceColumn::Reference),
    ("pagina", EvidenceColumn::Reference),
    ("reference", EvidenceColumn::Reference),
    ("page", EvidenceColumn::Reference),
];

/// Map a field label to its canonical column header, or return it trimmed if unknown.
pub fn canonical_key(key: &str) -> String {
    let trimmed = key.trim();
    let lowered = trimmed.to_lowercase();
    KEY_SYNONYMS
        .iter()
        .find(|(variant, _)| *variant == lowered)
        .map(|(_, col)| col.header().to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Turn line breaks and tabs into spaces, collapse whitespace runs to one space, trim.
///
/// A lone whitespace char (e.g. a non-breaking space inside "R$\u{a0}10") is kept as is.
pub fn clean_value(value: &str) -> String {
    let chars: Vec<char> = value
        .chars()
        .map(|c| if matches!(c, '\r' | '\n' | '\t') { ' ' } else { c })
        .collect();

    let mut out = String::with_capacity(value.len());
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_whitespace() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        out.push(if i - start == 1 { chars[start] } else { ' ' });
    }
    out.trim().to_string()
}

pub fn normalize_record(raw: &RawRecord) -> CanonicalRecord {
    let mut out = CanonicalRecord::new();
    for (key, value) in raw {
        let key = canonical_key(key);
        let value = clean_value(value);
        // Two labels can collapse onto one column ("Página" and "Referência"); the later
        // non-empty value wins.
        match out.get(&key) {
            Some(existing) if !existing.is_empty() && value.is_empty() => {}
            _ => {
                out.insert(key, value);
            }
        }
    }
    out
}

pub fn normalize(records: &[RawRecord]) -> Vec<CanonicalRecord> {
    records.iter().map(normalize_record).collect()
}

pub mod markdown_table;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{CanonicalRecord, ExtractionWarning, RawRecord};
use crate::normalize::normalize;

pub use markdown_table::parse_markdown_table;

/// Which parser produced the records. Informational only; records look the same either way.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplyFormat {
    JsonArray,
    MarkdownTable,
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub format: ReplyFormat,
    pub records: Vec<CanonicalRecord>,
    pub warnings: Vec<ExtractionWarning>,
}

/// Decode a reply into normalized records: JSON array first, Markdown table second.
pub fn extract(reply: &str) -> Vec<CanonicalRecord> {
    extract_reply(reply).records
}

pub fn extract_reply(reply: &str) -> Extraction {
    let text = reply.trim();
    let mut warnings = Vec::new();

    if let Some(raw) = decode_json_array(text, &mut warnings) {
        tracing::debug!(records = raw.len(), "reply decoded as JSON array");
        return Extraction {
            format: ReplyFormat::JsonArray,
            records: normalize(&raw),
            warnings,
        };
    }

    let raw = parse_markdown_table(text);
    if raw.is_empty() {
        return Extraction {
            format: ReplyFormat::Unrecognized,
            records: Vec::new(),
            warnings,
        };
    }
    tracing::debug!(records = raw.len(), "reply decoded as Markdown table");
    Extraction {
        format: ReplyFormat::MarkdownTable,
        records: normalize(&raw),
        warnings,
    }
}

/// `None` when the text is not JSON or not an array; both fall through to the table parser.
fn decode_json_array(text: &str, warnings: &mut Vec<ExtractionWarning>) -> Option<Vec<RawRecord>> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) else {
        return None;
    };

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            // Map iterates in source order, which decides key collisions downstream.
            Value::Object(map) => {
                out.push(
                    map.into_iter()
                        .map(|(k, v)| (k, json_value_text(v)))
                        .collect(),
                );
            }
            other => warnings.push(
                ExtractionWarning::new(
                    "EXTRACT_JSON_ITEM_SKIPPED",
                    "Skipped non-object entry in JSON reply",
                )
                .with_details(format!("index={idx}; kind={}", json_kind(&other))),
            ),
        }
    }
    Some(out)
}

fn json_value_text(v: Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

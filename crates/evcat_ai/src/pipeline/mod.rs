use std::path::PathBuf;

use evcat_core::config::PipelineConfig;
use evcat_core::domain::ExtractionWarning;
use evcat_core::error::AppError;
use evcat_core::extract::{extract_reply, ReplyFormat};
use evcat_core::filter::retain_evidence;
use evcat_core::ingest::{load_document, segment, Chunk};
use evcat_core::store::{AppendOutcome, EvidenceStore};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::audit::AuditLog;
use crate::llm::Llm;
use crate::prompts::{build_prompt, resolve_preamble};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Loaded,
    Initialized,
    Processing { ordinal: usize, total: usize },
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChunkStatus {
    /// At least one record survived filtering and reached the store.
    Stored {
        format: ReplyFormat,
        extracted: usize,
        written: usize,
        duplicates: usize,
    },
    /// The reply parsed to nothing, or every record was empty after filtering.
    NoEvidence { format: ReplyFormat, extracted: usize },
    GenerationFailed { error: AppError },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkOutcome {
    pub ordinal: usize,
    pub char_count: usize,
    pub text_sha256: String,
    pub status: ChunkStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub input_path: PathBuf,
    pub table_path: PathBuf,
    pub started_at: String,
    pub finished_at: String,
    pub total_chunks: usize,
    pub rows_written: usize,
    pub duplicate_rows: usize,
    pub failed_chunks: usize,
    pub empty_chunks: usize,
    pub outcomes: Vec<ChunkOutcome>,
    pub warnings: Vec<ExtractionWarning>,
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Drives one document through segment → generate → extract → filter → store.
///
/// Only a missing input or a store failure ends a run early. A chunk whose generation
/// fails, or whose reply holds no evidence, is recorded and skipped.
pub struct Orchestrator<'a> {
    config: &'a PipelineConfig,
    llm: &'a dyn Llm,
    audit: Option<AuditLog>,
    state: RunState,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a PipelineConfig, llm: &'a dyn Llm) -> Self {
        Self {
            config,
            llm,
            audit: config.audit_dir.clone().map(AuditLog::new),
            state: RunState::Pending,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn run(&mut self) -> Result<RunSummary, AppError> {
        let started_at = now_rfc3339();
        self.config.validate()?;

        let doc = load_document(&self.config.input_path)?;
        self.state = RunState::Loaded;

        let store = EvidenceStore::open(&self.config.table_path)?;
        store.initialize()?;
        self.state = RunState::Initialized;

        let chunks = segment(&doc.cleaned, self.config.chunk_budget);
        let total = chunks.clone().count();
        tracing::info!(
            input = %self.config.input_path.display(),
            table = %self.config.table_path.display(),
            total_chunks = total,
            budget = self.config.chunk_budget,
            "pipeline run started"
        );

        let mut outcomes = Vec::with_capacity(total);
        let mut warnings = Vec::new();
        for chunk in chunks {
            self.state = RunState::Processing {
                ordinal: chunk.ordinal,
                total,
            };
            let outcome = self.process_chunk(&store, &chunk, total, &mut warnings)?;
            outcomes.push(outcome);
        }
        self.state = RunState::Completed;

        let mut summary = RunSummary {
            input_path: self.config.input_path.clone(),
            table_path: self.config.table_path.clone(),
            started_at,
            finished_at: now_rfc3339(),
            total_chunks: total,
            rows_written: 0,
            duplicate_rows: 0,
            failed_chunks: 0,
            empty_chunks: 0,
            outcomes: Vec::new(),
            warnings,
        };
        for o in &outcomes {
            match &o.status {
                ChunkStatus::Stored {
                    written, duplicates, ..
                } => {
                    summary.rows_written += written;
                    summary.duplicate_rows += duplicates;
                }
                ChunkStatus::NoEvidence { .. } => summary.empty_chunks += 1,
                ChunkStatus::GenerationFailed { .. } => summary.failed_chunks += 1,
            }
        }
        summary.outcomes = outcomes;

        tracing::info!(
            total_chunks = summary.total_chunks,
            rows_written = summary.rows_written,
            failed_chunks = summary.failed_chunks,
            empty_chunks = summary.empty_chunks,
            "pipeline run completed"
        );
        Ok(summary)
    }

    /// Process one chunk. Errors returned here are store failures and abort the run.
    pub fn process_chunk(
        &self,
        store: &EvidenceStore,
        chunk: &Chunk,
        total: usize,
        warnings: &mut Vec<ExtractionWarning>,
    ) -> Result<ChunkOutcome, AppError> {
        let outcome = |status| ChunkOutcome {
            ordinal: chunk.ordinal,
            char_count: chunk.char_count,
            text_sha256: chunk.text_sha256.clone(),
            status,
        };

        let prompt = build_prompt(resolve_preamble(self.config), &chunk.text);
        if let Some(audit) = &self.audit {
            if let Err(e) = audit.record_prompt(chunk.ordinal, &prompt) {
                tracing::warn!(chunk = chunk.ordinal, error = %e, "audit write failed");
            }
        }

        tracing::info!(
            chunk = chunk.ordinal,
            total,
            chars = chunk.char_count,
            sha256 = %chunk.text_sha256,
            "dispatching chunk"
        );

        let reply = match self.llm.generate(self.config.generator.model(), &prompt) {
            Ok(r) if !r.trim().is_empty() => r,
            Ok(_) => {
                let error = AppError::new("LLM_RESPONSE_EMPTY", "Generation returned no text")
                    .with_details(format!("chunk={}", chunk.ordinal));
                tracing::warn!(chunk = chunk.ordinal, error = %error, "generation failed");
                return Ok(outcome(ChunkStatus::GenerationFailed { error }));
            }
            Err(error) => {
                tracing::warn!(chunk = chunk.ordinal, error = %error, "generation failed");
                return Ok(outcome(ChunkStatus::GenerationFailed { error }));
            }
        };

        if let Some(audit) = &self.audit {
            if let Err(e) = audit.record_reply(chunk.ordinal, &reply) {
                tracing::warn!(chunk = chunk.ordinal, error = %e, "audit write failed");
            }
        }

        let extraction = extract_reply(&reply);
        warnings.extend(
            extraction
                .warnings
                .into_iter()
                .map(|w| w.for_chunk(chunk.ordinal)),
        );
        let format = extraction.format;
        let extracted = extraction.records.len();

        let mut written = 0;
        let mut duplicates = 0;
        for record in extraction.records.iter().filter_map(retain_evidence) {
            match store.append(&record)? {
                AppendOutcome::Inserted => written += 1,
                AppendOutcome::Duplicate => duplicates += 1,
                AppendOutcome::Blank => {}
            }
        }

        if written + duplicates == 0 {
            tracing::warn!(
                chunk = chunk.ordinal,
                format = ?format,
                extracted,
                reply_chars = reply.chars().count(),
                "no evidence extracted from reply"
            );
            return Ok(outcome(ChunkStatus::NoEvidence { format, extracted }));
        }

        tracing::info!(chunk = chunk.ordinal, written, duplicates, "chunk stored");
        Ok(outcome(ChunkStatus::Stored {
            format,
            extracted,
            written,
            duplicates,
        }))
    }
}

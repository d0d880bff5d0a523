use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use evcat_ai::llm::{build_llm, GeminiLlm};
use evcat_ai::ollama::OllamaClient;
use evcat_ai::pipeline::{ChunkStatus, Orchestrator, RunSummary};
use evcat_core::config::{GeneratorConfig, PipelineConfig};
use evcat_core::error::AppError;
use evcat_core::store::EvidenceStore;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "evcat=info,evcat_core=info,evcat_ai=info";

#[derive(Debug, Parser)]
#[command(
    name = "evcat",
    version,
    about = "Extract a deduplicated evidence table from an OCR case-file transcript"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Process the input transcript once and append evidence to the table
    Run {
        /// JSON config file (defaults apply when omitted)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Input UTF-8 transcript
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
        /// Evidence table (.csv, .sqlite, .sqlite3 or .db)
        #[arg(long, value_name = "FILE")]
        table: Option<PathBuf>,
        /// Characters per chunk
        #[arg(long)]
        budget: Option<usize>,
        /// Print the run summary as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print table counts, type distribution and rows
    Show {
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        table: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the consolidated summary view next to the table
    Summary {
        #[arg(long)]
        text: String,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        table: Option<PathBuf>,
    },
    /// Check that the configured generator is reachable
    Health {
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, AppError> {
    match path {
        Some(p) => PipelineConfig::load(p),
        None => Ok(PipelineConfig::default()),
    }
}

fn table_path(config: Option<&Path>, table: Option<PathBuf>) -> Result<PathBuf, AppError> {
    match table {
        Some(t) => Ok(t),
        None => Ok(load_config(config)?.table_path),
    }
}

fn encode_json(value: &impl serde::Serialize) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| {
        AppError::new("OUTPUT_ENCODE_FAILED", "Failed to encode output as JSON")
            .with_details(e.to_string())
    })
}

fn run(
    config: Option<PathBuf>,
    input: Option<PathBuf>,
    table: Option<PathBuf>,
    budget: Option<usize>,
    json: bool,
) -> Result<(), AppError> {
    let mut cfg = load_config(config.as_deref())?;
    if let Some(input) = input {
        cfg.input_path = input;
    }
    if let Some(table) = table {
        cfg.table_path = table;
    }
    if let Some(budget) = budget {
        cfg.chunk_budget = budget;
    }
    cfg.validate()?;

    let llm = build_llm(&cfg.generator)?;
    tracing::info!(
        provider = cfg.generator.provider(),
        model = cfg.generator.model(),
        "generator ready"
    );
    let summary = Orchestrator::new(&cfg, llm.as_ref()).run()?;

    if json {
        println!("{}", encode_json(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(s: &RunSummary) {
    println!("input:         {}", s.input_path.display());
    println!("table:         {}", s.table_path.display());
    println!("chunks:        {}", s.total_chunks);
    println!("rows written:  {}", s.rows_written);
    println!("duplicates:    {}", s.duplicate_rows);
    println!("failed chunks: {}", s.failed_chunks);
    println!("empty chunks:  {}", s.empty_chunks);
    for o in &s.outcomes {
        if let ChunkStatus::GenerationFailed { error } = &o.status {
            println!("  chunk {:03}: {}", o.ordinal, error);
        }
    }
    if !s.warnings.is_empty() {
        println!("warnings:      {}", s.warnings.len());
    }
}

fn show(config: Option<PathBuf>, table: Option<PathBuf>, json: bool) -> Result<(), AppError> {
    let path = table_path(config.as_deref(), table)?;
    let table = EvidenceStore::open(&path)?.read_table()?;

    if json {
        println!("{}", encode_json(&table)?);
        return Ok(());
    }

    println!("table:   {}", path.display());
    println!("rows:    {}", table.row_count());
    println!("columns: {}", table.column_count());
    for (kind, count) in table.type_distribution() {
        let label = if kind.is_empty() { "(sem tipo)" } else { kind.as_str() };
        println!("  {count:>5}  {label}");
    }
    println!();
    println!("{}", table.columns().join(" | "));
    for row in table.rows() {
        println!("{}", row.cells().join(" | "));
    }
    Ok(())
}

fn summary(text: String, config: Option<PathBuf>, table: Option<PathBuf>) -> Result<(), AppError> {
    let path = table_path(config.as_deref(), table)?;
    EvidenceStore::open(&path)?.finalize_summary(&text)?;
    println!("summary written for {}", path.display());
    Ok(())
}

fn health(config: Option<PathBuf>) -> Result<(), AppError> {
    let cfg = load_config(config.as_deref())?;
    match &cfg.generator {
        GeneratorConfig::Ollama { base_url, .. } => {
            let client = OllamaClient::new(base_url)?;
            client.health_check()?;
            println!("ollama ok: {}", client.base_url());
        }
        GeneratorConfig::Gemini {
            base_url,
            api_key_env,
            ..
        } => {
            // No cheap health endpoint; confirm the client can be built.
            GeminiLlm::from_env(base_url, api_key_env)?;
            println!("gemini configured: {base_url} (key from {api_key_env})");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run {
            config,
            input,
            table,
            budget,
            json,
        } => run(config, input, table, budget, json),
        Command::Show {
            config,
            table,
            json,
        } => show(config, table, json),
        Command::Summary {
            text,
            config,
            table,
        } => summary(text, config, table),
        Command::Health { config } => health(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = %e.code, details = ?e.details, "command failed");
            eprintln!("[{}] {}", e.code, e.message);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_override_config() {
        let cli = Cli::try_parse_from([
            "evcat", "run", "--input", "proc.txt", "--table", "ev.db", "--budget", "500", "--json",
        ])
        .unwrap();
        match cli.command {
            Command::Run {
                config,
                input,
                table,
                budget,
                json,
            } => {
                assert_eq!(config, None);
                assert_eq!(input, Some(PathBuf::from("proc.txt")));
                assert_eq!(table, Some(PathBuf::from("ev.db")));
                assert_eq!(budget, Some(500));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn summary_requires_text() {
        assert!(Cli::try_parse_from(["evcat", "summary"]).is_err());
    }
}

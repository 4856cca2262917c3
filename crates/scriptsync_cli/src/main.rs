//! Command-line tools for scriptsync history databases.

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use scriptsync_core::history::{ChangeStore, HistoryRecord, MemoryChangeStore, RedbChangeStore};
use scriptsync_core::{patch, Config, ScriptSession, SessionOptions};
use std::io::{self, Read, Write};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scriptsync", about = "Screenplay history tools", version)]
struct Cli {
    /// History database path (can also be set via SCRIPTSYNC_DB_PATH)
    #[arg(long, env = "SCRIPTSYNC_DB_PATH")]
    db: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// List the newest history records
    History {
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Include draft records
        #[arg(long)]
        drafts: bool,
    },
    /// Rebuild a script by replaying every stored record onto the script
    /// the history started from
    Replay {
        /// Base script, or `-` for stdin
        base: String,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print the encoded patch that turns OLD into NEW
    Diff { old: String, new: String },
    /// Apply an encoded patch to a script
    Apply {
        xml: String,
        /// Patch file, or `-` for stdin
        patch: String,
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path))
}

fn write_output(output: Option<&str>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("Failed to write '{}'", path))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}

fn visible_records(records: Vec<HistoryRecord>, drafts: bool) -> Vec<HistoryRecord> {
    records
        .into_iter()
        .filter(|record| drafts || !record.is_draft)
        .collect()
}

fn format_history(records: &[HistoryRecord], json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(records)?);
    }
    let rows: Vec<String> = records
        .iter()
        .map(|record| {
            format!(
                "{:<36} {} {:<16}{}",
                record.uuid,
                record.created_at.format("%Y-%m-%d %H:%M:%S"),
                record.author,
                if record.is_draft { " (draft)" } else { "" }
            )
        })
        .collect();
    Ok(rows.join("\n"))
}

/// Replay every record of `store`, in append order, onto `base`.
fn replay_history(store: &dyn ChangeStore, base: &str) -> anyhow::Result<String> {
    let records = store.all()?;
    let patches: Vec<String> = records
        .into_iter()
        .map(|record| record.redo_patch)
        .collect();
    let mut session = ScriptSession::new(
        Arc::new(MemoryChangeStore::new()),
        SessionOptions::default(),
    )?;
    session.load(base).context("Base script is not valid")?;
    session.apply_patches_with_progress(&patches, |done, total| {
        tracing::debug!(done, total, "replayed record");
    })?;
    session.update_snapshot()?;
    Ok(session.snapshot().xml.clone())
}

fn open_store(db: Option<String>) -> anyhow::Result<RedbChangeStore> {
    let path = db.unwrap_or_else(|| Config::from_env().db_path);
    RedbChangeStore::new(&path).with_context(|| format!("Failed to open history at '{}'", path))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scriptsync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let Cli { db, json, command } = Cli::parse();

    match command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
        Commands::History { limit, drafts } => {
            let store = open_store(db)?;
            let records = visible_records(store.last(limit)?, drafts);
            let output = format_history(&records, json)?;
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Commands::Replay { base, output } => {
            let store = open_store(db)?;
            let base = read_input(&base)?;
            let xml = replay_history(&store, &base)?;
            tracing::info!(records = store.len()?, "replay finished");
            write_output(output.as_deref(), &xml)?;
        }
        Commands::Diff { old, new } => {
            let old = read_input(&old)?;
            let new = read_input(&new)?;
            let encoded = patch::encoded_diff(&old, &new)?;
            if json {
                let body = serde_json::json!({
                    "patch": encoded,
                    "hunks": patch::Patch::diff(&old, &new).hunks().len(),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("{}", encoded);
            }
        }
        Commands::Apply { xml, patch, output } => {
            let script = read_input(&xml)?;
            let encoded = read_input(&patch)?;
            let applied = patch::apply_encoded(encoded.trim(), &script)
                .context("Patch does not apply to this script")?;
            write_output(output.as_deref(), &applied)?;
        }
    }

    Ok(())
}

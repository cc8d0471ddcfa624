mod display;
mod serve;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::{FixedOffset, Local, Offset};
use clap::{Parser, Subcommand};
use leadmachine_core::{Conversation, resolve_with_rule};
use leadmachine_ingest::{CorrectionMode, Reconciler, pull};
use leadmachine_store::{DuckStore, StoreError};
use leadmachine_sync::VoiceAiClient;
use tracing::info;

/// Call-lead name resolution and reconciliation.
#[derive(Parser)]
#[command(name = "leadmachine", version, about = "Call-lead name resolution and reconciliation")]
struct Cli {
    /// Path to the DuckDB lead database
    #[arg(
        long,
        global = true,
        env = "LEADMACHINE_DB",
        default_value = "leadmachine.duckdb"
    )]
    db: PathBuf,

    /// UTC offset used for placeholder call times, e.g. -05:00 (default: local offset)
    #[arg(
        long,
        global = true,
        env = "LEADMACHINE_UTC_OFFSET",
        allow_hyphen_values = true,
        value_parser = parse_offset
    )]
    utc_offset: Option<FixedOffset>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the name resolver over a call summary
    Resolve {
        /// Call summary text
        text: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ingest a JSON array of conversations
    Ingest {
        /// Path to the conversations JSON file
        file: PathBuf,
    },

    /// Pull conversations from the voice-AI provider and ingest them
    Pull {
        /// Only conversations started at or after this Unix timestamp
        #[arg(long)]
        since: Option<i64>,
        /// Provider API base URL
        #[arg(long, env = "VOICE_AI_BASE_URL")]
        base_url: String,
        /// Provider API key
        #[arg(long, env = "VOICE_AI_API_KEY", hide_env_values = true)]
        api_key: String,
        /// Agent whose conversations are pulled
        #[arg(long, env = "VOICE_AI_AGENT_ID")]
        agent_id: String,
    },

    /// Replace placeholder names on call leads where the summary names the caller
    FixNames {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the most recent leads
    Leads {
        /// Maximum rows to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Show one lead as a card
    Lead {
        /// Lead id
        id: i64,
    },

    /// Serve the webhook and admin HTTP endpoints
    Serve {
        /// Port to listen on
        #[arg(long, env = "LEADMACHINE_PORT", default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let offset = cli
        .utc_offset
        .unwrap_or_else(|| Local::now().offset().fix());

    match cli.command {
        Commands::Resolve { text, json } => {
            let resolution = resolve_with_rule(text.as_str());
            if json {
                println!("{}", serde_json::to_string_pretty(&resolution)?);
            } else {
                display::print_resolution(&resolution);
            }
        }
        Commands::Ingest { file } => {
            let store = open_store(&cli.db)?;
            cmd_ingest(&store, offset, &file)?;
        }
        Commands::Pull {
            since,
            base_url,
            api_key,
            agent_id,
        } => {
            let store = open_store(&cli.db)?;
            let client = VoiceAiClient::new(base_url, api_key, agent_id);
            let reconciler = Reconciler::new(&store, offset);
            let stats = pull(&client, &reconciler, since)
                .await
                .context("listing conversations from the provider")?;
            println!(
                "Pulled {} conversations: {} created, {} existing, {} failed ({:.1}s)",
                stats.listed, stats.created, stats.existing, stats.failed, stats.elapsed_secs
            );
        }
        Commands::FixNames { dry_run, json } => {
            let store = open_store(&cli.db)?;
            let mode = if dry_run {
                CorrectionMode::DryRun
            } else {
                CorrectionMode::Apply
            };
            let report = Reconciler::new(&store, offset)
                .correct_names(mode)
                .context("selecting placeholder leads")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                display::print_report(&report);
            }
        }
        Commands::Leads { limit } => {
            let store = open_store(&cli.db)?;
            let batches = store.leads_arrow(limit)?;
            let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
            if rows == 0 {
                println!("No leads.");
            } else {
                arrow::util::pretty::print_batches(&batches)?;
                println!("({rows} of {} leads)", store.lead_count()?);
            }
        }
        Commands::Lead { id } => {
            let store = open_store(&cli.db)?;
            let batch = match store.lead_arrow(id) {
                Ok(b) => b,
                Err(StoreError::NoResults) => bail!("lead {id} not found"),
                Err(e) => return Err(e.into()),
            };
            display::print_lead_card(&batch)?;
        }
        Commands::Serve { port } => {
            let store = open_store(&cli.db)?;
            serve::start_server(store, offset, port).await?;
        }
    }

    Ok(())
}

fn open_store(path: &Path) -> anyhow::Result<DuckStore> {
    DuckStore::open_persistent(path).with_context(|| format!("opening {}", path.display()))
}

fn cmd_ingest(store: &DuckStore, offset: FixedOffset, file: &Path) -> anyhow::Result<()> {
    let raw =
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let conversations: Vec<Conversation> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;

    let reconciler = Reconciler::new(store, offset);
    let mut created = 0usize;
    for conv in &conversations {
        let outcome = reconciler
            .ingest(conv)
            .with_context(|| format!("ingesting conversation {}", conv.conversation_id))?;
        if outcome.is_created() {
            created += 1;
        }
    }
    info!(file = %file.display(), created, "ingest complete");
    println!(
        "Ingested {} conversations: {created} created, {} existing",
        conversations.len(),
        conversations.len() - created
    );
    Ok(())
}

/// Parse `+HH:MM` / `-HH:MM` (or `Z`) into a fixed offset.
fn parse_offset(s: &str) -> Result<FixedOffset, String> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Ok(Offset::fix(&chrono::Utc));
    }
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(format!("expected +HH:MM or -HH:MM, got {s:?}")),
    };
    let (h, m) = rest
        .split_once(':')
        .ok_or_else(|| format!("expected +HH:MM or -HH:MM, got {s:?}"))?;
    let hours: i32 = h.parse().map_err(|_| format!("bad hours in {s:?}"))?;
    let minutes: i32 = m.parse().map_err(|_| format!("bad minutes in {s:?}"))?;
    if !(0..60).contains(&minutes) {
        return Err(format!("bad minutes in {s:?}"));
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("offset out of range: {s:?}"))
}

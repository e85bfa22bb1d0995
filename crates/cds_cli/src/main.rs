//! CDS emulation CLI
//!
//! Replays a recorded contest update dump (JSON lines) as a live contest,
//! writing the paced updates to stdout as JSON lines.

#![warn(missing_docs)]
#![warn(clippy::all)]

use cds_core::ContestUpdate;
use cds_emulation::{Emulation, EmulationConfig};
use chrono::{DateTime, Utc};
use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "cds_core=info,cds_emulation=info,cds_cli=info";

#[derive(Parser)]
#[command(name = "cds-emulate")]
#[command(about = "Replay a finished contest as if it were live", long_about = None)]
struct Cli {
    /// Path to the JSON-lines update dump
    #[arg(short, long)]
    input: PathBuf,
    /// JSON emulation config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Speed multiplier (overrides config)
    #[arg(short, long)]
    speed: Option<f64>,
    /// Emulated contest start, RFC 3339 (overrides config; default now)
    #[arg(long)]
    start: Option<DateTime<Utc>>,
    /// Seed for judging progress synthesis (overrides config)
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli).await?;
    let updates = read_updates(&cli.input).await?;
    info!(updates = updates.len(), input = %cli.input.display(), "loaded contest updates");

    let emulation = Emulation::new(config)?;
    let cancel = emulation.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, stopping emulation");
            cancel.cancel();
        }
    });

    let replay = emulation.run(futures::stream::iter(updates));
    let mut replay = std::pin::pin!(replay);
    let stdout = std::io::stdout();
    while let Some(update) = replay.next().await {
        let line = update?.to_json()?;
        let mut out = stdout.lock();
        writeln!(out, "{line}")?;
        out.flush()?;
    }

    Ok(())
}

async fn load_config(cli: &Cli) -> Result<EmulationConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .wrap_err_with(|| format!("reading config {}", path.display()))?;
            EmulationConfig::from_json(&text)?
        }
        None => EmulationConfig::new(Utc::now(), 1.0),
    };

    if let Some(speed) = cli.speed {
        config.emulation_speed = speed;
    }
    if let Some(start) = cli.start {
        config.start_time = start;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    Ok(config)
}

async fn read_updates(path: &Path) -> Result<Vec<ContestUpdate>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("reading updates {}", path.display()))?;
    parse_updates(&text)
}

fn parse_updates(text: &str) -> Result<Vec<ContestUpdate>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            ContestUpdate::from_json(line).wrap_err_with(|| format!("line {}", index + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_updates_skips_blank_lines() {
        let text = concat!(
            r#"{"type":"info","data":{"name":"T","status":"RUNNING","contest_length":1000}}"#,
            "\n\n",
            r#"{"type":"analytics","data":{"id":"m1","relative_time":10,"message":"hi"}}"#,
            "\n",
        );
        let updates = parse_updates(text).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].kind(), "analytics");
    }

    #[test]
    fn test_parse_updates_reports_line() {
        let err = parse_updates("{}\n").unwrap_err();
        assert!(format!("{err:?}").contains("line 1"));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "cds-emulate",
            "--input",
            "dump.jsonl",
            "--speed",
            "20",
            "--start",
            "2024-04-18T09:00:00Z",
            "--seed",
            "3",
        ]);
        let config = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(load_config(&cli))
            .unwrap();
        assert_eq!(config.emulation_speed, 20.0);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.start_time.to_rfc3339(), "2024-04-18T09:00:00+00:00");
    }
}

// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wellgraph::{
    CompletionMarker, ImportSummary, LoaderConfig, MarkerState, MemoryGraph, Neo4jStore,
    RunCoordinator, RunOutcome,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "wellgraph-import")]
#[command(about = "Load registry licence, field and well-bore CSV exports into Neo4j")]
struct Cli {
    /// TOML file layered under environment variables.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    csv_dir: Option<PathBuf>,
    #[arg(long)]
    marker: Option<PathBuf>,
    /// Remove the completion marker and import again.
    #[arg(long, default_value_t = false)]
    force: bool,
    /// Resolve into an in-memory graph; touches neither Neo4j nor the marker.
    #[arg(long, default_value_t = false, conflicts_with = "force")]
    dry_run: bool,
    /// Print the completion marker state and exit.
    #[arg(long, default_value_t = false, conflicts_with_all = ["force", "dry_run"])]
    status: bool,
}

fn load_config(cli: &Cli) -> Result<LoaderConfig> {
    let mut config = match &cli.config {
        Some(path) => LoaderConfig::from_file(path)?,
        None => LoaderConfig::default(),
    };
    config.apply_env()?;
    if let Some(dir) = &cli.csv_dir {
        config.source.csv_dir = dir.clone();
    }
    if let Some(path) = &cli.marker {
        config.marker.path = path.clone();
    }
    config.validate()?;
    Ok(config)
}

fn log_summary(summary: &ImportSummary) {
    for file in &summary.files {
        info!(
            file = %file.source,
            rows = file.rows_read,
            imported = file.rows_imported,
            malformed = file.malformed_rows,
            missing_key = file.missing_key_rows,
            failed = file.failed_rows,
            "Source summary"
        );
    }
    if let Some(counts) = &summary.counts {
        for (label, n) in &counts.nodes {
            info!("{label}: {n} nodes");
        }
        for (relation, n) in &counts.edges {
            info!("{relation}: {n} edges");
        }
    }
}

fn print_status(marker: &CompletionMarker) -> Result<()> {
    match marker.state() {
        MarkerState::Pending => println!("pending: no marker at {}", marker.path().display()),
        MarkerState::Complete(None) => {
            println!("complete: {} (no recorded summary)", marker.path().display())
        }
        MarkerState::Complete(Some(record)) => {
            println!("complete: {}", marker.path().display());
            println!("{}", serde_json::to_string_pretty(record)?);
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = load_config(&cli).context("Invalid loader configuration")?;
    let mut marker = CompletionMarker::load(&config.marker.path)?;

    if cli.status {
        return print_status(&marker);
    }

    if cli.dry_run {
        info!(
            "Dry run: resolving {} into memory",
            config.source.csv_dir.display()
        );
        let mut coordinator = RunCoordinator::new(MemoryGraph::new(), &config);
        let summary = coordinator.import_dir(&config.source.csv_dir).await?;
        log_summary(&summary);
        return Ok(());
    }

    if cli.force {
        marker.reset()?;
    } else if marker.is_complete() {
        info!(
            "Import already complete according to {}; nothing to do",
            marker.path().display()
        );
        return Ok(());
    }

    info!("Connecting to Neo4j at {}", config.store.uri);
    let store = Neo4jStore::connect(&config.store)
        .await
        .context("Neo4j is not reachable")?;

    let mut coordinator = RunCoordinator::new(store, &config);
    match coordinator.run(&config.source.csv_dir, &mut marker).await? {
        RunOutcome::AlreadyComplete(_) => {
            info!("Import already complete; nothing to do");
        }
        RunOutcome::Completed(summary) => {
            log_summary(&summary);
            info!(
                rows = summary.rows_imported(),
                skipped = summary.skipped_rows(),
                "Import complete"
            );
        }
        RunOutcome::Incomplete(summary) => {
            log_summary(&summary);
            error!(
                failed = summary.failed_rows(),
                "Import incomplete; re-run to finish the remaining rows"
            );
            warn!("Completion marker {} not written", marker.path().display());
            std::process::exit(2);
        }
    }
    Ok(())
}

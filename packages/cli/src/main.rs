#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line interface for the quake map toolchain.
//!
//! Each subcommand runs one presentation query against the live USGS
//! feeds (or a `GeoJSON` fixture via `--geojson`) and prints the result.
//! Without a subcommand an interactive menu is shown.

mod interactive;
mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use quake_map_event_models::Feed;
use quake_map_server::ServerConfig;
use quake_map_source::memory::StaticSource;
use quake_map_source::usgs::UsgsSource;
use quake_map_source::{EventSource, FetchError};
use quake_map_view::{DEFAULT_FETCH_TIMEOUT, Dataset, ViewError, ViewStateMachine};

/// Errors surfaced by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The `GeoJSON` fixture could not be read.
    #[error("Failed to read {path}: {source}")]
    Fixture {
        /// Fixture path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Building the event source failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A presentation query failed.
    #[error(transparent)]
    View(#[from] ViewError),

    /// Interactive prompt failed.
    #[error(transparent)]
    Prompt(#[from] dialoguer::Error),

    /// The server failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The server task panicked or was cancelled.
    #[error("Server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Parser)]
#[command(name = "quake_map", about = "Seismic event region analysis")]
struct Cli {
    /// Serve every feed from a USGS `GeoJSON` file instead of the live feeds
    #[arg(long, global = true)]
    geojson: Option<PathBuf>,

    /// Upstream fetch timeout in seconds (0 disables)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve,
    /// Print the average magnitude and high-risk count for a feed
    Summary {
        /// Feed to summarize (`realtime` or `historical_month`)
        #[arg(long, default_value = "realtime")]
        feed: Feed,
    },
    /// Rank regions by event count
    Regions {
        /// Feed to rank (`realtime` or `historical_month`)
        #[arg(long, default_value = "realtime")]
        feed: Feed,
        /// Only count events at or above this magnitude
        #[arg(long)]
        min_magnitude: Option<f64>,
        /// Maximum number of regions to print
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Print the regional risk outlook for a feed
    Narrative {
        /// Feed to describe (`realtime` or `historical_month`)
        #[arg(long, default_value = "realtime")]
        feed: Feed,
    },
    /// List raw events for a feed
    Events {
        /// Feed to list (`realtime` or `historical_month`)
        #[arg(long, default_value = "realtime")]
        feed: Feed,
        /// Maximum number of events to print
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Fetch every dataset and print its state
    Views,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let source = build_source(cli.geojson.as_deref())?;

    let Some(command) = cli.command else {
        interactive::run(source, cli.timeout, cli.geojson.is_some()).await?;
        return Ok(());
    };

    run_command(command, source, cli.timeout).await?;
    Ok(())
}

/// Builds the event source: a `GeoJSON` fixture serving every feed, or
/// the live USGS feeds.
fn build_source(geojson: Option<&Path>) -> Result<Arc<dyn EventSource>, CliError> {
    let Some(path) = geojson else {
        return Ok(Arc::new(UsgsSource::new()?));
    };

    let text = std::fs::read_to_string(path).map_err(|source| CliError::Fixture {
        path: path.display().to_string(),
        source,
    })?;
    let source = Feed::all()
        .iter()
        .try_fold(StaticSource::new(), |source, &feed| {
            source.with_geojson(feed, &text)
        })?;
    log::info!("Serving feeds from {}", path.display());

    Ok(Arc::new(source))
}

/// `None` keeps the default; `Some(0)` disables the timeout.
fn resolve_timeout(secs: Option<u64>, default: Option<Duration>) -> Option<Duration> {
    match secs {
        None => default,
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
    }
}

fn state_machine(source: Arc<dyn EventSource>, timeout: Option<u64>) -> ViewStateMachine {
    ViewStateMachine::with_timeout(source, resolve_timeout(timeout, Some(DEFAULT_FETCH_TIMEOUT)))
}

async fn run_command(
    command: Commands,
    source: Arc<dyn EventSource>,
    timeout: Option<u64>,
) -> Result<(), CliError> {
    match command {
        Commands::Serve => {
            let mut config = ServerConfig::from_env();
            config.fetch_timeout = resolve_timeout(timeout, config.fetch_timeout);
            serve(source, config).await?;
        }
        Commands::Summary { feed } => {
            let summary = state_machine(source, timeout).get_summary(feed).await?;
            print!("{}", report::summary(feed, &summary));
        }
        Commands::Regions {
            feed,
            min_magnitude,
            limit,
        } => {
            let regions = state_machine(source, timeout)
                .get_top_regions(feed, min_magnitude, limit)
                .await?;
            print!("{}", report::regions(&regions));
        }
        Commands::Narrative { feed } => {
            let narrative = state_machine(source, timeout).get_narrative(feed).await?;
            println!("{narrative}");
        }
        Commands::Events { feed, limit } => {
            let events = state_machine(source, timeout).get_events(feed).await?;
            print!("{}", report::events(&events, limit));
        }
        Commands::Views => {
            let views = state_machine(source, timeout);
            for (dataset, result) in views.prefetch_all().await {
                if let Err(e) = result {
                    log::warn!("{dataset}: {e}");
                }
            }
            let states: Vec<_> = Dataset::all()
                .iter()
                .map(|&dataset| views.get_view_state(dataset))
                .collect();
            print!("{}", report::view_states(&states));
        }
    }

    Ok(())
}

/// Runs the API server to completion.
async fn serve(source: Arc<dyn EventSource>, config: ServerConfig) -> Result<(), CliError> {
    // The server uses actix-web's runtime, so we need to run it
    // in a blocking task to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(quake_map_server::serve(source, config))
    })
    .await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from([
            "quake_map",
            "regions",
            "--feed",
            "historical_month",
            "--min-magnitude",
            "4.5",
            "--limit",
            "3",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Regions {
                feed: Feed::HistoricalMonth,
                min_magnitude: Some(m),
                limit: 3,
            }) if (m - 4.5).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn feed_defaults_to_realtime() {
        let cli = Cli::try_parse_from(["quake_map", "summary"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Summary {
                feed: Feed::Realtime
            })
        ));
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "quake_map",
            "narrative",
            "--geojson",
            "fixture.geojson",
            "--timeout",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.geojson, Some(PathBuf::from("fixture.geojson")));
        assert_eq!(cli.timeout, Some(0));
    }

    #[test]
    fn parses_historical_feed_flag() {
        for args in [
            ["quake_map", "summary", "--feed", "historical_month"],
            ["quake_map", "narrative", "--feed", "HISTORICAL_MONTH"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            let feed = match cli.command {
                Some(Commands::Summary { feed } | Commands::Narrative { feed }) => feed,
                _ => panic!("expected a feed subcommand"),
            };
            assert_eq!(feed, Feed::HistoricalMonth);
        }
    }

    #[test]
    fn no_subcommand_is_interactive() {
        assert!(Cli::try_parse_from(["quake_map"]).unwrap().command.is_none());
    }

    #[test]
    fn rejects_unknown_feed() {
        assert!(Cli::try_parse_from(["quake_map", "summary", "--feed", "weekly"]).is_err());
    }

    #[test]
    fn timeout_resolution() {
        let default = Some(Duration::from_secs(30));
        assert_eq!(resolve_timeout(None, default), default);
        assert_eq!(resolve_timeout(Some(0), default), None);
        assert_eq!(resolve_timeout(Some(5), None), Some(Duration::from_secs(5)));
    }

    #[test]
    fn missing_fixture_is_reported() {
        let Err(err) = build_source(Some(Path::new("/nonexistent/quake.geojson"))) else {
            panic!("expected a fixture error");
        };
        assert!(matches!(err, CliError::Fixture { .. }));
        assert!(err.to_string().contains("/nonexistent/quake.geojson"));
    }
}

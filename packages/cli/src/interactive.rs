//! Interactive menu shown when no subcommand is given.

use std::sync::Arc;

use dialoguer::{Input, Select};
use quake_map_event_models::Feed;
use quake_map_server::ServerConfig;
use quake_map_source::EventSource;

use crate::{CliError, Commands};

/// Top-level actions offered by the menu.
#[derive(Clone, Copy)]
enum Action {
    Summary,
    Regions,
    Narrative,
    Events,
    Views,
    Server,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Summary,
        Self::Regions,
        Self::Narrative,
        Self::Events,
        Self::Views,
        Self::Server,
    ];

    #[must_use]
    const fn label(self) -> &'static str {
        match self {
            Self::Summary => "Show risk summary",
            Self::Regions => "Rank regions by activity",
            Self::Narrative => "Show regional risk outlook",
            Self::Events => "List raw events",
            Self::Views => "Fetch all datasets",
            Self::Server => "Start server",
        }
    }
}

/// Prompts for an action (and a feed where one is needed) and runs it.
///
/// # Errors
///
/// Returns [`CliError`] if a prompt fails or the selected command fails.
pub async fn run(
    source: Arc<dyn EventSource>,
    timeout: Option<u64>,
    from_fixture: bool,
) -> Result<(), CliError> {
    println!("Quake Map");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(|action| action.label()).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let command = match Action::ALL[idx] {
        Action::Summary => Commands::Summary {
            feed: select_feed()?,
        },
        Action::Regions => {
            let feed = select_feed()?;
            let limit: usize = Input::new()
                .with_prompt("How many regions?")
                .default(10)
                .interact_text()?;
            Commands::Regions {
                feed,
                min_magnitude: None,
                limit,
            }
        }
        Action::Narrative => Commands::Narrative {
            feed: select_feed()?,
        },
        Action::Events => Commands::Events {
            feed: select_feed()?,
            limit: Some(25),
        },
        Action::Views => Commands::Views,
        Action::Server if from_fixture => {
            return crate::serve(source, ServerConfig::from_env()).await;
        }
        Action::Server => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(quake_map_server::interactive::run())
            })
            .await??;
            return Ok(());
        }
    };

    crate::run_command(command, source, timeout).await
}

fn select_feed() -> Result<Feed, CliError> {
    let labels: Vec<String> = Feed::all().iter().map(ToString::to_string).collect();
    let idx = Select::new()
        .with_prompt("Which feed?")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(Feed::all()[idx])
}

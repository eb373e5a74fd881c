use std::{sync::Arc, time::Duration};

use anyhow::{Context, anyhow};
use city_search_core::{
    Config, DEBOUNCE_TIMEOUT, GeoDbCityLoader, OptionLoader, OptionPage, OptionsState,
    SearchUpdate, SearchWidget, SelectableOption, config::DEFAULT_BASE_URL,
};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use tokio::io::{AsyncBufReadExt, BufReader};

/// How long `watch` waits for the last query's options after stdin closes.
const WATCH_DRAIN: Duration = Duration::from_secs(10);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "city-search", version, about = "City search autocomplete")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key for the city-lookup service.
    Configure,

    /// Load options for a name prefix once and print them.
    Search {
        /// Start of the city name, e.g. "Lon".
        prefix: String,

        /// Print the option page as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search interactively and pick a city.
    Pick,

    /// Treat each stdin line as the current input and print debounced results.
    Watch,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Search { prefix, json } => search(&prefix, json).await,
            Command::Pick => pick().await,
            Command::Watch => watch().await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    cfg.set_api_key(api_key);

    let current = cfg.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = Text::new("Base URL:")
        .with_default(&current)
        .prompt()
        .context("Failed to read base URL")?;
    if base_url != current {
        cfg.base_url = Some(base_url);
    }

    let path = cfg.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

fn loader() -> anyhow::Result<Arc<dyn OptionLoader>> {
    let api = Config::load()?.geo_api_config()?;
    Ok(Arc::new(GeoDbCityLoader::new(api)?))
}

async fn search(prefix: &str, json: bool) -> anyhow::Result<()> {
    let loader = loader()?;
    let page = loader
        .load_options(prefix)
        .await
        .map_err(|e| anyhow!("{} ({e})", e.user_message()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        print_page(prefix, &page);
    }
    Ok(())
}

async fn pick() -> anyhow::Result<()> {
    let mut widget = SearchWidget::new(loader()?, |selected| {
        println!("{}", describe_selection(selected));
    });

    while let Some(query) = Text::new(widget.placeholder()).prompt_skippable()? {
        let page = match widget.load_options(&query).await {
            Ok(page) => page,
            Err(e) => {
                eprintln!("{}", e.user_message());
                continue;
            }
        };

        if page.is_empty() {
            println!("No cities found for {query:?}");
            continue;
        }

        if let Some(choice) = Select::new("Select a city", page.options).prompt_skippable()? {
            widget.on_selection_change(Some(choice));
            break;
        }
    }

    Ok(())
}

async fn watch() -> anyhow::Result<()> {
    let mut widget = SearchWidget::new(loader()?, |_| {});
    let (session, mut updates) = widget.start_session();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_input: Option<String> = None;
    let mut last_seen: Option<String> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("Failed to read stdin")? {
                Some(text) => {
                    session.input(text.clone());
                    last_input = Some(text);
                    last_seen = None;
                }
                None => break,
            },
            Some(update) = updates.recv() => {
                last_seen = Some(render_update(&mut widget, update));
            }
        }
    }

    if let Some(last) = pending_query(last_input.as_deref(), last_seen.as_deref()) {
        tracing::debug!(query = last, "stdin closed, waiting for final options");
        while let Ok(Some(update)) =
            tokio::time::timeout(DEBOUNCE_TIMEOUT + WATCH_DRAIN, updates.recv()).await
        {
            if render_update(&mut widget, update) == last {
                break;
            }
        }
    }

    session.close().await;
    Ok(())
}

/// The query whose options are still outstanding once input has ended.
fn pending_query<'a>(last_input: Option<&'a str>, last_seen: Option<&str>) -> Option<&'a str> {
    last_input.filter(|input| Some(*input) != last_seen)
}

/// Render an update and return its query.
fn render_update(widget: &mut SearchWidget, update: SearchUpdate) -> String {
    let query = update.query.clone();
    let seq = update.seq;
    if !widget.apply_update(update) {
        tracing::debug!(seq, query = %query, "skipping superseded update");
        return query;
    }

    match widget.options() {
        OptionsState::Idle => {}
        OptionsState::Ready(page) => print_page(&query, page),
        OptionsState::Failed { query, message } => eprintln!("{query:?}: {message}"),
    }
    query
}

fn print_page(query: &str, page: &OptionPage) {
    if page.is_empty() {
        println!("No cities found for {query:?}");
        return;
    }
    for option in page.iter() {
        println!("{}", format_option(option));
    }
}

fn format_option(option: &SelectableOption) -> String {
    format!("{}  ({})", option.label, option.value)
}

fn describe_selection(selected: Option<&SelectableOption>) -> String {
    match selected {
        None => "Selection cleared".to_string(),
        Some(option) => match option.coordinates() {
            Ok(c) => format!(
                "Selected {} (latitude {}, longitude {})",
                option.label, c.latitude, c.longitude
            ),
            Err(e) => format!("Selected {} ({e})", option.label),
        },
    }
}

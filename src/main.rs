use std::sync::Arc;

use anyhow::Result;
use wayfarer_core::{AppError, Config, ValidationError};
use wayfarer_places::{
    KeyValueBacking, LocationPreferences, MemoryBacking, OpenMeteoGeocoder, SearchLayer,
    Selection,
};

const USAGE: &str = "usage: wayfarer [search <query> | pick <lat|lon|name|country> [query] | pin <lat|lon|name|country>]";

#[tokio::main]
async fn main() -> Result<()> {
    wayfarer_core::init()?;

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }

    Ok(())
}

async fn run() -> Result<(), AppError> {
    let (config, _) = Config::load_validated()?;
    let prefs = open_preferences(&config);

    tracing::info!("Wayfarer started");

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => summary(&prefs),
        Some("search") => {
            let query = args[1..].join(" ");
            search(&config, &query).await?;
        }
        Some("pick") => {
            let selection = parse_selection(args.get(1))?;
            let query = args.get(2).map(String::as_str).unwrap_or(&selection.name);
            let routed = prefs.select(&selection.to_location(), query);
            println!("{}", routed.route_path());
        }
        Some("pin") => {
            let selection = parse_selection(args.get(1))?;
            let favourites = prefs.favourites.toggle(&selection.to_location())?;
            println!("{} favourites", favourites.len());
        }
        Some(_) => eprintln!("{}", USAGE),
    }

    Ok(())
}

/// Fall back to a session-only store so the app stays usable.
fn open_preferences(config: &Config) -> LocationPreferences {
    match LocationPreferences::open(config) {
        Ok(prefs) => prefs,
        Err(e) => {
            tracing::warn!("Saved places unavailable, using session storage: {}", e);
            eprintln!("{}", e.user_message());
            let backing: Arc<dyn KeyValueBacking> = Arc::new(MemoryBacking::new());
            LocationPreferences::with_backing(
                backing,
                config.preferences.favourites_limit,
                config.preferences.history_limit,
            )
        }
    }
}

fn parse_selection(raw: Option<&String>) -> Result<Selection, ValidationError> {
    let raw = raw.ok_or_else(|| ValidationError::MalformedSelection(USAGE.to_string()))?;
    raw.parse()
}

fn summary(prefs: &LocationPreferences) {
    println!("Favourites:");
    for fav in prefs.favourites.list() {
        println!("  {} [{}]", fav.location.display_name(), fav.id);
    }

    println!("Recent searches:");
    for entry in prefs.history.recent() {
        println!("  {} (\"{}\")", entry.location.display_name(), entry.query);
    }
}

async fn search(config: &Config, query: &str) -> Result<(), AppError> {
    let geocoder = OpenMeteoGeocoder::from_config(&config.search)?;
    let layer = SearchLayer::from_config(geocoder, &config.search);

    if !layer.accepts(query) {
        eprintln!(
            "Type at least {} characters to search",
            config.search.min_query_len
        );
        return Ok(());
    }

    let state = layer.search(query).await;
    if let Some(error) = state.error {
        return Err(error.into());
    }

    for location in &state.results {
        println!("{}\t{}", Selection::from(location), location.display_name());
    }
    Ok(())
}

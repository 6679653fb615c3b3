//! # News Scraper
//!
//! A small web application that scrapes headline links from a news site,
//! stores them, and lets readers save the interesting ones and keep notes on
//! them.
//!
//! ## Usage
//!
//! ```sh
//! news_scraper --database ./newsScraper.sqlite --port 3000
//! ```
//!
//! Then open `http://localhost:3000/scrape` to pull the latest headlines.
//!
//! ## Architecture
//!
//! 1. **Scraping**: Fetch the source front page and extract `h3.headline` links
//! 2. **Storing**: Validate each headline and insert it unless its link is known
//! 3. **Serving**: Render the article list and the saved list, and handle
//!    save/unsave and note create/delete from HTML forms
//!
//! The store handle and HTTP client are created once here and passed to the
//! routes through [`routes::AppState`].

use std::error::Error;
use std::time::Duration;

use axum::ServiceExt;
use axum::extract::Request;
use clap::Parser;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod error;
mod ingest;
mod models;
mod routes;
mod scrapers;
mod store;
mod views;

use cli::Cli;
use routes::AppState;
use store::Store;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("news_scraper starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // --- Store & client ---
    let store = Store::open(&args.database)?;
    info!(database = %args.database, "Store ready");

    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(FETCH_TIMEOUT)
        .build()?;

    let state = AppState::new(store, client, args.source_url.clone(), args.duplicates);
    let app = routes::with_method_override(routes::router(state, &args.static_dir));

    // --- Serve ---
    let addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, source = %args.source_url, "App running");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

    Ok(())
}

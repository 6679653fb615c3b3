//! Fetch → extract → validate → store.
//!
//! [`run`] is what `GET /scrape` calls. It never fails: a fetch error is
//! logged and yields an empty report, and each headline that cannot be
//! validated or stored is logged and skipped without stopping the rest.
//!
//! Articles are keyed on `link`. Under [`Duplicates::Skip`] (the default) a
//! link already in the store, or repeated further down the same page, is
//! counted as a duplicate and not inserted. [`Duplicates::Keep`] inserts every
//! valid headline on every run.
//!
//! Parsing and store writes are blocking, so [`run`] moves them onto the
//! blocking pool once the page is fetched.

use itertools::Itertools;
use reqwest::Client;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::models::NewArticle;
use crate::scrapers::smithsonian::{self, Headline};
use crate::store::Store;

/// How to treat a headline whose link is already known.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Duplicates {
    /// Insert only links not seen before.
    #[default]
    Skip,
    /// Insert every headline, even if its link is already stored.
    Keep,
}

/// What one ingest pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Headings matched on the page.
    pub extracted: usize,
    /// New articles written.
    pub inserted: usize,
    /// Headings whose link was already stored or already seen on the page.
    pub duplicates: usize,
    /// Headings missing a title or a usable link.
    pub rejected: usize,
    /// Headings that failed to persist.
    pub failed: usize,
}

/// Scrape `source` and store every new headline.
#[instrument(level = "info", skip(store, client, source), fields(source = %source))]
pub async fn run(
    store: &Store,
    client: &Client,
    source: &Url,
    duplicates: Duplicates,
) -> IngestReport {
    let html = match smithsonian::fetch_page(client, source).await {
        Ok(html) => html,
        Err(e) => {
            error!(error = %e, "Scrape failed; nothing ingested");
            return IngestReport::default();
        }
    };
    let store = store.clone();
    let base_url = source.clone();
    match tokio::task::spawn_blocking(move || ingest_html(&store, &html, &base_url, duplicates))
        .await
    {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Ingest task failed");
            IngestReport::default()
        }
    }
}

/// Run the extract/store half of the pipeline over an already-fetched page.
pub fn ingest_html(
    store: &Store,
    html: &str,
    base_url: &Url,
    duplicates: Duplicates,
) -> IngestReport {
    store_headlines(
        store,
        smithsonian::extract_headlines(html, base_url),
        duplicates,
    )
}

fn store_headlines(
    store: &Store,
    headlines: Vec<Headline>,
    duplicates: Duplicates,
) -> IngestReport {
    let mut report = IngestReport {
        extracted: headlines.len(),
        ..IngestReport::default()
    };

    let valid: Vec<NewArticle> = headlines
        .into_iter()
        .filter_map(|headline| {
            match NewArticle::new(headline.title, headline.link.unwrap_or_default()) {
                Ok(article) => Some(article),
                Err(e) => {
                    warn!(error = %e, "Skipping headline");
                    report.rejected += 1;
                    None
                }
            }
        })
        .collect();

    let articles: Vec<NewArticle> = match duplicates {
        Duplicates::Keep => valid,
        Duplicates::Skip => {
            let valid_count = valid.len();
            let unique: Vec<NewArticle> = valid
                .into_iter()
                .unique_by(|article| article.link.clone())
                .collect();
            report.duplicates += valid_count - unique.len();
            unique
        }
    };

    for article in &articles {
        let stored = match duplicates {
            Duplicates::Keep => store.insert_article(article).map(Some),
            Duplicates::Skip => store.insert_article_if_new(article),
        };
        match stored {
            Ok(Some(stored)) => {
                debug!(id = %stored.id, link = %stored.link, "Stored article");
                report.inserted += 1;
            }
            Ok(None) => report.duplicates += 1,
            Err(e) => {
                error!(error = %e, link = %article.link, "Failed to store article");
                report.failed += 1;
            }
        }
    }

    info!(
        extracted = report.extracted,
        inserted = report.inserted,
        duplicates = report.duplicates,
        rejected = report.rejected,
        failed = report.failed,
        "Ingest complete"
    );
    report
}

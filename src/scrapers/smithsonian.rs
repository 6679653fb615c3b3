//! Smithsonian Magazine headline scraper.
//!
//! This module scrapes the [Smithsonian Magazine](http://www.smithsonianmag.com/)
//! front page. Every story teaser is an `h3.headline` whose direct `<a>` child
//! carries the story title and a site-relative link.
//!
//! # URL Pattern
//!
//! Links are resolved against the page URL, so `/history/some-story/` becomes
//! `http://www.smithsonianmag.com/history/some-story/`.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::AppResult;

/// Front page scraped when no other source is configured.
pub const SOURCE_URL: &str = "http://www.smithsonianmag.com/";

static HEADLINE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3.headline").expect("headline selector is valid"));

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// One `h3.headline` element as found on the page.
///
/// # Fields
///
/// * `title` - Text of the heading's direct `<a>` children, whitespace collapsed
/// * `link` - The first anchor's `href` resolved against the page URL, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub title: String,
    pub link: Option<String>,
}

/// Fetch a page body as text.
///
/// Non-2xx responses are treated as errors.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_page(client: &Client, url: &Url) -> AppResult<String> {
    let html = client
        .get(url.clone())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    debug!(bytes = html.len(), "Fetched page");
    Ok(html)
}

/// Extract every `h3.headline` from an HTML document.
///
/// Headings are returned in document order. A heading with no anchor child
/// yields an empty title and no link; callers decide whether that is usable.
pub fn extract_headlines(html: &str, base_url: &Url) -> Vec<Headline> {
    let document = Html::parse_document(html);

    let headlines: Vec<Headline> = document
        .select(&HEADLINE_SELECTOR)
        .map(|heading| {
            let anchors: Vec<ElementRef<'_>> = heading
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| child.value().name() == "a")
                .collect();

            let text = anchors
                .iter()
                .flat_map(|a| a.text())
                .collect::<String>();
            let title = WHITESPACE.replace_all(text.trim(), " ").into_owned();

            let link = anchors
                .first()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| base_url.join(href).ok())
                .map(|url| url.to_string());

            Headline { title, link }
        })
        .collect();

    info!(count = headlines.len(), source = %base_url, "Extracted headlines");
    headlines
}

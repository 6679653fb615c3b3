//! Command-line interface definitions for News Scraper.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option can also be supplied through an environment variable, which
//! is how the server is usually configured when deployed.

use clap::Parser;

use crate::ingest::Duplicates;
use crate::scrapers::smithsonian::SOURCE_URL;

/// Command-line arguments for the News Scraper server.
///
/// # Examples
///
/// ```sh
/// # Defaults: ./newsScraper.sqlite, port 3000
/// news_scraper
///
/// # Custom database and port
/// DATABASE_URL=/var/lib/news/news.sqlite PORT=8080 news_scraper
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// SQLite database file (":memory:" for a throwaway store)
    #[arg(short, long, env = "DATABASE_URL", default_value = "newsScraper.sqlite")]
    pub database: String,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Front page to scrape headlines from
    #[arg(long, env = "SOURCE_URL", default_value = SOURCE_URL)]
    pub source_url: url::Url,

    /// Whether a scrape skips or re-inserts links that are already stored
    #[arg(long, env = "DUPLICATES", value_enum, default_value_t = Duplicates::Skip)]
    pub duplicates: Duplicates,

    /// Directory of static assets served for unmatched paths
    #[arg(long, env = "STATIC_DIR", default_value = "public")]
    pub static_dir: String,
}

impl Cli {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["news_scraper"]).unwrap();

        // Environment may override these in CI; only check when unset.
        if std::env::var("PORT").is_err() {
            assert_eq!(cli.port, 3000);
        }
        if std::env::var("DATABASE_URL").is_err() {
            assert_eq!(cli.database, "newsScraper.sqlite");
        }
        if std::env::var("SOURCE_URL").is_err() {
            assert_eq!(cli.source_url.as_str(), "http://www.smithsonianmag.com/");
        }
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "news_scraper",
            "--database",
            "/tmp/news.sqlite",
            "--port",
            "8080",
            "--host",
            "127.0.0.1",
            "--source-url",
            "http://localhost:9000/",
        ]);

        assert_eq!(cli.database, "/tmp/news.sqlite");
        assert_eq!(cli.bind_addr(), "127.0.0.1:8080");
        assert_eq!(cli.source_url.as_str(), "http://localhost:9000/");
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["news_scraper", "-d", ":memory:", "-p", "4000"]);

        assert_eq!(cli.database, ":memory:");
        assert_eq!(cli.port, 4000);
    }

    #[test]
    fn test_cli_duplicates_policy() {
        let cli = Cli::parse_from(["news_scraper", "--duplicates", "keep"]);
        assert_eq!(cli.duplicates, Duplicates::Keep);
    }

    #[test]
    fn test_cli_rejects_bad_source_url() {
        let result = Cli::try_parse_from(["news_scraper", "--source-url", "not a url"]);
        assert!(result.is_err());
    }
}

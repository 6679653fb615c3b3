//! News source scrapers.
//!
//! Each scraper exposes the same two steps:
//!
//! 1. **Fetching**: Download the source's front page with a shared [`reqwest::Client`]
//! 2. **Extracting**: Pull `(title, link)` pairs out of the HTML with `scraper`
//!
//! # Supported Sources
//!
//! | Source | Module | Selector |
//! |--------|--------|----------|
//! | Smithsonian Magazine | [`smithsonian`] | `h3.headline > a` |

pub mod smithsonian;

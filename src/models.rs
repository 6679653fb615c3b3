//! Data models for scraped articles and the notes attached to them.
//!
//! This module defines the core data structures used throughout the application:
//! - [`NewArticle`]: A validated headline ready to be inserted
//! - [`Article`]: A persisted headline with its saved flag and note references
//! - [`NewNote`] / [`Note`]: Free-text notes attached to a saved article
//! - [`SavedArticle`]: An article with its note references resolved
//!
//! Validation happens when a `New*` value is built, so anything that reaches
//! the store already satisfies the required-field rules.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// A scraped headline that passed validation and can be persisted.
///
/// # Fields
///
/// * `title` - The headline text, trimmed and non-empty
/// * `link` - Absolute URL of the story
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub title: String,
    pub link: String,
}

impl NewArticle {
    /// Validate a `(title, link)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if either field is blank or if `link`
    /// is not an absolute URL.
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> AppResult<Self> {
        let title = title.into().trim().to_string();
        let link = link.into().trim().to_string();

        if title.is_empty() {
            return Err(AppError::validation("article", "title is required"));
        }
        if link.is_empty() {
            return Err(AppError::validation("article", "link is required"));
        }
        Url::parse(&link)
            .map_err(|e| AppError::validation("article", format!("link {link:?}: {e}")))?;

        Ok(NewArticle { title, link })
    }
}

/// A persisted article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub link: String,
    /// Whether the article shows up on the saved page.
    pub saved: bool,
    /// Note ids in the order they were attached. May name notes that have
    /// since been deleted.
    pub notes: Vec<Uuid>,
    pub scraped_at: DateTime<Utc>,
}

/// Form payload for a new note. The body is free text and may be empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewNote {
    #[serde(default)]
    pub body: String,
}

/// A persisted note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A saved article with its note references resolved.
///
/// References to deleted notes are dropped during resolution, so `notes`
/// can be shorter than `article.notes`.
#[derive(Debug, Clone)]
pub struct SavedArticle {
    pub article: Article,
    pub notes: Vec<Note>,
}

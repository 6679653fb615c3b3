//! SQLite-backed document store for articles and notes.
//!
//! The store keeps two collections plus the ordered reference list that ties
//! them together:
//!
//! ```text
//! articles       id, title, link, saved, scraped_at
//! notes          id, body, created_at
//! article_notes  article_id -> note_id (insertion order = rowid order)
//! ```
//!
//! `article_notes.note_id` carries no foreign key: deleting a note leaves its
//! id in the owning article's list. Reads resolve references with an inner
//! join, so a dangling id simply resolves to nothing.
//!
//! A [`Store`] is a cheap clonable handle around a single connection. It is
//! opened once in `main` and handed to the ingest pipeline and the route
//! layer explicitly.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, Row, params};
#[cfg(test)]
use rusqlite::OptionalExtension;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Article, NewArticle, NewNote, Note, SavedArticle};

/// Path that opens a transient, process-local database.
pub const IN_MEMORY: &str = ":memory:";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS articles (
        id         BLOB PRIMARY KEY,
        title      TEXT NOT NULL CHECK (length(title) > 0),
        link       TEXT NOT NULL CHECK (length(link) > 0),
        saved      BOOLEAN NOT NULL DEFAULT 0,
        scraped_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_articles_link ON articles(link);
    CREATE INDEX IF NOT EXISTS idx_articles_saved ON articles(saved);

    CREATE TABLE IF NOT EXISTS notes (
        id         BLOB PRIMARY KEY,
        body       TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS article_notes (
        article_id BLOB NOT NULL REFERENCES articles(id),
        note_id    BLOB NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_article_notes_article ON article_notes(article_id);
";

/// Shared handle to the article/note database.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Open (or create) the database at `path` and make sure the schema exists.
    ///
    /// [`IN_MEMORY`] opens a transient database.
    #[instrument(level = "info")]
    pub fn open(path: &str) -> AppResult<Self> {
        let conn = if path == IN_MEMORY {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        info!("Store opened");
        Ok(Store {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> AppResult<Self> {
        Self::open(IN_MEMORY)
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| AppError::Poisoned)
    }

    // ── Articles ──

    /// Insert an article unconditionally.
    #[instrument(level = "debug", skip_all, fields(link = %new.link))]
    pub fn insert_article(&self, new: &NewArticle) -> AppResult<Article> {
        let conn = self.lock()?;
        insert_article(&conn, new)
    }

    /// Insert an article unless one with the same link already exists.
    ///
    /// Returns `None` for a duplicate. The existence check and the insert run
    /// under the same lock.
    #[instrument(level = "debug", skip_all, fields(link = %new.link))]
    pub fn insert_article_if_new(&self, new: &NewArticle) -> AppResult<Option<Article>> {
        let conn = self.lock()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM articles WHERE link = ?1)",
            params![new.link],
            |row| row.get(0),
        )?;
        if exists {
            debug!("Article already stored");
            return Ok(None);
        }
        insert_article(&conn, new).map(Some)
    }

    #[cfg(test)]
    pub fn find_article(&self, id: Uuid) -> AppResult<Option<Article>> {
        let conn = self.lock()?;
        let article = conn
            .query_row(
                "SELECT id, title, link, saved, scraped_at FROM articles WHERE id = ?1",
                params![id],
                article_from_row,
            )
            .optional()?;
        match article {
            Some(mut article) => {
                article.notes = note_refs(&conn, article.id)?;
                Ok(Some(article))
            }
            None => Ok(None),
        }
    }

    /// All articles in insertion order.
    #[instrument(level = "debug", skip_all)]
    pub fn list_articles(&self) -> AppResult<Vec<Article>> {
        let conn = self.lock()?;
        query_articles(
            &conn,
            "SELECT id, title, link, saved, scraped_at FROM articles ORDER BY rowid",
        )
    }

    /// Set or clear the saved flag on one article.
    ///
    /// # Errors
    ///
    /// [`AppError::NotFound`] if no article has this id.
    #[instrument(level = "info", skip(self))]
    pub fn set_saved(&self, id: Uuid, saved: bool) -> AppResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE articles SET saved = ?1 WHERE id = ?2",
            params![saved, id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound {
                entity: "article",
                id,
            });
        }
        Ok(())
    }

    /// Saved articles in insertion order, each with its live notes resolved.
    #[instrument(level = "debug", skip_all)]
    pub fn list_saved(&self) -> AppResult<Vec<SavedArticle>> {
        let conn = self.lock()?;
        let articles = query_articles(
            &conn,
            "SELECT id, title, link, saved, scraped_at FROM articles WHERE saved = 1 ORDER BY rowid",
        )?;

        let mut stmt = conn.prepare(
            "SELECT n.id, n.body, n.created_at
             FROM article_notes an
             JOIN notes n ON n.id = an.note_id
             WHERE an.article_id = ?1
             ORDER BY an.rowid",
        )?;
        let mut saved = Vec::with_capacity(articles.len());
        for article in articles {
            let notes = stmt
                .query_map(params![article.id], note_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            saved.push(SavedArticle { article, notes });
        }
        Ok(saved)
    }

    // ── Notes ──

    /// Create a note and append its id to the article's note list.
    ///
    /// Both writes share one transaction, so a missing article leaves no
    /// orphan note behind.
    #[instrument(level = "info", skip(self, new))]
    pub fn add_note(&self, article_id: Uuid, new: &NewNote) -> AppResult<Note> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM articles WHERE id = ?1)",
            params![article_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(AppError::NotFound {
                entity: "article",
                id: article_id,
            });
        }

        let note = Note {
            id: Uuid::new_v4(),
            body: new.body.clone(),
            created_at: Utc::now(),
        };
        tx.execute(
            "INSERT INTO notes (id, body, created_at) VALUES (?1, ?2, ?3)",
            params![note.id, note.body, note.created_at],
        )?;
        tx.execute(
            "INSERT INTO article_notes (article_id, note_id) VALUES (?1, ?2)",
            params![article_id, note.id],
        )?;
        tx.commit()?;

        info!(note_id = %note.id, "Note created");
        Ok(note)
    }

    #[cfg(test)]
    pub fn find_note(&self, id: Uuid) -> AppResult<Option<Note>> {
        let conn = self.lock()?;
        let note = conn
            .query_row(
                "SELECT id, body, created_at FROM notes WHERE id = ?1",
                params![id],
                note_from_row,
            )
            .optional()?;
        Ok(note)
    }

    /// Delete one note. Its id stays in the owning article's list.
    ///
    /// # Errors
    ///
    /// [`AppError::NotFound`] if no note has this id.
    #[instrument(level = "info", skip(self))]
    pub fn delete_note(&self, id: Uuid) -> AppResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM notes WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(AppError::NotFound { entity: "note", id });
        }
        Ok(())
    }
}

fn insert_article(conn: &Connection, new: &NewArticle) -> AppResult<Article> {
    let article = Article {
        id: Uuid::new_v4(),
        title: new.title.clone(),
        link: new.link.clone(),
        saved: false,
        notes: Vec::new(),
        scraped_at: Utc::now(),
    };
    conn.execute(
        "INSERT INTO articles (id, title, link, saved, scraped_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            article.id,
            article.title,
            article.link,
            article.saved,
            article.scraped_at
        ],
    )?;
    Ok(article)
}

fn query_articles(conn: &Connection, sql: &str) -> AppResult<Vec<Article>> {
    let mut stmt = conn.prepare(sql)?;
    let mut articles = stmt
        .query_map([], article_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    for article in &mut articles {
        article.notes = note_refs(conn, article.id)?;
    }
    Ok(articles)
}

fn note_refs(conn: &Connection, article_id: Uuid) -> AppResult<Vec<Uuid>> {
    let mut stmt = conn.prepare_cached(
        "SELECT note_id FROM article_notes WHERE article_id = ?1 ORDER BY rowid",
    )?;
    let ids = stmt
        .query_map(params![article_id], |row| row.get(0))?
        .collect::<Result<Vec<Uuid>, _>>()?;
    Ok(ids)
}

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        link: row.get(2)?,
        saved: row.get(3)?,
        notes: Vec::new(),
        scraped_at: row.get(4)?,
    })
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        body: row.get(1)?,
        created_at: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(store: &Store, title: &str, link: &str) -> Article {
        store
            .insert_article(&NewArticle::new(title, link).unwrap())
            .unwrap()
    }

    fn note(body: &str) -> NewNote {
        NewNote {
            body: body.to_string(),
        }
    }

    #[test]
    fn test_insert_and_list_preserves_order() {
        let store = Store::open_in_memory().unwrap();
        article(&store, "First", "https://example.com/1");
        article(&store, "Second", "https://example.com/2");

        let all = store.list_articles().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "First");
        assert_eq!(all[1].title, "Second");
        assert!(all.iter().all(|a| !a.saved && a.notes.is_empty()));
    }

    #[test]
    fn test_insert_if_new_skips_existing_link() {
        let store = Store::open_in_memory().unwrap();
        let new = NewArticle::new("Story", "https://example.com/story").unwrap();

        assert!(store.insert_article_if_new(&new).unwrap().is_some());
        assert!(store.insert_article_if_new(&new).unwrap().is_none());
        assert_eq!(store.list_articles().unwrap().len(), 1);
    }

    #[test]
    fn test_save_then_unsave_restores_article() {
        let store = Store::open_in_memory().unwrap();
        let a = article(&store, "Story", "https://example.com/story");
        store.add_note(a.id, &note("keep")).unwrap();
        let before = store.find_article(a.id).unwrap().unwrap();

        store.set_saved(a.id, true).unwrap();
        assert!(store.find_article(a.id).unwrap().unwrap().saved);

        store.set_saved(a.id, false).unwrap();
        let after = store.find_article(a.id).unwrap().unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn test_set_saved_unknown_article() {
        let store = Store::open_in_memory().unwrap();
        let err = store.set_saved(Uuid::new_v4(), true).unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: "article", .. }));
    }

    #[test]
    fn test_add_note_only_touches_target_article() {
        let store = Store::open_in_memory().unwrap();
        let a = article(&store, "A", "https://example.com/a");
        let b = article(&store, "B", "https://example.com/b");

        let first = store.add_note(a.id, &note("one")).unwrap();
        let second = store.add_note(a.id, &note("two")).unwrap();

        let a = store.find_article(a.id).unwrap().unwrap();
        let b = store.find_article(b.id).unwrap().unwrap();
        assert_eq!(a.notes, vec![first.id, second.id]);
        assert!(b.notes.is_empty());
    }

    #[test]
    fn test_add_note_to_missing_article_creates_nothing() {
        let store = Store::open_in_memory().unwrap();
        let err = store.add_note(Uuid::new_v4(), &note("orphan")).unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        let conn = store.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_list_saved_filters_and_resolves_notes() {
        let store = Store::open_in_memory().unwrap();
        let a = article(&store, "A", "https://example.com/a");
        let b = article(&store, "B", "https://example.com/b");
        store.set_saved(b.id, true).unwrap();
        store.add_note(b.id, &note("first thought")).unwrap();
        store.add_note(b.id, &note("second thought")).unwrap();
        store.add_note(a.id, &note("unsaved note")).unwrap();

        let saved = store.list_saved().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].article.id, b.id);
        let bodies: Vec<&str> = saved[0].notes.iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["first thought", "second thought"]);
    }

    #[test]
    fn test_delete_note_leaves_dangling_reference() {
        let store = Store::open_in_memory().unwrap();
        let a = article(&store, "A", "https://example.com/a");
        store.set_saved(a.id, true).unwrap();
        let gone = store.add_note(a.id, &note("delete me")).unwrap();
        let kept = store.add_note(a.id, &note("keep me")).unwrap();

        store.delete_note(gone.id).unwrap();
        assert!(store.find_note(gone.id).unwrap().is_none());

        let saved = store.list_saved().unwrap();
        assert_eq!(saved[0].article.notes, vec![gone.id, kept.id]);
        assert_eq!(saved[0].notes.len(), 1);
        assert_eq!(saved[0].notes[0].body, "keep me");
    }

    #[test]
    fn test_delete_unknown_note() {
        let store = Store::open_in_memory().unwrap();
        let err = store.delete_note(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: "note", .. }));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.sqlite");
        let path = path.to_str().unwrap();

        let id = {
            let store = Store::open(path).unwrap();
            let a = article(&store, "Persisted", "https://example.com/p");
            store.set_saved(a.id, true).unwrap();
            a.id
        };

        let store = Store::open(path).unwrap();
        let found = store.find_article(id).unwrap().unwrap();
        assert_eq!(found.title, "Persisted");
        assert!(found.saved);
    }
}

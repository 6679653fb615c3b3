//! HTTP routes.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/scrape` | [`scrape`] |
//! | GET | `/` | [`index`] |
//! | PUT | `/saved/:id` | [`save_article`] |
//! | GET | `/saved` | [`saved`] |
//! | POST | `/saved/notes/:id` | [`add_note`] |
//! | PUT | `/delete/:id` | [`unsave_article`] |
//! | DELETE | `/saved/delete/:id` | [`delete_note`] |
//!
//! Anything else falls through to the static asset directory. HTML forms reach
//! the `PUT`/`DELETE` routes by posting with `?_method=PUT|DELETE`, which
//! [`with_method_override`] rewrites before the router sees the request.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{Path, Request, State},
    http::Method,
    response::{Html, Redirect},
    routing::{delete, get, post, put},
};
use reqwest::Client;
use tower::Layer;
use tower::util::{MapRequest, MapRequestLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, instrument};
use url::Url;
use uuid::Uuid;

use crate::error::AppResult;
use crate::ingest::{self, Duplicates};
use crate::models::NewNote;
use crate::store::Store;
use crate::views;

/// Everything a handler needs, shared across requests.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Store,
    pub client: Client,
    pub source: Arc<Url>,
    pub duplicates: Duplicates,
}

impl AppState {
    pub fn new(store: Store, client: Client, source: Url, duplicates: Duplicates) -> Self {
        AppState {
            store,
            client,
            source: Arc::new(source),
            duplicates,
        }
    }
}

/// Router with method override applied in front of it.
pub type App = MapRequest<Router, fn(Request) -> Request>;

/// Build the router, serving static files from `static_dir` for unmatched paths.
pub fn router(state: AppState, static_dir: impl Into<PathBuf>) -> Router {
    Router::new()
        .route("/scrape", get(scrape))
        .route("/", get(index))
        .route("/saved", get(saved))
        .route("/saved/:id", put(save_article))
        .route("/saved/notes/:id", post(add_note))
        .route("/delete/:id", put(unsave_article))
        .route("/saved/delete/:id", delete(delete_note))
        .fallback_service(ServeDir::new(static_dir.into()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Wrap a router so `POST ...?_method=PUT|DELETE|PATCH` is dispatched as that verb.
pub fn with_method_override(router: Router) -> App {
    MapRequestLayer::new(method_override as fn(Request) -> Request).layer(router)
}

fn method_override(mut request: Request) -> Request {
    if request.method() != Method::POST {
        return request;
    }
    let Some(query) = request.uri().query() else {
        return request;
    };

    let requested = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "_method")
        .map(|(_, value)| value.to_ascii_uppercase());

    let method = match requested.as_deref() {
        Some("PUT") => Method::PUT,
        Some("DELETE") => Method::DELETE,
        Some("PATCH") => Method::PATCH,
        _ => return request,
    };
    debug!(%method, path = %request.uri().path(), "Method override");
    *request.method_mut() = method;
    request
}

/// Scrape the source, then send the browser back to the article list.
#[instrument(level = "info", skip_all)]
pub async fn scrape(State(state): State<AppState>) -> Redirect {
    let report = ingest::run(
        &state.store,
        &state.client,
        &state.source,
        state.duplicates,
    )
    .await;
    info!(inserted = report.inserted, "Scrape finished");
    Redirect::to("/")
}

/// Run a store call on the blocking pool.
async fn with_store<T, F>(state: &AppState, f: F) -> AppResult<T>
where
    F: FnOnce(&Store) -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || f(&store)).await?
}

pub async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    let articles = with_store(&state, |store| store.list_articles()).await?;
    Ok(Html(views::index_page(&articles)))
}

pub async fn save_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    with_store(&state, move |store| store.set_saved(id, true)).await?;
    Ok(Redirect::to("/"))
}

pub async fn saved(State(state): State<AppState>) -> AppResult<Html<String>> {
    let saved = with_store(&state, |store| store.list_saved()).await?;
    Ok(Html(views::saved_page(&saved)))
}

pub async fn add_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(note): Form<NewNote>,
) -> AppResult<Redirect> {
    with_store(&state, move |store| store.add_note(id, &note)).await?;
    Ok(Redirect::to("/saved"))
}

pub async fn unsave_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    with_store(&state, move |store| store.set_saved(id, false)).await?;
    Ok(Redirect::to("/saved"))
}

pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    with_store(&state, move |store| store.delete_note(id)).await?;
    Ok(Redirect::to("/saved"))
}

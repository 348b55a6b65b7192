use std::sync::Arc;

use article_store::{ArchiveEntry, ArticleStore, StoredArticle};
use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use renderer::{render_archive_json, render_article_page, RECENT_LIMIT};
use time::OffsetDateTime;
use tracing::info;

use crate::error::WebError;
use crate::AppState;

pub const ARCHIVE_LIMIT: usize = 50;

pub async fn archive(State(state): State<Arc<AppState>>) -> Result<Response, WebError> {
    let store = state.require_store()?;

    let items: Vec<ArchiveEntry> = store
        .list_recent(ARCHIVE_LIMIT)
        .await?
        .iter()
        .map(StoredArticle::summary)
        .collect();
    let json = render_archive_json(&items)?;

    Ok(([(header::CONTENT_TYPE, "application/json; charset=utf-8")], json).into_response())
}

pub async fn article_by_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<Response, WebError> {
    let store = state.require_store()?;

    match store.get_by_date(&date).await? {
        Some(article) => render_page(&state, store, &article).await,
        None => Err(WebError::NotFound(date)),
    }
}

/// Serves the newest article, generating today's inline when none exists yet.
pub async fn latest(State(state): State<Arc<AppState>>) -> Result<Response, WebError> {
    let store = state.require_store()?;

    if let Some(article) = store.latest().await? {
        return render_page(&state, store, &article).await;
    }

    if state.generator.is_available() {
        info!("No article stored yet; generating inline");
        state
            .generator
            .generate_daily_article(OffsetDateTime::now_utc())
            .await?;

        if let Some(article) = store.latest().await? {
            return render_page(&state, store, &article).await;
        }
    }

    Err(WebError::NotGenerated)
}

async fn render_page(
    state: &AppState,
    store: &ArticleStore,
    article: &StoredArticle,
) -> Result<Response, WebError> {
    // One extra so the current article can be dropped from the list.
    let recent: Vec<ArchiveEntry> = store
        .list_recent(RECENT_LIMIT + 1)
        .await?
        .iter()
        .map(StoredArticle::summary)
        .collect();

    let page = render_article_page(&state.site_title, article, &recent)?;
    Ok(Html(page).into_response())
}

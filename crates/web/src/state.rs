use std::sync::Arc;

use article_store::ArticleStore;
use daily_generator::DailyGenerator;

use crate::error::WebError;

#[derive(Clone)]
pub struct AppState {
    /// `None` when no KV store is bound; every route then answers 500.
    pub store: Option<ArticleStore>,
    pub generator: DailyGenerator,
    pub site_title: Arc<str>,
}

impl AppState {
    pub fn require_store(&self) -> Result<&ArticleStore, WebError> {
        self.store.as_ref().ok_or(WebError::NotConfigured("KV store binding"))
    }
}

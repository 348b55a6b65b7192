use article_store::{ArchiveEntry, StoredArticle};
use askama::Template;
use common::{ServiceError, ServiceResult};

pub const RECENT_LIMIT: usize = 5;

#[derive(Template)]
#[template(path = "article.html")]
pub struct ArticlePage<'a> {
    pub site_title: &'a str,
    pub article: &'a StoredArticle,
    pub recent: Vec<&'a ArchiveEntry>,
}

impl<'a> ArticlePage<'a> {
    /// `recent` may include the article itself; it is skipped and at most
    /// five others are kept.
    pub fn new(site_title: &'a str, article: &'a StoredArticle, recent: &'a [ArchiveEntry]) -> Self {
        let recent = recent
            .iter()
            .filter(|entry| entry.date != article.date)
            .take(RECENT_LIMIT)
            .collect();

        Self { site_title, article, recent }
    }
}

/// Complete HTML document for one article.
///
/// Every field is HTML-escaped by the template except `body_html`, which is
/// trusted markup produced by the generator.
pub fn render_article_page(site_title: &str, article: &StoredArticle, recent: &[ArchiveEntry]) -> ServiceResult<String> {
    ArticlePage::new(site_title, article, recent)
        .render()
        .map_err(|e| ServiceError::Render(e.to_string()))
}

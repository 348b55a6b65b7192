pub mod archive;
pub mod escape;
pub mod page;

pub use archive::render_archive_json;
pub use escape::escape_html;
pub use page::{render_article_page, ArticlePage, RECENT_LIMIT};

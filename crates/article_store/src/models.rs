use serde::{Deserialize, Serialize};

pub const ARTICLE_PREFIX: &str = "article:";
pub const LATEST_KEY: &str = "latest-key";

pub fn article_key(date: &str) -> String {
    format!("{}{}", ARTICLE_PREFIX, date)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredArticle {
    pub key: String,
    pub title: String,
    pub body_html: String,
    /// UTC day in `YYYY-MM-DD` form.
    pub date: String,
    pub topic: String,
}

impl StoredArticle {
    pub fn new(date: &str, title: String, body_html: String, topic: String) -> Self {
        Self {
            key: article_key(date),
            title,
            body_html,
            date: date.to_string(),
            topic,
        }
    }

    pub fn summary(&self) -> ArchiveEntry {
        ArchiveEntry {
            date: self.date.clone(),
            title: self.title.clone(),
            topic: self.topic.clone(),
        }
    }
}

/// The listing projection of a stored article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub date: String,
    pub title: String,
    pub topic: String,
}

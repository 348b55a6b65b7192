pub mod models;

use std::sync::Arc;

use common::{KvStore, ServiceResult};
use tracing::{info, warn};

pub use models::{article_key, ArchiveEntry, StoredArticle, ARTICLE_PREFIX, LATEST_KEY};

/// Reads and writes `StoredArticle` records in a KV store.
///
/// Articles live under `article:<date>` as JSON; `latest-key` holds the key of
/// the most recently written one. Every call goes to the store.
#[derive(Clone)]
pub struct ArticleStore {
    kv: Arc<dyn KvStore>,
}

impl ArticleStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Absent when the key is unset or its value does not parse.
    pub async fn get(&self, key: &str) -> ServiceResult<Option<StoredArticle>> {
        let Some(raw) = self.kv.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<StoredArticle>(&raw) {
            Ok(article) => Ok(Some(article)),
            Err(e) => {
                warn!("Ignoring malformed article at {}: {}", key, e);
                Ok(None)
            }
        }
    }

    pub async fn get_by_date(&self, date: &str) -> ServiceResult<Option<StoredArticle>> {
        self.get(&article_key(date)).await
    }

    /// Writes the article, then moves the latest pointer to it.
    ///
    /// The two writes are independent: a failure between them leaves the
    /// pointer on the previous article until the next successful put.
    pub async fn put(&self, article: &StoredArticle) -> ServiceResult<()> {
        let key = article_key(&article.date);
        let json = serde_json::to_string(article)?;

        self.kv.put(&key, &json).await?;
        self.kv.put(LATEST_KEY, &key).await?;

        info!("Stored article {} ({})", key, article.title);
        Ok(())
    }

    pub async fn latest(&self) -> ServiceResult<Option<StoredArticle>> {
        match self.kv.get(LATEST_KEY).await? {
            Some(key) => self.get(key.trim()).await,
            None => Ok(None),
        }
    }

    /// Newest first by `date`, at most `limit` entries.
    pub async fn list_recent(&self, limit: usize) -> ServiceResult<Vec<StoredArticle>> {
        let keys = self.kv.list(ARTICLE_PREFIX).await?;

        let mut articles = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(article) = self.get(&key).await? {
                articles.push(article);
            }
        }

        // ISO dates are fixed width, so string order is date order.
        articles.sort_by(|a, b| b.date.cmp(&a.date));
        articles.truncate(limit);
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::MemoryKv;

    fn article(date: &str) -> StoredArticle {
        StoredArticle::new(
            date,
            format!("Article {}", date),
            "<p>body</p>".to_string(),
            "topic".to_string(),
        )
    }

    #[tokio::test]
    async fn put_writes_article_and_latest_pointer() {
        let kv = MemoryKv::new();
        let store = ArticleStore::new(Arc::new(kv.clone()));

        store.put(&article("2024-01-01")).await.unwrap();
        store.put(&article("2024-01-02")).await.unwrap();

        assert_eq!(
            kv.get(LATEST_KEY).await.unwrap().as_deref(),
            Some("article:2024-01-02")
        );
        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest.date, "2024-01-02");
        assert_eq!(store.get("article:2024-01-01").await.unwrap(), Some(article("2024-01-01")));
    }

    #[tokio::test]
    async fn list_recent_sorts_descending_and_limits() {
        let store = ArticleStore::new(Arc::new(MemoryKv::new()));
        for date in ["2024-01-01", "2024-01-03", "2024-01-02"] {
            store.put(&article(date)).await.unwrap();
        }

        let dates: Vec<_> = store
            .list_recent(10)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.date)
            .collect();
        assert_eq!(dates, vec!["2024-01-03", "2024-01-02", "2024-01-01"]);

        let limited = store.list_recent(2).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].date, "2024-01-03");
        assert!(store.list_recent(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_records_are_absent() {
        let kv = MemoryKv::new();
        kv.put("article:2024-02-01", "not json").await.unwrap();
        let store = ArticleStore::new(Arc::new(kv));
        store.put(&article("2024-02-02")).await.unwrap();

        assert!(store.get("article:2024-02-01").await.unwrap().is_none());
        assert_eq!(store.list_recent(5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn latest_is_absent_before_any_write() {
        let store = ArticleStore::new(Arc::new(MemoryKv::new()));
        assert!(store.latest().await.unwrap().is_none());
        assert!(store.get_by_date("2099-01-01").await.unwrap().is_none());
    }
}

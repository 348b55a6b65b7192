pub mod prompt;
pub mod text;
pub mod topics;

use std::fmt;
use std::sync::Arc;

use article_store::{article_key, ArticleStore, StoredArticle};
use common::{KvStore, ModelRequest, ServiceResult, TextModel};
use time::OffsetDateTime;
use tracing::{info, warn};

pub use text::{derive_title, remove_title_from_body, sanitize_model_output};
pub use topics::{day_index, utc_date, TopicSchedule, DEFAULT_TOPICS};

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub model_id: String,
    pub max_tokens: u32,
    pub topics: TopicSchedule,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            model_id: common::config::DEFAULT_MODEL_ID.to_string(),
            max_tokens: common::config::DEFAULT_MAX_TOKENS,
            topics: TopicSchedule::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    StoreNotConfigured,
    ModelNotConfigured,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::StoreNotConfigured => write!(f, "KV store is not configured"),
            SkipReason::ModelNotConfigured => write!(f, "text model is not configured"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Created(StoredArticle),
    /// Today's article was already stored under this key.
    AlreadyExists(String),
    Skipped(SkipReason),
}

/// Writes at most one article per UTC day.
///
/// Both collaborators are optional; with either missing, generation is a
/// silent no-op. The existence check is a plain read before the write, so two
/// runs racing on the same day can both generate (last write wins).
#[derive(Clone)]
pub struct DailyGenerator {
    kv: Option<Arc<dyn KvStore>>,
    model: Option<Arc<dyn TextModel>>,
    settings: Arc<GeneratorSettings>,
}

impl DailyGenerator {
    pub fn new(
        kv: Option<Arc<dyn KvStore>>,
        model: Option<Arc<dyn TextModel>>,
        settings: GeneratorSettings,
    ) -> Self {
        Self {
            kv,
            model,
            settings: Arc::new(settings),
        }
    }

    pub fn is_available(&self) -> bool {
        self.kv.is_some() && self.model.is_some()
    }

    pub fn pick_topic_for_today(&self, now: OffsetDateTime) -> &str {
        self.settings.topics.pick_topic_for_today(now)
    }

    pub async fn generate_daily_article(&self, now: OffsetDateTime) -> ServiceResult<GenerationOutcome> {
        let Some(kv) = self.kv.clone() else {
            warn!("Skipping generation: {}", SkipReason::StoreNotConfigured);
            return Ok(GenerationOutcome::Skipped(SkipReason::StoreNotConfigured));
        };
        let Some(model) = self.model.as_ref() else {
            warn!("Skipping generation: {}", SkipReason::ModelNotConfigured);
            return Ok(GenerationOutcome::Skipped(SkipReason::ModelNotConfigured));
        };

        let store = ArticleStore::new(kv);
        let date = utc_date(now);
        let key = article_key(&date);

        if store.get(&key).await?.is_some() {
            info!("Article {} already exists; nothing to do", key);
            return Ok(GenerationOutcome::AlreadyExists(key));
        }

        let topic = self.pick_topic_for_today(now).to_string();
        info!("Generating article for {} on topic: {}", date, topic);

        let request = ModelRequest {
            messages: prompt::build_messages(&topic, &date),
            max_tokens: self.settings.max_tokens,
        };
        let output = model.run(&self.settings.model_id, &request).await?;

        let article = compose_article(&output.response, &date, topic);
        store.put(&article).await?;

        info!("Generated article {}: {}", article.key, article.title);
        Ok(GenerationOutcome::Created(article))
    }
}

/// Turns raw model text into the stored record for `date`.
pub fn compose_article(raw: &str, date: &str, topic: String) -> StoredArticle {
    let cleaned = sanitize_model_output(raw);
    let title = derive_title(&cleaned, date);
    let body_html = remove_title_from_body(&cleaned, &title);
    StoredArticle::new(date, title, body_html, topic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::{MemoryKv, ModelOutput};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::macros::datetime;

    struct ScriptedModel {
        response: String,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(response: &str) -> Self {
            Self { response: response.to_string(), calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl TextModel for ScriptedModel {
        async fn run(&self, _model_id: &str, request: &ModelRequest) -> ServiceResult<ModelOutput> {
            assert_eq!(request.messages.len(), 2);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ModelOutput { response: self.response.clone() })
        }
    }

    const RAW: &str = "<h1>Why Caches Lie</h1>\n<p>Intro.</p>\n<ul><li>- point</li></ul>\n<h2>Part one</h2>";

    #[tokio::test]
    async fn generates_once_per_day() {
        let kv = MemoryKv::new();
        let model = Arc::new(ScriptedModel::new(RAW));
        let generator = DailyGenerator::new(
            Some(Arc::new(kv.clone())),
            Some(model.clone()),
            GeneratorSettings::default(),
        );
        let now = datetime!(2024-01-03 09:00 UTC);

        let first = generator.generate_daily_article(now).await.unwrap();
        let GenerationOutcome::Created(article) = first else {
            panic!("expected an article, got {:?}", first);
        };
        assert_eq!(article.key, "article:2024-01-03");
        assert_eq!(article.title, "Why Caches Lie");
        assert_eq!(article.body_html, "<p>Intro.</p>\npoint\n<h2>Part one</h2>");
        assert_eq!(article.topic, generator.pick_topic_for_today(now));

        let entries_before = kv.len().await;
        let again = generator
            .generate_daily_article(datetime!(2024-01-03 23:00 UTC))
            .await
            .unwrap();
        assert_eq!(again, GenerationOutcome::AlreadyExists("article:2024-01-03".to_string()));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(kv.len().await, entries_before);
    }

    #[tokio::test]
    async fn skips_without_collaborators() {
        let no_model = DailyGenerator::new(Some(Arc::new(MemoryKv::new())), None, GeneratorSettings::default());
        assert!(!no_model.is_available());
        assert_eq!(
            no_model.generate_daily_article(OffsetDateTime::now_utc()).await.unwrap(),
            GenerationOutcome::Skipped(SkipReason::ModelNotConfigured)
        );

        let model = Arc::new(ScriptedModel::new(RAW));
        let no_store = DailyGenerator::new(None, Some(model.clone()), GeneratorSettings::default());
        assert_eq!(
            no_store.generate_daily_article(OffsetDateTime::now_utc()).await.unwrap(),
            GenerationOutcome::Skipped(SkipReason::StoreNotConfigured)
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_output_gets_default_title() {
        let article = compose_article("  \n", "2024-02-29", "topic".to_string());
        assert_eq!(article.title, "Daily Insight – 2024-02-29");
        assert_eq!(article.body_html, "");
    }
}

use common::ServiceResult;
use daily_generator::{DailyGenerator, GenerationOutcome};
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub type GenerationHandle = JoinHandle<ServiceResult<GenerationOutcome>>;

/// Starts today's generation as its own task and returns immediately.
pub fn spawn_generation(generator: DailyGenerator) -> GenerationHandle {
    tokio::spawn(async move {
        generator
            .generate_daily_article(OffsetDateTime::now_utc())
            .await
    })
}

/// Waits for a generation task and logs how it ended.
pub async fn report_generation(handle: GenerationHandle) -> Option<GenerationOutcome> {
    match handle.await {
        Ok(Ok(outcome)) => {
            match &outcome {
                GenerationOutcome::Created(article) => {
                    info!("Daily generation stored {} ({})", article.key, article.title)
                }
                GenerationOutcome::AlreadyExists(key) => {
                    info!("Daily generation skipped: {} already exists", key)
                }
                GenerationOutcome::Skipped(reason) => warn!("Daily generation skipped: {}", reason),
            }
            Some(outcome)
        }
        Ok(Err(e)) => {
            error!("Daily generation failed: {}", e);
            None
        }
        Err(e) => {
            error!("Daily generation task aborted: {}", e);
            None
        }
    }
}

use anyhow::Result;
use daily_generator::DailyGenerator;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_cron_scheduler::{JobScheduler, Job};
use tracing::{info, error};
use time::OffsetDateTime;
use std::sync::Arc;

use crate::trigger::{report_generation, spawn_generation};

pub struct DailyScheduler {
    scheduler: JobScheduler,
    // Generation runs outlive the cron callback that started them; shutdown
    // waits for whatever is still in here.
    background: Arc<Mutex<JoinSet<()>>>,
}

impl DailyScheduler {
    pub async fn new() -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            background: Arc::new(Mutex::new(JoinSet::new())),
        })
    }

    pub async fn add_daily_job<F, Fut>(&mut self, hour: u32, minute: u32, job_fn: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let cron_expression = cron_expression(hour, minute);
        info!("Scheduling daily job with cron: {}", cron_expression);

        let job_fn = Arc::new(job_fn);
        let job = Job::new_async(cron_expression.as_str(), move |_uuid, _l| {
            let job_fn = job_fn.clone();
            Box::pin(async move {
                info!("Executing scheduled job at {}", OffsetDateTime::now_utc());
                match job_fn().await {
                    Ok(()) => info!("Scheduled job completed successfully"),
                    Err(e) => error!("Scheduled job failed: {}", e),
                }
            })
        })?;

        self.scheduler.add(job).await?;
        Ok(())
    }

    /// Runs daily generation at `hour:minute` UTC without blocking the trigger.
    pub async fn schedule_generation(&mut self, hour: u32, minute: u32, generator: DailyGenerator) -> Result<()> {
        let background = self.background.clone();
        self.add_daily_job(hour, minute, move || {
            let background = background.clone();
            let generator = generator.clone();
            async move {
                launch(&background, generator).await;
                Ok(())
            }
        })
        .await
    }

    /// Starts a generation immediately, outside the cron schedule.
    pub async fn trigger_now(&self, generator: DailyGenerator) {
        launch(&self.background, generator).await;
    }

    /// Waits until every launched generation has finished.
    pub async fn wait_for_background(&self) {
        let mut background = self.background.lock().await;
        while background.join_next().await.is_some() {}
    }

    pub async fn start(&self) -> Result<()> {
        info!("Starting scheduler...");
        self.scheduler.start().await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down scheduler...");
        self.scheduler.shutdown().await?;
        self.wait_for_background().await;
        Ok(())
    }
}

async fn launch(background: &Mutex<JoinSet<()>>, generator: DailyGenerator) {
    let handle = spawn_generation(generator);
    let mut background = background.lock().await;
    // Reap finished runs so the set only holds live ones.
    while background.try_join_next().is_some() {}
    background.spawn(async move {
        report_generation(handle).await;
    });
}

fn cron_expression(hour: u32, minute: u32) -> String {
    format!("0 {} {} * * *", minute, hour)
}

use std::sync::Arc;

use anyhow::{Context, Result};
use article_store::ArticleStore;
use clap::Parser;
use common::{CloudflareClient, Config, KvBackend, KvStore, MemoryKv, TextModel};
use daily_generator::{DailyGenerator, GeneratorSettings, TopicSchedule};
use scheduler::{report_generation, spawn_generation, DailyScheduler};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use web::{create_app, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about = "Publishes one generated article per day", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Serve the site and generate the daily article on schedule (default)
    Serve,
    /// Generate today's article once and exit
    Generate,
}

fn build_kv(config: &Config) -> Result<Option<Arc<dyn KvStore>>> {
    let kv: Option<Arc<dyn KvStore>> = match &config.kv_backend {
        KvBackend::Cloudflare { namespace_id } => {
            let client = CloudflareClient::new(config.require_cloudflare()?);
            info!("Using KV namespace {}", namespace_id);
            Some(Arc::new(client.kv(namespace_id)))
        }
        KvBackend::Memory => {
            warn!("Using in-memory KV store; articles are lost on restart");
            Some(Arc::new(MemoryKv::new()))
        }
        KvBackend::None => {
            warn!("No KV store configured; every route will answer 500");
            None
        }
    };
    Ok(kv)
}

fn build_generator(config: &Config, kv: Option<Arc<dyn KvStore>>) -> DailyGenerator {
    let model: Option<Arc<dyn TextModel>> = match (&config.model, &config.cloudflare) {
        (Some(model), Some(cloudflare)) => {
            info!("Using model {} (max_tokens={})", model.model_id, model.max_tokens);
            Some(Arc::new(CloudflareClient::new(cloudflare).workers_ai()))
        }
        _ => {
            warn!("No text model configured; daily generation is disabled");
            None
        }
    };

    let mut settings = GeneratorSettings {
        topics: TopicSchedule::from_config(&config.topics),
        ..GeneratorSettings::default()
    };
    if let Some(model) = &config.model {
        settings.model_id = model.model_id.clone();
        settings.max_tokens = model.max_tokens;
    }
    info!("Topic schedule has {} entries", settings.topics.len());

    DailyGenerator::new(kv, model, settings)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal, shutting down...");
}

async fn serve(config: Config, kv: Option<Arc<dyn KvStore>>, generator: DailyGenerator) -> Result<()> {
    let mut scheduler = DailyScheduler::new().await?;
    scheduler
        .schedule_generation(config.schedule.hour, config.schedule.minute, generator.clone())
        .await?;
    scheduler.start().await?;
    info!(
        "Daily generation scheduled at {:02}:{:02} UTC",
        config.schedule.hour, config.schedule.minute
    );

    let state = AppState {
        store: kv.map(ArticleStore::new),
        generator,
        site_title: Arc::from(config.site_title.as_str()),
    };
    let app = create_app(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    scheduler.shutdown().await?;
    served.context("HTTP server error")
}

async fn generate_once(generator: DailyGenerator) -> Result<()> {
    info!("Running daily generation once");
    match report_generation(spawn_generation(generator)).await {
        Some(_) => Ok(()),
        None => anyhow::bail!("Daily generation did not complete"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    let _ = dotenv::dotenv();

    // Configure tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env()?;
    let kv = build_kv(&config)?;
    let generator = build_generator(&config, kv.clone());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, kv, generator).await,
        Commands::Generate => generate_once(generator).await,
    }
}

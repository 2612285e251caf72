use anyhow::Context;
use geoassist::assistant::AssistantClient;
use geoassist::cadastre::CadastreClient;
use geoassist::docwatch::DocumentWatcher;
use geoassist::recognition::RecognitionClient;
use geoassist::server::{router, AppContext};
use geoassist::service::ConversionService;
use geoassist::usage::UsageStore;
use geoassist::AppConfig;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("geoassist=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load_or_default(Some("config.toml"));
    tracing::info!("Loaded configuration: {:?}", config.server.name);

    let api_key =
        std::env::var("ANTHROPIC_API_KEY").context("ANTHROPIC_API_KEY not set")?;

    let ctx = AppContext {
        service: ConversionService::new(),
        assistant: Arc::new(AssistantClient::new(config.assistant.clone(), api_key)?),
        recognition: Arc::new(RecognitionClient::new(&config.recognition)?),
        cadastre: Arc::new(CadastreClient::new(&config.cadastre)?),
        usage: Arc::new(UsageStore::new(
            &config.usage.db_path,
            config.usage.daily_limit,
        )?),
    };

    if !config.documents.sources.is_empty() {
        DocumentWatcher::new(&config.documents)?
            .start_background(config.documents.poll_interval_hours);
        tracing::info!(
            sources = config.documents.sources.len(),
            "document watcher started"
        );
    }

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("geoassist listening on http://{}", addr);

    axum::serve(listener, router(ctx)).await?;

    Ok(())
}

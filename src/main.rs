use std::sync::Arc;

use asl_relay::api::{AppState, api_routes};
use asl_relay::config::{PipelineConfig, ServiceConfig};
use asl_relay::llm::create_generator;
use asl_relay::pipeline::{Dispatcher, PipelineDeps, TranslationProcessor};
use asl_relay::services::{
    HttpImageClient, HttpImageModerationClient, HttpModerationClient, HttpPublisher,
    HttpSentimentClient, LogPublisher, Publish,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let services = ServiceConfig::from_env()?;
    let pipeline = PipelineConfig::from_env()?;

    eprintln!("🤟 asl-relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", services.llm.model);
    eprintln!("   API: http://0.0.0.0:{}/api/translate", services.port);

    // ── Collaborators ───────────────────────────────────────────────────
    let llm = create_generator(&services.llm, &pipeline.generation)?;
    let deps = PipelineDeps {
        llm,
        scorer: Arc::new(HttpModerationClient::new(
            &services.moderation_url,
            &pipeline.language_code,
        )),
        sentiment: Arc::new(HttpSentimentClient::new(
            &services.sentiment_url,
            &pipeline.language_code,
        )),
    };

    let publisher: Arc<dyn Publish> = match &services.publisher_url {
        Some(url) => Arc::new(HttpPublisher::new(url, &services.topic)),
        None => {
            eprintln!("   Publisher: none configured, envelopes are only logged");
            Arc::new(LogPublisher)
        }
    };

    // ── Pipeline ────────────────────────────────────────────────────────
    let processor = TranslationProcessor::new(&pipeline, deps);
    let mut dispatcher = Dispatcher::new(
        publisher,
        pipeline.image.clone(),
        pipeline.markers.unethical.clone(),
    );
    if let Some(url) = &services.image_url {
        dispatcher = dispatcher.with_images(Arc::new(HttpImageClient::new(url)));
        if let Some(url) = &services.image_moderation_url {
            dispatcher =
                dispatcher.with_image_moderator(Arc::new(HttpImageModerationClient::new(url)));
        }
    }

    let app = api_routes(AppState {
        processor: Arc::new(processor),
        dispatcher: Arc::new(dispatcher),
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", services.port)).await?;
    tracing::info!(port = services.port, "asl-relay listening");
    axum::serve(listener, app).await?;

    Ok(())
}

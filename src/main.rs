use actix_cors::Cors;
use actix_web::{web, App, HttpServer, middleware};
use sentimatch::config::{LoggingSettings, Settings};
use sentimatch::core::{ConversationAnalyzer, LexiconExtractor, Matcher, SentimentExtractor};
use sentimatch::routes::{self, AppState};
use sentimatch::services::{ChatCompletion, OpenAiClient};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let loaded = Settings::load();
    let logging = loaded
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    info!("Starting Sentimatch service...");

    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e));
        }
    };

    info!("Configuration loaded successfully");

    // Sentiment extractor, loaded up front so a bad lexicon shows in the startup log
    let extractor = match &settings.sentiment.lexicon_path {
        Some(path) => LexiconExtractor::from_path(path.clone()),
        None => LexiconExtractor::new(),
    };
    if !extractor.initialize() {
        warn!("Sentiment extractor unavailable, every conversation will score 0.5");
    }

    let mut analyzer = ConversationAnalyzer::new(Arc::new(extractor));
    if let Some(limit) = settings.sentiment.max_messages {
        info!("Conversations longer than {} messages will not be scored", limit);
        analyzer = analyzer.with_message_limit(limit);
    }
    let weights = settings.compatibility_weights();
    let matcher = Matcher::new(analyzer, weights, settings.matching.max_matches);

    info!("Matcher initialized with weights: {:?}", weights);

    let llm = OpenAiClient::new(
        settings.llm.base_url.clone(),
        settings.llm.api_key.clone(),
        settings.llm.model.clone(),
        settings.llm.timeout_secs,
    )
    .map_err(|e| {
        error!("Failed to build language model client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;

    if llm.is_configured() {
        info!("Language model client ready (model {})", llm.model());
    } else {
        warn!("No API key configured, profiles and conversations will use canned content");
    }

    let llm: Arc<dyn ChatCompletion> = Arc::new(llm);
    let app_state = AppState::new(
        llm,
        matcher,
        settings.generation.default_profiles,
        settings.generation.messages_per_conversation,
    );

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_app)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

mod telegram;
mod update;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use sotto_core::{Engine, EngineConfig};
use sotto_db::Database;
use sotto_types::TopicSet;

use crate::telegram::TelegramClient;
use crate::update::Update;

struct Config {
    token: String,
    channel_chat: String,
    webhook_url: Option<String>,
    port: u16,
    db_path: String,
    topics: TopicSet,
    session_ttl: Duration,
}

fn load_config() -> anyhow::Result<Config> {
    let token = std::env::var("SOTTO_BOT_TOKEN")
        .map_err(|_| anyhow::anyhow!("SOTTO_BOT_TOKEN is required in the environment or .env"))?;
    let channel_chat = std::env::var("SOTTO_CHANNEL_CHAT_ID").map_err(|_| {
        anyhow::anyhow!("SOTTO_CHANNEL_CHAT_ID is required in the environment or .env")
    })?;

    let webhook_url = std::env::var("SOTTO_WEBHOOK_URL").ok().filter(|s| !s.is_empty());
    let port: u16 = std::env::var("SOTTO_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let db_path = std::env::var("SOTTO_DB_PATH").unwrap_or_else(|_| "sotto.db".into());

    let topics = match std::env::var("SOTTO_TOPICS") {
        Ok(spec) => spec.parse()?,
        Err(_) => TopicSet::default(),
    };

    let session_ttl = Duration::from_secs(
        std::env::var("SOTTO_SESSION_TTL_SECS")
            .unwrap_or_else(|_| "1800".into())
            .parse()?,
    );

    Ok(Config { token, channel_chat, webhook_url, port, db_path, topics, session_ttl })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sotto=debug,tower_http=debug".into()),
        )
        .init();

    let config = load_config()?;

    let db = Arc::new(Database::open(&PathBuf::from(&config.db_path))?);
    let client = Arc::new(TelegramClient::new(&config.token));
    client.set_my_commands().await?;

    let engine = Arc::new(Engine::new(
        db,
        client.clone(),
        client.clone(),
        EngineConfig {
            channel_chat: config.channel_chat.clone(),
            topics: config.topics.clone(),
        },
    ));

    spawn_session_sweep(engine.clone(), config.session_ttl);

    match &config.webhook_url {
        Some(url) => run_webhook(engine, &client, url, config.port).await,
        None => run_polling(engine, &client).await,
    }
}

/// Abandoned authoring sessions are dropped after the configured idle TTL
/// so the session map cannot grow without bound.
fn spawn_session_sweep(engine: Arc<Engine>, ttl: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let dropped = engine.sessions().purge_idle(ttl).await;
            if dropped > 0 {
                info!("Expired {} idle sessions", dropped);
            }
        }
    });
}

async fn run_webhook(
    engine: Arc<Engine>,
    client: &TelegramClient,
    public_url: &str,
    port: u16,
) -> anyhow::Result<()> {
    client.set_webhook(&format!("{public_url}/webhook")).await?;

    let app = Router::new()
        .route("/webhook", post(receive_update))
        .with_state(engine)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Webhook mode listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn receive_update(
    State(engine): State<Arc<Engine>>,
    Json(update): Json<Update>,
) -> StatusCode {
    update::dispatch(&engine, update).await;
    StatusCode::OK
}

async fn run_polling(engine: Arc<Engine>, client: &TelegramClient) -> anyhow::Result<()> {
    info!("Polling mode started.");

    let mut offset = 0i64;
    loop {
        match client.get_updates(offset, 30).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    update::dispatch(&engine, update).await;
                }
            }
            Err(e) => {
                warn!("getUpdates failed, backing off: {:#}", e);
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
        }
    }
}

use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod allocator;
mod cache;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod shortid;
mod store;

use allocator::Allocator;
use cache::LinkCache;
use shortid::RandomGenerator;
use store::{InMemoryLinkStore, LinkStore, SqliteLinkStore};

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    /// Pool for the to-do tables (and the link table when it is durable).
    pub db: sqlx::SqlitePool,
    pub config: config::AppConfig,
    pub links: Arc<dyn LinkStore>,
    pub allocator: Allocator,
    /// short_id -> target_url, in front of the redirect path.
    pub cache: LinkCache,
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (ignore error if file is absent, env vars may already be set)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shortlist=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::AppConfig::from_env()?;
    tracing::info!("Starting shortlist on {}", config.bind_addr());
    tracing::info!("Base URL: {}", config.base_url);

    // With DATABASE_URL=memory only short links live in process memory; the
    // to-do tables still need SQL, so they get a private in-memory database.
    let (db, links) = if config.uses_memory_store() {
        tracing::warn!("Using in-memory link store, short links will not survive a restart");
        let db = db::connect_in_memory().await?;
        let links: Arc<dyn LinkStore> = Arc::new(InMemoryLinkStore::new());
        (db, links)
    } else {
        let db = db::connect(&config.database_url).await?;
        tracing::info!("Database migrations applied");
        let links: Arc<dyn LinkStore> = Arc::new(SqliteLinkStore::new(db.clone()));
        (db, links)
    };

    let cache = LinkCache::new();
    db::warm_cache(links.as_ref(), &cache).await?;

    let generator = match config.rng_seed {
        Some(seed) => RandomGenerator::seeded(seed, config.short_id_length),
        None => RandomGenerator::new(config.short_id_length),
    };
    tracing::info!(
        "Short ids: {} chars, {} attempts per allocation",
        generator.length(),
        config.max_attempts
    );
    let allocator = Allocator::new(links.clone(), Arc::new(generator))
        .with_max_attempts(config.max_attempts);

    let bind_addr = config.bind_addr();
    let state = Arc::new(AppState {
        db,
        config,
        links,
        allocator,
        cache,
    });

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

// ── Router ─────────────────────────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    let todo_router = Router::new()
        .route("/item", post(handlers::todos::create))
        .route("/items", get(handlers::todos::list))
        .route("/items/stats", get(handlers::todos::stats))
        .route(
            "/item/:id",
            get(handlers::todos::get)
                .put(handlers::todos::update)
                .delete(handlers::todos::delete),
        )
        .route("/item/:id/status", patch(handlers::todos::set_status));

    Router::new()
        .route("/", get(handlers::links::index))
        .route("/health", get(|| async { axum::http::StatusCode::OK }))
        .route("/shorten", post(handlers::links::shorten))
        .route("/stats/:short_id", get(handlers::links::stats))
        .route("/urls/all", get(handlers::links::list_all))
        .route(
            "/delete/:short_id",
            axum::routing::delete(handlers::links::delete),
        )
        .nest("/todo", todo_router)
        // Short-link redirect, static routes above take priority
        .route("/:short_id", get(handlers::redirect::redirect))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

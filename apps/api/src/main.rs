mod auth;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod routes;
mod shortlist;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::SupabaseAuth;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{CompletionService, OpenAiClient};
use crate::routes::build_router;
use crate::shortlist::locks::TenantLocks;
use crate::shortlist::pipeline::ShortlistSettings;
use crate::state::AppState;
use crate::store::PgRecordStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recruit API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    let store = Arc::new(PgRecordStore::new(pool));

    // Initialize completion client; without a key the analysis endpoint answers 500
    let llm: Option<Arc<dyn CompletionService>> = match &config.openai_api_key {
        Some(key) => {
            let client = OpenAiClient::new(
                key.clone(),
                config.openai_base_url.clone(),
                Duration::from_secs(config.openai_timeout_secs),
            )?;
            info!("Completion client initialized (models: {})", config.openai_models.join(", "));
            Some(Arc::new(client))
        }
        None => {
            warn!("OPENAI_API_KEY is not set; candidate analysis is disabled");
            None
        }
    };

    let auth = Arc::new(SupabaseAuth::new(
        config.supabase_url.clone(),
        config.supabase_anon_key.clone(),
    )?);

    let shortlist = ShortlistSettings::new(config.openai_models.clone(), config.shortlist_concurrency);
    info!("Shortlist concurrency: {}", shortlist.max_concurrency);

    // Build app state
    let state = AppState {
        store,
        llm,
        auth,
        shortlist,
        tenant_locks: TenantLocks::default(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

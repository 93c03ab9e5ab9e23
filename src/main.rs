//! Service binary: wires configuration, storage and the billing ticker.
//!
//! The API layer and the real-time transport mount elsewhere; this process
//! owns the one scheduled task that must run independently of request
//! handling.

use std::sync::Arc;

use dotenvy::dotenv;
use seance::config;
use seance::errors::Result;
use seance::presence::PresenceTracker;
use seance::ticker::BillingTicker;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Billing policy (defaults unless config.toml overrides)
    let policy = config::policy::load_default_policy()
        .inspect_err(|e| error!("Failed to load billing policy: {e}"))?;
    info!(
        reader_share_pct = policy.reader_share_pct,
        tick_secs = policy.tick_interval_secs,
        "billing policy loaded"
    );

    // 4. Database (DATABASE_URL or the local default)
    let db = config::database::create_connection()
        .await
        .inspect(|_| info!("Database connected."))
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    // First-run table creation; production deployments migrate out of band
    config::database::create_tables(&db).await?;

    // 5. Shared presence map - the transport refreshes it, the ticker reads it
    let presence = Arc::new(PresenceTracker::new(policy.presence_ttl()));

    // 6. Run the billing ticker until shutdown
    let ticker = BillingTicker::new(db, Arc::clone(&presence), policy);
    let handle = ticker.spawn();
    info!("Billing ticker running.");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down.");
    handle.abort();

    Ok(())
}

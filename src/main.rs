//! Folio - portfolio, research and travel blog backend

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio::{
    auth::{AuthService, JwtValidator, LocalAuth, RestAuth},
    config::Args,
    db::{ContentStore, MemoryStore, RestStore, RestStoreConfig},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("folio={},info", log_level).into()),
        )
        .with(args.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!args.log_json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Folio");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Admins: {}", args.admin_email_list().join(", "));
    info!(
        "Contact relay: {}",
        args.contact_endpoint.as_deref().unwrap_or("(disabled)")
    );
    info!("======================================");

    let (store, auth): (Arc<dyn ContentStore>, Arc<dyn AuthService>) = if args.dev_mode {
        warn!("Using in-memory store; content is lost on restart");
        if args.jwt_secret.is_none() {
            warn!("JWT_SECRET not set, using the built-in development secret");
        }

        let jwt = JwtValidator::new(args.jwt_secret(), args.jwt_expiry_seconds)?;
        let local = LocalAuth::new(jwt);
        local.add_account(&args.dev_admin_email, &args.dev_admin_password)?;

        (Arc::new(MemoryStore::new()), Arc::new(local))
    } else {
        // validate() guarantees both are present outside dev mode
        let config = RestStoreConfig {
            base_url: args.store_url.clone().unwrap_or_default(),
            anon_key: args.store_anon_key.clone().unwrap_or_default(),
            timeout: Duration::from_millis(args.request_timeout_ms),
        };
        info!("Hosted store: {}", config.base_url);

        (
            Arc::new(RestStore::new(config.clone())?),
            Arc::new(RestAuth::new(config)?),
        )
    };

    let state = Arc::new(AppState::new(args, store, auth)?);
    server::run(state).await?;

    Ok(())
}

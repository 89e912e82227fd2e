//! Parking Server Binary
//!
//! Runs the campus parking HTTP service.

use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

use parking_auth::{ApiKeyBackend, ApiKeyInfo, GatewayScope, InMemoryApiKeyBackend, TokenSigner};
use parking_core::{Clock, SystemClock};
use parking_server::{
    create_router, AppState, HttpRegistryClient, MemoryStore, ParkingStore, ServerConfig,
    WebhookNotifier,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to set tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Parking server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig) -> Result<(), BoxError> {
    info!(config = ?config, "Loaded configuration");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Initialize storage
    #[cfg(feature = "postgres")]
    let postgres = match config.database_url.as_deref() {
        Some(url) => Some(parking_server::PostgresStore::new(url).await?),
        None => None,
    };

    #[cfg(feature = "postgres")]
    let store: Arc<dyn ParkingStore> = match &postgres {
        Some(pg) => Arc::new(pg.clone()),
        None => Arc::new(MemoryStore::new()),
    };

    #[cfg(not(feature = "postgres"))]
    let store: Arc<dyn ParkingStore> = {
        if config.database_url.is_some() {
            return Err("PARKING_DATABASE_URL is set but this build lacks the postgres feature".into());
        }
        Arc::new(MemoryStore::new())
    };

    let signer = TokenSigner::new(config.token_secret.as_bytes(), config.token_ttl_minutes, clock.clone())?;

    // Gateway keys
    let api_keys = Arc::new(InMemoryApiKeyBackend::new(clock.clone()));
    let gateway_key = |key_id: &str, owner: &str, scope: GatewayScope| {
        let info = ApiKeyInfo::new(key_id, owner, scope);
        match config.gateway_keys_expire_at {
            Some(expires_at) => info.with_expires_at(expires_at),
            None => info,
        }
    };
    if let Some(key) = &config.police_api_key {
        api_keys.register_key(key.clone(), gateway_key("police", "campus-police", GatewayScope::Police));
    }
    if let Some(key) = &config.registrar_api_key {
        api_keys.register_key(
            key.clone(),
            gateway_key("registrar", "registrar-office", GatewayScope::Registrar),
        );
    }
    info!(
        backend = api_keys.description(),
        key_ids = ?api_keys.list_key_ids(),
        expires_at = ?config.gateway_keys_expire_at,
        "Gateway keys registered"
    );

    let mut builder = AppState::builder(store, signer, clock).with_api_keys(api_keys);

    if let Some(service_key) = &config.service_key {
        builder = builder.with_service_key(service_key.clone());
    }

    if let Some(url) = &config.registry_url {
        let service_key = config
            .service_key
            .as_deref()
            .ok_or("PARKING_REGISTRY_URL requires PARKING_SERVICE_KEY")?;
        let client = Arc::new(HttpRegistryClient::new(url.clone(), service_key, config.upstream_timeout)?);
        builder = builder.with_confirmer(client.clone()).with_owner_lookup(client);
        info!(registry = %url, "Using remote vehicle registry");
    }

    if let Some(url) = &config.notify_webhook_url {
        let notifier = WebhookNotifier::new(url.clone(), config.upstream_timeout)?;
        builder = builder.with_notifier(Arc::new(notifier));
    }

    let state = Arc::new(builder.build());

    if let Some(admin) = &config.bootstrap_admin {
        state.accounts.ensure_admin(&admin.email, &admin.password).await?;
    }

    // Build router
    let app = create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(addr = %addr, "Parking server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    #[cfg(feature = "postgres")]
    if let Some(pg) = postgres {
        pg.close().await;
    }

    info!("Parking server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
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

    info!("Shutdown signal received");
}

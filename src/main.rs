use std::{net::SocketAddr, sync::Arc};

use anyhow::{bail, Context};
use tokio::signal;
use tracing::{error, info, warn};

use marketplace_api as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    if cfg.is_production() && !cfg.has_cors_allowed_origins() && !cfg.cors_allow_any_origin {
        error!("Missing CORS configuration detected");
        bail!(
            "Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS \
             or APP__CORS_ALLOW_ANY_ORIGIN=true"
        );
    }

    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }
    let db = Arc::new(db_pool);

    let (event_sender, event_rx) = api::events::channel(cfg.event_channel_capacity);
    tokio::spawn(api::events::process_events(event_rx));

    let state = api::AppState::new(db, cfg.clone(), event_sender);

    match (&cfg.bootstrap_admin_email, &cfg.bootstrap_admin_password) {
        (Some(email), Some(password)) => {
            let (admin, created) = state
                .services
                .users
                .ensure_admin(email, "Administrator", password)
                .await
                .context("failed to bootstrap admin account")?;
            info!(user_id = %admin.id, created, "Bootstrap admin ready");
        }
        (Some(_), None) | (None, Some(_)) => {
            warn!("Both bootstrap_admin_email and bootstrap_admin_password are needed; skipping");
        }
        (None, None) => {}
    }

    let app = api::app_router(state);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.host, cfg.port))?;
    info!("marketplace-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
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

use axum::{http::HeaderValue, routing::get, Extension, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use marketplace_api::{
    api_v1_routes,
    config::{init_tracing, load_config},
    db,
    events::{event_channel, process_events},
    handlers,
    rate_limiter::{self, RateLimitConfig, RateLimiter},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Arc::new(load_config()?);
    init_tracing(cfg.log_level(), cfg.log_json);
    info!(
        environment = %cfg.environment,
        "starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    // Database
    let pool = db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        db::run_migrations(&pool).await?;
        info!("database migrations applied");
    }
    // Event channel and background consumer
    let (event_sender, event_receiver) = event_channel(cfg.event_channel_capacity);
    tokio::spawn(process_events(event_receiver));

    let app_state = AppState::new(Arc::new(pool), cfg.clone(), Arc::new(event_sender));

    // CORS from config
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    let cors_layer = if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        info!("using permissive CORS (no explicit origins configured)");
        CorsLayer::permissive()
    } else {
        error!("missing CORS configuration; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
        return Err("Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true".into());
    };

    // Rate limiter with periodic cleanup
    let limiter = RateLimiter::new(RateLimitConfig {
        requests_per_window: cfg.rate_limit_requests_per_window,
        window_duration: Duration::from_secs(cfg.rate_limit_window_seconds),
        enable_headers: cfg.rate_limit_enable_headers,
    });
    tokio::spawn(rate_limiter::start_cleanup_task(
        limiter.clone(),
        Duration::from_secs(cfg.rate_limit_window_seconds.max(1) * 2),
    ));

    let app = Router::new()
        .route("/", get(|| async { "marketplace-api up" }))
        .merge(handlers::health::routes())
        .merge(handlers::uploads::routes())
        // Crawlers expect the sitemap at the site root.
        .merge(handlers::seo::public_routes())
        .nest("/api/v1", api_v1_routes())
        .with_state(app_state.clone())
        .layer(Extension(app_state.auth_service.clone()))
        .layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limiter::rate_limit_middleware,
        ))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! Niaga Customer Service.
//!
//! This binary serves the customer API on port 8004.
//!
//! # Architecture
//!
//! - Axum web framework with a JSON API under `/api/v1`
//! - `PostgreSQL` (schema `customer`) for profiles, addresses, measurements,
//!   wishlist items, and back-in-stock subscriptions
//! - Restock events arrive on `/internal/events/{subject}` and are processed
//!   by a background subscriber that calls the notification service
//!
//! # Security
//!
//! Customer and admin routes require an HS256 bearer token. Event deliveries
//! require an HMAC signature.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use niaga_customer_service::{
    app,
    config::{LogFormat, ServiceConfig},
    db::{self, PgStore},
    services::{
        BackInStockRegistry, HttpNotificationClient, LogNotificationSender, NotificationSender,
        RestockNotifier,
        restock::{queue_stream, run_subscriber},
    },
    state::AppState,
};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServiceConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(format: LogFormat) {
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "niaga_customer_service=info,tower_http=debug".into());

    let fmt_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

fn notification_sender(config: &ServiceConfig) -> Arc<dyn NotificationSender> {
    match &config.notification_service_url {
        Some(url) => {
            let client =
                HttpNotificationClient::new(url).expect("Failed to build notification client");
            tracing::info!(endpoint = %client.endpoint(), "Notification service configured");
            Arc::new(client)
        }
        None => {
            tracing::warn!("NOTIFICATION_SERVICE_URL not set; notifications will only be logged");
            Arc::new(LogNotificationSender)
        }
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServiceConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing(config.log_format);

    // Initialize database connection pool
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p niaga-customer-cli -- migrate

    let store = PgStore::new(pool);

    // Restock subscriber: the events route feeds the queue, one event at a time
    let (restock_tx, restock_rx) = mpsc::channel(config.restock_queue_capacity);
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let notifier = RestockNotifier::new(
        BackInStockRegistry::new(Arc::new(store.clone())),
        notification_sender(&config),
        config.restock_timeout,
    );
    let subscriber = tokio::spawn(run_subscriber(
        queue_stream(restock_rx),
        notifier,
        async move {
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        },
    ));

    let addr = config.socket_addr();
    let state = AppState::new(config, store, restock_tx);
    let app = app(state);

    // Start server
    tracing::info!("customer service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    let _ = shutdown_tx.send(true);
    match subscriber.await {
        Ok(handled) => tracing::info!(handled, "Restock subscriber stopped"),
        Err(e) => tracing::error!(error = %e, "Restock subscriber panicked"),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

use std::sync::Arc;
use std::time::Duration;

use salvo::conn::TcpListener;
use salvo::{Listener, Router};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

use almanac_app::app::api::routes;
use almanac_app::config::ConfigHandler;
use almanac_app::service_handler::ScheduleServiceHandler;
use almanac_core::config::load_config;
use almanac_db::db::DbProvider;
use almanac_db::db::connection::create_pool;
use almanac_db::db::migrations::run_migrations;
use almanac_service::notify::PgNotifier;
use almanac_service::reminder::ReminderScanner;
use almanac_service::schedule::{PgScheduleStore, ScheduleService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Almanac scheduling server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    run_migrations(&config.database.url).await?;

    let pool = create_pool(
        &config.database.url,
        u32::from(config.database.max_connections),
    )
    .await?;

    tracing::info!("Database connection pool created.");

    let provider: Arc<dyn DbProvider> = Arc::new(pool);
    let store = Arc::new(PgScheduleStore::new(Arc::clone(&provider)));
    let notifier = Arc::new(PgNotifier::new(provider));
    let horizon_days = config.recurrence.default_horizon_days;

    let service = ScheduleService::new(store.clone(), notifier.clone(), horizon_days)
        .with_max_window_days(config.recurrence.max_window_days);

    let _reminders = if config.reminders.enabled {
        let scanner = Arc::new(ReminderScanner::new(
            store,
            notifier,
            config.reminders.hours_ahead,
            horizon_days,
        ));
        tracing::info!(
            interval_seconds = config.reminders.interval_seconds,
            hours_ahead = config.reminders.hours_ahead,
            "Reminder scanner started"
        );
        Some(scanner.spawn(Duration::from_secs(config.reminders.interval_seconds)))
    } else {
        None
    };

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(ConfigHandler {
            settings: config.clone(),
        })
        .hoop(ScheduleServiceHandler {
            service: Arc::new(service),
        })
        .push(routes()?);

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}

use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use tracing::{error, info, warn};

use remindd_core::{Notifier, RemindConfig};
use remindd_dispatch::Dispatcher;
use remindd_scheduler::{Schedule, Scheduler};
use remindd_store::ReminderStore;
use remindd_telegram::TelegramNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remindd=info".into()),
        )
        .init();

    // load config: explicit REMINDD_CONFIG path > ~/.remindd/remindd.toml
    let config_path = std::env::var("REMINDD_CONFIG").ok();
    let config = RemindConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        RemindConfig::default()
    });

    check_environment(&config)?;

    // open the SQLite database and run the idempotent migrations
    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");
    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    let store = ReminderStore::new(Arc::new(Mutex::new(db)))?;
    info!("database migrations complete");

    let notifier = Arc::new(TelegramNotifier::new(&config.telegram)?);
    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        notifier,
        config.dispatch.clone(),
    ));

    let scheduler = Scheduler::new(std::time::Duration::from_secs(
        config.scheduler.shutdown_grace_secs,
    ));
    register_jobs(&scheduler, &config, store, dispatcher)?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let engine = tokio::spawn(scheduler.clone().run(shutdown_rx));

    let status = scheduler.status();
    info!(jobs = status.jobs.len(), "remindd started");

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received — draining in-flight deliveries");
    let _ = shutdown_tx.send(true);
    engine.await?;
    info!("remindd shutdown complete");
    Ok(())
}

/// Register the three recurring jobs on the shared scheduler.
fn register_jobs<N: Notifier + 'static>(
    scheduler: &Scheduler,
    config: &RemindConfig,
    store: ReminderStore,
    dispatcher: Arc<Dispatcher<N>>,
) -> anyhow::Result<()> {
    scheduler.add_job(
        "reminder_check",
        "Check and send reminders",
        Schedule::Interval {
            every_secs: config.dispatch.interval_secs,
        },
        move || {
            let dispatcher = Arc::clone(&dispatcher);
            Box::pin(async move {
                // A store failure aborts this cycle only; the next window
                // starts fresh.
                if let Err(e) = dispatcher.run_cycle().await {
                    error!(error = %e, "dispatch cycle aborted");
                }
            }) as BoxFuture<'static, ()>
        },
    )?;

    let retention_days = config.maintenance.retention_days;
    let cleanup_store = store.clone();
    scheduler.add_job(
        "daily_cleanup",
        "Daily cleanup and maintenance",
        Schedule::Daily {
            hour: config.maintenance.cleanup_hour,
            minute: config.maintenance.cleanup_minute,
        },
        move || {
            let store = cleanup_store.clone();
            Box::pin(async move {
                if let Err(e) = remindd_dispatch::maintenance::run_cleanup(&store, retention_days) {
                    error!(error = %e, "daily cleanup failed");
                }
            }) as BoxFuture<'static, ()>
        },
    )?;

    scheduler.add_job(
        "stats_update",
        "Update bot statistics",
        Schedule::Interval {
            every_secs: config.maintenance.stats_interval_secs,
        },
        move || {
            let store = store.clone();
            Box::pin(async move {
                if let Err(e) = remindd_dispatch::maintenance::run_stats_refresh(&store) {
                    error!(error = %e, "stats refresh failed");
                }
            }) as BoxFuture<'static, ()>
        },
    )?;

    Ok(())
}

/// Refuse to start without the pieces delivery cannot work without.
fn check_environment(config: &RemindConfig) -> anyhow::Result<()> {
    if config.telegram.bot_token.is_empty() {
        anyhow::bail!("telegram.bot_token is not configured — set it in remindd.toml");
    }
    if config.telegram.admin_chat_id.is_none() {
        warn!("telegram.admin_chat_id not set — admin reports have no destination");
    }
    Ok(())
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(dir = %parent.display(), "could not create database directory: {e}");
        }
    }
}

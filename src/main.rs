//! sessiond: session lifecycle service.
//!
//! Main entry point that wires the crates together and runs the HTTP
//! server, the background worker, or the migrations.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, fmt};

use sessiond_api::{AppState, build_router};
use sessiond_auth::{AccountService, JwtCodec, PasswordHasher, SessionEngine};
use sessiond_cache::provider::SessionCacheManager;
use sessiond_core::config::AppConfig;
use sessiond_core::traits::SessionCache;
use sessiond_database::DatabasePool;
use sessiond_database::migration::run_migrations;
use sessiond_database::repositories::{
    JobRepository, LoginEventRepository, SessionRepository, UserRepository,
};
use sessiond_worker::jobs::{
    BanReconcileHandler, JobCleanupHandler, LoginAuditHandler, SessionExpireHandler,
};
use sessiond_worker::{CronScheduler, JobExecutor, JobQueue, WorkerRunner};

#[derive(Debug, Parser)]
#[command(name = "sessiond", version, about = "Session lifecycle service")]
struct Cli {
    /// Configuration overlay to load from `config/{env}.toml`.
    /// Defaults to `$SESSIOND_ENV`, then `development`.
    #[arg(long)]
    env: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (and the worker when `worker.enabled`).
    Serve,
    /// Run only the background worker and cron scheduler.
    Worker,
    /// Apply database migrations and exit.
    Migrate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let env = cli
        .env
        .clone()
        .or_else(|| std::env::var("SESSIOND_ENV").ok())
        .unwrap_or_else(|| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, version = env!("CARGO_PKG_VERSION"), "Starting sessiond");

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Worker => worker(config).await,
        Command::Migrate => migrate(config).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %format!("{e:#}"), "sessiond exited with error");
        std::process::exit(1);
    }
}

/// Initialize tracing. `RUST_LOG` overrides `logging.level`.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Shared components built from configuration.
struct Components {
    database: DatabasePool,
    cache: Arc<dyn SessionCache>,
    queue: Arc<JobQueue>,
    engine: SessionEngine,
    accounts: AccountService,
}

async fn build_components(config: &AppConfig) -> anyhow::Result<Components> {
    let database = DatabasePool::connect(&config.database)
        .await
        .context("database connection failed")?;
    let pool = database.pool().clone();

    let cache: Arc<dyn SessionCache> = Arc::new(
        SessionCacheManager::new(&config.cache)
            .await
            .context("session store init failed")?,
    );

    let worker_id = format!("worker-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
    let queue = Arc::new(JobQueue::new(
        Arc::new(JobRepository::new(pool.clone())),
        worker_id,
        config.worker.max_attempts,
    ));

    let users = Arc::new(UserRepository::new(pool.clone()));
    let hasher = Arc::new(PasswordHasher::new());

    let engine = SessionEngine::new(
        users.clone(),
        Arc::new(SessionRepository::new(pool.clone())),
        Arc::new(LoginEventRepository::new(pool)),
        Arc::clone(&cache),
        hasher.clone(),
        Arc::new(JwtCodec::new(&config.auth)),
        queue.clone(),
        config.session.clone(),
    );
    let accounts = AccountService::new(users, hasher);

    Ok(Components {
        database,
        cache,
        queue,
        engine,
        accounts,
    })
}

/// Start the runner and cron scheduler. Returns the runner task and the
/// scheduler, which the caller shuts down.
async fn start_worker(
    config: &AppConfig,
    components: &Components,
    cancel: watch::Receiver<bool>,
) -> anyhow::Result<(JoinHandle<()>, CronScheduler)> {
    let mut executor = JobExecutor::new();
    executor.register(Arc::new(SessionExpireHandler::new(components.engine.clone())));
    executor.register(Arc::new(LoginAuditHandler::new(components.engine.clone())));
    executor.register(Arc::new(BanReconcileHandler::new(components.engine.clone())));
    executor.register(Arc::new(JobCleanupHandler::new(Arc::clone(&components.queue))));

    let runner = WorkerRunner::new(
        Arc::clone(&components.queue),
        Arc::new(executor),
        config.worker.clone(),
    );

    let scheduler = CronScheduler::new(Arc::clone(&components.queue), config.worker.clone()).await?;
    scheduler.register_default_tasks().await?;
    scheduler.start().await?;

    let handle = tokio::spawn(async move {
        runner.run(cancel).await;
    });
    Ok((handle, scheduler))
}

async fn stop_worker(handle: JoinHandle<()>, mut scheduler: CronScheduler) {
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Cron scheduler shutdown failed");
    }
    if tokio::time::timeout(Duration::from_secs(35), handle)
        .await
        .is_err()
    {
        tracing::warn!("Worker did not stop in time");
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let components = build_components(&config).await?;
    run_migrations(components.database.pool()).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = if config.worker.enabled {
        Some(start_worker(&config, &components, shutdown_rx.clone()).await?)
    } else {
        tracing::info!("In-process worker disabled");
        None
    };

    let addr = config.server.bind_address();
    if config.server.admin_api_key.is_empty() {
        tracing::warn!("Admin API key is empty, admin endpoints are unguarded");
    }

    let state = AppState {
        config: Arc::new(config),
        engine: components.engine.clone(),
        accounts: components.accounts.clone(),
        cache: Arc::clone(&components.cache),
        database: Some(components.database.clone()),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown");
            let _ = shutdown_tx.send(true);
        })
        .await
        .context("HTTP server error")?;

    if let Some((handle, scheduler)) = worker {
        stop_worker(handle, scheduler).await;
    }
    components.database.close().await;

    tracing::info!("sessiond shut down gracefully");
    Ok(())
}

async fn worker(config: AppConfig) -> anyhow::Result<()> {
    let components = build_components(&config).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (handle, scheduler) = start_worker(&config, &components, shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping worker");
    let _ = shutdown_tx.send(true);

    stop_worker(handle, scheduler).await;
    components.database.close().await;
    Ok(())
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
    let database = DatabasePool::connect(&config.database)
        .await
        .context("database connection failed")?;
    run_migrations(database.pool()).await?;
    database.close().await;
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
}

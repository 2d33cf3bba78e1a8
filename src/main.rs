use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use catalog::{
    application::error::AppError,
    cache::{CacheConfig, ResponseCache},
    config,
    infra::{
        db::PostgresRepositories, error::InfraError, http, http::ApiState,
        memory::InMemoryRepositories, telemetry,
    },
};
use tokio::task::JoinHandle;
use tracing::{Dispatch, Level, debug, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(InfraError::from)?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let cache = Arc::new(ResponseCache::in_memory(CacheConfig::from(&settings.cache)));

    let state = match settings.database.url.as_deref() {
        Some(url) => {
            let repositories = init_postgres(url, &settings).await?;
            info!(target: "catalog::serve", store = "postgres", "store ready");
            ApiState::from_store(repositories, cache.clone())
        }
        None => {
            info!(target: "catalog::serve", store = "memory", "no database url configured");
            ApiState::from_store(Arc::new(InMemoryRepositories::new()), cache.clone())
        }
    };

    let sweeper = spawn_cache_sweeper(cache);
    let result = serve_http(&settings, state).await;

    sweeper.abort();
    let _ = sweeper.await;

    result
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::migration(err.to_string()))?;

    info!(target: "catalog::migrate", "migrations applied");
    Ok(())
}

async fn init_postgres(
    url: &str,
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::migration(err.to_string()))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn spawn_cache_sweeper(cache: Arc<ResponseCache>) -> JoinHandle<()> {
    let period = cache.config().sweep_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            let stats = cache.sweep().await;
            debug!(
                target: "catalog::cache::sweep",
                purged = stats.purged_entries,
                pruned = stats.pruned_keys,
                "cache sweep finished"
            );
        }
    })
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;

    info!(target: "catalog::serve", addr = %settings.server.addr, "listening");

    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
        }
        () = drain_deadline(signalled_rx, grace) => {
            warn!(
                target: "catalog::serve",
                grace_secs = grace.as_secs(),
                "in-flight requests did not finish before the shutdown deadline"
            );
            Ok(())
        }
    }
}

async fn drain_deadline(signalled: tokio::sync::oneshot::Receiver<()>, grace: Duration) {
    if signalled.await.is_ok() {
        tokio::time::sleep(grace).await;
    } else {
        std::future::pending::<()>().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!(target: "catalog::serve", "shutdown signal received");
}

//! `server` command: assemble the pool, services and router, then serve until a signal.

use crate::app::Application;
use crate::cli::ServerCommand;
use crate::config::{validate, Configuration};
use crate::database;
use crate::error::{AppError, ConfigError};
use crate::properties::Properties;
use crate::request_log::{log_requests, RequestLog};
use crate::routes::common_routes;
use crate::services::build_services;
use crate::state::{AppInfo, AppState};
use axum::{middleware, Router};
use std::future::{Future, IntoFuture};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinError;
use tower_http::limit::RequestBodyLimitLayer;

pub const MAX_BODY_BYTES: &str = "server.max_body_bytes";
pub const SHUTDOWN_GRACE_MS: &str = "server.shutdown_grace_ms";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServerSettings {
    pub max_body_bytes: usize,
    /// How long in-flight requests may drain after a shutdown signal.
    pub shutdown_grace: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024,
            shutdown_grace: Duration::from_millis(5000),
        }
    }
}

impl ServerSettings {
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            max_body_bytes: props.parse_or(MAX_BODY_BYTES, defaults.max_body_bytes)?,
            shutdown_grace: props
                .parse::<u64>(SHUTDOWN_GRACE_MS)?
                .map(Duration::from_millis)
                .unwrap_or(defaults.shutdown_grace),
        })
    }
}

pub async fn run<A: Application>(app: &A, command: &ServerCommand) -> Result<(), AppError> {
    let mut config = Configuration::default();
    app.configure(&mut config);
    validate(&config)?;
    let settings = ServerSettings::from_properties(&command.properties)?;

    let pool = database::connect(&command.properties, config.stage()).await?;
    let services = build_services(config.modules(), &pool).await?;
    let state = AppState::new(
        AppInfo::of(app),
        pool,
        command.properties.clone(),
        services,
        config.stage(),
    );
    let router = build_router(app, &config, state, &settings)?;

    let listener = TcpListener::bind(command.addr()).await?;
    tracing::info!(
        app = app.executable_name(),
        addr = %listener.local_addr()?,
        graceful = command.graceful,
        "listening"
    );
    serve(listener, router, command.graceful, settings.shutdown_grace, shutdown_signal()).await
}

/// Common routes, application routes, request log and body limit, in that order.
pub fn build_router<A: Application>(
    app: &A,
    config: &Configuration,
    state: AppState,
    settings: &ServerSettings,
) -> Result<Router, ConfigError> {
    let routes = match config.mount_path() {
        Some(path) if path != "/" => common_routes().nest(path, app.routes()),
        _ => common_routes().merge(app.routes()),
    };
    let request_log = RequestLog::new(config.ignored_paths())?;
    let router = routes
        .layer(RequestBodyLimitLayer::new(settings.max_body_bytes))
        .layer(middleware::from_fn_with_state(request_log, log_requests))
        .with_state(state);
    Ok(app.configure_router(router))
}

/// Serve until `signal` resolves. Graceful shutdown stops accepting and waits up to
/// `grace` for in-flight requests; graceless shutdown drops them immediately.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    graceful: bool,
    grace: Duration,
    signal: F,
) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send,
{
    let (drain_tx, drain_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = drain_rx.await;
    });
    let mut handle = tokio::spawn(server.into_future());

    tokio::select! {
        finished = &mut handle => return join_result(finished),
        () = signal => {}
    }

    if !graceful {
        tracing::info!("shutting down without draining requests");
        handle.abort();
        return Ok(());
    }

    tracing::info!(grace_ms = grace.as_millis() as u64, "draining in-flight requests");
    let _ = drain_tx.send(());
    match tokio::time::timeout(grace, &mut handle).await {
        Ok(finished) => join_result(finished),
        Err(_) => {
            tracing::warn!("drain period elapsed, dropping remaining requests");
            handle.abort();
            Ok(())
        }
    }
}

fn join_result(finished: Result<std::io::Result<()>, JoinError>) -> Result<(), AppError> {
    match finished {
        Ok(result) => result.map_err(AppError::from),
        Err(e) if e.is_cancelled() => Ok(()),
        Err(e) => Err(AppError::Io(std::io::Error::other(e))),
    }
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "unable to listen for SIGINT");
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
                tracing::error!(error = %e, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_to_five_second_drain() {
        let settings = ServerSettings::from_properties(&Properties::new()).unwrap();
        assert_eq!(settings.shutdown_grace, Duration::from_millis(5000));
        assert_eq!(settings.max_body_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn settings_read_overrides() {
        let mut props = Properties::new();
        props.set(SHUTDOWN_GRACE_MS, "250");
        props.set(MAX_BODY_BYTES, "1024");
        let settings = ServerSettings::from_properties(&props).unwrap();
        assert_eq!(settings.shutdown_grace, Duration::from_millis(250));
        assert_eq!(settings.max_body_bytes, 1024);
    }
}

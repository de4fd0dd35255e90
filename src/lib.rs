//! Shore: command line and server bootstrapping for axum + sqlx applications.
//!
//! An application implements [`Application`], registers its entities and modules in
//! [`Application::configure`], and hands control to [`run`]:
//!
//! ```ignore
//! #[tokio::main]
//! async fn main() -> std::process::ExitCode {
//!     shore::run_from_env(Widgets).await
//! }
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod dao;
pub mod database;
pub mod error;
pub mod params;
pub mod properties;
pub mod request_log;
pub mod response;
pub mod routes;
pub mod schema;
pub mod server;
pub mod services;
pub mod state;

pub use app::Application;
pub use cli::{Command, CommandFactory, HelpCommand, SchemaCommand, ServerCommand};
pub use config::{ColumnDef, Configuration, EntityDescriptor, Stage};
pub use dao::Dao;
pub use error::{AppError, ConfigError, PropertiesError};
pub use params::Param;
pub use properties::Properties;
pub use response::created;
pub use services::{Module, Services};
pub use state::{AppInfo, AppState};

use std::ffi::OsStr;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber on stderr, filtered by `RUST_LOG` (default `info`).
/// Does nothing if a subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolve `args` (without the executable path) into a command and execute it.
pub async fn run<A, I, S>(app: A, args: I) -> ExitCode
where
    A: Application,
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    init_tracing();
    let command = CommandFactory::for_app(&app).resolve(args);
    command.execute(&app).await
}

/// [`run`] with the process arguments.
pub async fn run_from_env<A: Application>(app: A) -> ExitCode {
    run(app, std::env::args_os().skip(1)).await
}

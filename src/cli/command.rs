//! Resolved commands. Each is built once by [`CommandFactory`](super::CommandFactory)
//! and consumed once by [`Command::execute`].

use crate::app::Application;
use crate::properties::Properties;
use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help(HelpCommand),
    RunServer(ServerCommand),
    EmitSchema(SchemaCommand),
}

impl Command {
    /// Run the command against `app` and report how the process should exit.
    pub async fn execute<A: Application>(self, app: &A) -> ExitCode {
        match self {
            Command::Help(help) => help.print(),
            Command::RunServer(server) => match crate::server::run(app, &server).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!(error = %e, "server failed");
                    ExitCode::FAILURE
                }
            },
            Command::EmitSchema(schema) => {
                let mut out = std::io::stdout();
                match crate::schema::run(app, &schema, &mut out).await {
                    Ok(()) => ExitCode::SUCCESS,
                    Err(e) => {
                        tracing::error!(error = %e, "schema generation failed");
                        ExitCode::FAILURE
                    }
                }
            }
        }
    }
}

/// Usage text, optionally preceded by the error that caused it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelpCommand {
    usage: String,
    error: Option<String>,
}

impl HelpCommand {
    pub fn new(usage: String, error: Option<String>) -> Self {
        Self { usage, error }
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// `None` when help was explicitly requested.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn text(&self) -> String {
        match &self.error {
            Some(msg) => format!("Error: {}\n\n{}", msg, self.usage),
            None => self.usage.clone(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_error() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }

    pub fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "{}", self.text())?;
        out.flush()
    }

    /// Requested help goes to stdout, help caused by an error to stderr.
    pub fn print(&self) -> ExitCode {
        let written = if self.error.is_some() {
            self.write_to(&mut std::io::stderr().lock())
        } else {
            self.write_to(&mut std::io::stdout().lock())
        };
        if let Err(e) = written {
            tracing::warn!(error = %e, "unable to print usage");
        }
        self.exit_code()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerCommand {
    pub config_path: PathBuf,
    pub properties: Properties,
    pub host: IpAddr,
    pub port: u16,
    /// Drain in-flight requests on shutdown.
    pub graceful: bool,
}

impl ServerCommand {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaCommand {
    pub config_path: PathBuf,
    pub properties: Properties,
    /// Diff against the live database instead of a drop-and-create script.
    pub migration: bool,
}

//! Turns command line arguments into a [`Command`].
//!
//! Resolution is total: every parse or file failure becomes a [`HelpCommand`]
//! carrying an error line, so callers only ever deal with one of three commands.

use super::command::{Command, HelpCommand, SchemaCommand, ServerCommand};
use super::usage;
use crate::app::Application;
use crate::error::PropertiesError;
use crate::properties::Properties;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{value_parser, Arg, ArgAction};
use std::ffi::{OsStr, OsString};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use thiserror::Error;

/// Property naming the interface the server binds to.
pub const HOST_PROPERTY: &str = "server.host";
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unrecognized command: {0}")]
    UnknownCommand(String),
    #[error("{0}")]
    Usage(String),
    #[error("Config file does not exist")]
    FileNotFound,
    #[error("Unable to read config file")]
    FileRead,
    #[error("Invalid port number")]
    InvalidPort,
    #[error("Invalid host address")]
    InvalidHost,
}

impl From<PropertiesError> for ResolveError {
    fn from(err: PropertiesError) -> Self {
        match err {
            PropertiesError::NotFound(_) => ResolveError::FileNotFound,
            _ => ResolveError::FileRead,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Server,
    Schema,
}

impl Mode {
    fn template(self) -> &'static str {
        match self {
            Mode::Server => usage::SERVER,
            Mode::Schema => usage::SCHEMA,
        }
    }

    fn parser(self) -> clap::Command {
        let config = Arg::new("config")
            .short('c')
            .long("config")
            .value_name("FILE")
            .value_parser(value_parser!(PathBuf))
            .action(ArgAction::Set);
        let base = clap::Command::new(self.name())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .arg(config);
        match self {
            Mode::Server => base
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .allow_negative_numbers(true)
                        .action(ArgAction::Set),
                )
                .arg(Arg::new("graceless").long("graceless").action(ArgAction::SetTrue)),
            Mode::Schema => {
                base.arg(Arg::new("migration").long("migration").action(ArgAction::SetTrue))
            }
        }
    }

    fn name(self) -> &'static str {
        match self {
            Mode::Server => "server",
            Mode::Schema => "schema",
        }
    }

    /// Short names of the options this mode cannot run without.
    fn required(self) -> &'static [(&'static str, char)] {
        match self {
            Mode::Server => &[("config", 'c'), ("port", 'p')],
            Mode::Schema => &[("config", 'c')],
        }
    }
}

#[derive(Clone, Debug)]
pub struct CommandFactory {
    executable_name: String,
}

impl CommandFactory {
    pub fn new(executable_name: impl Into<String>) -> Self {
        Self {
            executable_name: executable_name.into(),
        }
    }

    pub fn for_app<A: Application>(app: &A) -> Self {
        Self::new(app.executable_name())
    }

    pub fn executable_name(&self) -> &str {
        &self.executable_name
    }

    /// Resolve `args` (without the executable path) into exactly one command.
    pub fn resolve<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|s| s.as_ref().to_os_string()).collect();
        let Some((first, rest)) = args.split_first() else {
            return Command::Help(self.help(usage::TOP_LEVEL, None));
        };
        let mode = match first.to_str() {
            Some("server") => Mode::Server,
            Some("schema") => Mode::Schema,
            Some("-h" | "--help") => return Command::Help(self.help(usage::TOP_LEVEL, None)),
            _ => {
                let err = ResolveError::UnknownCommand(first.to_string_lossy().into_owned());
                return Command::Help(self.help(usage::TOP_LEVEL, Some(err)));
            }
        };
        if is_help_request(rest) {
            return Command::Help(self.help(mode.template(), None));
        }
        match resolve_mode(mode, rest) {
            Ok(command) => command,
            Err(err) => {
                tracing::debug!(mode = mode.name(), error = %err, "unable to resolve command");
                Command::Help(self.help(mode.template(), Some(err)))
            }
        }
    }

    fn help(&self, template: &str, error: Option<ResolveError>) -> HelpCommand {
        HelpCommand::new(
            usage::render(template, &self.executable_name),
            error.map(|e| e.to_string()),
        )
    }
}

fn is_help_request(rest: &[OsString]) -> bool {
    match rest {
        [] => true,
        [only] => only == "-h" || only == "--help",
        _ => false,
    }
}

fn resolve_mode(mode: Mode, rest: &[OsString]) -> Result<Command, ResolveError> {
    let matches = mode
        .parser()
        .try_get_matches_from(rest)
        .map_err(|e| ResolveError::Usage(describe_parse_error(&e)))?;

    let missing: Vec<String> = mode
        .required()
        .iter()
        .filter(|(id, _)| !matches.contains_id(id))
        .map(|(_, short)| short.to_string())
        .collect();
    match missing.as_slice() {
        [] => {}
        [one] => return Err(ResolveError::Usage(format!("Missing required option: {one}"))),
        many => {
            return Err(ResolveError::Usage(format!(
                "Missing required options: {}",
                many.join(", ")
            )))
        }
    }

    let config_path = matches.get_one::<PathBuf>("config").cloned().unwrap_or_default();
    match mode {
        Mode::Server => {
            let port = matches
                .get_one::<String>("port")
                .map(String::as_str)
                .unwrap_or_default()
                .trim()
                .parse::<u16>()
                .map_err(|_| ResolveError::InvalidPort)?;
            let properties = Properties::load(&config_path)?;
            let host = match properties.get(HOST_PROPERTY) {
                Some(raw) => raw.trim().parse::<IpAddr>().map_err(|_| ResolveError::InvalidHost)?,
                None => DEFAULT_HOST,
            };
            Ok(Command::RunServer(ServerCommand {
                config_path,
                properties,
                host,
                port,
                graceful: !matches.get_flag("graceless"),
            }))
        }
        Mode::Schema => {
            let properties = Properties::load(&config_path)?;
            Ok(Command::EmitSchema(SchemaCommand {
                config_path,
                properties,
                migration: matches.get_flag("migration"),
            }))
        }
    }
}

fn describe_parse_error(err: &clap::Error) -> String {
    let invalid = match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(s)) => Some(option_name(s)),
        _ => None,
    };
    match (err.kind(), invalid) {
        (ErrorKind::UnknownArgument, Some(arg)) => format!("Unrecognized option: {arg}"),
        (ErrorKind::InvalidValue | ErrorKind::NoEquals, Some(arg)) => {
            format!("Missing argument for option: {arg}")
        }
        (ErrorKind::ArgumentConflict, Some(arg)) => format!("Option given more than once: {arg}"),
        (kind, _) => kind.as_str().unwrap_or("Invalid arguments").to_string(),
    }
}

/// `--port <PORT>` becomes `--port`.
fn option_name(rendered: &str) -> &str {
    rendered.split_whitespace().next().unwrap_or(rendered)
}

//! Usage templates. `{app}` is replaced with the executable name.

pub const APP_PLACEHOLDER: &str = "{app}";

pub const TOP_LEVEL: &str = "usage: {app} <subcommand> [options]

Available subcommands:
   server    Run {app} as an HTTP server.
   schema    Generate a database schema for {app}.

Type '{app} <subcommand> --help' for help on a specific subcommand.";

pub const SERVER: &str = "usage: {app} server -c <file> -p <port> [--graceless]
   -c, --config=FILE    Which config file to use
   -p, --port=PORT      Which port to bind to
   --graceless          Stop immediately instead of draining requests";

pub const SCHEMA: &str = "usage: {app} schema -c <file> [--migration]
   -c, --config=FILE    Which config file to use
   --migration          Generate a migration script";

pub fn render(template: &str, app: &str) -> String {
    template.replace(APP_PLACEHOLDER, app)
}

//! The trait a downstream application implements.

use crate::config::Configuration;
use crate::state::AppState;
use axum::Router;

/// Everything shore needs to know about an application.
///
/// ```ignore
/// struct Widgets;
///
/// impl Application for Widgets {
///     fn executable_name(&self) -> &str {
///         "widgets"
///     }
///
///     fn configure(&self, config: &mut Configuration) {
///         config
///             .add_entity(widget_entity())
///             .add_module(WidgetModule)
///             .do_not_log_requests_for("/health");
///     }
///
///     fn routes(&self) -> Router<AppState> {
///         Router::new().route("/widget/:name", get(show).post(create))
///     }
/// }
/// ```
pub trait Application: Send + Sync + 'static {
    /// Substituted into usage text.
    fn executable_name(&self) -> &str;

    /// Reported by `GET /version`. Usually `env!("CARGO_PKG_VERSION")` of the application crate.
    fn version(&self) -> &str {
        "unknown"
    }

    /// Register entities, modules and server settings. Called once per command.
    fn configure(&self, config: &mut Configuration);

    fn routes(&self) -> Router<AppState> {
        Router::new()
    }

    /// Last chance to wrap the assembled router, e.g. with extra tower layers.
    fn configure_router(&self, router: Router) -> Router {
        router
    }
}

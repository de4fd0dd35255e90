//! Shared application state for all routes.

use crate::app::Application;
use crate::config::Stage;
use crate::error::AppError;
use crate::properties::Properties;
use crate::services::Services;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

/// Name and version reported by `/version`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
}

impl AppInfo {
    pub fn of<A: Application>(app: &A) -> Self {
        Self {
            name: app.executable_name().to_string(),
            version: app.version().to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub info: Arc<AppInfo>,
    pub pool: PgPool,
    pub properties: Arc<Properties>,
    pub services: Arc<Services>,
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        info: AppInfo,
        pool: PgPool,
        properties: Properties,
        services: Services,
        stage: Stage,
    ) -> Self {
        Self {
            info: Arc::new(info),
            pool,
            properties: Arc::new(properties),
            services: Arc::new(services),
            stage,
            started_at: Utc::now(),
        }
    }

    /// Look up a service registered by a module.
    pub fn service<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, AppError> {
        self.services.require::<T>()
    }
}

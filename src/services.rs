//! Service registry. Modules fill it at start-up; handlers read it through [`AppState`](crate::AppState).

use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Services {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service`, replacing any earlier value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, service: T) -> &mut Self {
        self.insert_arc(Arc::new(service))
    }

    pub fn insert_arc<T: Send + Sync + 'static>(&mut self, service: Arc<T>) -> &mut Self {
        if self.entries.insert(TypeId::of::<T>(), service).is_some() {
            tracing::warn!(service = type_name::<T>(), "service replaced");
        }
        self
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|s| s.downcast::<T>().ok())
    }

    pub fn require<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, AppError> {
        self.get::<T>().ok_or(AppError::MissingService(type_name::<T>()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").field("count", &self.entries.len()).finish()
    }
}

/// A unit of service wiring, run once per server start in registration order.
#[async_trait]
pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    async fn register(&self, services: &mut Services, pool: &PgPool) -> Result<(), AppError>;
}

/// Run every module against a fresh registry.
pub async fn build_services(modules: &[Box<dyn Module>], pool: &PgPool) -> Result<Services, AppError> {
    let mut services = Services::new();
    for module in modules {
        let before = services.len();
        module.register(&mut services, pool).await.map_err(|e| match e {
            AppError::Module { .. } => e,
            other => AppError::Module {
                module: module.name().to_string(),
                reason: other.to_string(),
            },
        })?;
        tracing::info!(
            module = module.name(),
            added = services.len().saturating_sub(before),
            "module registered"
        );
    }
    Ok(services)
}

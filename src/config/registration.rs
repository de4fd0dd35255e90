//! What an application registers before a command runs.

use crate::config::EntityDescriptor;
use crate::services::Module;
use std::fmt;

/// Controls how eagerly resources are acquired at start-up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    /// Pool connects on first use; the server starts even if the database is down.
    #[default]
    Development,
    /// Pool connects before the listener binds; start-up fails fast.
    Production,
}

/// Registration lists filled by [`Application::configure`](crate::Application::configure).
/// Every list keeps insertion order.
#[derive(Default)]
pub struct Configuration {
    entities: Vec<EntityDescriptor>,
    modules: Vec<Box<dyn Module>>,
    ignored_paths: Vec<String>,
    stage: Stage,
    mount_path: Option<String>,
}

impl Configuration {
    pub fn add_entity(&mut self, entity: EntityDescriptor) -> &mut Self {
        self.entities.push(entity);
        self
    }

    pub fn add_module(&mut self, module: impl Module + 'static) -> &mut Self {
        self.modules.push(Box::new(module));
        self
    }

    /// Skip request logging for `spec`: an exact path, `/prefix/*` or `*.suffix`.
    pub fn do_not_log_requests_for(&mut self, spec: impl Into<String>) -> &mut Self {
        self.ignored_paths.push(spec.into());
        self
    }

    pub fn set_stage(&mut self, stage: Stage) -> &mut Self {
        self.stage = stage;
        self
    }

    /// Nest application routes under `path` instead of `/`.
    pub fn set_mount_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.mount_path = Some(path.into());
        self
    }

    pub fn entities(&self) -> &[EntityDescriptor] {
        &self.entities
    }

    pub fn modules(&self) -> &[Box<dyn Module>] {
        &self.modules
    }

    pub fn ignored_paths(&self) -> &[String] {
        &self.ignored_paths
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn mount_path(&self) -> Option<&str> {
        self.mount_path.as_deref()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("entities", &self.entities)
            .field(
                "modules",
                &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("ignored_paths", &self.ignored_paths)
            .field("stage", &self.stage)
            .field("mount_path", &self.mount_path)
            .finish()
    }
}

//! Registration validation: entity shape and uniqueness.

use crate::config::{Configuration, EntityDescriptor};
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(config: &Configuration) -> Result<(), ConfigError> {
    if let Some(path) = config.mount_path() {
        if !path.starts_with('/') || (path.len() > 1 && path.ends_with('/')) {
            return Err(ConfigError::InvalidMountPath(path.to_string()));
        }
    }
    let mut tables = HashSet::new();
    for entity in config.entities() {
        validate_entity(entity)?;
        if !tables.insert(entity.qualified_name()) {
            return Err(ConfigError::DuplicateEntity(entity.qualified_name()));
        }
    }
    Ok(())
}

fn validate_entity(entity: &EntityDescriptor) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidEntity {
        table: entity.qualified_name(),
        reason: reason.to_string(),
    };
    if entity.table.trim().is_empty() {
        return Err(invalid("table name is empty"));
    }
    if entity.columns.is_empty() {
        return Err(invalid("no columns"));
    }
    if entity.primary_key_columns().next().is_none() {
        return Err(invalid("no primary key column"));
    }
    let mut names = HashSet::new();
    for c in &entity.columns {
        if !names.insert(c.name.as_str()) {
            return Err(invalid(&format!("column {} declared twice", c.name)));
        }
        if c.primary_key && c.nullable {
            return Err(invalid(&format!("primary key column {} is nullable", c.name)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnDef;

    fn widgets() -> EntityDescriptor {
        EntityDescriptor::new("widgets")
            .column(ColumnDef::new("id", "BIGSERIAL").primary_key())
            .column(ColumnDef::new("name", "TEXT").not_null())
    }

    #[test]
    fn accepts_well_formed_entities() {
        let mut config = Configuration::default();
        config.add_entity(widgets());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn rejects_duplicate_tables() {
        let mut config = Configuration::default();
        config.add_entity(widgets());
        config.add_entity(widgets());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::DuplicateEntity(name)) if name == "public.widgets"
        ));
    }

    #[test]
    fn rejects_relative_mount_paths() {
        let mut config = Configuration::default();
        config.set_mount_path("api");
        assert!(matches!(validate(&config), Err(ConfigError::InvalidMountPath(_))));
        config.set_mount_path("/api");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn rejects_entities_without_primary_key() {
        let mut config = Configuration::default();
        config.add_entity(EntityDescriptor::new("notes").column(ColumnDef::new("body", "TEXT")));
        assert!(matches!(validate(&config), Err(ConfigError::InvalidEntity { .. })));
    }
}

//! `schema` command: SQL scripts for the registered entities.
//! The full script drops and recreates every table; the migration script only adds
//! the tables and columns the live database is missing.

use crate::app::Application;
use crate::cli::SchemaCommand;
use crate::config::{validate, ColumnDef, Configuration, EntityDescriptor};
use crate::database::DatabaseSettings;
use crate::error::AppError;
use crate::properties::Properties;
use sqlx::PgPool;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Write;

pub const FULL_HEADER: &str = "/* full drop-and-create script */";
pub const MIGRATION_HEADER: &str = "/* migration script */";

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified(entity: &EntityDescriptor) -> String {
    format!("{}.{}", quote(&entity.schema), quote(&entity.table))
}

fn column_def(c: &ColumnDef) -> String {
    let mut def = format!("{} {}", quote(&c.name), c.sql_type);
    if !c.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(ref d) = c.default {
        def.push_str(" DEFAULT ");
        def.push_str(d);
    }
    def
}

pub fn create_table(entity: &EntityDescriptor) -> String {
    let mut col_defs: Vec<String> = entity.columns.iter().map(column_def).collect();
    let pk_cols: Vec<String> = entity.primary_key_columns().map(|c| quote(&c.name)).collect();
    if !pk_cols.is_empty() {
        col_defs.push(format!("PRIMARY KEY ({})", pk_cols.join(", ")));
    }
    format!("CREATE TABLE {} (\n  {}\n)", qualified(entity), col_defs.join(",\n  "))
}

pub fn drop_table(entity: &EntityDescriptor) -> String {
    format!("DROP TABLE IF EXISTS {} CASCADE", qualified(entity))
}

/// Schemas other than `public` that the entities live in, in first-seen order.
fn extra_schemas<'a>(entities: impl IntoIterator<Item = &'a EntityDescriptor>) -> Vec<String> {
    let mut seen = HashSet::new();
    entities
        .into_iter()
        .map(|e| e.schema.as_str())
        .filter(|s| *s != "public" && seen.insert(*s))
        .map(|s| format!("CREATE SCHEMA IF NOT EXISTS {}", quote(s)))
        .collect()
}

/// Drops in reverse registration order, then creates in registration order.
pub fn full_script(entities: &[EntityDescriptor]) -> Vec<String> {
    let mut statements: Vec<String> = entities.iter().rev().map(drop_table).collect();
    statements.extend(extra_schemas(entities));
    statements.extend(entities.iter().map(create_table));
    statements
}

/// Columns already present, keyed by (schema, table).
pub type ExistingColumns = HashMap<(String, String), BTreeSet<String>>;

pub fn migration_script(entities: &[EntityDescriptor], existing: &ExistingColumns) -> Vec<String> {
    let missing_tables: Vec<&EntityDescriptor> = entities
        .iter()
        .filter(|e| !existing.contains_key(&(e.schema.clone(), e.table.clone())))
        .collect();
    let mut statements = extra_schemas(missing_tables.iter().copied());
    for entity in entities {
        match existing.get(&(entity.schema.clone(), entity.table.clone())) {
            None => statements.push(create_table(entity)),
            Some(columns) => {
                for c in entity.columns.iter().filter(|c| !columns.contains(&c.name)) {
                    statements.push(format!(
                        "ALTER TABLE {} ADD COLUMN {}",
                        qualified(entity),
                        column_def(c)
                    ));
                }
            }
        }
    }
    statements
}

pub fn print_sql(out: &mut impl Write, statements: &[String]) -> std::io::Result<()> {
    for sql in statements {
        writeln!(out, "{};", sql)?;
    }
    Ok(())
}

async fn existing_columns(pool: &PgPool, entities: &[EntityDescriptor]) -> Result<ExistingColumns, AppError> {
    let schemas: Vec<String> = entities
        .iter()
        .map(|e| e.schema.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let sql = "SELECT table_schema::text, table_name::text, column_name::text \
               FROM information_schema.columns WHERE table_schema = ANY($1)";
    tracing::debug!(sql = %sql, "query");
    let rows = sqlx::query_as::<_, (String, String, String)>(sql)
        .bind(schemas)
        .fetch_all(pool)
        .await?;
    let mut existing = ExistingColumns::new();
    for (schema, table, column) in rows {
        existing.entry((schema, table)).or_default().insert(column);
    }
    Ok(existing)
}

async fn connect(props: &Properties) -> Result<PgPool, AppError> {
    let settings = DatabaseSettings::from_properties(props)?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(settings.connect_options()?)
        .await?;
    Ok(pool)
}

pub async fn run<A: Application>(
    app: &A,
    command: &SchemaCommand,
    out: &mut impl Write,
) -> Result<(), AppError> {
    let mut config = Configuration::default();
    app.configure(&mut config);
    validate(&config)?;
    let entities = config.entities();
    tracing::info!(entities = entities.len(), migration = command.migration, "generating schema");

    if !command.migration {
        writeln!(out, "{}", FULL_HEADER)?;
        print_sql(out, &full_script(entities))?;
        out.flush()?;
        return Ok(());
    }

    let existing = match connect(&command.properties).await {
        Ok(pool) => {
            let existing = existing_columns(&pool, entities).await;
            pool.close().await;
            existing
        }
        Err(e) => Err(e),
    };
    match existing {
        Ok(existing) => {
            writeln!(out, "{}", MIGRATION_HEADER)?;
            print_sql(out, &migration_script(entities, &existing))?;
            out.flush()?;
            Ok(())
        }
        Err(e) => {
            writeln!(out, "Error: unable to connect to the database.\n")?;
            writeln!(out, "{}", e)?;
            out.flush()?;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widgets() -> EntityDescriptor {
        EntityDescriptor::new("widgets")
            .column(ColumnDef::new("id", "BIGSERIAL").primary_key())
            .column(ColumnDef::new("name", "TEXT").not_null())
            .column(ColumnDef::new("description", "TEXT"))
    }

    #[test]
    fn create_table_lists_columns_then_primary_key() {
        assert_eq!(
            create_table(&widgets()),
            "CREATE TABLE \"public\".\"widgets\" (\n  \"id\" BIGSERIAL NOT NULL,\n  \"name\" TEXT NOT NULL,\n  \"description\" TEXT,\n  PRIMARY KEY (\"id\")\n)"
        );
    }

    #[test]
    fn quotes_embedded_double_quotes() {
        assert_eq!(quote("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn migration_adds_missing_columns_only() {
        let mut existing = ExistingColumns::new();
        existing.insert(
            ("public".into(), "widgets".into()),
            ["id", "name"].iter().map(|s| s.to_string()).collect(),
        );
        let statements = migration_script(&[widgets()], &existing);
        assert_eq!(
            statements,
            vec!["ALTER TABLE \"public\".\"widgets\" ADD COLUMN \"description\" TEXT".to_string()]
        );
    }

    #[test]
    fn migration_creates_missing_tables_and_schemas() {
        let audit = EntityDescriptor::new("events")
            .in_schema("audit")
            .column(ColumnDef::new("id", "UUID").primary_key());
        let statements = migration_script(&[audit], &ExistingColumns::new());
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "CREATE SCHEMA IF NOT EXISTS \"audit\"");
        assert!(statements[1].starts_with("CREATE TABLE \"audit\".\"events\""));
    }
}

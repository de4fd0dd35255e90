//! Widgets: a small application built on shore.
//!
//! Print the schema: `cargo run -p widgets -- schema -c example_consumer/widgets.properties`
//! Serve: `cargo run -p widgets -- server -c example_consumer/widgets.properties -p 8080`

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use shore::{
    created, AppError, AppState, Application, ColumnDef, Configuration, Dao, EntityDescriptor,
    Module, Services,
};
use sqlx::PgPool;
use std::fmt;
use std::process::ExitCode;

#[derive(Debug, sqlx::FromRow)]
struct Widget {
    name: String,
    description: Option<String>,
}

impl fmt::Display for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Widget name:{}, description:{}]",
            self.name,
            self.description.as_deref().unwrap_or("")
        )
    }
}

fn widget_entity() -> EntityDescriptor {
    EntityDescriptor::new("widgets")
        .column(ColumnDef::new("id", "BIGSERIAL").primary_key())
        .column(ColumnDef::new("name", "TEXT").not_null())
        .column(ColumnDef::new("description", "TEXT"))
}

struct WidgetDao {
    dao: Dao,
}

impl WidgetDao {
    async fn find_by_name(&self, name: &str) -> Result<Option<Widget>, AppError> {
        let widget = sqlx::query_as::<_, Widget>(
            "SELECT name, description FROM widgets WHERE name = $1 ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(self.dao.pool())
        .await?;
        Ok(widget)
    }

    async fn save(&self, widget: &Widget) -> Result<(), AppError> {
        let mut tx = self.dao.begin().await?;
        sqlx::query("DELETE FROM widgets WHERE name = $1")
            .bind(&widget.name)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO widgets (name, description) VALUES ($1, $2)")
            .bind(&widget.name)
            .bind(&widget.description)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

struct WidgetModule;

#[async_trait]
impl Module for WidgetModule {
    fn name(&self) -> &str {
        "widgets"
    }

    async fn register(&self, services: &mut Services, pool: &PgPool) -> Result<(), AppError> {
        services.insert(WidgetDao {
            dao: Dao::new(pool.clone()),
        });
        Ok(())
    }
}

async fn show(State(state): State<AppState>, Path(name): Path<String>) -> Result<String, AppError> {
    let widgets = state.service::<WidgetDao>()?;
    match widgets.find_by_name(&name).await? {
        Some(widget) => Ok(widget.to_string()),
        None => Err(AppError::NotFound(format!("widget {name}"))),
    }
}

async fn create(
    State(state): State<AppState>,
    Path(name): Path<String>,
    description: String,
) -> Result<Response, AppError> {
    let widgets = state.service::<WidgetDao>()?;
    let widget = Widget {
        name,
        description: Some(description),
    };
    widgets.save(&widget).await?;
    tracing::info!(name = %widget.name, "widget saved");
    Ok(created(&format!("/widget/{}", widget.name)))
}

struct Widgets;

impl Application for Widgets {
    fn executable_name(&self) -> &str {
        "widgets"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn configure(&self, config: &mut Configuration) {
        config
            .add_entity(widget_entity())
            .add_module(WidgetModule)
            .do_not_log_requests_for("/health");
    }

    fn routes(&self) -> Router<AppState> {
        Router::new().route("/widget/:name", get(show).post(create))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    shore::run_from_env(Widgets).await
}

//! Base for data access objects.

use sqlx::{PgPool, Postgres, Transaction};

/// Embed in a DAO to get at the pool. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct Dao {
    pool: PgPool,
}

impl Dao {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Start a unit of work. Dropped without `commit` it rolls back.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }
}

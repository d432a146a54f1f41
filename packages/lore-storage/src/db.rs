use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Result, schema};

// Transaction-scoped advisory lock key for schema bootstrap.
const SCHEMA_LOCK_ID: i64 = 9_314_207;

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &lore_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	/// Applies the schema inside one transaction. Concurrent bootstrappers
	/// queue on the advisory lock, and every statement is `IF NOT EXISTS`,
	/// so running this on each startup is safe.
	pub async fn ensure_schema(&self) -> Result<()> {
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)")
			.bind(SCHEMA_LOCK_ID)
			.execute(&mut *tx)
			.await?;

		for statement in schema::SCHEMA_SQL.split(';').map(str::trim) {
			if statement.is_empty() {
				continue;
			}

			sqlx::query(statement).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}

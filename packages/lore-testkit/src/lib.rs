mod error;

pub use error::{Error, Result};

use std::{collections::HashSet, env, str::FromStr, sync::Mutex, thread, time::Duration};

use qdrant_client::Qdrant;
use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::{runtime::Builder, time};
use uuid::Uuid;

// Maintenance databases to try when creating or dropping test databases.
const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];
const QDRANT_OP_TIMEOUT: Duration = Duration::from_secs(10);

/// One throwaway Postgres database plus the Qdrant collections handed out
/// for it. Torn down eagerly via [`cleanup`](Self::cleanup) or best-effort
/// on [`Drop`].
pub struct TestDatabase {
	database: String,
	dsn: String,
	base: PgConnectOptions,
	collections: Mutex<HashSet<String>>,
	cleaned: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error(format!("Failed to parse LORE_PG_DSN: {err}.")))?;
		let database = format!("lore_test_{}", Uuid::new_v4().simple());
		let mut admin = admin_connection(&base).await?;

		admin
			.execute(format!(r#"CREATE DATABASE "{database}""#).as_str())
			.await
			.map_err(|err| Error(format!("Failed to create test database: {err}.")))?;

		let dsn = base.clone().database(&database).to_url_lossy().to_string();

		Ok(Self { database, dsn, base, collections: Mutex::new(HashSet::new()), cleaned: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	/// Returns a collection name scoped to this database and remembers it for
	/// teardown. Deterministic per prefix, so repeated calls share one
	/// collection.
	pub fn collection_name(&self, prefix: &str) -> String {
		let collection = format!("{prefix}_{}", self.database);

		self.collections.lock().unwrap_or_else(|err| err.into_inner()).insert(collection.clone());

		collection
	}

	pub async fn cleanup(mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		let outcome = teardown(&self.database, &self.base, &self.tracked_collections()).await;

		self.cleaned = true;

		outcome
	}

	fn tracked_collections(&self) -> Vec<String> {
		self.collections.lock().unwrap_or_else(|err| err.into_inner()).iter().cloned().collect()
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let database = self.database.clone();
		let base = self.base.clone();
		let collections = self.tracked_collections();
		// Drop is synchronous, so the async teardown runs on its own
		// single-threaded runtime.
		let sweeper = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test cleanup runtime failed: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(teardown(&database, &base, &collections)) {
				eprintln!("Test cleanup failed: {err}.");
			}
		});
		let _ = sweeper.join();
	}
}

pub fn env_dsn() -> Option<String> {
	env::var("LORE_PG_DSN").ok()
}

pub fn env_qdrant_url() -> Option<String> {
	env::var("LORE_QDRANT_URL").ok()
}

async fn admin_connection(base: &PgConnectOptions) -> Result<PgConnection> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		match PgConnection::connect_with(&base.clone().database(database)).await {
			Ok(conn) => return Ok(conn),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error(format!("Failed to connect to a maintenance database: {last_err:?}.")))
}

async fn teardown(database: &str, base: &PgConnectOptions, collections: &[String]) -> Result<()> {
	let qdrant_outcome = drop_collections(collections).await;
	let db_outcome = drop_database(database, base).await;

	db_outcome?;
	qdrant_outcome
}

async fn drop_database(database: &str, base: &PgConnectOptions) -> Result<()> {
	let mut admin = admin_connection(base).await?;

	// Lingering pool connections would otherwise block DROP DATABASE.
	let _ = sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(database)
	.fetch_all(&mut admin)
	.await;

	sqlx::query(format!(r#"DROP DATABASE IF EXISTS "{database}""#).as_str())
		.execute(&mut admin)
		.await
		.map_err(|err| Error(format!("Failed to drop test database: {err}.")))?;

	Ok(())
}

async fn drop_collections(collections: &[String]) -> Result<()> {
	if collections.is_empty() {
		return Ok(());
	}

	let Some(url) = env_qdrant_url() else {
		eprintln!("Skipping Qdrant cleanup; set LORE_QDRANT_URL to delete test collections.");

		return Ok(());
	};
	let client = Qdrant::from_url(&url)
		.build()
		.map_err(|err| Error(format!("Failed to build Qdrant client: {err}.")))?;

	for collection in collections {
		drop_collection(&client, collection).await?;
	}

	Ok(())
}

async fn drop_collection(client: &Qdrant, collection: &str) -> Result<()> {
	const ATTEMPTS: u32 = 4;

	let mut wait = Duration::from_millis(150);

	for attempt in 1..=ATTEMPTS {
		let exists = time::timeout(QDRANT_OP_TIMEOUT, client.collection_exists(collection))
			.await
			.map_err(|_| Error("Qdrant collection_exists timed out.".to_string()))?
			.map_err(|err| {
				Error(format!("Failed to probe Qdrant collection {collection:?}: {err}."))
			})?;

		if !exists {
			return Ok(());
		}

		match time::timeout(QDRANT_OP_TIMEOUT, client.delete_collection(collection)).await {
			Ok(Ok(_)) => return Ok(()),
			Ok(Err(err)) if attempt == ATTEMPTS =>
				return Err(Error(format!(
					"Failed to delete Qdrant collection {collection:?} after {ATTEMPTS} attempts: {err}."
				))),
			Err(_) if attempt == ATTEMPTS =>
				return Err(Error(format!(
					"Timed out deleting Qdrant collection {collection:?} after {ATTEMPTS} attempts."
				))),
			_ => {
				time::sleep(wait).await;

				wait = wait.saturating_mul(2).min(Duration::from_secs(2));
			},
		}
	}

	Ok(())
}

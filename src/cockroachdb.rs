//! CockroachDB-backed schema access.
//!
//! CockroachDB has no session-level switch for constraint enforcement: there
//! is no trigger machinery behind foreign keys, so nothing like PostgreSQL's
//! `DISABLE TRIGGER ALL` exists to turn checks off. Suspending integrity on
//! CockroachDB therefore means physically dropping the constraints and
//! re-creating them afterwards, which is the protocol this crate implements.
//!
//! For everything this crate touches, CockroachDB behaves like PostgreSQL:
//! it speaks the same wire protocol, exposes `pg_catalog.pg_constraint` with
//! the same columns, and reports duplicate constraint names with the same
//! SQLSTATE (`42710`). [`CockroachSchema`] therefore delegates wholesale to
//! an inner [`PostgresSchema`]; CockroachDB-specific divergence would live
//! here if one appeared.

use async_trait::async_trait;

use crate::error::IntegrityResult;
use crate::foreign_key::ForeignKeyDefinition;
use crate::postgres::PostgresSchema;
use crate::schema::{SchemaCatalog, SchemaMutator};

/// Schema access over a CockroachDB connection pool.
///
/// # Examples
///
/// ```no_run
/// use refint::{CockroachSchema, IntegrityToggle};
///
/// # async fn example() {
/// let schema = CockroachSchema::connect("postgres://root@localhost:26257/app")
/// 	.await
/// 	.unwrap();
/// let toggle = IntegrityToggle::new(schema);
///
/// toggle
/// 	.with_integrity_disabled(|| async move {
/// 		// Load fixtures in any order here.
/// 		Ok::<_, anyhow::Error>(())
/// 	})
/// 	.await
/// 	.unwrap();
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(example());
/// ```
#[derive(Debug, Clone)]
pub struct CockroachSchema {
	inner: PostgresSchema,
}

impl CockroachSchema {
	/// Wraps existing PostgreSQL-style schema access.
	pub fn new(inner: PostgresSchema) -> Self {
		Self { inner }
	}

	/// Connects to the cluster and creates schema access over a new pool.
	pub async fn connect(url: &str) -> IntegrityResult<Self> {
		Ok(Self::new(PostgresSchema::connect(url).await?))
	}

	/// Scopes catalog reads and DDL to the given schema instead of
	/// `public`.
	pub fn with_schema_name(mut self, schema_name: impl Into<String>) -> Self {
		self.inner = self.inner.with_schema_name(schema_name);
		self
	}

	/// Returns the schema this handle is scoped to.
	pub fn schema_name(&self) -> &str {
		self.inner.schema_name()
	}

	/// Returns the underlying PostgreSQL-style access, for callers that
	/// want the generated SQL.
	pub fn postgres(&self) -> &PostgresSchema {
		&self.inner
	}
}

#[async_trait]
impl SchemaCatalog for CockroachSchema {
	async fn table_names(&self) -> IntegrityResult<Vec<String>> {
		self.inner.table_names().await
	}

	async fn foreign_keys(&self, table: &str) -> IntegrityResult<Vec<ForeignKeyDefinition>> {
		self.inner.foreign_keys(table).await
	}
}

#[async_trait]
impl SchemaMutator for CockroachSchema {
	async fn drop_foreign_key(&self, table: &str, constraint: &str) -> IntegrityResult<()> {
		self.inner.drop_foreign_key(table, constraint).await
	}

	async fn add_foreign_key(&self, foreign_key: &ForeignKeyDefinition) -> IntegrityResult<()> {
		self.inner.add_foreign_key(foreign_key).await
	}
}

//! PostgreSQL-backed schema access.
//!
//! [`PostgresSchema`] implements both capability traits over a connection
//! pool: it enumerates tables and foreign keys straight from `pg_catalog`
//! and issues `ALTER TABLE` statements to drop and re-create constraints.
//! Duplicate constraint names are recognized by SQLSTATE and classified into
//! [`IntegrityError::DuplicateConstraint`], so callers never need to inspect
//! driver error types.

use std::sync::Arc;

use async_trait::async_trait;
use pg_escape::quote_identifier;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};

use crate::error::{IntegrityError, IntegrityResult};
use crate::foreign_key::{DeferrableOption, ForeignKeyAction, ForeignKeyDefinition};
use crate::schema::{SchemaCatalog, SchemaMutator};

/// SQLSTATE for `duplicate_object`, reported by both PostgreSQL and
/// CockroachDB when a constraint name is already taken.
const DUPLICATE_OBJECT: &str = "42710";

const FOREIGN_KEY_QUERY: &str = r#"
SELECT
	con.conname AS name,
	ref.relname AS referenced_table,
	ref_nsp.nspname AS referenced_schema,
	con.condeferrable AS deferrable,
	con.condeferred AS deferred,
	con.convalidated AS validated,
	con.confdeltype::text AS on_delete,
	con.confupdtype::text AS on_update,
	(
		SELECT array_agg(att.attname::text ORDER BY array_position(con.conkey, att.attnum))
		FROM pg_catalog.pg_attribute att
		WHERE att.attrelid = con.conrelid AND att.attnum = ANY (con.conkey)
	) AS columns,
	(
		SELECT array_agg(att.attname::text ORDER BY array_position(con.confkey, att.attnum))
		FROM pg_catalog.pg_attribute att
		WHERE att.attrelid = con.confrelid AND att.attnum = ANY (con.confkey)
	) AS referenced_columns
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class tbl ON tbl.oid = con.conrelid
JOIN pg_catalog.pg_namespace nsp ON nsp.oid = tbl.relnamespace
JOIN pg_catalog.pg_class ref ON ref.oid = con.confrelid
JOIN pg_catalog.pg_namespace ref_nsp ON ref_nsp.oid = ref.relnamespace
WHERE con.contype = 'f' AND nsp.nspname = $1 AND tbl.relname = $2
ORDER BY con.conname
"#;

/// Schema access over a PostgreSQL connection pool.
///
/// Scoped to a single schema, `public` unless overridden with
/// [`with_schema_name`](PostgresSchema::with_schema_name). Foreign keys must
/// stay inside that schema: a constraint referencing a table in another
/// schema fails the catalog read, because the captured definition could not
/// re-create it. Handles are cheap clones sharing the pool.
///
/// # Examples
///
/// ```no_run
/// use refint::{IntegrityToggle, PostgresSchema};
///
/// # async fn example() {
/// let schema = PostgresSchema::connect("postgres://localhost/app")
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
pub struct PostgresSchema {
	pool: Arc<PgPool>,
	schema_name: String,
}

impl PostgresSchema {
	/// Creates schema access over an existing pool.
	pub fn new(pool: PgPool) -> Self {
		Self::from_pool_arc(Arc::new(pool))
	}

	/// Creates schema access over a shared pool.
	pub fn from_pool_arc(pool: Arc<PgPool>) -> Self {
		Self {
			pool,
			schema_name: "public".to_string(),
		}
	}

	/// Connects to the database and creates schema access over a new pool.
	pub async fn connect(url: &str) -> IntegrityResult<Self> {
		let pool = PgPool::connect(url)
			.await
			.map_err(|e| IntegrityError::Connection(e.to_string()))?;
		Ok(Self::new(pool))
	}

	/// Scopes catalog reads and DDL to the given schema instead of
	/// `public`.
	pub fn with_schema_name(mut self, schema_name: impl Into<String>) -> Self {
		self.schema_name = schema_name.into();
		self
	}

	/// Returns the schema this handle is scoped to.
	pub fn schema_name(&self) -> &str {
		&self.schema_name
	}

	fn qualified_table(&self, table: &str) -> String {
		format!(
			"{}.{}",
			quote_identifier(&self.schema_name),
			quote_identifier(table)
		)
	}

	/// Builds the `ALTER TABLE ... DROP CONSTRAINT` statement issued by
	/// [`drop_foreign_key`](SchemaMutator::drop_foreign_key).
	///
	/// No `IF EXISTS`: a missing constraint must fail.
	///
	/// # Examples
	///
	/// ```no_run
	/// use refint::PostgresSchema;
	/// use sqlx::postgres::PgPool;
	///
	/// let pool = PgPool::connect_lazy("postgresql://localhost/app").unwrap();
	/// let schema = PostgresSchema::new(pool);
	///
	/// assert_eq!(
	/// 	schema.drop_foreign_key_sql("orders", "fk_orders_customer"),
	/// 	"ALTER TABLE public.orders DROP CONSTRAINT fk_orders_customer"
	/// );
	/// ```
	pub fn drop_foreign_key_sql(&self, table: &str, constraint: &str) -> String {
		format!(
			"ALTER TABLE {} DROP CONSTRAINT {}",
			self.qualified_table(table),
			quote_identifier(constraint)
		)
	}

	/// Builds the `ALTER TABLE ... ADD CONSTRAINT` statement issued by
	/// [`add_foreign_key`](SchemaMutator::add_foreign_key).
	///
	/// Emits `ON DELETE`/`ON UPDATE` only for non-default actions, the
	/// deferrable clause only for deferrable constraints, and `NOT VALID`
	/// for definitions captured from an unvalidated constraint.
	///
	/// # Examples
	///
	/// ```no_run
	/// use refint::{ForeignKeyAction, ForeignKeyDefinition, PostgresSchema};
	/// use sqlx::postgres::PgPool;
	///
	/// let pool = PgPool::connect_lazy("postgresql://localhost/app").unwrap();
	/// let schema = PostgresSchema::new(pool);
	/// let foreign_key = ForeignKeyDefinition::single_column(
	/// 	"orders",
	/// 	"fk_orders_customer",
	/// 	"customer_id",
	/// 	"customers",
	/// 	"id",
	/// )
	/// .with_on_delete(ForeignKeyAction::Cascade);
	///
	/// assert_eq!(
	/// 	schema.add_foreign_key_sql(&foreign_key),
	/// 	"ALTER TABLE public.orders ADD CONSTRAINT fk_orders_customer \
	/// 	 FOREIGN KEY (customer_id) REFERENCES public.customers(id) \
	/// 	 ON DELETE CASCADE"
	/// );
	/// ```
	pub fn add_foreign_key_sql(&self, foreign_key: &ForeignKeyDefinition) -> String {
		let columns = foreign_key
			.columns
			.iter()
			.map(|column| quote_identifier(column))
			.collect::<Vec<_>>()
			.join(", ");
		let referenced_columns = foreign_key
			.referenced_columns
			.iter()
			.map(|column| quote_identifier(column))
			.collect::<Vec<_>>()
			.join(", ");

		let mut sql = format!(
			"ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
			self.qualified_table(&foreign_key.table),
			quote_identifier(&foreign_key.name),
			columns,
			self.qualified_table(&foreign_key.referenced_table),
			referenced_columns,
		);
		if let Some(action) = foreign_key.on_delete {
			sql.push_str(&format!(" ON DELETE {}", action.to_sql_keyword()));
		}
		if let Some(action) = foreign_key.on_update {
			sql.push_str(&format!(" ON UPDATE {}", action.to_sql_keyword()));
		}
		if let Some(deferrable) = foreign_key.deferrable {
			sql.push_str(&format!(" {}", deferrable));
		}
		if !foreign_key.validate {
			sql.push_str(" NOT VALID");
		}
		sql
	}
}

#[async_trait]
impl SchemaCatalog for PostgresSchema {
	async fn table_names(&self) -> IntegrityResult<Vec<String>> {
		let rows = sqlx::query(
			"SELECT tablename FROM pg_catalog.pg_tables WHERE schemaname = $1 ORDER BY tablename",
		)
		.bind(&self.schema_name)
		.fetch_all(self.pool.as_ref())
		.await
		.map_err(|e| IntegrityError::CatalogRead(format!("Failed to list tables: {}", e)))?;

		let mut names = Vec::with_capacity(rows.len());
		for row in &rows {
			let name: String = row.try_get("tablename").map_err(|e| {
				IntegrityError::CatalogRead(format!("Failed to decode table name: {}", e))
			})?;
			names.push(name);
		}
		Ok(names)
	}

	async fn foreign_keys(&self, table: &str) -> IntegrityResult<Vec<ForeignKeyDefinition>> {
		let rows = sqlx::query(FOREIGN_KEY_QUERY)
			.bind(&self.schema_name)
			.bind(table)
			.fetch_all(self.pool.as_ref())
			.await
			.map_err(|e| {
				IntegrityError::CatalogRead(format!(
					"Failed to fetch foreign keys for table {}: {}",
					table, e
				))
			})?;

		let mut foreign_keys = Vec::with_capacity(rows.len());
		for row in &rows {
			foreign_keys.push(foreign_key_from_row(&self.schema_name, table, row)?);
		}
		Ok(foreign_keys)
	}
}

#[async_trait]
impl SchemaMutator for PostgresSchema {
	async fn drop_foreign_key(&self, table: &str, constraint: &str) -> IntegrityResult<()> {
		let sql = self.drop_foreign_key_sql(table, constraint);
		sqlx::query(&sql)
			.execute(self.pool.as_ref())
			.await
			.map_err(|e| IntegrityError::ConstraintDrop {
				table: table.to_string(),
				constraint: constraint.to_string(),
				message: e.to_string(),
			})?;
		Ok(())
	}

	async fn add_foreign_key(&self, foreign_key: &ForeignKeyDefinition) -> IntegrityResult<()> {
		let sql = self.add_foreign_key_sql(foreign_key);
		sqlx::query(&sql)
			.execute(self.pool.as_ref())
			.await
			.map_err(|e| {
				if is_duplicate_object(&e) {
					IntegrityError::DuplicateConstraint {
						table: foreign_key.table.clone(),
						constraint: foreign_key.name.clone(),
					}
				} else {
					IntegrityError::ConstraintAdd {
						table: foreign_key.table.clone(),
						constraint: foreign_key.name.clone(),
						message: e.to_string(),
					}
				}
			})?;
		Ok(())
	}
}

fn foreign_key_from_row(
	schema_name: &str,
	table: &str,
	row: &PgRow,
) -> IntegrityResult<ForeignKeyDefinition> {
	let name: String = row.try_get("name").map_err(|e| decode_error(table, e))?;
	let referenced_table: String = row
		.try_get("referenced_table")
		.map_err(|e| decode_error(table, e))?;
	let referenced_schema: String = row
		.try_get("referenced_schema")
		.map_err(|e| decode_error(table, e))?;
	let columns: Vec<String> = row.try_get("columns").map_err(|e| decode_error(table, e))?;
	let referenced_columns: Vec<String> = row
		.try_get("referenced_columns")
		.map_err(|e| decode_error(table, e))?;
	let deferrable: bool = row
		.try_get("deferrable")
		.map_err(|e| decode_error(table, e))?;
	let deferred: bool = row.try_get("deferred").map_err(|e| decode_error(table, e))?;
	let validated: bool = row
		.try_get("validated")
		.map_err(|e| decode_error(table, e))?;
	let on_delete: String = row
		.try_get("on_delete")
		.map_err(|e| decode_error(table, e))?;
	let on_update: String = row
		.try_get("on_update")
		.map_err(|e| decode_error(table, e))?;

	// The definition has no field for a foreign namespace; rebuilt DDL would
	// requalify the reference into the handle's schema.
	if referenced_schema != schema_name {
		return Err(IntegrityError::CatalogRead(format!(
			"Foreign key {} on table {} references {}.{} outside schema {}",
			name, table, referenced_schema, referenced_table, schema_name
		)));
	}

	Ok(ForeignKeyDefinition {
		table: table.to_string(),
		name,
		columns,
		referenced_table,
		referenced_columns,
		on_delete: referential_action(&on_delete),
		on_update: referential_action(&on_update),
		deferrable: deferrable_option(deferrable, deferred),
		validate: validated,
	})
}

fn decode_error(table: &str, error: sqlx::Error) -> IntegrityError {
	IntegrityError::CatalogRead(format!(
		"Failed to decode foreign key row for table {}: {}",
		table, error
	))
}

/// Maps a `pg_constraint` action code to its referential action. `a`
/// (NO ACTION) is the default and maps to `None`.
fn referential_action(code: &str) -> Option<ForeignKeyAction> {
	match code {
		"r" => Some(ForeignKeyAction::Restrict),
		"c" => Some(ForeignKeyAction::Cascade),
		"n" => Some(ForeignKeyAction::SetNull),
		"d" => Some(ForeignKeyAction::SetDefault),
		_ => None,
	}
}

fn deferrable_option(deferrable: bool, deferred: bool) -> Option<DeferrableOption> {
	match (deferrable, deferred) {
		(false, _) => None,
		(true, false) => Some(DeferrableOption::Immediate),
		(true, true) => Some(DeferrableOption::Deferred),
	}
}

fn is_duplicate_object(error: &sqlx::Error) -> bool {
	match error {
		sqlx::Error::Database(database) => database.code().as_deref() == Some(DUPLICATE_OBJECT),
		_ => false,
	}
}

//! In-memory schema for exercising integrity workflows without a database.
//!
//! [`MemorySchema`] models just enough of a catalog to run the full
//! suspend/restore protocol: named tables in creation order, each carrying
//! its foreign key constraints in creation order. There is no row data and
//! nothing is actually enforced; the point is observable DDL behavior,
//! including the failure modes a live backend would produce (duplicate
//! constraint names, drops of missing constraints, references to missing
//! tables).
//!
//! Handles are cheap clones sharing one state, so a test can keep a handle
//! while an [`IntegrityToggle`](crate::toggle::IntegrityToggle) owns another.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::error::{IntegrityError, IntegrityResult};
use crate::foreign_key::ForeignKeyDefinition;
use crate::schema::{SchemaCatalog, SchemaMutator};

/// An in-memory implementation of [`SchemaCatalog`] and [`SchemaMutator`].
///
/// # Examples
///
/// ```
/// use refint::{ForeignKeyDefinition, MemorySchema, SchemaCatalog, SchemaMutator};
///
/// # tokio_test::block_on(async {
/// let schema = MemorySchema::new();
/// schema.create_table("customers");
/// schema.create_table("orders");
/// schema
/// 	.add_foreign_key(&ForeignKeyDefinition::single_column(
/// 		"orders",
/// 		"fk_orders_customer",
/// 		"customer_id",
/// 		"customers",
/// 		"id",
/// 	))
/// 	.await
/// 	.unwrap();
///
/// assert_eq!(schema.table_names().await.unwrap(), vec!["customers", "orders"]);
/// assert_eq!(schema.foreign_keys("orders").await.unwrap().len(), 1);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySchema {
	inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
	tables: IndexMap<String, Vec<ForeignKeyDefinition>>,
	ddl_log: Vec<String>,
}

impl MemorySchema {
	/// Creates an empty schema.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a table with no constraints. Creating an existing table is a
	/// no-op.
	pub fn create_table(&self, name: impl Into<String>) {
		let mut state = self.inner.lock();
		state.tables.entry(name.into()).or_insert_with(Vec::new);
	}

	/// Removes a table and the constraints it declares. Constraints on other
	/// tables that reference it are left in place; re-adding them later
	/// fails the way a live backend would.
	pub fn drop_table(&self, name: &str) {
		let mut state = self.inner.lock();
		state.tables.shift_remove(name);
	}

	/// Returns every mutation issued so far, oldest first, as
	/// `"drop table.constraint"` / `"add table.constraint"` entries.
	///
	/// Tests use this to assert that all drops precede all re-adds and that
	/// both follow snapshot order.
	pub fn ddl_log(&self) -> Vec<String> {
		self.inner.lock().ddl_log.clone()
	}
}

#[async_trait]
impl SchemaCatalog for MemorySchema {
	async fn table_names(&self) -> IntegrityResult<Vec<String>> {
		Ok(self.inner.lock().tables.keys().cloned().collect())
	}

	async fn foreign_keys(&self, table: &str) -> IntegrityResult<Vec<ForeignKeyDefinition>> {
		Ok(self
			.inner
			.lock()
			.tables
			.get(table)
			.cloned()
			.unwrap_or_default())
	}
}

#[async_trait]
impl SchemaMutator for MemorySchema {
	async fn drop_foreign_key(&self, table: &str, constraint: &str) -> IntegrityResult<()> {
		let mut state = self.inner.lock();
		let Some(constraints) = state.tables.get_mut(table) else {
			return Err(IntegrityError::ConstraintDrop {
				table: table.to_string(),
				constraint: constraint.to_string(),
				message: format!("relation \"{}\" does not exist", table),
			});
		};
		let Some(position) = constraints.iter().position(|fk| fk.name == constraint) else {
			return Err(IntegrityError::ConstraintDrop {
				table: table.to_string(),
				constraint: constraint.to_string(),
				message: format!(
					"constraint \"{}\" of relation \"{}\" does not exist",
					constraint, table
				),
			});
		};
		constraints.remove(position);
		state.ddl_log.push(format!("drop {}.{}", table, constraint));
		Ok(())
	}

	async fn add_foreign_key(&self, foreign_key: &ForeignKeyDefinition) -> IntegrityResult<()> {
		let mut state = self.inner.lock();
		if !state.tables.contains_key(&foreign_key.referenced_table) {
			return Err(IntegrityError::ConstraintAdd {
				table: foreign_key.table.clone(),
				constraint: foreign_key.name.clone(),
				message: format!(
					"referenced relation \"{}\" does not exist",
					foreign_key.referenced_table
				),
			});
		}
		let Some(constraints) = state.tables.get_mut(&foreign_key.table) else {
			return Err(IntegrityError::ConstraintAdd {
				table: foreign_key.table.clone(),
				constraint: foreign_key.name.clone(),
				message: format!("relation \"{}\" does not exist", foreign_key.table),
			});
		};
		if constraints.iter().any(|existing| existing.name == foreign_key.name) {
			return Err(IntegrityError::DuplicateConstraint {
				table: foreign_key.table.clone(),
				constraint: foreign_key.name.clone(),
			});
		}
		constraints.push(foreign_key.clone());
		state
			.ddl_log
			.push(format!("add {}.{}", foreign_key.table, foreign_key.name));
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fk(table: &str, name: &str, referenced_table: &str) -> ForeignKeyDefinition {
		ForeignKeyDefinition::single_column(table, name, "ref_id", referenced_table, "id")
	}

	#[tokio::test]
	async fn test_table_names_keep_creation_order() {
		let schema = MemorySchema::new();
		schema.create_table("zones");
		schema.create_table("accounts");
		schema.create_table("migrations");

		assert_eq!(
			schema.table_names().await.unwrap(),
			vec!["zones", "accounts", "migrations"]
		);
	}

	#[tokio::test]
	async fn test_foreign_keys_keep_add_order() {
		let schema = MemorySchema::new();
		schema.create_table("orders");
		schema.create_table("customers");
		schema.create_table("addresses");
		schema.add_foreign_key(&fk("orders", "fk_b", "customers")).await.unwrap();
		schema.add_foreign_key(&fk("orders", "fk_a", "addresses")).await.unwrap();

		let names: Vec<String> = schema
			.foreign_keys("orders")
			.await
			.unwrap()
			.into_iter()
			.map(|foreign_key| foreign_key.name)
			.collect();
		assert_eq!(names, vec!["fk_b", "fk_a"]);
	}

	#[tokio::test]
	async fn test_unknown_table_has_no_foreign_keys() {
		let schema = MemorySchema::new();
		assert!(schema.foreign_keys("missing").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_duplicate_add_is_classified() {
		let schema = MemorySchema::new();
		schema.create_table("orders");
		schema.create_table("customers");
		schema.add_foreign_key(&fk("orders", "fk_dup", "customers")).await.unwrap();

		let result = schema.add_foreign_key(&fk("orders", "fk_dup", "customers")).await;
		assert!(matches!(
			result,
			Err(IntegrityError::DuplicateConstraint { ref constraint, .. })
				if constraint == "fk_dup"
		));
	}

	#[tokio::test]
	async fn test_add_rejects_missing_referenced_table() {
		let schema = MemorySchema::new();
		schema.create_table("orders");

		let result = schema.add_foreign_key(&fk("orders", "fk_nowhere", "ghosts")).await;
		let error = result.unwrap_err();
		assert!(matches!(error, IntegrityError::ConstraintAdd { .. }));
		assert!(error.to_string().contains("referenced relation \"ghosts\""));
	}

	#[tokio::test]
	async fn test_add_rejects_missing_owning_table() {
		let schema = MemorySchema::new();
		schema.create_table("customers");

		let result = schema.add_foreign_key(&fk("ghosts", "fk_nowhere", "customers")).await;
		assert!(matches!(result, Err(IntegrityError::ConstraintAdd { .. })));
	}

	#[tokio::test]
	async fn test_drop_missing_constraint_fails() {
		let schema = MemorySchema::new();
		schema.create_table("orders");

		let result = schema.drop_foreign_key("orders", "fk_missing").await;
		let error = result.unwrap_err();
		assert!(matches!(error, IntegrityError::ConstraintDrop { .. }));
		assert!(error.to_string().contains("constraint \"fk_missing\""));
	}

	#[tokio::test]
	async fn test_drop_removes_only_the_named_constraint() {
		let schema = MemorySchema::new();
		schema.create_table("orders");
		schema.create_table("customers");
		schema.add_foreign_key(&fk("orders", "fk_keep", "customers")).await.unwrap();
		schema.add_foreign_key(&fk("orders", "fk_drop", "customers")).await.unwrap();

		schema.drop_foreign_key("orders", "fk_drop").await.unwrap();

		let names: Vec<String> = schema
			.foreign_keys("orders")
			.await
			.unwrap()
			.into_iter()
			.map(|foreign_key| foreign_key.name)
			.collect();
		assert_eq!(names, vec!["fk_keep"]);
	}

	#[tokio::test]
	async fn test_ddl_log_records_mutations_in_order() {
		let schema = MemorySchema::new();
		schema.create_table("orders");
		schema.create_table("customers");
		schema.add_foreign_key(&fk("orders", "fk_log", "customers")).await.unwrap();
		schema.drop_foreign_key("orders", "fk_log").await.unwrap();

		assert_eq!(
			schema.ddl_log(),
			vec!["add orders.fk_log".to_string(), "drop orders.fk_log".to_string()]
		);
	}

	#[tokio::test]
	async fn test_drop_table_keeps_constraints_declared_elsewhere() {
		let schema = MemorySchema::new();
		schema.create_table("customers");
		schema.create_table("orders");
		schema.add_foreign_key(&fk("orders", "fk_orders_customer", "customers")).await.unwrap();

		schema.drop_table("customers");

		assert_eq!(schema.table_names().await.unwrap(), vec!["orders"]);
		// The declaring table still lists its constraint; re-adding it
		// after a drop would fail against the missing referenced table.
		assert_eq!(schema.foreign_keys("orders").await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_clones_share_state() {
		let schema = MemorySchema::new();
		let observer = schema.clone();
		schema.create_table("orders");

		assert_eq!(observer.table_names().await.unwrap(), vec!["orders"]);
	}
}

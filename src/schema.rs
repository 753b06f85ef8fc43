//! Capability traits separating catalog reads from schema mutations.
//!
//! [`IntegrityToggle`](crate::toggle::IntegrityToggle) is generic over a
//! schema handle implementing both traits, so the suspend/restore protocol
//! can run against a live database or against
//! [`MemorySchema`](crate::memory::MemorySchema) in tests. Both traits are
//! object safe.

use async_trait::async_trait;

use crate::error::IntegrityResult;
use crate::foreign_key::ForeignKeyDefinition;

/// Read-only access to the table and constraint catalog of one schema.
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
	/// Lists the user tables of the schema, in a deterministic order.
	///
	/// The order returned here fixes the snapshot order of the protocol:
	/// constraints are dropped and restored in table order, then per-table
	/// constraint order.
	async fn table_names(&self) -> IntegrityResult<Vec<String>>;

	/// Lists the foreign key constraints declared on `table`, in a
	/// deterministic order, as complete reconstructible definitions.
	///
	/// A table unknown to the schema yields an empty list, matching what a
	/// live catalog reports. A constraint whose referenced table lies
	/// outside the handle's scope has no reconstructible definition and
	/// fails the read with [`IntegrityError::CatalogRead`].
	///
	/// [`IntegrityError::CatalogRead`]: crate::error::IntegrityError::CatalogRead
	async fn foreign_keys(&self, table: &str) -> IntegrityResult<Vec<ForeignKeyDefinition>>;
}

/// DDL-level mutation of foreign key constraints.
#[async_trait]
pub trait SchemaMutator: Send + Sync {
	/// Drops the named constraint from `table`.
	///
	/// Fails if the constraint does not exist; there is no `IF EXISTS`
	/// fallback. The protocol relies on this to surface drift between the
	/// snapshot and the actual schema.
	async fn drop_foreign_key(&self, table: &str, constraint: &str) -> IntegrityResult<()>;

	/// Creates the constraint described by `foreign_key` on its owning
	/// table.
	///
	/// Fails with [`IntegrityError::DuplicateConstraint`] when a constraint
	/// of that name already exists on the table, and with other variants for
	/// definitions the database rejects (missing referenced table, column
	/// type mismatch, rows violating the constraint).
	///
	/// [`IntegrityError::DuplicateConstraint`]: crate::error::IntegrityError::DuplicateConstraint
	async fn add_foreign_key(&self, foreign_key: &ForeignKeyDefinition) -> IntegrityResult<()>;
}

//! Error types for integrity toggling operations.
//!
//! Every fallible operation in this crate returns [`IntegrityResult`], and the
//! variant of [`IntegrityError`] tells the caller which phase of the protocol
//! failed and what state the schema was left in. There is no rollback: the
//! documentation on each variant spells out which constraints are still
//! dropped when it surfaces.

use thiserror::Error;

/// Errors produced while suspending or restoring foreign key constraints.
#[derive(Error, Debug)]
pub enum IntegrityError {
	/// Connecting to the database failed. Nothing was read or mutated.
	#[error("Connection failed: {0}")]
	Connection(String),

	/// Reading table or constraint metadata from the catalog failed.
	///
	/// When this surfaces from the snapshot phase, nothing was mutated. When
	/// it surfaces from duplicate verification during restore, constraints
	/// later in the restore order are left dropped.
	#[error("Catalog read failed: {0}")]
	CatalogRead(String),

	/// Dropping a constraint failed.
	///
	/// Constraints dropped before this one stay dropped, the unit of work is
	/// never invoked, and no restore is attempted.
	#[error("Failed to drop constraint {constraint} on table {table}: {message}")]
	ConstraintDrop {
		/// Table that owns the constraint.
		table: String,
		/// Name of the constraint that could not be dropped.
		constraint: String,
		/// Error text reported by the database.
		message: String,
	},

	/// Adding a constraint failed because one with the same name already
	/// exists on that table.
	///
	/// During restore this is recovered internally when the existing
	/// definition matches the captured one; it only reaches callers who use
	/// a schema backend directly.
	#[error("Constraint {constraint} already exists on table {table}")]
	DuplicateConstraint {
		/// Table that owns the constraint.
		table: String,
		/// Name of the conflicting constraint.
		constraint: String,
	},

	/// A constraint with the captured name already exists but its definition
	/// differs from the snapshot.
	///
	/// The divergent constraint is left in place and constraints later in
	/// the restore order are left dropped.
	#[error("Constraint {constraint} on table {table} exists with a different definition")]
	ConstraintMismatch {
		/// Table that owns the constraint.
		table: String,
		/// Name of the divergent constraint.
		constraint: String,
	},

	/// Re-creating a constraint failed for a reason other than a duplicate
	/// name.
	///
	/// Constraints earlier in the restore order were restored; this one and
	/// everything after it are left dropped.
	#[error("Failed to add constraint {constraint} on table {table}: {message}")]
	ConstraintAdd {
		/// Table that owns the constraint.
		table: String,
		/// Name of the constraint that could not be re-created.
		constraint: String,
		/// Error text reported by the database.
		message: String,
	},

	/// The unit of work itself failed.
	///
	/// Restore is skipped entirely: every captured constraint remains
	/// dropped. The original error and its cause chain pass through
	/// unchanged.
	#[error(transparent)]
	Work(#[from] anyhow::Error),
}

/// Result alias used throughout the crate.
pub type IntegrityResult<T> = Result<T, IntegrityError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;

	#[rstest]
	fn test_connection_display() {
		let error = IntegrityError::Connection("refused".to_string());
		assert_eq!(error.to_string(), "Connection failed: refused");
	}

	#[rstest]
	fn test_catalog_read_display() {
		let error = IntegrityError::CatalogRead("Failed to list tables: timeout".to_string());
		assert_eq!(
			error.to_string(),
			"Catalog read failed: Failed to list tables: timeout"
		);
	}

	#[rstest]
	fn test_constraint_drop_display_names_table_and_constraint() {
		let error = IntegrityError::ConstraintDrop {
			table: "orders".to_string(),
			constraint: "fk_orders_customer".to_string(),
			message: "permission denied".to_string(),
		};
		assert_eq!(
			error.to_string(),
			"Failed to drop constraint fk_orders_customer on table orders: permission denied"
		);
	}

	#[rstest]
	fn test_duplicate_constraint_display() {
		let error = IntegrityError::DuplicateConstraint {
			table: "orders".to_string(),
			constraint: "fk_orders_customer".to_string(),
		};
		assert_eq!(
			error.to_string(),
			"Constraint fk_orders_customer already exists on table orders"
		);
	}

	#[rstest]
	fn test_constraint_mismatch_display() {
		let error = IntegrityError::ConstraintMismatch {
			table: "orders".to_string(),
			constraint: "fk_orders_customer".to_string(),
		};
		assert_eq!(
			error.to_string(),
			"Constraint fk_orders_customer on table orders exists with a different definition"
		);
	}

	#[rstest]
	fn test_constraint_add_display() {
		let error = IntegrityError::ConstraintAdd {
			table: "items".to_string(),
			constraint: "fk_items_order".to_string(),
			message: "relation \"orders\" does not exist".to_string(),
		};
		assert_eq!(
			error.to_string(),
			"Failed to add constraint fk_items_order on table items: relation \"orders\" does not exist"
		);
	}

	#[rstest]
	fn test_work_error_passes_through_unchanged() {
		let error = IntegrityError::from(anyhow::anyhow!("fixture file truncated"));
		assert_eq!(error.to_string(), "fixture file truncated");
	}

	#[rstest]
	fn test_work_error_preserves_cause_chain() {
		let cause = anyhow::anyhow!("disk full").context("loading fixtures");
		let error = IntegrityError::Work(cause);
		assert_eq!(error.to_string(), "loading fixtures");
		let source = std::error::Error::source(&error).map(|s| s.to_string());
		assert_eq!(source.as_deref(), Some("disk full"));
	}
}

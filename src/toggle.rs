//! Suspension and restoration of foreign key constraints around a unit of
//! work.
//!
//! CockroachDB (and any other database without a session-level switch for
//! constraint enforcement) offers no way to turn foreign keys off while bulk
//! data is loaded. [`IntegrityToggle`] implements the physical alternative:
//! capture every foreign key in the schema, drop them all, run the caller's
//! work against the unconstrained schema, then re-create each constraint from
//! its captured definition.

use crate::error::{IntegrityError, IntegrityResult};
use crate::foreign_key::ForeignKeyDefinition;
use crate::schema::{SchemaCatalog, SchemaMutator};

/// Drops and re-creates every foreign key constraint around a unit of work.
///
/// The toggle is generic over a schema handle implementing both
/// [`SchemaCatalog`] and [`SchemaMutator`], so the same protocol runs against
/// `PostgresSchema`, `CockroachSchema`, or
/// [`MemorySchema`](crate::memory::MemorySchema).
///
/// The caller must hold exclusive schema access for the duration of a call:
/// no concurrent DDL from other sessions, and no overlapping calls against
/// the same schema. The toggle issues its statements sequentially and does
/// not enforce that exclusivity itself.
#[derive(Debug, Clone)]
pub struct IntegrityToggle<S> {
	schema: S,
}

impl<S> IntegrityToggle<S>
where
	S: SchemaCatalog + SchemaMutator,
{
	/// Creates a toggle over the given schema handle.
	pub fn new(schema: S) -> Self {
		Self { schema }
	}

	/// Returns the underlying schema handle.
	pub fn schema(&self) -> &S {
		&self.schema
	}

	/// Captures every foreign key constraint in the schema, flattened into
	/// one list: table-enumeration order, then per-table constraint order.
	///
	/// This is exactly the list [`with_integrity_disabled`] would drop and
	/// restore, in exactly that order. Nothing is mutated.
	///
	/// [`with_integrity_disabled`]: IntegrityToggle::with_integrity_disabled
	pub async fn all_foreign_keys(&self) -> IntegrityResult<Vec<ForeignKeyDefinition>> {
		let mut foreign_keys = Vec::new();
		for table in self.schema.table_names().await? {
			foreign_keys.extend(self.schema.foreign_keys(&table).await?);
		}
		Ok(foreign_keys)
	}

	/// Runs `work` with every foreign key constraint removed from the
	/// schema, restoring the constraints afterwards.
	///
	/// The protocol, in order:
	///
	/// 1. Capture all foreign keys (see [`all_foreign_keys`]).
	/// 2. Drop each captured constraint, in capture order.
	/// 3. Invoke `work` exactly once.
	/// 4. Re-create each captured constraint, in capture order.
	///
	/// If `work` re-created some of the constraints itself, the duplicate is
	/// tolerated as long as the existing definition matches the captured
	/// one; a same-named constraint with a different definition surfaces
	/// [`IntegrityError::ConstraintMismatch`].
	///
	/// There is no transactional wrapper and no rollback. A drop failure
	/// propagates immediately and leaves earlier drops in place without
	/// invoking `work`; a `work` failure skips restore entirely and leaves
	/// every constraint dropped; a restore failure leaves that constraint
	/// and everything after it dropped. The error variant identifies the
	/// phase that failed.
	///
	/// # Examples
	///
	/// ```
	/// use refint::{ForeignKeyDefinition, IntegrityToggle, MemorySchema};
	/// use refint::{SchemaCatalog, SchemaMutator};
	///
	/// # async fn example() {
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
	/// let toggle = IntegrityToggle::new(schema);
	/// let loaded = toggle
	/// 	.with_integrity_disabled(|| async move {
	/// 		// No foreign keys exist here; load rows in any order.
	/// 		Ok::<_, anyhow::Error>(42)
	/// 	})
	/// 	.await
	/// 	.unwrap();
	///
	/// assert_eq!(loaded, 42);
	/// assert_eq!(toggle.schema().foreign_keys("orders").await.unwrap().len(), 1);
	/// # }
	/// # tokio::runtime::Runtime::new().unwrap().block_on(example());
	/// ```
	///
	/// [`all_foreign_keys`]: IntegrityToggle::all_foreign_keys
	pub async fn with_integrity_disabled<F, Fut, T>(&self, work: F) -> IntegrityResult<T>
	where
		F: FnOnce() -> Fut,
		Fut: std::future::Future<Output = Result<T, anyhow::Error>>,
	{
		let snapshot = self.all_foreign_keys().await?;

		tracing::debug!(
			constraints = snapshot.len(),
			"suspending foreign key constraints"
		);
		for foreign_key in &snapshot {
			self.schema
				.drop_foreign_key(&foreign_key.table, &foreign_key.name)
				.await?;
		}

		let value = work().await.map_err(IntegrityError::Work)?;

		tracing::debug!(
			constraints = snapshot.len(),
			"restoring foreign key constraints"
		);
		for foreign_key in &snapshot {
			match self.schema.add_foreign_key(foreign_key).await {
				Ok(()) => {}
				Err(IntegrityError::DuplicateConstraint { .. }) => {
					self.verify_restored(foreign_key).await?;
					tracing::debug!(
						table = %foreign_key.table,
						constraint = %foreign_key.name,
						"constraint already restored by the unit of work"
					);
				}
				Err(error) => return Err(error),
			}
		}

		Ok(value)
	}

	/// Checks that the constraint already occupying a captured name enforces
	/// the captured rule.
	async fn verify_restored(&self, expected: &ForeignKeyDefinition) -> IntegrityResult<()> {
		let existing = self.schema.foreign_keys(&expected.table).await?;
		let matches = existing
			.iter()
			.find(|candidate| candidate.name == expected.name)
			.is_some_and(|candidate| candidate.matches_definition(expected));
		if matches {
			Ok(())
		} else {
			Err(IntegrityError::ConstraintMismatch {
				table: expected.table.clone(),
				constraint: expected.name.clone(),
			})
		}
	}
}

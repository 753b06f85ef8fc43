//! # refint
//!
//! Suspend and restore foreign key constraints around a unit of work.
//!
//! Bulk data loading wants to insert rows in file order, not dependency
//! order. PostgreSQL can wave foreign keys through for a session with
//! `ALTER TABLE ... DISABLE TRIGGER ALL`; CockroachDB has no trigger
//! machinery behind its constraints, so there is nothing to disable. The
//! only way to get an unconstrained window there is physical:
//! [`IntegrityToggle`] captures every foreign key in the schema, drops them
//! all, runs your work, then re-creates each constraint from its captured
//! definition.
//!
//! ## Quick start
//!
//! The protocol runs against any schema handle implementing
//! [`SchemaCatalog`] and [`SchemaMutator`]. [`MemorySchema`] ships for
//! tests:
//!
//! ```
//! use refint::{ForeignKeyDefinition, IntegrityToggle, MemorySchema};
//! use refint::{SchemaCatalog, SchemaMutator};
//!
//! # async fn example() {
//! let schema = MemorySchema::new();
//! schema.create_table("customers");
//! schema.create_table("orders");
//! schema
//! 	.add_foreign_key(&ForeignKeyDefinition::single_column(
//! 		"orders",
//! 		"fk_orders_customer",
//! 		"customer_id",
//! 		"customers",
//! 		"id",
//! 	))
//! 	.await
//! 	.unwrap();
//!
//! let toggle = IntegrityToggle::new(schema.clone());
//! let rows_loaded = toggle
//! 	.with_integrity_disabled(|| async move {
//! 		// No foreign keys exist in here.
//! 		Ok::<_, anyhow::Error>(1250)
//! 	})
//! 	.await
//! 	.unwrap();
//!
//! assert_eq!(rows_loaded, 1250);
//! assert_eq!(schema.foreign_keys("orders").await.unwrap().len(), 1);
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(example());
//! ```
//!
//! ## Against a live database
//!
//! ```no_run
//! use refint::{IntegrityToggle, PostgresSchema};
//!
//! # async fn example() -> Result<(), refint::IntegrityError> {
//! let schema = PostgresSchema::connect("postgres://localhost/app").await?;
//! let toggle = IntegrityToggle::new(schema);
//!
//! toggle
//! 	.with_integrity_disabled(|| async move {
//! 		// sqlx::query("INSERT INTO orders ...") in any order.
//! 		Ok::<_, anyhow::Error>(())
//! 	})
//! 	.await?;
//! # Ok(())
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(example()).unwrap();
//! ```
//!
//! ## Failure model
//!
//! There is no transactional wrapper and no rollback; the
//! [`IntegrityError`] variant tells you which phase failed and what is
//! still dropped. A failed drop stops everything before the work runs; a
//! failed work skips restore entirely; a failed re-create abandons the
//! constraints after it. The caller owns exclusive schema access for the
//! duration of the call.
//!
//! ## Feature flags
//!
//! - `postgres` (default) - [`PostgresSchema`] over `sqlx`
//! - `cockroachdb` - `CockroachSchema` delegating to the PostgreSQL backend
//!
//! With `--no-default-features` the crate still provides the toggle, the
//! definitions, the traits, and [`MemorySchema`].

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod foreign_key;
pub mod memory;
pub mod prelude;
pub mod schema;
pub mod toggle;

#[cfg(feature = "cockroachdb")]
pub mod cockroachdb;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use error::{IntegrityError, IntegrityResult};
pub use foreign_key::{DeferrableOption, ForeignKeyAction, ForeignKeyDefinition};
pub use memory::MemorySchema;
pub use schema::{SchemaCatalog, SchemaMutator};
pub use toggle::IntegrityToggle;

#[cfg(feature = "cockroachdb")]
pub use cockroachdb::CockroachSchema;
#[cfg(feature = "postgres")]
pub use postgres::PostgresSchema;

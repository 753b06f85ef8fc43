//! Convenience re-exports for common usage.
//!
//! # Example
//!
//! ```
//! use refint::prelude::*;
//!
//! let foreign_key = ForeignKeyDefinition::single_column(
//! 	"orders",
//! 	"fk_orders_customer",
//! 	"customer_id",
//! 	"customers",
//! 	"id",
//! );
//! assert_eq!(foreign_key.referenced_table, "customers");
//! ```

// Error types
pub use crate::error::{IntegrityError, IntegrityResult};

// Constraint definitions
pub use crate::foreign_key::{DeferrableOption, ForeignKeyAction, ForeignKeyDefinition};

// Capability traits
pub use crate::schema::{SchemaCatalog, SchemaMutator};

// Orchestration
pub use crate::toggle::IntegrityToggle;

// Schema backends
pub use crate::memory::MemorySchema;

#[cfg(feature = "cockroachdb")]
pub use crate::cockroachdb::CockroachSchema;
#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresSchema;

//! Foreign key constraint definitions.
//!
//! A [`ForeignKeyDefinition`] captures everything needed to re-create a
//! constraint exactly as it existed: owning table, name, ordered column
//! pairing, referential actions, deferrability, and whether existing rows
//! were validated. Definitions are plain values; backends produce them from
//! the catalog and consume them to build DDL.

use std::fmt;

/// Referential action applied by `ON DELETE` / `ON UPDATE` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ForeignKeyAction {
	/// Reject the delete/update if referencing rows exist.
	Restrict,
	/// Cascade the delete/update to referencing rows.
	Cascade,
	/// Set referencing columns to NULL.
	SetNull,
	/// Defer the check to the end of the statement (the database default).
	NoAction,
	/// Set referencing columns to their default values.
	SetDefault,
}

impl ForeignKeyAction {
	/// Returns the SQL keyword for this action.
	pub fn to_sql_keyword(&self) -> &'static str {
		match self {
			ForeignKeyAction::Restrict => "RESTRICT",
			ForeignKeyAction::Cascade => "CASCADE",
			ForeignKeyAction::SetNull => "SET NULL",
			ForeignKeyAction::NoAction => "NO ACTION",
			ForeignKeyAction::SetDefault => "SET DEFAULT",
		}
	}
}

impl fmt::Display for ForeignKeyAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_sql_keyword())
	}
}

/// Deferrability of constraint checking within a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeferrableOption {
	/// Deferrable, checked at the end of each statement by default.
	Immediate,
	/// Deferrable, checked at transaction commit by default.
	Deferred,
}

impl fmt::Display for DeferrableOption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DeferrableOption::Immediate => write!(f, "DEFERRABLE INITIALLY IMMEDIATE"),
			DeferrableOption::Deferred => write!(f, "DEFERRABLE INITIALLY DEFERRED"),
		}
	}
}

/// A complete, reconstructible description of one foreign key constraint.
///
/// The column lists are positionally paired: `columns[i]` references
/// `referenced_columns[i]`. Their order is the constraint's own column order
/// and is preserved through capture and re-creation. `on_delete`/`on_update`
/// of `None` mean the database default (`NO ACTION`), and re-created DDL
/// omits the clause. `validate: false` marks a constraint that was added
/// without checking existing rows (`NOT VALID`) and is re-created the same
/// way.
///
/// # Examples
///
/// ```
/// use refint::{ForeignKeyAction, ForeignKeyDefinition};
///
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
/// 	foreign_key.to_string(),
/// 	"CONSTRAINT fk_orders_customer FOREIGN KEY (customer_id) \
/// 	 REFERENCES customers(id) ON DELETE CASCADE"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDefinition {
	/// Table that owns (declares) the constraint.
	pub table: String,
	/// Constraint name, unique within the schema.
	pub name: String,
	/// Referencing columns, in constraint order.
	pub columns: Vec<String>,
	/// Table the constraint points at.
	pub referenced_table: String,
	/// Referenced columns, positionally paired with `columns`.
	pub referenced_columns: Vec<String>,
	/// `ON DELETE` action; `None` means the database default.
	pub on_delete: Option<ForeignKeyAction>,
	/// `ON UPDATE` action; `None` means the database default.
	pub on_update: Option<ForeignKeyAction>,
	/// Deferrability; `None` means `NOT DEFERRABLE`.
	pub deferrable: Option<DeferrableOption>,
	/// Whether existing rows were validated when the constraint was added.
	pub validate: bool,
}

impl ForeignKeyDefinition {
	/// Creates a definition with default options (no actions, not
	/// deferrable, validated).
	pub fn new(
		table: impl Into<String>,
		name: impl Into<String>,
		columns: Vec<String>,
		referenced_table: impl Into<String>,
		referenced_columns: Vec<String>,
	) -> Self {
		Self {
			table: table.into(),
			name: name.into(),
			columns,
			referenced_table: referenced_table.into(),
			referenced_columns,
			on_delete: None,
			on_update: None,
			deferrable: None,
			validate: true,
		}
	}

	/// Creates a single-column definition, the common case.
	pub fn single_column(
		table: impl Into<String>,
		name: impl Into<String>,
		column: impl Into<String>,
		referenced_table: impl Into<String>,
		referenced_column: impl Into<String>,
	) -> Self {
		Self::new(
			table,
			name,
			vec![column.into()],
			referenced_table,
			vec![referenced_column.into()],
		)
	}

	/// Sets the `ON DELETE` action.
	pub fn with_on_delete(mut self, action: ForeignKeyAction) -> Self {
		self.on_delete = Some(action);
		self
	}

	/// Sets the `ON UPDATE` action.
	pub fn with_on_update(mut self, action: ForeignKeyAction) -> Self {
		self.on_update = Some(action);
		self
	}

	/// Marks the constraint deferrable.
	pub fn with_deferrable(mut self, option: DeferrableOption) -> Self {
		self.deferrable = Some(option);
		self
	}

	/// Sets whether existing rows are validated when the constraint is
	/// added. `false` renders as `NOT VALID`.
	pub fn with_validate(mut self, validate: bool) -> Self {
		self.validate = validate;
		self
	}

	/// Iterates the positional `(column, referenced_column)` pairs.
	///
	/// # Examples
	///
	/// ```
	/// use refint::ForeignKeyDefinition;
	///
	/// let foreign_key = ForeignKeyDefinition::new(
	/// 	"order_items",
	/// 	"fk_order_items_order",
	/// 	vec!["tenant_id".to_string(), "order_id".to_string()],
	/// 	"orders",
	/// 	vec!["tenant_id".to_string(), "id".to_string()],
	/// );
	///
	/// let pairs: Vec<_> = foreign_key.column_pairs().collect();
	/// assert_eq!(pairs, vec![("tenant_id", "tenant_id"), ("order_id", "id")]);
	/// ```
	pub fn column_pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
		self.columns
			.iter()
			.map(String::as_str)
			.zip(self.referenced_columns.iter().map(String::as_str))
	}

	/// Returns `true` when `other` enforces the same rule as `self`: same
	/// owning table, same column pairing, same referenced table, same
	/// referential actions.
	///
	/// Constraint name, deferrability, and validation status are excluded:
	/// they do not change which rows the constraint admits. This is the
	/// comparison used to decide whether an already-existing constraint
	/// counts as a successful restore.
	pub fn matches_definition(&self, other: &ForeignKeyDefinition) -> bool {
		self.table == other.table
			&& self.columns == other.columns
			&& self.referenced_table == other.referenced_table
			&& self.referenced_columns == other.referenced_columns
			&& self.on_delete == other.on_delete
			&& self.on_update == other.on_update
	}
}

impl fmt::Display for ForeignKeyDefinition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
			self.name,
			self.columns.join(", "),
			self.referenced_table,
			self.referenced_columns.join(", ")
		)?;
		if let Some(action) = self.on_delete {
			write!(f, " ON DELETE {}", action)?;
		}
		if let Some(action) = self.on_update {
			write!(f, " ON UPDATE {}", action)?;
		}
		if let Some(deferrable) = self.deferrable {
			write!(f, " {}", deferrable)?;
		}
		if !self.validate {
			write!(f, " NOT VALID")?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;

	#[rstest]
	#[case(ForeignKeyAction::Restrict, "RESTRICT")]
	#[case(ForeignKeyAction::Cascade, "CASCADE")]
	#[case(ForeignKeyAction::SetNull, "SET NULL")]
	#[case(ForeignKeyAction::NoAction, "NO ACTION")]
	#[case(ForeignKeyAction::SetDefault, "SET DEFAULT")]
	fn test_action_sql_keywords(#[case] action: ForeignKeyAction, #[case] keyword: &str) {
		assert_eq!(action.to_sql_keyword(), keyword);
		assert_eq!(action.to_string(), keyword);
	}

	#[rstest]
	#[case(DeferrableOption::Immediate, "DEFERRABLE INITIALLY IMMEDIATE")]
	#[case(DeferrableOption::Deferred, "DEFERRABLE INITIALLY DEFERRED")]
	fn test_deferrable_display(#[case] option: DeferrableOption, #[case] rendered: &str) {
		assert_eq!(option.to_string(), rendered);
	}

	#[rstest]
	fn test_display_minimal_definition_omits_optional_clauses() {
		let foreign_key = ForeignKeyDefinition::single_column(
			"items",
			"fk_items_order",
			"order_id",
			"orders",
			"id",
		);
		assert_eq!(
			foreign_key.to_string(),
			"CONSTRAINT fk_items_order FOREIGN KEY (order_id) REFERENCES orders(id)"
		);
	}

	#[rstest]
	fn test_display_renders_all_options() {
		let foreign_key = ForeignKeyDefinition::single_column(
			"orders",
			"fk_orders_customer",
			"customer_id",
			"customers",
			"id",
		)
		.with_on_delete(ForeignKeyAction::SetNull)
		.with_on_update(ForeignKeyAction::Cascade)
		.with_deferrable(DeferrableOption::Deferred)
		.with_validate(false);

		assert_eq!(
			foreign_key.to_string(),
			"CONSTRAINT fk_orders_customer FOREIGN KEY (customer_id) REFERENCES customers(id) \
			 ON DELETE SET NULL ON UPDATE CASCADE DEFERRABLE INITIALLY DEFERRED NOT VALID"
		);
	}

	#[rstest]
	fn test_display_preserves_composite_column_order() {
		let foreign_key = ForeignKeyDefinition::new(
			"order_items",
			"fk_order_items_order",
			vec!["tenant_id".to_string(), "order_id".to_string()],
			"orders",
			vec!["tenant_id".to_string(), "id".to_string()],
		);
		assert_eq!(
			foreign_key.to_string(),
			"CONSTRAINT fk_order_items_order FOREIGN KEY (tenant_id, order_id) \
			 REFERENCES orders(tenant_id, id)"
		);
	}

	#[rstest]
	fn test_matches_definition_accepts_identical_rule_under_other_name() {
		let original = ForeignKeyDefinition::single_column(
			"orders",
			"fk_orders_customer",
			"customer_id",
			"customers",
			"id",
		)
		.with_on_delete(ForeignKeyAction::Cascade);
		let recreated = ForeignKeyDefinition {
			name: "orders_customer_id_fkey".to_string(),
			..original.clone()
		};
		assert!(original.matches_definition(&recreated));
	}

	#[rstest]
	fn test_matches_definition_ignores_deferrable_and_validate() {
		let original = ForeignKeyDefinition::single_column(
			"orders",
			"fk_orders_customer",
			"customer_id",
			"customers",
			"id",
		);
		let relaxed = original
			.clone()
			.with_deferrable(DeferrableOption::Immediate)
			.with_validate(false);
		assert!(original.matches_definition(&relaxed));
	}

	#[rstest]
	fn test_matches_definition_rejects_different_referenced_table() {
		let original = ForeignKeyDefinition::single_column(
			"orders",
			"fk_orders_customer",
			"customer_id",
			"customers",
			"id",
		);
		let divergent = ForeignKeyDefinition::single_column(
			"orders",
			"fk_orders_customer",
			"customer_id",
			"suppliers",
			"id",
		);
		assert!(!original.matches_definition(&divergent));
	}

	#[rstest]
	fn test_matches_definition_rejects_different_actions() {
		let original = ForeignKeyDefinition::single_column(
			"orders",
			"fk_orders_customer",
			"customer_id",
			"customers",
			"id",
		)
		.with_on_delete(ForeignKeyAction::Cascade);
		let divergent = original.clone().with_on_delete(ForeignKeyAction::Restrict);
		assert!(!original.matches_definition(&divergent));
	}

	#[rstest]
	fn test_matches_definition_rejects_reordered_composite_columns() {
		let original = ForeignKeyDefinition::new(
			"order_items",
			"fk_order_items_order",
			vec!["tenant_id".to_string(), "order_id".to_string()],
			"orders",
			vec!["tenant_id".to_string(), "id".to_string()],
		);
		let reordered = ForeignKeyDefinition::new(
			"order_items",
			"fk_order_items_order",
			vec!["order_id".to_string(), "tenant_id".to_string()],
			"orders",
			vec!["id".to_string(), "tenant_id".to_string()],
		);
		assert!(!original.matches_definition(&reordered));
	}
}

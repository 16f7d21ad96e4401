//! Parsed table descriptors and the names derived from them.

use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use super::{Column, ForeignKey};

/// A table parsed from a `CREATE TABLE` statement.
///
/// Derived names ([`Table::history_table_name`], [`Table::function_prefix`],
/// ...) are recomputed from `schema` and `name` on every call, so they follow
/// any later change to those fields.
///
/// # Example
///
/// ```rust
/// use sql_history::{Column, Table};
///
/// let table = Table::new("products")
///     .with_schema("inventory")
///     .with_column(Column::new("sku", "TEXT", "PRIMARY KEY"));
///
/// assert_eq!(table.qualified_name(), "inventory.products");
/// assert_eq!(table.history_table_name(), "inventory.products_history");
/// assert_eq!(table.function_prefix(), "inventory_products");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table {
    /// Bare table name, identifier delimiters stripped.
    pub name: String,
    /// Schema qualifier; `None` or empty for unqualified tables.
    pub schema: Option<String>,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
    /// Foreign keys in the order they were encountered.
    pub foreign_keys: Vec<ForeignKey>,
    /// Columns named by a table-level `PRIMARY KEY (...)` clause.
    pub table_pk_columns: Vec<String>,
}

impl Table {
    /// Create an empty, unqualified table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the schema qualifier.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Append a column.
    #[must_use]
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Append a foreign key.
    #[must_use]
    pub fn with_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// The schema qualifier, if it is non-empty.
    #[must_use]
    pub fn schema_name(&self) -> Option<&str> {
        self.schema.as_deref().filter(|schema| !schema.is_empty())
    }

    /// `schema.name`, or `name` for unqualified tables.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match self.schema_name() {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Name of the history table: `schema.name_history` or `name_history`.
    #[must_use]
    pub fn history_table_name(&self) -> String {
        format!("{}_history", self.qualified_name())
    }

    /// Prefix for trigger and function names: `schema_name` or `name`.
    ///
    /// Any character other than an ASCII letter, digit or `_` becomes `_`,
    /// keeping the result a valid unquoted identifier.
    #[must_use]
    pub fn function_prefix(&self) -> String {
        self.qualified_name()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }

    /// Prefix for index names; the same rule as [`Table::function_prefix`].
    #[must_use]
    pub fn index_prefix(&self) -> String {
        self.function_prefix()
    }

    /// Names of all columns, in declaration order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Whether a primary key is declared, on a column or at table level.
    #[must_use]
    pub fn has_declared_primary_key(&self) -> bool {
        !self.table_pk_columns.is_empty() || self.columns.iter().any(Column::is_primary_key)
    }

    /// Columns used to identify a row when closing its open history entry.
    ///
    /// Resolution order:
    /// 1. columns declaring `PRIMARY KEY`, in declaration order;
    /// 2. the columns of a table-level `PRIMARY KEY (...)` clause;
    /// 3. the first column.
    ///
    /// The last step is a heuristic: nothing guarantees the first column is
    /// unique. Declare the key explicitly when it is not the first column.
    /// Only a table with no columns yields an empty list.
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<&str> {
        let declared: Vec<&str> = self
            .columns
            .iter()
            .filter(|column| column.is_primary_key())
            .map(|column| column.name.as_str())
            .collect();
        if !declared.is_empty() {
            return declared;
        }

        if !self.table_pk_columns.is_empty() {
            return self.table_pk_columns.iter().map(String::as_str).collect();
        }

        match self.columns.first() {
            Some(first) => vec![first.name.as_str()],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Table {
        Table::new("users")
            .with_column(Column::new("id", "SERIAL", "PRIMARY KEY"))
            .with_column(Column::new("name", "VARCHAR(50)", "NOT NULL"))
    }

    #[test]
    fn test_names_without_schema() {
        let table = users();
        assert_eq!(table.qualified_name(), "users");
        assert_eq!(table.history_table_name(), "users_history");
        assert_eq!(table.function_prefix(), "users");
        assert_eq!(table.index_prefix(), "users");
    }

    #[test]
    fn test_names_with_schema() {
        let table = Table::new("products").with_schema("inventory");
        assert_eq!(table.qualified_name(), "inventory.products");
        assert_eq!(table.history_table_name(), "inventory.products_history");
        assert_eq!(table.function_prefix(), "inventory_products");
        assert_eq!(table.index_prefix(), "inventory_products");
    }

    #[test]
    fn test_empty_schema_is_unqualified() {
        let table = Table::new("users").with_schema("");
        assert_eq!(table.schema_name(), None);
        assert_eq!(table.history_table_name(), "users_history");
    }

    #[test]
    fn test_names_follow_mutation() {
        let mut table = users();
        table.name = "accounts".into();
        table.schema = Some("billing".into());
        assert_eq!(table.history_table_name(), "billing.accounts_history");
        assert_eq!(table.qualified_name(), "billing.accounts");

        table.schema = None;
        assert_eq!(table.history_table_name(), "accounts_history");
    }

    #[test]
    fn test_prefix_replaces_non_alphanumerics() {
        let table = Table::new("order items").with_schema("sales-eu");
        assert_eq!(table.function_prefix(), "sales_eu_order_items");
    }

    #[test]
    fn test_primary_key_declared() {
        assert_eq!(users().primary_key_columns(), vec!["id"]);
        assert!(users().has_declared_primary_key());
    }

    #[test]
    fn test_primary_key_composite_in_declaration_order() {
        let table = Table::new("memberships")
            .with_column(Column::new("note", "TEXT", ""))
            .with_column(Column::new("group_id", "INT", "PRIMARY KEY"))
            .with_column(Column::new("user_id", "INT", "NOT NULL PRIMARY KEY"));
        assert_eq!(table.primary_key_columns(), vec!["group_id", "user_id"]);
    }

    #[test]
    fn test_primary_key_table_level() {
        let mut table = Table::new("memberships")
            .with_column(Column::new("note", "TEXT", ""))
            .with_column(Column::new("group_id", "INT", ""))
            .with_column(Column::new("user_id", "INT", ""));
        table.table_pk_columns = vec!["group_id".into(), "user_id".into()];
        assert_eq!(table.primary_key_columns(), vec!["group_id", "user_id"]);
        assert!(table.has_declared_primary_key());
    }

    #[test]
    fn test_primary_key_falls_back_to_first_column() {
        // The fallback is a guess: `name` is not necessarily unique.
        let table = Table::new("people")
            .with_column(Column::new("name", "VARCHAR(50)", "NOT NULL"))
            .with_column(Column::new("email", "VARCHAR(100)", ""));
        assert_eq!(table.primary_key_columns(), vec!["name"]);
        assert!(!table.has_declared_primary_key());
    }

    #[test]
    fn test_primary_key_empty_table() {
        assert!(Table::new("nothing").primary_key_columns().is_empty());
    }
}

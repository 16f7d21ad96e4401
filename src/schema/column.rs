//! Column definitions and their constraints.

use alloc::string::String;
use alloc::vec::Vec;

use crate::sql::parse_column_constraints;

/// The kind of a single column constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstraintKind {
    /// `PRIMARY KEY`
    PrimaryKey,
    /// `UNIQUE`
    Unique,
    /// `NOT NULL`
    NotNull,
    /// `NULL`
    Null,
    /// `DEFAULT <expr>`
    Default,
    /// `AUTO_INCREMENT`, `AUTOINCREMENT`, `IDENTITY` or `GENERATED ... AS IDENTITY`.
    AutoIncrement,
    /// `CHECK (...)`
    Check,
    /// `REFERENCES <table> ...`
    References,
    /// Anything else, kept verbatim.
    Other,
}

impl ConstraintKind {
    /// Whether the constraint still makes sense on an append-only history
    /// table.
    ///
    /// Keys, uniqueness, auto-increment markers and foreign keys are dropped:
    /// a history table holds many rows per source key and must accept the
    /// values copied from the source row as they are.
    #[must_use]
    pub fn is_kept_in_history(self) -> bool {
        !matches!(
            self,
            ConstraintKind::PrimaryKey
                | ConstraintKind::Unique
                | ConstraintKind::AutoIncrement
                | ConstraintKind::References
        )
    }
}

/// One constraint from a column's options text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnConstraint {
    /// What the constraint does.
    pub kind: ConstraintKind,
    /// The constraint's source text, including a `CONSTRAINT <name>` prefix.
    pub text: String,
}

/// A column of a parsed table.
///
/// The options text is kept exactly as written (after whitespace
/// normalization); [`Column::constraints`] classifies it on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Column {
    /// Column name, identifier delimiters stripped.
    pub name: String,
    /// Data type as written, e.g. `VARCHAR(50)` or `DECIMAL(10,2)`.
    pub data_type: String,
    /// Everything after the data type, e.g. `NOT NULL DEFAULT 0`.
    pub options: String,
}

impl Column {
    /// Create a column.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        data_type: impl Into<String>,
        options: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            options: options.into(),
        }
    }

    /// Constraints declared in the options text, in order.
    #[must_use]
    pub fn constraints(&self) -> Vec<ColumnConstraint> {
        parse_column_constraints(&self.options)
    }

    /// Whether the column declares itself `PRIMARY KEY`.
    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.constraints()
            .iter()
            .any(|constraint| constraint.kind == ConstraintKind::PrimaryKey)
    }

    /// The options text with history-incompatible constraints removed.
    ///
    /// Kept constraints are emitted verbatim, separated by single spaces.
    #[must_use]
    pub fn history_options(&self) -> String {
        let mut options = String::new();
        for constraint in self.constraints() {
            if !constraint.kind.is_kept_in_history() {
                continue;
            }
            if !options.is_empty() {
                options.push(' ');
            }
            options.push_str(&constraint.text);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_detection() {
        assert!(Column::new("id", "SERIAL", "PRIMARY KEY").is_primary_key());
        assert!(Column::new("id", "INT", "not null primary key").is_primary_key());
        assert!(Column::new("id", "INT", "CONSTRAINT pk_t PRIMARY KEY").is_primary_key());
        assert!(!Column::new("name", "TEXT", "NOT NULL").is_primary_key());
        assert!(!Column::new("kind", "TEXT", "DEFAULT 'PRIMARY KEY'").is_primary_key());
        assert!(!Column::new("name", "TEXT", "").is_primary_key());
    }

    #[test]
    fn test_history_options_strip() {
        let column = Column::new("username", "VARCHAR(50)", "NOT NULL UNIQUE");
        assert_eq!(column.history_options(), "NOT NULL");

        let column = Column::new(
            "user_id",
            "INTEGER",
            "NOT NULL REFERENCES users(id) ON DELETE CASCADE ON UPDATE SET NULL DEFAULT 0",
        );
        assert_eq!(column.history_options(), "NOT NULL DEFAULT 0");

        let column = Column::new("id", "INTEGER", "GENERATED ALWAYS AS IDENTITY PRIMARY KEY");
        assert_eq!(column.history_options(), "");

        let column = Column::new("id", "INT", "AUTO_INCREMENT UNIQUE PRIMARY KEY");
        assert_eq!(column.history_options(), "");
    }

    #[test]
    fn test_history_options_keep_other_text_verbatim() {
        let column = Column::new(
            "price",
            "NUMERIC",
            "COLLATE \"C\" CHECK (price >= 0) DEFAULT 1.50",
        );
        assert_eq!(
            column.history_options(),
            "COLLATE \"C\" CHECK (price >= 0) DEFAULT 1.50"
        );
    }

    #[test]
    fn test_kept_in_history() {
        assert!(ConstraintKind::NotNull.is_kept_in_history());
        assert!(ConstraintKind::Default.is_kept_in_history());
        assert!(ConstraintKind::Check.is_kept_in_history());
        assert!(ConstraintKind::Other.is_kept_in_history());
        assert!(!ConstraintKind::PrimaryKey.is_kept_in_history());
        assert!(!ConstraintKind::Unique.is_kept_in_history());
        assert!(!ConstraintKind::AutoIncrement.is_kept_in_history());
        assert!(!ConstraintKind::References.is_kept_in_history());
    }
}

//! Foreign-key relationships extracted from `CREATE TABLE` statements.

use alloc::string::String;
use core::fmt::{self, Display};

/// Action taken by the database when a referenced row is deleted or updated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReferentialAction {
    /// `CASCADE`
    Cascade,
    /// `SET NULL`
    SetNull,
    /// `SET DEFAULT`
    SetDefault,
    /// `RESTRICT`
    Restrict,
    /// `NO ACTION`
    NoAction,
    /// Any other action token, uppercased.
    Other(String),
}

impl ReferentialAction {
    /// Classify an action as written after `ON DELETE` / `ON UPDATE`.
    ///
    /// Matching ignores case and collapses inner whitespace, so
    /// `set   null` is [`ReferentialAction::SetNull`].
    #[must_use]
    pub fn from_sql(text: &str) -> Self {
        let mut normalized = String::with_capacity(text.len());
        for (i, word) in text.split_whitespace().enumerate() {
            if i > 0 {
                normalized.push(' ');
            }
            normalized.push_str(&word.to_ascii_uppercase());
        }

        match normalized.as_str() {
            "CASCADE" => Self::Cascade,
            "SET NULL" => Self::SetNull,
            "SET DEFAULT" => Self::SetDefault,
            "RESTRICT" => Self::Restrict,
            "NO ACTION" => Self::NoAction,
            _ => Self::Other(normalized),
        }
    }
}

impl Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferentialAction::Cascade => f.write_str("CASCADE"),
            ReferentialAction::SetNull => f.write_str("SET NULL"),
            ReferentialAction::SetDefault => f.write_str("SET DEFAULT"),
            ReferentialAction::Restrict => f.write_str("RESTRICT"),
            ReferentialAction::NoAction => f.write_str("NO ACTION"),
            ReferentialAction::Other(raw) => f.write_str(raw),
        }
    }
}

/// A foreign-key relationship, from an inline `REFERENCES` clause or a
/// table-level `FOREIGN KEY (...) REFERENCES ...` constraint.
///
/// Composite keys keep their column lists comma-joined (`"a, b"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForeignKey {
    /// Referencing column(s) in the declaring table.
    pub column_name: String,
    /// Referenced table, schema-qualified if it was written that way.
    pub referenced_table: String,
    /// Referenced column(s); empty when the clause names only the table.
    pub referenced_column: String,
    /// `ON DELETE` action, if declared.
    pub on_delete: Option<ReferentialAction>,
    /// `ON UPDATE` action, if declared.
    pub on_update: Option<ReferentialAction>,
}

impl Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FOREIGN KEY ({}) REFERENCES {}",
            self.column_name, self.referenced_table
        )?;
        if !self.referenced_column.is_empty() {
            write!(f, " ({})", self.referenced_column)?;
        }
        if let Some(action) = &self.on_delete {
            write!(f, " ON DELETE {action}")?;
        }
        if let Some(action) = &self.on_update {
            write!(f, " ON UPDATE {action}")?;
        }
        Ok(())
    }
}

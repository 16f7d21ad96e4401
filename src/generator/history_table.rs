//! History table DDL.

use alloc::string::{String, ToString};
use core::fmt::{self, Display};

use crate::config::Config;
use crate::schema::Table;

/// `CREATE TABLE` and `CREATE INDEX` statements for a table's history table.
///
/// Every source column is re-declared with its name and type. Its options
/// keep only the constraints that hold for an append-only table (see
/// [`Column::history_options`](crate::Column::history_options)). The
/// bookkeeping columns `valid_from`, `valid_to`, `operation` and, with user
/// tracking, `changed_by` follow, along with one index on each validity
/// bound.
#[derive(Debug, Clone, Copy)]
pub struct HistoryTable<'a> {
    table: &'a Table,
    config: Config,
}

impl<'a> HistoryTable<'a> {
    /// Wrap a table for formatting.
    #[must_use]
    pub fn new(table: &'a Table, config: Config) -> Self {
        Self { table, config }
    }
}

impl Display for HistoryTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let history = self.table.history_table_name();

        writeln!(f, "CREATE TABLE {history} (")?;
        for column in &self.table.columns {
            write!(f, "    {} {}", column.name, column.data_type)?;
            let options = column.history_options();
            if !options.is_empty() {
                write!(f, " {options}")?;
            }
            f.write_str(",\n")?;
        }
        f.write_str("    valid_from TIMESTAMP DEFAULT CURRENT_TIMESTAMP,\n")?;
        f.write_str("    valid_to TIMESTAMP NULL,\n")?;
        f.write_str("    operation CHAR(1) NOT NULL CHECK (operation IN ('I', 'U', 'D'))")?;
        if self.config.track_user {
            f.write_str(",\n    changed_by VARCHAR(255)")?;
        }
        f.write_str("\n);\n\n")?;

        let prefix = self.table.index_prefix();
        writeln!(
            f,
            "CREATE INDEX idx_{prefix}_history_valid_from ON {history} (valid_from);"
        )?;
        writeln!(
            f,
            "CREATE INDEX idx_{prefix}_history_valid_to ON {history} (valid_to);"
        )
    }
}

/// Render the history table DDL for `table`.
#[must_use]
pub fn generate_history_table(table: &Table, config: Config) -> String {
    HistoryTable::new(table, config).to_string()
}

//! Commented query templates showing how to read a history table.

use alloc::string::{String, ToString};
use core::fmt::{self, Display};

use crate::schema::Table;

/// Timestamp used in the as-of example; fixed so output stays deterministic.
const EXAMPLE_TIMESTAMP: &str = "2024-01-01 00:00:00";

/// A `-- Usage Examples:` comment block for one history table.
///
/// Three read-only queries, all commented out so the generated script stays
/// executable: the current state of every row, the state as of a point in
/// time, and the change trail of a single row.
#[derive(Debug, Clone, Copy)]
pub struct PointInTimeQueries<'a> {
    table: &'a Table,
}

impl<'a> PointInTimeQueries<'a> {
    /// Wrap a table for formatting.
    #[must_use]
    pub fn new(table: &'a Table) -> Self {
        Self { table }
    }
}

impl Display for PointInTimeQueries<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = self.table.qualified_name();
        let history = self.table.history_table_name();
        let columns = self.table.column_names().join(", ");

        f.write_str("-- Usage Examples:\n")?;

        writeln!(f, "-- Current state of {source}:")?;
        writeln!(f, "--   SELECT {columns} FROM {history}")?;
        f.write_str("--   WHERE valid_to IS NULL AND operation != 'D';\n")?;
        f.write_str("--\n")?;

        writeln!(f, "-- State of {source} as of a point in time:")?;
        writeln!(f, "--   SELECT {columns} FROM {history}")?;
        writeln!(f, "--   WHERE valid_from <= '{EXAMPLE_TIMESTAMP}'")?;
        writeln!(
            f,
            "--     AND (valid_to IS NULL OR valid_to > '{EXAMPLE_TIMESTAMP}')"
        )?;
        f.write_str("--     AND operation != 'D';\n")?;
        f.write_str("--\n")?;

        writeln!(f, "-- Change trail of one {source} row:")?;
        write!(f, "--   SELECT * FROM {history} WHERE ")?;
        for (i, column) in self.table.primary_key_columns().into_iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{column} = :{column}")?;
        }
        f.write_str("\n--   ORDER BY valid_from;\n\n")
    }
}

/// Render the point-in-time query templates for `table`.
#[must_use]
pub fn generate_point_in_time_queries(table: &Table) -> String {
    PointInTimeQueries::new(table).to_string()
}

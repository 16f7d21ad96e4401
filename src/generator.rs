//! SQL generation from parsed tables.
//!
//! Every generator is a [`Display`] wrapper around borrowed tables, with a
//! `generate_*` function returning the rendered [`String`]. Output is a pure
//! function of the input: `CURRENT_TIMESTAMP` is emitted as text, never
//! evaluated.

use alloc::string::{String, ToString};
use core::fmt::{self, Display};

use hashbrown::HashSet;
use tracing::warn;

use crate::config::Config;
use crate::schema::Table;

mod history_table;
mod point_in_time;
mod triggers;

pub use history_table::{HistoryTable, generate_history_table};
pub use point_in_time::{PointInTimeQueries, generate_point_in_time_queries};
pub use triggers::{TriggerEvent, Triggers, generate_triggers};

/// The full output script for a batch of tables.
///
/// A banner comment, then per table a header comment, the history table DDL,
/// its triggers and, when enabled, the point-in-time query templates. Tables
/// are separated by a line of 80 dashes.
#[derive(Debug, Clone, Copy)]
pub struct HistoryScript<'a> {
    tables: &'a [Table],
    config: Config,
}

impl<'a> HistoryScript<'a> {
    /// Wrap a batch of tables for formatting.
    #[must_use]
    pub fn new(tables: &'a [Table], config: Config) -> Self {
        Self { tables, config }
    }
}

impl Display for HistoryScript<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("-- Generated History Tables and Triggers\n")?;
        f.write_str(
            "-- This file contains history tables and triggers for temporal data tracking\n\n",
        )?;

        for (i, table) in self.tables.iter().enumerate() {
            if i > 0 {
                writeln!(f, "\n{:-<80}\n", "")?;
            }

            writeln!(
                f,
                "-- History table and triggers for: {}\n",
                table.qualified_name()
            )?;
            HistoryTable::new(table, self.config).fmt(f)?;
            f.write_str("\n")?;
            Triggers::new(table, self.config).fmt(f)?;
            if self.config.point_in_time_examples {
                PointInTimeQueries::new(table).fmt(f)?;
            }
        }

        Ok(())
    }
}

/// Render the history script for `tables`.
///
/// Never fails. Rejecting an empty batch is up to the caller; the result is
/// then just the banner. Tables that would share a history table name, or
/// that have no declared primary key, are reported through `tracing`.
///
/// # Example
///
/// ```rust
/// use sql_history::{Config, generate_history_sql, parse_create_tables};
///
/// let tables = parse_create_tables("CREATE TABLE users (id SERIAL PRIMARY KEY, name TEXT);");
/// let sql = generate_history_sql(&tables, Config::default());
///
/// assert!(sql.contains("CREATE TABLE users_history ("));
/// assert!(sql.contains("CREATE TRIGGER users_update_trigger"));
/// ```
#[must_use]
pub fn generate_history_sql(tables: &[Table], config: Config) -> String {
    let mut history_names = HashSet::with_capacity(tables.len());
    for table in tables {
        let history = table.history_table_name();
        if !history_names.insert(history.clone()) {
            warn!(
                history_table = %history,
                "several tables map to the same history table"
            );
        }
        triggers::warn_on_assumed_key(table);
    }

    HistoryScript::new(tables, config).to_string()
}

//! PL/pgSQL trigger functions and bindings that feed a history table.

use alloc::string::{String, ToString};
use core::fmt::{self, Display};

use tracing::warn;

use crate::config::Config;
use crate::schema::Table;

/// A row event on the source table that a history trigger reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerEvent {
    /// `INSERT`: record the new row.
    Insert,
    /// `UPDATE`: close the open history row, then record the new row.
    Update,
    /// `DELETE`: close the open history row, then record the deleted row.
    Delete,
}

impl TriggerEvent {
    /// All events, in the order their triggers are emitted.
    pub const ALL: [TriggerEvent; 3] = [
        TriggerEvent::Insert,
        TriggerEvent::Update,
        TriggerEvent::Delete,
    ];

    /// Lowercase name used in function and trigger names.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TriggerEvent::Insert => "insert",
            TriggerEvent::Update => "update",
            TriggerEvent::Delete => "delete",
        }
    }

    fn label(self) -> &'static str {
        match self {
            TriggerEvent::Insert => "Insert",
            TriggerEvent::Update => "Update",
            TriggerEvent::Delete => "Delete",
        }
    }

    /// When the trigger fires.
    ///
    /// The delete trigger runs before the row disappears.
    #[must_use]
    pub fn timing(self) -> &'static str {
        match self {
            TriggerEvent::Insert => "AFTER INSERT",
            TriggerEvent::Update => "AFTER UPDATE",
            TriggerEvent::Delete => "BEFORE DELETE",
        }
    }

    /// The `operation` code written to the history row.
    #[must_use]
    pub fn operation_code(self) -> char {
        match self {
            TriggerEvent::Insert => 'I',
            TriggerEvent::Update => 'U',
            TriggerEvent::Delete => 'D',
        }
    }

    /// The trigger record holding the row to copy, `NEW` or `OLD`.
    #[must_use]
    pub fn row(self) -> &'static str {
        match self {
            TriggerEvent::Insert | TriggerEvent::Update => "NEW",
            TriggerEvent::Delete => "OLD",
        }
    }

    fn closes_open_row(self) -> bool {
        self != TriggerEvent::Insert
    }
}

/// The insert, update and delete triggers of one table.
///
/// Each event gets a `<prefix>_<event>_history()` function and a
/// `<prefix>_<event>_trigger` binding. Update and delete first set
/// `valid_to` on the open history row of the affected key, matched on
/// [`Table::primary_key_columns`].
#[derive(Debug, Clone, Copy)]
pub struct Triggers<'a> {
    table: &'a Table,
    config: Config,
}

impl<'a> Triggers<'a> {
    /// Wrap a table for formatting.
    #[must_use]
    pub fn new(table: &'a Table, config: Config) -> Self {
        Self { table, config }
    }

    fn close_open_row(&self, f: &mut fmt::Formatter<'_>, history: &str) -> fmt::Result {
        writeln!(f, "    UPDATE {history} SET valid_to = CURRENT_TIMESTAMP")?;
        f.write_str("    WHERE valid_to IS NULL")?;
        for column in self.table.primary_key_columns() {
            write!(f, " AND {column} = OLD.{column}")?;
        }
        f.write_str(";\n")
    }

    fn record_row(
        &self,
        f: &mut fmt::Formatter<'_>,
        history: &str,
        event: TriggerEvent,
    ) -> fmt::Result {
        let user = self.config.user_expression();

        write!(f, "    INSERT INTO {history} (")?;
        for column in &self.table.columns {
            write!(f, "{}, ", column.name)?;
        }
        f.write_str("valid_from, operation")?;
        if user.is_some() {
            f.write_str(", changed_by")?;
        }

        f.write_str(")\n    VALUES (")?;
        for column in &self.table.columns {
            write!(f, "{}.{}, ", event.row(), column.name)?;
        }
        write!(f, "CURRENT_TIMESTAMP, '{}'", event.operation_code())?;
        if let Some(user) = user {
            write!(f, ", {user}")?;
        }
        f.write_str(");\n")
    }
}

impl Display for Triggers<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = self.table.qualified_name();
        let history = self.table.history_table_name();
        let prefix = self.table.function_prefix();

        let assumed_key = if self.table.has_declared_primary_key() {
            None
        } else {
            self.table.columns.first().map(|column| column.name.as_str())
        };

        for event in TriggerEvent::ALL {
            let name = event.name();

            writeln!(f, "-- {} trigger for {source}", event.label())?;
            if let (TriggerEvent::Update, Some(column)) = (event, assumed_key) {
                writeln!(
                    f,
                    "-- NOTE: {source} declares no primary key; assuming {column} identifies a row"
                )?;
            }
            writeln!(
                f,
                "CREATE OR REPLACE FUNCTION {prefix}_{name}_history() RETURNS TRIGGER AS $$"
            )?;
            f.write_str("BEGIN\n")?;
            if event.closes_open_row() {
                self.close_open_row(f, &history)?;
            }
            self.record_row(f, &history, event)?;
            writeln!(f, "    RETURN {};", event.row())?;
            f.write_str("END;\n$$ LANGUAGE plpgsql;\n\n")?;

            writeln!(f, "CREATE TRIGGER {prefix}_{name}_trigger")?;
            writeln!(f, "    {} ON {source}", event.timing())?;
            f.write_str("    FOR EACH ROW\n")?;
            writeln!(f, "    EXECUTE FUNCTION {prefix}_{name}_history();\n")?;
        }

        Ok(())
    }
}

/// Render the insert, update and delete triggers for `table`.
///
/// Logs a warning when the table declares no primary key and the first
/// column is used to match history rows instead.
#[must_use]
pub fn generate_triggers(table: &Table, config: Config) -> String {
    warn_on_assumed_key(table);
    Triggers::new(table, config).to_string()
}

pub(crate) fn warn_on_assumed_key(table: &Table) {
    if table.has_declared_primary_key() {
        return;
    }
    if let Some(column) = table.columns.first() {
        warn!(
            table = %table.qualified_name(),
            column = %column.name,
            "no primary key declared; matching history rows on the first column"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserSource;
    use crate::schema::Column;

    fn users() -> Table {
        Table::new("users")
            .with_column(Column::new("id", "SERIAL", "PRIMARY KEY"))
            .with_column(Column::new("username", "VARCHAR(50)", "NOT NULL"))
    }

    #[test]
    fn test_insert_trigger() {
        let sql = generate_triggers(&users(), Config::default());
        assert!(sql.starts_with(
            "-- Insert trigger for users\n\
             CREATE OR REPLACE FUNCTION users_insert_history() RETURNS TRIGGER AS $$\n\
             BEGIN\n\
             \x20   INSERT INTO users_history (id, username, valid_from, operation)\n\
             \x20   VALUES (NEW.id, NEW.username, CURRENT_TIMESTAMP, 'I');\n\
             \x20   RETURN NEW;\n\
             END;\n\
             $$ LANGUAGE plpgsql;\n\
             \n\
             CREATE TRIGGER users_insert_trigger\n\
             \x20   AFTER INSERT ON users\n\
             \x20   FOR EACH ROW\n\
             \x20   EXECUTE FUNCTION users_insert_history();\n\
             \n"
        ));
    }

    #[test]
    fn test_update_and_delete_close_open_row() {
        let sql = generate_triggers(&users(), Config::default());
        assert!(sql.contains(
            "CREATE OR REPLACE FUNCTION users_update_history() RETURNS TRIGGER AS $$\n\
             BEGIN\n\
             \x20   UPDATE users_history SET valid_to = CURRENT_TIMESTAMP\n\
             \x20   WHERE valid_to IS NULL AND id = OLD.id;\n\
             \x20   INSERT INTO users_history (id, username, valid_from, operation)\n\
             \x20   VALUES (NEW.id, NEW.username, CURRENT_TIMESTAMP, 'U');\n\
             \x20   RETURN NEW;\n"
        ));
        assert!(sql.contains(
            "\x20   WHERE valid_to IS NULL AND id = OLD.id;\n\
             \x20   INSERT INTO users_history (id, username, valid_from, operation)\n\
             \x20   VALUES (OLD.id, OLD.username, CURRENT_TIMESTAMP, 'D');\n\
             \x20   RETURN OLD;\n"
        ));
        assert!(sql.contains("    BEFORE DELETE ON users\n"));
        assert!(sql.contains("    AFTER UPDATE ON users\n"));
    }

    #[test]
    fn test_trigger_order() {
        let sql = generate_triggers(&users(), Config::default());
        let insert = sql.find("users_insert_trigger").unwrap();
        let update = sql.find("users_update_trigger").unwrap();
        let delete = sql.find("users_delete_trigger").unwrap();
        assert!(insert < update && update < delete);
        assert_eq!(sql.matches("CREATE TRIGGER").count(), 3);
    }

    #[test]
    fn test_composite_key_predicate() {
        let table = Table::new("memberships")
            .with_column(Column::new("group_id", "INT", "PRIMARY KEY"))
            .with_column(Column::new("user_id", "INT", "PRIMARY KEY"));
        let sql = generate_triggers(&table, Config::default());
        assert_eq!(
            sql.matches("WHERE valid_to IS NULL AND group_id = OLD.group_id AND user_id = OLD.user_id;")
                .count(),
            2
        );
    }

    #[test]
    fn test_user_tracking() {
        let config = Config::default().with_track_user(true);
        let sql = generate_triggers(&users(), config);
        assert_eq!(
            sql.matches("(id, username, valid_from, operation, changed_by)")
                .count(),
            3
        );
        assert!(sql.contains("VALUES (NEW.id, NEW.username, CURRENT_TIMESTAMP, 'I', current_user);"));
        assert!(sql.contains("VALUES (OLD.id, OLD.username, CURRENT_TIMESTAMP, 'D', current_user);"));

        let sql = generate_triggers(&users(), config.with_user_source(UserSource::Session));
        assert_eq!(
            sql.matches(
                "COALESCE(NULLIF(current_setting('app.current_user', true), ''), current_user)"
            )
            .count(),
            3
        );
    }

    #[test]
    fn test_user_source_ignored_without_tracking() {
        let config = Config::default().with_user_source(UserSource::Session);
        let sql = generate_triggers(&users(), config);
        assert!(!sql.contains("changed_by"));
        assert!(!sql.contains("current_setting"));
    }

    #[test]
    fn test_assumed_key_is_flagged() {
        let table = Table::new("people")
            .with_column(Column::new("name", "TEXT", "NOT NULL"))
            .with_column(Column::new("email", "TEXT", ""));
        let sql = generate_triggers(&table, Config::default());
        assert!(sql.contains(
            "-- Update trigger for people\n\
             -- NOTE: people declares no primary key; assuming name identifies a row\n"
        ));
        assert_eq!(sql.matches("-- NOTE:").count(), 1);
        assert!(sql.contains("WHERE valid_to IS NULL AND name = OLD.name;"));

        assert!(!generate_triggers(&users(), Config::default()).contains("-- NOTE:"));
    }

    #[test]
    fn test_schema_prefix() {
        let table = Table::new("products")
            .with_schema("inventory")
            .with_column(Column::new("product_id", "INTEGER", "PRIMARY KEY"));
        let sql = generate_triggers(&table, Config::default());
        assert!(sql.contains("CREATE OR REPLACE FUNCTION inventory_products_insert_history()"));
        assert!(sql.contains("CREATE TRIGGER inventory_products_delete_trigger\n"));
        assert!(sql.contains("    AFTER INSERT ON inventory.products\n"));
        assert!(sql.contains("INSERT INTO inventory.products_history (product_id, "));
    }
}

//! `CREATE TABLE` statement splitting and decomposition.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use tracing::debug;

use super::constraints::{extract_inline_foreign_key, parse_foreign_key_constraint};
use super::lexer::{
    Lexer, Scanner, Token, TokenKind, find_top_level, matching_paren, normalize_whitespace,
    split_top_level, strip_delimiters,
};
use crate::schema::{Column, ForeignKey, Table};

const CREATE_TABLE: &str = "CREATE TABLE ";

/// Reasons a single `CREATE TABLE` statement could not be decomposed.
///
/// [`parse_create_tables`] logs these and moves on; only
/// [`parse_create_table`] returns them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The statement does not start with `CREATE TABLE <name>`.
    #[error("Missing table name in CREATE TABLE statement")]
    MissingTableName,
    /// No parenthesized column list follows the table name.
    #[error("Missing column list for table {table}")]
    MissingColumnList {
        /// The table name as written.
        table: String,
    },
    /// The column list never closes.
    #[error("Unbalanced parentheses in column list of table {table}")]
    UnbalancedParentheses {
        /// The table name as written.
        table: String,
    },
    /// The column list holds no column definition.
    #[error("No columns defined for table {table}")]
    EmptyColumnList {
        /// The table name as written.
        table: String,
    },
}

/// Columns, foreign keys and table-level key columns of a table body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableBody {
    /// Column definitions, in declaration order.
    pub columns: Vec<Column>,
    /// Inline and table-level foreign keys, in the order encountered.
    pub foreign_keys: Vec<ForeignKey>,
    /// Columns of a table-level `PRIMARY KEY (...)` clause.
    pub table_pk_columns: Vec<String>,
}

/// Parse every `CREATE TABLE` statement in `sql`.
///
/// Tables come back in source order. Statements that cannot be decomposed
/// into a name and at least one column are skipped, so one malformed
/// statement does not stop the rest of a file from being processed. An empty
/// result is for the caller to report.
///
/// # Example
///
/// ```rust
/// use sql_history::parse_create_tables;
///
/// let tables = parse_create_tables(
///     "CREATE TABLE users (id SERIAL PRIMARY KEY, name TEXT NOT NULL);
///      CREATE TABLE broken;",
/// );
/// assert_eq!(tables.len(), 1);
/// assert_eq!(tables[0].name, "users");
/// assert_eq!(tables[0].primary_key_columns(), vec!["id"]);
/// ```
#[must_use]
pub fn parse_create_tables(sql: &str) -> Vec<Table> {
    let content = normalize_whitespace(sql);
    let mut tables = Vec::new();

    for start in create_table_offsets(&content) {
        let statement = &content[start..statement_end(&content, start)];
        match parse_create_table(statement) {
            Ok(table) => {
                debug!(
                    table = %table.qualified_name(),
                    columns = table.columns.len(),
                    foreign_keys = table.foreign_keys.len(),
                    "parsed table"
                );
                tables.push(table);
            }
            Err(error) => debug!(%error, "skipping CREATE TABLE statement"),
        }
    }

    tables
}

/// Parse a single `CREATE TABLE` statement.
///
/// The statement may span several lines and end with a semicolon; anything
/// after the closing parenthesis of the column list (table options,
/// `INHERITS`, `PARTITION BY`, ...) is ignored.
///
/// # Errors
///
/// Returns a [`ParseError`] if the statement has no table name, no column
/// list, an unterminated column list, or no column definitions.
pub fn parse_create_table(statement: &str) -> Result<Table, ParseError> {
    let statement = normalize_whitespace(statement);
    let rest = strip_keyword(&statement, "CREATE")
        .and_then(|rest| strip_keyword(rest, "TABLE"))
        .ok_or(ParseError::MissingTableName)?;
    let rest = strip_keyword(rest, "IF")
        .and_then(|rest| strip_keyword(rest, "NOT"))
        .and_then(|rest| strip_keyword(rest, "EXISTS"))
        .unwrap_or(rest);

    let name_end = table_name_end(rest);
    let raw_name = &rest[..name_end];
    let (schema, name) = parse_table_name(raw_name);
    if name.is_empty() {
        return Err(ParseError::MissingTableName);
    }

    let after_name = rest[name_end..].trim_start();
    if !after_name.starts_with('(') {
        return Err(ParseError::MissingColumnList {
            table: raw_name.to_string(),
        });
    }
    let close = matching_paren(after_name, 0).ok_or_else(|| ParseError::UnbalancedParentheses {
        table: raw_name.to_string(),
    })?;

    let body = parse_columns(&after_name[1..close]);
    if body.columns.is_empty() {
        return Err(ParseError::EmptyColumnList {
            table: raw_name.to_string(),
        });
    }

    Ok(Table {
        name,
        schema,
        columns: body.columns,
        foreign_keys: body.foreign_keys,
        table_pk_columns: body.table_pk_columns,
    })
}

/// Split a possibly qualified table name into schema and bare name.
///
/// Delimiters are stripped from every dot-separated part. With more than two
/// parts, everything before the last part is the schema.
///
/// ```rust
/// use sql_history::sql::parse_table_name;
///
/// assert_eq!(parse_table_name("users"), (None, "users".to_string()));
/// assert_eq!(
///     parse_table_name("\"public\".`users`"),
///     (Some("public".to_string()), "users".to_string())
/// );
/// ```
#[must_use]
pub fn parse_table_name(raw: &str) -> (Option<String>, String) {
    let parts: Vec<&str> = split_top_level(raw.trim(), '.')
        .map(strip_delimiters)
        .collect();

    match parts.as_slice() {
        [] => (None, String::new()),
        [name] => (None, (*name).to_string()),
        [schema @ .., name] => (Some(schema.join(".")), (*name).to_string()),
    }
}

/// Decompose the text between the parentheses of a `CREATE TABLE`.
///
/// The body is split on top-level commas. Each clause is then a table-level
/// foreign key, a table-level primary key, another table-level clause
/// (`CONSTRAINT`, `KEY`, `INDEX`, `UNIQUE (...)`, `CHECK (...)`, ...), which
/// is dropped, or a column definition. Column definitions without a data type
/// are dropped as well.
#[must_use]
pub fn parse_columns(body: &str) -> TableBody {
    let body = normalize_whitespace(body);
    let mut parsed = TableBody::default();

    for clause in split_top_level(&body, ',') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }

        match classify_clause(clause) {
            Clause::ForeignKey => {
                if let Some(foreign_key) = parse_foreign_key_constraint(clause) {
                    parsed.foreign_keys.push(foreign_key);
                }
            }
            Clause::PrimaryKey(columns) => parsed.table_pk_columns.extend(columns),
            Clause::Ignored => {}
            Clause::Column => {
                let Some(column) = parse_column_definition(clause) else {
                    continue;
                };
                if let Some(foreign_key) = extract_inline_foreign_key(&column.name, &column.options)
                {
                    parsed.foreign_keys.push(foreign_key);
                }
                parsed.columns.push(column);
            }
        }
    }

    parsed
}

/// Parse `name type [options]` from whitespace-normalized text.
///
/// The name is the first top-level space-delimited token with identifier
/// delimiters stripped. Returns `None` if there is no data type.
#[must_use]
pub fn parse_column_definition(clause: &str) -> Option<Column> {
    let clause = clause.trim();
    let split = find_top_level(clause, ' ')?;

    let name = strip_delimiters(&clause[..split]);
    let rest = clause[split + 1..].trim();
    if name.is_empty() || rest.is_empty() {
        return None;
    }

    let (data_type, options) = split_data_type(rest);
    Some(Column::new(name, data_type, options))
}

/// Split `type [options]` into the data type and the trailing options.
///
/// The type is the leading top-level run up to a space, extended over a
/// detached size (`VARCHAR (50)`) and the multi-word PostgreSQL types such as
/// `DOUBLE PRECISION` or `TIMESTAMP WITH TIME ZONE`.
#[must_use]
pub fn split_data_type(rest: &str) -> (&str, &str) {
    let rest = rest.trim();
    let mut end = find_top_level(rest, ' ').unwrap_or(rest.len());

    while end < rest.len() {
        let tail = &rest[end..];
        let start = end + (tail.len() - tail.trim_start().len());
        let next_end = start + find_top_level(&rest[start..], ' ').unwrap_or(rest.len() - start);
        let next = &rest[start..next_end];

        if next.starts_with('(') || continues_type(&rest[..end], next) {
            end = next_end;
        } else {
            break;
        }
    }

    (rest[..end].trim(), rest[end..].trim())
}

/// Whether `next` continues a multi-word data type written so far as `so_far`.
fn continues_type(so_far: &str, next: &str) -> bool {
    let last = so_far
        .rsplit(' ')
        .next()
        .unwrap_or(so_far)
        .to_ascii_uppercase();
    let next = next.to_ascii_uppercase();
    let starts = |prefix: &str| last.starts_with(prefix);

    match next.as_str() {
        "PRECISION" => last == "DOUBLE",
        "WITH" | "WITHOUT" => starts("TIMESTAMP") || starts("TIME"),
        "TIME" => last == "WITH" || last == "WITHOUT",
        "ZONE" => last == "TIME" && so_far.contains(' '),
        "YEAR" | "MONTH" | "DAY" | "HOUR" | "MINUTE" | "SECOND" | "TO" => {
            so_far.to_ascii_uppercase().starts_with("INTERVAL")
        }
        varying if varying.starts_with("VARYING") => {
            matches!(last.as_str(), "CHARACTER" | "CHAR" | "BIT")
        }
        _ => false,
    }
}

/// What a top-level body clause declares.
enum Clause {
    Column,
    ForeignKey,
    PrimaryKey(Vec<String>),
    Ignored,
}

fn classify_clause(clause: &str) -> Clause {
    let tokens: Vec<Token> = Lexer::new(clause).take(5).collect();
    let keyword = |at: usize, word: &str| {
        tokens
            .get(at)
            .is_some_and(|token| token.is_keyword(clause, word))
    };
    let group_at = |at: usize| {
        tokens
            .get(at)
            .is_some_and(|token| token.kind == TokenKind::Group)
    };

    let named = keyword(0, "CONSTRAINT");
    let at = if named { 2 } else { 0 };

    if keyword(at, "FOREIGN") && keyword(at + 1, "KEY") {
        return Clause::ForeignKey;
    }
    if keyword(at, "PRIMARY") && keyword(at + 1, "KEY") {
        return match tokens.get(at + 2) {
            Some(group) if group.kind == TokenKind::Group => Clause::PrimaryKey(
                split_top_level(group.group_inner(clause), ',')
                    .map(strip_delimiters)
                    .filter(|column| !column.is_empty())
                    .map(ToString::to_string)
                    .collect(),
            ),
            _ => Clause::Ignored,
        };
    }
    if named
        || ["KEY", "INDEX", "FULLTEXT", "SPATIAL", "LIKE", "EXCLUDE"]
            .iter()
            .any(|&word| keyword(0, word))
        || (keyword(0, "UNIQUE") && (group_at(1) || keyword(1, "KEY") || keyword(1, "INDEX")))
        || (keyword(0, "CHECK") && group_at(1))
    {
        return Clause::Ignored;
    }

    Clause::Column
}

/// Byte offsets of every `CREATE TABLE` outside quoted text.
///
/// `content` must already be normalized, so the keywords are separated by
/// exactly one space.
fn create_table_offsets(content: &str) -> Vec<usize> {
    let bytes = content.as_bytes();
    let mut scanner = Scanner::new();
    let mut offsets = Vec::new();
    let mut previous: Option<char> = None;

    for (i, c) in content.char_indices() {
        if !scanner.in_quote()
            && (c == 'C' || c == 'c')
            && !previous.is_some_and(is_identifier_char)
            && bytes
                .get(i..i + CREATE_TABLE.len())
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(CREATE_TABLE.as_bytes()))
        {
            offsets.push(i);
        }
        scanner.feed(c);
        previous = Some(c);
    }

    offsets
}

/// End of the statement starting at `start`: just past the first top-level
/// semicolon, or the end of the input.
fn statement_end(content: &str, start: usize) -> usize {
    find_top_level(&content[start..], ';').map_or(content.len(), |offset| start + offset + 1)
}

/// Where the table name ends: the first top-level space or `(`.
fn table_name_end(rest: &str) -> usize {
    let mut scanner = Scanner::new();
    for (i, c) in rest.char_indices() {
        if scanner.is_top_level() && (c == ' ' || c == '(') {
            return i;
        }
        scanner.feed(c);
    }
    rest.len()
}

/// Strip a leading keyword followed by a space (or the end of input).
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let head = text.get(..keyword.len())?;
    let tail = &text[keyword.len()..];
    if head.eq_ignore_ascii_case(keyword) && (tail.is_empty() || tail.starts_with(' ')) {
        Some(tail.trim_start())
    } else {
        None
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ReferentialAction;
    use alloc::vec;

    #[test]
    fn test_parse_create_tables() {
        let sql = "
            CREATE TABLE users (
                id SERIAL PRIMARY KEY,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(100) NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE products (
                product_id INTEGER PRIMARY KEY,
                name VARCHAR(200) NOT NULL,
                price DECIMAL(10,2) NOT NULL
            );
        ";

        let tables = parse_create_tables(sql);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "users");
        assert_eq!(tables[1].name, "products");
        assert_eq!(tables[0].columns.len(), 4);
        assert_eq!(tables[1].columns[2].data_type, "DECIMAL(10,2)");
    }

    #[test]
    fn test_parse_create_tables_with_schema() {
        let sql = "
            CREATE TABLE public.users (id SERIAL PRIMARY KEY, username VARCHAR(50) NOT NULL);
            CREATE TABLE inventory.products (product_id INTEGER PRIMARY KEY, name VARCHAR(200));
        ";

        let tables = parse_create_tables(sql);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].schema.as_deref(), Some("public"));
        assert_eq!(tables[0].name, "users");
        assert_eq!(tables[1].schema.as_deref(), Some("inventory"));
        assert_eq!(tables[1].name, "products");
    }

    #[test]
    fn test_parse_columns() {
        let body = parse_columns("id SERIAL PRIMARY KEY, username VARCHAR(50) NOT NULL, price DECIMAL(10,2)");

        assert_eq!(body.columns.len(), 3);
        assert!(body.foreign_keys.is_empty());

        let expected = [
            ("id", "SERIAL", "PRIMARY KEY"),
            ("username", "VARCHAR(50)", "NOT NULL"),
            ("price", "DECIMAL(10,2)", ""),
        ];
        for (column, (name, data_type, options)) in body.columns.iter().zip(expected) {
            assert_eq!(column.name, name);
            assert_eq!(column.data_type, data_type);
            assert_eq!(column.options, options);
        }
    }

    #[test]
    fn test_parse_foreign_keys_inline_then_table_level() {
        let sql = "
            CREATE TABLE orders (
                order_id SERIAL PRIMARY KEY,
                user_id INTEGER REFERENCES users(id) ON DELETE CASCADE,
                total DECIMAL(10,2) NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE SET NULL ON UPDATE CASCADE
            );
        ";

        let tables = parse_create_tables(sql);
        let orders = &tables[0];
        assert_eq!(orders.columns.len(), 3);
        assert_eq!(orders.foreign_keys.len(), 2);

        let inline = &orders.foreign_keys[0];
        assert_eq!(inline.column_name, "user_id");
        assert_eq!(inline.referenced_table, "users");
        assert_eq!(inline.referenced_column, "id");
        assert_eq!(inline.on_delete, Some(ReferentialAction::Cascade));
        assert_eq!(inline.on_update, None);

        let constraint = &orders.foreign_keys[1];
        assert_eq!(constraint.column_name, "user_id");
        assert_eq!(constraint.on_delete, Some(ReferentialAction::SetNull));
        assert_eq!(constraint.on_update, Some(ReferentialAction::Cascade));
    }

    #[test]
    fn test_table_level_clauses_are_not_columns() {
        let body = parse_columns(
            "a INT, b INT, c TEXT, PRIMARY KEY (a, b), CONSTRAINT uq UNIQUE (c), \
             UNIQUE (b, c), CHECK (a > 0), KEY idx_c (c), INDEX (b), \
             CONSTRAINT fk_c FOREIGN KEY (c) REFERENCES other (name)",
        );
        assert_eq!(
            body.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(body.table_pk_columns, vec!["a", "b"]);
        assert_eq!(body.foreign_keys.len(), 1);
        assert_eq!(body.foreign_keys[0].column_name, "c");
        assert_eq!(body.foreign_keys[0].referenced_table, "other");
    }

    #[test]
    fn test_keyword_prefixed_column_names_stay_columns() {
        let body = parse_columns("keyword TEXT, primary_contact TEXT, indexed BOOLEAN");
        assert_eq!(body.columns.len(), 3);
        assert_eq!(body.columns[0].name, "keyword");
        assert_eq!(body.columns[2].name, "indexed");
    }

    #[test]
    fn test_column_without_type_is_skipped() {
        let body = parse_columns("id, name TEXT");
        assert_eq!(body.columns.len(), 1);
        assert_eq!(body.columns[0].name, "name");
    }

    #[test]
    fn test_quoted_names() {
        let tables =
            parse_create_tables("CREATE TABLE \"sales\".\"order items\" (\"line no\" INT PRIMARY KEY, `qty` INT)");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].schema.as_deref(), Some("sales"));
        assert_eq!(tables[0].name, "order items");
        assert_eq!(tables[0].columns[0].name, "line no");
        assert_eq!(tables[0].columns[1].name, "qty");
    }

    #[test]
    fn test_multi_word_types() {
        let cases = [
            ("DOUBLE PRECISION NOT NULL", "DOUBLE PRECISION", "NOT NULL"),
            (
                "TIMESTAMP WITH TIME ZONE DEFAULT now()",
                "TIMESTAMP WITH TIME ZONE",
                "DEFAULT now()",
            ),
            ("TIME(3) WITHOUT TIME ZONE", "TIME(3) WITHOUT TIME ZONE", ""),
            ("CHARACTER VARYING(20) UNIQUE", "CHARACTER VARYING(20)", "UNIQUE"),
            ("VARCHAR (50) NOT NULL", "VARCHAR (50)", "NOT NULL"),
            ("INTERVAL DAY TO SECOND", "INTERVAL DAY TO SECOND", ""),
            ("TEXT DEFAULT 'a b'", "TEXT", "DEFAULT 'a b'"),
            ("NUMERIC(10, 2) CHECK (x > 0)", "NUMERIC(10, 2)", "CHECK (x > 0)"),
        ];
        for (rest, data_type, options) in cases {
            assert_eq!(split_data_type(rest), (data_type, options), "{rest}");
        }
    }

    #[test]
    fn test_statement_boundaries() {
        let sql = "CREATE TABLE a (x INT, note TEXT DEFAULT 'semi;colon') ; \
                   create table IF NOT EXISTS b (y INT)";
        let tables = parse_create_tables(sql);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].columns[1].options, "DEFAULT 'semi;colon'");
        assert_eq!(tables[1].name, "b");
    }

    #[test]
    fn test_comments_and_strings_are_not_statements() {
        let sql = "
            -- CREATE TABLE commented (id INT);
            /* CREATE TABLE blocked (id INT); */
            CREATE TABLE notes (
                id INT PRIMARY KEY,
                body TEXT DEFAULT 'CREATE TABLE fake (x INT);'
            );
            CREATE TABLE_LIKE_NAME (id INT);
        ";
        let tables = parse_create_tables(sql);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "notes");
    }

    #[test]
    fn test_malformed_statements_are_skipped() {
        let sql = "
            CREATE TABLE good_one (id INT);
            CREATE TABLE no_body;
            CREATE TABLE copy AS SELECT * FROM good_one;
            CREATE TABLE only_constraints (PRIMARY KEY (id));
            CREATE TABLE good_two (id INT);
        ";
        let names: Vec<String> = parse_create_tables(sql).into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["good_one", "good_two"]);
    }

    #[test]
    fn test_parse_create_table_errors() {
        assert_eq!(parse_create_table("CREATE TABLE"), Err(ParseError::MissingTableName));
        assert_eq!(
            parse_create_table("CREATE TABLE t;"),
            Err(ParseError::MissingColumnList { table: "t;".into() })
        );
        assert_eq!(
            parse_create_table("CREATE TABLE t (id INT"),
            Err(ParseError::UnbalancedParentheses { table: "t".into() })
        );
        assert_eq!(
            parse_create_table("CREATE TABLE t (CHECK (1 = 1))"),
            Err(ParseError::EmptyColumnList { table: "t".into() })
        );
        assert_eq!(parse_create_table("SELECT 1"), Err(ParseError::MissingTableName));
    }

    #[test]
    fn test_trailing_table_options_are_ignored() {
        let table = parse_create_table(
            "CREATE TABLE events (id BIGINT PRIMARY KEY, at TIMESTAMPTZ) PARTITION BY RANGE (at);",
        )
        .unwrap();
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[1].data_type, "TIMESTAMPTZ");
    }

    #[test]
    fn test_parse_table_name() {
        assert_eq!(parse_table_name("users"), (None, "users".into()));
        assert_eq!(
            parse_table_name("[dbo].[users]"),
            (Some("dbo".into()), "users".into())
        );
        assert_eq!(
            parse_table_name("db.public.users"),
            (Some("db.public".into()), "users".into())
        );
    }
}

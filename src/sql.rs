//! Hand-rolled reader for `CREATE TABLE` statements.
//!
//! This is not a SQL parser. It understands just enough of the
//! `CREATE TABLE` grammar to find table names, column definitions and
//! foreign keys, and it tolerates dialect differences (PostgreSQL, MySQL,
//! SQLite, SQL Server bracket quoting) by keeping anything it does not
//! recognize as opaque text:
//!
//! - [`lexer`] tracks quotes and parenthesis depth, splits on top-level
//!   delimiters and normalizes whitespace;
//! - [`parser`] splits a script into statements and a table body into
//!   clauses;
//! - [`constraints`] classifies column options and reads `REFERENCES` and
//!   `FOREIGN KEY` clauses.

pub mod constraints;
pub mod lexer;
pub mod parser;

pub use constraints::{
    extract_inline_foreign_key, parse_column_constraints, parse_foreign_key_constraint,
};
pub use lexer::{Lexer, Scanner, Token, TokenKind, normalize_whitespace, split_top_level};
pub use parser::{
    ParseError, TableBody, parse_column_definition, parse_columns, parse_create_table,
    parse_create_tables, parse_table_name, split_data_type,
};

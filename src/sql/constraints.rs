//! Classification of column options and `REFERENCES` clauses.
//!
//! Options text stays the source of truth on [`Column`](crate::Column); this
//! module only labels runs of it. Every [`ColumnConstraint`] carries the exact
//! slice it was cut from, so anything the classifier does not understand is
//! reproduced verbatim as [`ConstraintKind::Other`].

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use super::lexer::{Lexer, Token, TokenKind, split_top_level, strip_delimiters};
use super::parser::parse_table_name;
use crate::schema::{ColumnConstraint, ConstraintKind, ForeignKey, ReferentialAction};

/// Words that begin a new column constraint.
const CONSTRAINT_KEYWORDS: &[&str] = &[
    "CONSTRAINT",
    "PRIMARY",
    "UNIQUE",
    "NULL",
    "DEFAULT",
    "AUTO_INCREMENT",
    "AUTOINCREMENT",
    "IDENTITY",
    "GENERATED",
    "CHECK",
    "REFERENCES",
    "COLLATE",
];

/// Split a column's options text into classified constraints.
///
/// Recognized forms, each optionally preceded by `CONSTRAINT <name>`:
/// `PRIMARY KEY [ASC|DESC]`, `UNIQUE [KEY]`, `NOT NULL`, `NULL`,
/// `DEFAULT <expr>`, `AUTO_INCREMENT`, `AUTOINCREMENT`, `IDENTITY[(...)]`,
/// `GENERATED {ALWAYS|BY DEFAULT} AS IDENTITY [(...)]`, `CHECK (...)` and
/// `REFERENCES ...`. A `DEFAULT` expression runs up to the next constraint
/// keyword. Anything else is grouped into [`ConstraintKind::Other`] runs.
#[must_use]
pub fn parse_column_constraints(options: &str) -> Vec<ColumnConstraint> {
    let tokens: Vec<Token> = Lexer::new(options).collect();
    let mut constraints = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let body = if tokens[i].is_keyword(options, "CONSTRAINT") {
            (i + 2).min(tokens.len())
        } else {
            i
        };

        let (kind, end) = classify(options, &tokens, body).unwrap_or_else(|| {
            (
                ConstraintKind::Other,
                next_constraint(options, &tokens, body + 1),
            )
        });

        let text = options[tokens[i].start..tokens[end - 1].end].trim();
        constraints.push(ColumnConstraint {
            kind,
            text: text.to_string(),
        });
        i = end;
    }

    constraints
}

/// Extract the foreign key declared by an inline `REFERENCES` clause.
///
/// Returns `None` when the options contain no `REFERENCES` clause or the
/// clause names no table.
#[must_use]
pub fn extract_inline_foreign_key(column_name: &str, options: &str) -> Option<ForeignKey> {
    let tokens: Vec<Token> = Lexer::new(options).collect();
    let at = tokens
        .iter()
        .position(|token| token.is_keyword(options, "REFERENCES"))?;

    let (mut foreign_key, _) = parse_reference(options, &tokens, at)?;
    foreign_key.column_name = column_name.to_string();
    Some(foreign_key)
}

/// Parse a table-level `[CONSTRAINT <name>] FOREIGN KEY (<cols>) REFERENCES ...`
/// clause.
///
/// Returns `None` unless the clause has that shape with a non-empty source
/// column list.
#[must_use]
pub fn parse_foreign_key_constraint(clause: &str) -> Option<ForeignKey> {
    let tokens: Vec<Token> = Lexer::new(clause).collect();
    let mut at = 0;
    if tokens
        .first()
        .is_some_and(|token| token.is_keyword(clause, "CONSTRAINT"))
    {
        at = 2;
    }

    if !(keyword_at(clause, &tokens, at, "FOREIGN") && keyword_at(clause, &tokens, at + 1, "KEY"))
    {
        return None;
    }
    let columns = tokens
        .get(at + 2)
        .filter(|token| token.kind == TokenKind::Group)?;
    let column_name = identifier_list(columns.group_inner(clause));
    if column_name.is_empty() || !keyword_at(clause, &tokens, at + 3, "REFERENCES") {
        return None;
    }

    let (mut foreign_key, _) = parse_reference(clause, &tokens, at + 3)?;
    foreign_key.column_name = column_name;
    Some(foreign_key)
}

/// Parse `REFERENCES <table> [(<cols>)]` and its trailing modifiers starting
/// at the `REFERENCES` token `at`.
///
/// Modifiers accepted in any order: `ON DELETE <action>`,
/// `ON UPDATE <action>`, `MATCH <kind>`, `[NOT] DEFERRABLE`,
/// `INITIALLY <mode>`. Returns the foreign key (with an empty source column)
/// and the index of the first token after the clause.
pub(crate) fn parse_reference(
    input: &str,
    tokens: &[Token],
    at: usize,
) -> Option<(ForeignKey, usize)> {
    let first = tokens
        .get(at + 1)
        .filter(|token| matches!(token.kind, TokenKind::Word | TokenKind::QuotedIdent))?;

    // `"s"."t"` lexes as several adjacent tokens; glue them back together.
    let mut last = *first;
    let mut i = at + 2;
    while let Some(token) = tokens.get(i) {
        if token.start != last.end
            || !matches!(token.kind, TokenKind::Word | TokenKind::QuotedIdent)
        {
            break;
        }
        last = *token;
        i += 1;
    }
    let (schema, name) = parse_table_name(&input[first.start..last.end]);
    let referenced_table = match schema {
        Some(schema) => alloc::format!("{schema}.{name}"),
        None => name,
    };

    let mut foreign_key = ForeignKey {
        referenced_table,
        ..ForeignKey::default()
    };

    if let Some(group) = tokens.get(i).filter(|token| token.kind == TokenKind::Group) {
        foreign_key.referenced_column = identifier_list(group.group_inner(input));
        i += 1;
    }

    loop {
        if keyword_at(input, tokens, i, "ON") {
            let is_delete = keyword_at(input, tokens, i + 1, "DELETE");
            if !is_delete && !keyword_at(input, tokens, i + 1, "UPDATE") {
                break;
            }
            let (action, next) = parse_action(input, tokens, i + 2)?;
            if is_delete {
                foreign_key.on_delete = Some(action);
            } else {
                foreign_key.on_update = Some(action);
            }
            i = next;
        } else if keyword_at(input, tokens, i, "MATCH")
            || keyword_at(input, tokens, i, "INITIALLY")
        {
            i = (i + 2).min(tokens.len());
        } else if keyword_at(input, tokens, i, "DEFERRABLE") {
            i += 1;
        } else if keyword_at(input, tokens, i, "NOT")
            && keyword_at(input, tokens, i + 1, "DEFERRABLE")
        {
            i += 2;
        } else {
            break;
        }
    }

    Some((foreign_key, i))
}

/// Parse the referential action starting at `at`.
fn parse_action(input: &str, tokens: &[Token], at: usize) -> Option<(ReferentialAction, usize)> {
    let first = tokens.get(at).filter(|token| token.kind == TokenKind::Word)?;
    let two_words = (first.is_keyword(input, "SET")
        && (keyword_at(input, tokens, at + 1, "NULL")
            || keyword_at(input, tokens, at + 1, "DEFAULT")))
        || (first.is_keyword(input, "NO") && keyword_at(input, tokens, at + 1, "ACTION"));
    let end = if two_words { at + 2 } else { at + 1 };

    let text = &input[first.start..tokens[end - 1].end];
    Some((ReferentialAction::from_sql(text), end))
}

/// Classify the constraint whose first significant token is `at`, returning
/// its kind and the index one past its last token.
fn classify(input: &str, tokens: &[Token], at: usize) -> Option<(ConstraintKind, usize)> {
    let token = tokens.get(at).filter(|token| token.kind == TokenKind::Word)?;
    let word = token.text(input).to_ascii_uppercase();

    match word.as_str() {
        "PRIMARY" if keyword_at(input, tokens, at + 1, "KEY") => {
            let mut end = at + 2;
            if keyword_at(input, tokens, end, "ASC") || keyword_at(input, tokens, end, "DESC") {
                end += 1;
            }
            Some((ConstraintKind::PrimaryKey, end))
        }
        "UNIQUE" => {
            let end = if keyword_at(input, tokens, at + 1, "KEY") {
                at + 2
            } else {
                at + 1
            };
            Some((ConstraintKind::Unique, end))
        }
        "NOT" if keyword_at(input, tokens, at + 1, "NULL") => Some((ConstraintKind::NotNull, at + 2)),
        "NULL" => Some((ConstraintKind::Null, at + 1)),
        // The first expression token is always part of the default, so
        // `DEFAULT NULL` stays one constraint.
        "DEFAULT" => Some((ConstraintKind::Default, next_constraint(input, tokens, at + 2))),
        "AUTO_INCREMENT" | "AUTOINCREMENT" => Some((ConstraintKind::AutoIncrement, at + 1)),
        "IDENTITY" => Some((ConstraintKind::AutoIncrement, skip_group(tokens, at + 1))),
        "GENERATED" => {
            let mut k = at + 1;
            if keyword_at(input, tokens, k, "ALWAYS") {
                k += 1;
            } else if keyword_at(input, tokens, k, "BY")
                && keyword_at(input, tokens, k + 1, "DEFAULT")
            {
                k += 2;
            } else {
                return None;
            }
            if !(keyword_at(input, tokens, k, "AS") && keyword_at(input, tokens, k + 1, "IDENTITY"))
            {
                return None;
            }
            Some((ConstraintKind::AutoIncrement, skip_group(tokens, k + 2)))
        }
        "CHECK" => Some((ConstraintKind::Check, skip_group(tokens, at + 1))),
        "REFERENCES" => {
            parse_reference(input, tokens, at).map(|(_, end)| (ConstraintKind::References, end))
        }
        _ => None,
    }
}

/// Index of the first token at or after `from` that starts a constraint.
fn next_constraint(input: &str, tokens: &[Token], from: usize) -> usize {
    let mut i = from.min(tokens.len());
    while i < tokens.len() && !starts_constraint(input, tokens, i) {
        i += 1;
    }
    i
}

fn starts_constraint(input: &str, tokens: &[Token], at: usize) -> bool {
    let token = tokens[at];
    if token.is_keyword(input, "NOT") {
        return keyword_at(input, tokens, at + 1, "NULL");
    }
    CONSTRAINT_KEYWORDS
        .iter()
        .any(|keyword| token.is_keyword(input, keyword))
}

fn skip_group(tokens: &[Token], at: usize) -> usize {
    match tokens.get(at) {
        Some(token) if token.kind == TokenKind::Group => at + 1,
        _ => at.min(tokens.len()),
    }
}

fn keyword_at(input: &str, tokens: &[Token], at: usize, keyword: &str) -> bool {
    tokens
        .get(at)
        .is_some_and(|token| token.is_keyword(input, keyword))
}

/// Normalize a parenthesized identifier list to `a, b`.
fn identifier_list(inner: &str) -> String {
    let mut list = String::new();
    for part in split_top_level(inner, ',') {
        let name = strip_delimiters(part);
        if name.is_empty() {
            continue;
        }
        if !list.is_empty() {
            list.push_str(", ");
        }
        list.push_str(name);
    }
    list
}

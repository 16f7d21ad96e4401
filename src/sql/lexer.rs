//! Structural SQL scanning.
//!
//! Everything in the parser that needs to know whether a character sits at
//! the top level of a statement goes through [`Scanner`]: statement-end
//! detection, comma splitting of table bodies, data-type splitting and
//! comment stripping. [`Lexer`] builds on the same rules to cut clause text
//! into coarse tokens whose byte spans point back into the source, so the
//! source text of any token run can be recovered verbatim.

use alloc::string::String;

/// Parenthesis depth and quote state while walking SQL text.
///
/// A quote character (`'`, `"` or `` ` ``) opens a string only when no string
/// is open, and only the same character closes it. Parentheses change the
/// depth only outside strings; a stray `)` never drives the depth below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scanner {
    depth: usize,
    quote: Option<char>,
}

impl Scanner {
    /// Create a scanner positioned at the top level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the state with the next character.
    pub fn feed(&mut self, c: char) {
        match self.quote {
            Some(open) => {
                if c == open {
                    self.quote = None;
                }
            }
            None => match c {
                '\'' | '"' | '`' => self.quote = Some(c),
                '(' => self.depth += 1,
                ')' => self.depth = self.depth.saturating_sub(1),
                _ => {}
            },
        }
    }

    /// Current parenthesis depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether a quoted string is open.
    #[must_use]
    pub fn in_quote(&self) -> bool {
        self.quote.is_some()
    }

    /// Whether the scanner is outside every parenthesis and string.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.depth == 0 && self.quote.is_none()
    }
}

/// Iterator over the top-level segments of a string.
///
/// Created by [`split_top_level`].
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    input: &'a str,
    pos: usize,
    delimiter: char,
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.input.len() {
            return None;
        }

        let rest = &self.input[self.pos..];
        match find_top_level(rest, self.delimiter) {
            Some(offset) => {
                self.pos += offset + self.delimiter.len_utf8();
                Some(&rest[..offset])
            }
            None => {
                self.pos = self.input.len();
                Some(rest)
            }
        }
    }
}

/// Split `input` on every occurrence of `delimiter` that is outside
/// parentheses and quotes.
///
/// A trailing empty segment is not yielded, so `"a,b,"` produces `"a"` and
/// `"b"`. Segments are not trimmed.
#[must_use]
pub fn split_top_level(input: &str, delimiter: char) -> Segments<'_> {
    Segments {
        input,
        pos: 0,
        delimiter,
    }
}

/// Byte offset of the first top-level occurrence of `delimiter`.
#[must_use]
pub fn find_top_level(input: &str, delimiter: char) -> Option<usize> {
    let mut scanner = Scanner::new();
    for (i, c) in input.char_indices() {
        if c == delimiter && scanner.is_top_level() {
            return Some(i);
        }
        scanner.feed(c);
    }
    None
}

/// Byte offset of the parenthesis closing the `(` found at `open`.
///
/// Returns `None` if `open` does not point at `(` or the group never closes.
#[must_use]
pub fn matching_paren(input: &str, open: usize) -> Option<usize> {
    if input.as_bytes().get(open) != Some(&b'(') {
        return None;
    }

    let mut scanner = Scanner::new();
    for (i, c) in input[open..].char_indices() {
        scanner.feed(c);
        if c == ')' && scanner.is_top_level() {
            return Some(open + i);
        }
    }
    None
}

/// Strip comments and collapse whitespace outside quoted strings.
///
/// `--` comments run to the end of the line, `/* */` comments to their
/// terminator; both count as whitespace. Any run of whitespace outside quotes
/// becomes a single space and the result is trimmed. Quoted text is copied
/// unchanged.
#[must_use]
pub fn normalize_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut scanner = Scanner::new();
    let mut chars = input.chars().peekable();
    let mut pending_space = false;

    while let Some(c) = chars.next() {
        if !scanner.in_quote() {
            if c == '-' && chars.peek() == Some(&'-') {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
                pending_space = true;
                continue;
            }
            if c == '/' && chars.peek() == Some(&'*') {
                chars.next();
                let mut previous = '\0';
                for skipped in chars.by_ref() {
                    if previous == '*' && skipped == '/' {
                        break;
                    }
                    previous = skipped;
                }
                pending_space = true;
                continue;
            }
            if c.is_whitespace() {
                pending_space = true;
                continue;
            }
        }

        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        scanner.feed(c);
        out.push(c);
    }

    out
}

/// Strip identifier delimiters (`` ` ``, `"`, `[`, `]`) from both ends.
#[must_use]
pub fn strip_delimiters(identifier: &str) -> &str {
    identifier
        .trim()
        .trim_matches(|c| matches!(c, '`' | '"' | '[' | ']'))
}

/// The different kinds of tokens produced by [`Lexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Keyword, bare identifier or number, dots included (`public.users`, `3.14`).
    Word,
    /// Single-quoted string literal, quotes included.
    Literal,
    /// Identifier in double quotes, backticks or brackets, delimiters included.
    QuotedIdent,
    /// A balanced parenthesized span, parentheses included.
    Group,
    /// A comma.
    Comma,
    /// Any other single character.
    Symbol,
}

/// A token with its byte span in the lexed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// Byte offset where the token starts.
    pub start: usize,
    /// Byte offset one past the token's last byte.
    pub end: usize,
}

impl Token {
    /// The token's source text.
    #[must_use]
    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start..self.end]
    }

    /// Whether this is a word equal to `keyword`, ignoring ASCII case.
    #[must_use]
    pub fn is_keyword(&self, input: &str, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text(input).eq_ignore_ascii_case(keyword)
    }

    /// For a [`TokenKind::Group`], the text between the parentheses.
    #[must_use]
    pub fn group_inner<'a>(&self, input: &'a str) -> &'a str {
        let text = self.text(input);
        let text = text.strip_prefix('(').unwrap_or(text);
        text.strip_suffix(')').unwrap_or(text)
    }
}

/// Coarse SQL tokenizer over a single clause.
///
/// The lexer never fails: an unterminated string or group simply extends to
/// the end of the input.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    /// Position just past the first `close` at or after `from`, honouring
    /// doubled-quote escapes when `close` is a quote character.
    fn scan_quoted(&self, from: usize, close: char) -> usize {
        let mut i = from;
        while let Some(offset) = self.input[i..].find(close) {
            let at = i + offset + close.len_utf8();
            // A doubled quote is an escaped quote, not the terminator.
            if close != ']' && self.input[at..].starts_with(close) {
                i = at + close.len_utf8();
                continue;
            }
            return at;
        }
        self.input.len()
    }

    fn scan_word(&self, from: usize) -> usize {
        self.input[from..]
            .char_indices()
            .find(|&(_, c)| !is_word_char(c))
            .map_or(self.input.len(), |(i, _)| from + i)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let start = self.pos;
        let c = self.input[start..].chars().next()?;

        let (kind, end) = match c {
            '(' => (
                TokenKind::Group,
                matching_paren(self.input, start).map_or(self.input.len(), |close| close + 1),
            ),
            '\'' => (TokenKind::Literal, self.scan_quoted(start + 1, '\'')),
            '"' | '`' => (TokenKind::QuotedIdent, self.scan_quoted(start + 1, c)),
            '[' => (TokenKind::QuotedIdent, self.scan_quoted(start + 1, ']')),
            ',' => (TokenKind::Comma, start + 1),
            _ if is_word_char(c) => (TokenKind::Word, self.scan_word(start)),
            _ => (TokenKind::Symbol, start + c.len_utf8()),
        };

        self.pos = end;
        Some(Token { kind, start, end })
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '.')
}

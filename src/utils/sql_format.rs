//! SQL text passes: keyword bolding, normalization, N+1 detection.
//!
//! Everything here is a linear scan over one short statement; the tokenizer
//! segments the text and the passes decide what to do with each token.

use crate::db::QueryRecord;
use crate::utils::html_escape;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Recognized keywords, uppercase, sorted for binary search.
static KEYWORDS: &[&str] = &[
	"ALL", "ALTER", "AND", "AS", "ASC", "BEGIN", "BETWEEN", "BY", "CASE", "CAST", "COMMIT",
	"CREATE", "CROSS", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END", "EXISTS",
	"FROM", "FULL", "GROUP", "HAVING", "ILIKE", "IN", "INDEX", "INNER", "INSERT", "INTO", "IS",
	"JOIN", "LEFT", "LIKE", "LIMIT", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER",
	"PRIMARY", "RETURNING", "RIGHT", "ROLLBACK", "SELECT", "SET", "TABLE", "THEN", "UNION",
	"UPDATE", "USING", "VALUES", "WHEN", "WHERE",
];

/// Token classes produced by [`tokenize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	/// A word recognized as a SQL keyword.
	Keyword,
	/// An identifier or unrecognized word.
	Word,
	/// A numeric literal.
	Number,
	/// A single-quoted string literal.
	StringLit,
	/// A whitespace run.
	Whitespace,
	/// Operators, punctuation and anything else.
	Punct,
}

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"'(?:[^'\\]|\\.)*'|\b\d+(?:\.\d+)?\b|[A-Za-z_][A-Za-z0-9_]*|\s+|[^\sA-Za-z0-9_']+"#)
		.unwrap()
});

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)--.*$").unwrap());

fn classify(text: &str) -> TokenKind {
	let first = text.chars().next().unwrap_or(' ');
	if first == '\'' && text.len() >= 2 && text.ends_with('\'') {
		TokenKind::StringLit
	} else if first.is_ascii_digit() {
		TokenKind::Number
	} else if first.is_ascii_alphabetic() || first == '_' {
		if KEYWORDS
			.binary_search(&text.to_ascii_uppercase().as_str())
			.is_ok()
		{
			TokenKind::Keyword
		} else {
			TokenKind::Word
		}
	} else if first.is_whitespace() {
		TokenKind::Whitespace
	} else {
		TokenKind::Punct
	}
}

/// Segment a statement into classified tokens.
///
/// Text the tokenizer cannot place (stray quotes, malformed literals) is
/// passed through as [`TokenKind::Punct`] so the original text survives
/// verbatim.
pub fn tokenize(sql: &str) -> Vec<(TokenKind, &str)> {
	let mut tokens = Vec::new();
	let mut pos = 0;
	while pos < sql.len() {
		match TOKEN_RE.find_at(sql, pos) {
			Some(m) if m.start() == pos => {
				tokens.push((classify(m.as_str()), m.as_str()));
				pos = m.end();
			}
			Some(m) => {
				tokens.push((TokenKind::Punct, &sql[pos..m.start()]));
				pos = m.start();
			}
			None => {
				tokens.push((TokenKind::Punct, &sql[pos..]));
				break;
			}
		}
	}
	tokens
}

/// Reformat a statement for display: every token HTML-escaped, keyword
/// tokens wrapped in `<strong>` markers, ordering and non-keyword text
/// preserved verbatim.
pub fn reformat_sql(sql: &str) -> String {
	let mut out = String::with_capacity(sql.len() + 32);
	for (kind, text) in tokenize(sql) {
		let is_keyword = kind == TokenKind::Keyword;
		if is_keyword {
			out.push_str("<strong>");
		}
		out.push_str(&html_escape(text));
		if is_keyword {
			out.push_str("</strong>");
		}
	}
	out
}

/// Normalize a statement for duplicate detection.
///
/// Comments are stripped, string and numeric literals collapse to `?`,
/// words fold to uppercase and whitespace collapses to single spaces, so
/// statements differing only in bound values compare equal.
pub fn normalize_sql(sql: &str) -> String {
	let sql = COMMENT_RE.replace_all(sql, "");
	let mut out = String::with_capacity(sql.len());
	for (kind, text) in tokenize(&sql) {
		match kind {
			TokenKind::Whitespace => {
				if !out.ends_with(' ') {
					out.push(' ');
				}
			}
			TokenKind::Number | TokenKind::StringLit => out.push('?'),
			TokenKind::Keyword | TokenKind::Word => out.push_str(&text.to_ascii_uppercase()),
			TokenKind::Punct => out.push_str(text),
		}
	}
	out.trim().to_string()
}

/// How many occurrences of one normalized shape look like an N+1 loop.
const N_PLUS_ONE_THRESHOLD: usize = 3;

/// Detect N+1 query patterns.
///
/// Returns the normalized shapes that occur more than three times, in
/// first-seen order.
pub fn detect_n_plus_one(queries: &[QueryRecord]) -> Vec<String> {
	let mut normalized_counts: HashMap<String, usize> = HashMap::new();
	let mut patterns = Vec::new();
	for query in queries {
		let normalized = normalize_sql(&query.sql);
		let count = normalized_counts.entry(normalized.clone()).or_insert(0);
		*count += 1;
		if *count > N_PLUS_ONE_THRESHOLD && !patterns.contains(&normalized) {
			patterns.push(normalized);
		}
	}
	patterns
}

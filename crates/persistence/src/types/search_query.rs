//! The task search query language.
//!
//! A query is a whitespace-separated list of clauses that must all match:
//!
//! | Clause | Meaning |
//! |--------|---------|
//! | `*` | matches every task |
//! | `id:42`, `status:1` | integer equality |
//! | `nameEn:inventory` | case-insensitive equality on a text field |
//! | `code:INV*` | case-insensitive prefix match on a text field |
//! | `stock` | case-insensitive substring match on any text field |
//!
//! Values may be double-quoted to include whitespace (`nameEn:"stock take"`).
//! A quoted value is taken literally, so `code:"A*"` matches the code `A*`.
//! The keyword `AND` is accepted between clauses and ignored.

use std::fmt;

use super::field::TaskField;
use super::task::Task;
use crate::error::{SearchError, SearchResult};

/// One clause of a parsed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Matches every task.
    All,
    /// Integer field equals the value.
    IntEquals { field: TaskField, value: i64 },
    /// Text field equals the value, ignoring case.
    TextEquals { field: TaskField, value: String },
    /// Text field starts with the prefix, ignoring case.
    TextPrefix { field: TaskField, prefix: String },
    /// Any text field contains the term, ignoring case.
    Term(String),
}

/// A parsed search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    raw: String,
    clauses: Vec<Clause>,
}

impl SearchQuery {
    /// Parses a query string.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::QueryParseError` when the query is empty, names an
    /// unknown field, has an empty or non-integer value where one is required,
    /// or leaves a quote unterminated.
    pub fn parse(input: &str) -> SearchResult<Self> {
        let tokens = tokenize(input)?;
        let mut clauses = Vec::new();

        for token in tokens {
            match token.field {
                None => {
                    if !token.quoted && token.value == "*" {
                        clauses.push(Clause::All);
                    } else if !token.quoted && token.value == "AND" {
                        continue;
                    } else {
                        let term = if token.quoted {
                            token.value
                        } else {
                            token.value.trim_end_matches('*').to_string()
                        };
                        if term.is_empty() {
                            return Err(parse_error("empty search term"));
                        }
                        clauses.push(Clause::Term(term));
                    }
                }
                Some(name) => clauses.push(field_clause(&name, token.value, token.quoted)?),
            }
        }

        if clauses.is_empty() {
            return Err(parse_error("query is empty"));
        }

        Ok(Self {
            raw: input.trim().to_string(),
            clauses,
        })
    }

    /// A query matching every task.
    pub fn all() -> Self {
        Self {
            raw: "*".to_string(),
            clauses: vec![Clause::All],
        }
    }

    /// A query matching the task with the given id.
    pub fn by_id(id: i64) -> Self {
        Self {
            raw: format!("id:{id}"),
            clauses: vec![Clause::IntEquals {
                field: TaskField::Id,
                value: id,
            }],
        }
    }

    /// The query as written, trimmed.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parsed clauses.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Evaluates the query against a task in memory.
    pub fn matches(&self, task: &Task) -> bool {
        self.clauses.iter().all(|clause| clause.matches(task))
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Clause {
    /// Evaluates this clause against a task in memory.
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Clause::All => true,
            Clause::IntEquals { field, value } => {
                let actual = match field {
                    TaskField::Id => task.id,
                    TaskField::Status => task.status.map(i64::from),
                    _ => None,
                };
                actual == Some(*value)
            }
            Clause::TextEquals { field, value } => task
                .text_field(field.json_name())
                .is_some_and(|v| normalize(v) == normalize(value)),
            Clause::TextPrefix { field, prefix } => task
                .text_field(field.json_name())
                .is_some_and(|v| normalize(v).starts_with(&normalize(prefix))),
            Clause::Term(term) => {
                let term = normalize(term);
                TaskField::TEXT.iter().any(|field| {
                    task.text_field(field.json_name())
                        .is_some_and(|v| normalize(v).contains(&term))
                })
            }
        }
    }
}

/// Lowercases text for case-insensitive comparison.
///
/// The search index stores text columns in this form so SQL comparisons and
/// [`SearchQuery::matches`] agree on non-ASCII input.
pub fn normalize(value: &str) -> String {
    value.to_lowercase()
}

fn field_clause(name: &str, value: String, quoted: bool) -> SearchResult<Clause> {
    if name.is_empty() {
        return Err(parse_error("missing field name before ':'"));
    }
    let field = TaskField::parse(name).map_err(|_| parse_error(format!("unknown field '{name}'")))?;
    if value.is_empty() {
        return Err(parse_error(format!("empty value for field '{name}'")));
    }

    if field.is_integer() {
        let parsed = value.parse::<i64>().map_err(|_| {
            parse_error(format!("field '{name}' expects an integer, got '{value}'"))
        })?;
        return Ok(Clause::IntEquals {
            field,
            value: parsed,
        });
    }

    if !quoted {
        if let Some(prefix) = value.strip_suffix('*') {
            return Ok(Clause::TextPrefix {
                field,
                prefix: prefix.to_string(),
            });
        }
    }
    Ok(Clause::TextEquals { field, value })
}

fn parse_error(message: impl Into<String>) -> SearchError {
    SearchError::QueryParseError {
        message: message.into(),
    }
}

#[derive(Debug, Default)]
struct Token {
    field: Option<String>,
    value: String,
    quoted: bool,
}

fn tokenize(input: &str) -> SearchResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut current: Option<Token> = None;
    let mut in_quotes = false;

    for c in input.chars() {
        if in_quotes {
            if c == '"' {
                in_quotes = false;
            } else if let Some(token) = current.as_mut() {
                token.value.push(c);
            }
            continue;
        }

        match c {
            c if c.is_whitespace() => {
                if let Some(token) = current.take() {
                    tokens.push(token);
                }
            }
            '"' => {
                let token = current.get_or_insert_with(Token::default);
                token.quoted = true;
                in_quotes = true;
            }
            ':' => {
                let token = current.get_or_insert_with(Token::default);
                if token.field.is_none() && !token.quoted {
                    token.field = Some(std::mem::take(&mut token.value));
                } else {
                    token.value.push(c);
                }
            }
            c => current.get_or_insert_with(Token::default).value.push(c),
        }
    }

    if in_quotes {
        return Err(parse_error("unterminated quote"));
    }
    if let Some(token) = current.take() {
        tokens.push(token);
    }
    Ok(tokens)
}

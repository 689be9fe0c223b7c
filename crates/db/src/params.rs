//! Named query parameters and their translation to Postgres positional placeholders.

use std::error::Error;

use bytes::BytesMut;
use serde_json::Value;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};

use crate::error::DbError;

/// A value bound to a named parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Json(Value),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        ParamValue::Json(value)
    }
}

impl ToSql for ParamValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            ParamValue::Text(s) => s.to_sql_checked(ty, out),
            ParamValue::Json(v) => v.to_sql_checked(ty, out),
        }
    }

    // Per-variant type checks happen in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Ordered `name -> value` bindings for a single statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedParams {
    entries: Vec<(String, ParamValue)>,
}

impl NamedParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to `name`, replacing an earlier binding of the same name.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// SQL text rewritten to `$n` placeholders, with values in positional order.
#[derive(Debug)]
pub struct BoundQuery<'a> {
    pub sql: String,
    pub values: Vec<&'a ParamValue>,
}

impl BoundQuery<'_> {
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|value| *value as &(dyn ToSql + Sync))
            .collect()
    }
}

#[derive(Clone, Copy)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
}

/// Rewrite `:name` placeholders to `$n`.
///
/// A repeated name reuses its position. `::type` casts, quoted literals,
/// quoted identifiers and comments are left untouched.
pub fn bind_named<'a>(sql: &str, params: &'a NamedParams) -> Result<BoundQuery<'a>, DbError> {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut order: Vec<&str> = Vec::new();
    let mut values: Vec<&'a ParamValue> = Vec::new();
    let mut state = State::Normal;
    let mut copied = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    state = State::LineComment;
                    idx += 1;
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b':' if bytes.get(idx + 1) == Some(&b':') => idx += 1,
                b':' => {
                    let end = scan_identifier(bytes, idx + 1);
                    if end > idx + 1 {
                        let name = &sql[idx + 1..end];
                        let position = match order.iter().position(|n| *n == name) {
                            Some(pos) => pos + 1,
                            None => {
                                let value = params
                                    .get(name)
                                    .ok_or_else(|| DbError::MissingParameter(name.to_string()))?;
                                order.push(name);
                                values.push(value);
                                order.len()
                            }
                        };
                        out.push_str(&sql[copied..idx]);
                        out.push('$');
                        out.push_str(&position.to_string());
                        copied = end;
                        idx = end;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    out.push_str(&sql[copied..]);
    Ok(BoundQuery { sql: out, values })
}

fn scan_identifier(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    if idx < bytes.len() && (bytes[idx].is_ascii_alphabetic() || bytes[idx] == b'_') {
        idx += 1;
        while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_') {
            idx += 1;
        }
    }
    idx
}

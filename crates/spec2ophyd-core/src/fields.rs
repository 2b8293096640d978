//! Whitespace-delimited field splitting for SPEC config record lines
//!
//! SPEC writes its records as `<KEY> = <field> <field> ...` with columns padded
//! by an arbitrary amount of whitespace. Fields are consumed left to right, and
//! the last field of a channel line (its display name) is whatever is left over.

use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

/// Problem found inside a single record line
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldError {
    #[error("missing '=' separator")]
    MissingSeparator,
    #[error("missing {field} field")]
    Missing { field: &'static str },
    #[error("invalid {field} value '{value}', expected an integer")]
    NotInteger { field: &'static str, value: String },
    #[error("unexpected trailing text '{text}'")]
    Trailing { text: String },
    #[error("bad record key '{key}'")]
    BadKey { key: String },
}

/// Split a record line on its first `=` into trimmed key and value text
pub(crate) fn split_assignment(line: &str) -> Result<(&str, &str), FieldError> {
    line.split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
        .ok_or(FieldError::MissingSeparator)
}

/// Numeric identifier embedded in a record key, e.g. `MOT012` -> 12
pub(crate) fn record_number(key: &str, prefix: &str) -> Result<u32, FieldError> {
    key.strip_prefix(prefix)
        .filter(|digits| !digits.is_empty())
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| FieldError::BadKey {
            key: key.to_string(),
        })
}

/// Cursor over the whitespace-separated fields of a record value
pub(crate) struct Fields<'a> {
    rest: &'a str,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { rest: text.trim() }
    }

    /// Take the next token
    pub(crate) fn next_str(&mut self, field: &'static str) -> Result<&'a str, FieldError> {
        if self.rest.is_empty() {
            return Err(FieldError::Missing { field });
        }
        let end = self
            .rest
            .find(char::is_whitespace)
            .unwrap_or(self.rest.len());
        let (token, tail) = self.rest.split_at(end);
        self.rest = tail.trim_start();
        Ok(token)
    }

    /// Take the next token and parse it as an integer
    pub(crate) fn next_int<T: FromStr>(&mut self, field: &'static str) -> Result<T, FieldError> {
        let token = self.next_str(field)?;
        token.parse().map_err(|_| FieldError::NotInteger {
            field,
            value: token.to_string(),
        })
    }

    /// Everything not consumed yet, may be empty
    pub(crate) fn remainder(self) -> &'a str {
        self.rest
    }

    /// Fail if anything is left over
    pub(crate) fn finish(self) -> Result<(), FieldError> {
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(FieldError::Trailing {
                text: self.rest.to_string(),
            })
        }
    }
}

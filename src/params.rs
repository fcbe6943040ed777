//! Parameter extraction for tool arguments.
//!
//! Tool calls arrive with an untyped `arguments` object. Required values must be
//! present, non-null and non-zero (empty strings and `0` count as missing).
//! Optional values may be absent or null, but when present must have the
//! declared type.

use crate::types::ListOptions;
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("missing required parameter: {0}")]
    Missing(&'static str),
    #[error("parameter {name} is not of type {expected}")]
    WrongType {
        name: &'static str,
        expected: &'static str,
    },
    #[error("parameter {0} is out of range")]
    OutOfRange(&'static str),
    #[error("arguments must be a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    args: Option<&'a Map<String, Value>>,
}

impl<'a> Params<'a> {
    pub fn new(args: &'a Value) -> Result<Self, ParamError> {
        match args {
            Value::Object(map) => Ok(Self { args: Some(map) }),
            Value::Null => Ok(Self { args: None }),
            _ => Err(ParamError::NotAnObject),
        }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.args
            .and_then(|m| m.get(name))
            .filter(|v| !v.is_null())
    }

    pub fn required_str(&self, name: &'static str) -> Result<String, ParamError> {
        match self.optional_str(name)? {
            Some(s) => Ok(s),
            None => Err(ParamError::Missing(name)),
        }
    }

    /// Empty strings are treated the same as an absent value.
    pub fn optional_str(&self, name: &'static str) -> Result<Option<String>, ParamError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ParamError::WrongType {
                name,
                expected: "string",
            }),
        }
    }

    pub fn required_int(&self, name: &'static str) -> Result<u64, ParamError> {
        match self.optional_int(name)? {
            Some(n) => Ok(n),
            None => Err(ParamError::Missing(name)),
        }
    }

    /// Accepts any JSON number; fractions are truncated toward zero (`42.5` is
    /// `42`). Zero after truncation is treated as absent, negatives are out of range.
    pub fn optional_int(&self, name: &'static str) -> Result<Option<u64>, ParamError> {
        let Some(v) = self.get(name) else {
            return Ok(None);
        };
        let Value::Number(n) = v else {
            return Err(ParamError::WrongType {
                name,
                expected: "number",
            });
        };
        let n = match n.as_u64() {
            Some(u) => u,
            None => {
                let f = n.as_f64().unwrap_or(f64::NAN).trunc();
                if !(0.0..=u64::MAX as f64).contains(&f) {
                    return Err(ParamError::OutOfRange(name));
                }
                f as u64
            }
        };
        Ok((n != 0).then_some(n))
    }

    fn optional_u32(&self, name: &'static str, default: u32) -> Result<u32, ParamError> {
        match self.optional_int(name)? {
            None => Ok(default),
            Some(n) => u32::try_from(n).map_err(|_| ParamError::OutOfRange(name)),
        }
    }

    /// `page` / `perPage` with defaults 1 and 30.
    pub fn pagination(&self) -> Result<ListOptions, ParamError> {
        Ok(ListOptions {
            page: Some(self.optional_u32("page", DEFAULT_PAGE)?),
            per_page: Some(self.optional_u32("perPage", DEFAULT_PER_PAGE)?),
        })
    }
}

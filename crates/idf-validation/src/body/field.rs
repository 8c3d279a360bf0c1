//! Field-level error payload
//!
//! Serialized as `{ "errors": [ { "value", "msg", "param", "location" } ] }`.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Part of the request a field came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldLocation {
    Body,
    Params,
    Query,
}

/// One invalid field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub value: Value,
    pub msg: String,
    pub param: String,
    pub location: FieldLocation,
}

impl FieldError {
    /// Param name used for errors about the body as a whole
    pub const WHOLE_BODY: &'static str = "_error";

    /// Create new error for a body field
    #[must_use]
    pub fn body(param: &str, value: impl Into<Value>, msg: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            msg: msg.into(),
            param: param.to_string(),
            location: FieldLocation::Body,
        }
    }

    /// Create new error for a query parameter
    #[must_use]
    pub fn query(param: &str, value: impl Into<Value>, msg: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            msg: msg.into(),
            param: param.to_string(),
            location: FieldLocation::Query,
        }
    }

    /// Create new error for a path parameter
    #[must_use]
    pub fn params(param: &str, value: impl Into<Value>, msg: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            msg: msg.into(),
            param: param.to_string(),
            location: FieldLocation::Params,
        }
    }

    /// Error about the body as a whole, e.g. none of several fields given
    #[must_use]
    pub fn whole_body(msg: impl Into<String>) -> Self {
        Self::body(Self::WHOLE_BODY, Value::Null, msg)
    }
}

/// Every problem found in one request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldErrors {
    pub errors: Vec<FieldError>,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A single error
    #[must_use]
    pub fn one(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// `Ok(value)` if nothing was collected
    pub fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Messages in order, for logs and tests
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.msg.as_str()).collect()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

impl std::error::Error for FieldErrors {}

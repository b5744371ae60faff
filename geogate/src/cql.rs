//! CQL filter expressions for WFS `GetFeature`.
//!
//! Attribute/value predicates built here are escaped so that neither part
//! can terminate its token and inject further CQL. Raw expressions supplied
//! by a caller are forwarded as-is; URL encoding of the whole expression is
//! left to the URL builder.

use std::fmt;

use crate::error::{GatewayError, Result};

/// A CQL filter ready to be sent as `CQL_FILTER`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CqlFilter(String);

impl CqlFilter {
    /// Equality predicate `attribute = 'value'`.
    ///
    /// The attribute is emitted bare when it is a plain identifier and as a
    /// double-quoted identifier otherwise. The value is always a
    /// single-quoted literal; GeoServer coerces literals to the attribute's
    /// type, so numeric attributes still compare numerically.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingParameters`] when either part is empty.
    pub fn equals(attribute: &str, value: &str) -> Result<Self> {
        let mut missing = Vec::new();
        if attribute.trim().is_empty() {
            missing.push("featureName");
        }
        if value.is_empty() {
            missing.push("featureValue");
        }
        if !missing.is_empty() {
            return Err(GatewayError::MissingParameters(missing));
        }

        Ok(Self(format!(
            "{}={}",
            quote_identifier(attribute),
            quote_literal(value)
        )))
    }

    /// Wrap an expression supplied verbatim by the caller.
    pub fn raw(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    /// The expression text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CqlFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote_identifier(name: &str) -> String {
    if is_plain_identifier(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

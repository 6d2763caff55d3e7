//! The compiled-query contract between the template library and the
//! executor.
//!
//! Templates are pure: they produce query text plus named parameter
//! bindings and never touch the driver. The executor turns
//! [`ParamValue`]s into driver parameters at submission time.

use serde::{Deserialize, Serialize};

/// A parameter value bound to a compiled query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    StrList(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        Self::StrList(v)
    }
}

/// Query text plus its parameter bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub text: String,
    pub params: Vec<(String, ParamValue)>,
}

impl CompiledQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Look up a binding by name (test helper and adapter convenience).
    pub fn get_param(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_accumulation() {
        let q = CompiledQuery::new("MATCH (n) RETURN n")
            .param("limit", 10u32)
            .param("name", "acme")
            .param("ids", vec!["a".to_string(), "b".to_string()]);

        assert_eq!(q.params.len(), 3);
        assert_eq!(q.get_param("limit"), Some(&ParamValue::Int(10)));
        assert_eq!(q.get_param("name"), Some(&ParamValue::Str("acme".into())));
        assert!(q.get_param("missing").is_none());
    }
}

//! WHERE-clause construction with numbered parameter bindings.
//!
//! Field names are supplied by the templates, never by callers; only
//! values travel as parameters.

use haven_core::cypher::ParamValue;

/// How a condition compares its field against the bound value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Case-insensitive substring match.
    Contains,
    /// Exact equality.
    Exact,
    /// `field >= date($param)`.
    DateFrom,
    /// `field <= date($param)`.
    DateTo,
}

/// Accumulates conditions on one node variable into a WHERE clause.
pub struct ConditionSet {
    node_var: &'static str,
    parts: Vec<String>,
    params: Vec<(String, ParamValue)>,
}

impl ConditionSet {
    pub fn new(node_var: &'static str) -> Self {
        Self {
            node_var,
            parts: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Add a condition when the value is present and non-empty.
    pub fn push_opt(&mut self, field: &str, kind: MatchKind, value: Option<&str>) {
        let Some(value) = value else { return };
        if value.is_empty() {
            return;
        }
        let param = format!("param_{}", self.params.len());
        let var = self.node_var;
        let part = match kind {
            MatchKind::Contains => {
                format!("toLower({var}.{field}) CONTAINS toLower(${param})")
            }
            MatchKind::Exact => format!("{var}.{field} = ${param}"),
            MatchKind::DateFrom => format!("{var}.{field} >= date(${param})"),
            MatchKind::DateTo => format!("{var}.{field} <= date(${param})"),
        };
        self.parts.push(part);
        self.params.push((param, ParamValue::Str(value.to_string())));
    }

    /// The assembled clause: empty, or ` WHERE a AND b AND ...`.
    pub fn where_clause(&self) -> String {
        if self.parts.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.parts.join(" AND "))
        }
    }

    pub fn into_params(self) -> Vec<(String, ParamValue)> {
        self.params
    }
}

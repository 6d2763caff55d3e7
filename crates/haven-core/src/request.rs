//! Analytical request value objects.
//!
//! Each request is an immutable description of one operation and
//! validates itself before any query text is compiled. Depth and limit
//! ceilings guard against unbounded traversal cost on a 2M+ node
//! graph; identifier checks keep caller input out of query text.

use serde::{Deserialize, Serialize};

use crate::error::{HavenError, Result};

/// Ceiling for search-style limits.
pub const MAX_SEARCH_LIMIT: u32 = 1000;
/// Ceiling for traversal-style limits.
pub const MAX_TRAVERSAL_LIMIT: u32 = 200;
/// Ceiling for returned shortest paths.
pub const MAX_PATH_LIMIT: u32 = 50;
/// Depth ceiling for neighborhood traversals.
pub const MAX_TRAVERSAL_DEPTH: u32 = 5;
/// Depth ceiling for shortest-path search.
pub const MAX_PATH_DEPTH: u32 = 10;
/// Maximum seed nodes for a common-connections request.
pub const MAX_SEEDS: usize = 10;

/// Jurisdictions treated as high-risk when the caller supplies none.
pub const DEFAULT_RISK_JURISDICTIONS: [&str; 6] = [
    "British Virgin Islands",
    "Cayman Islands",
    "Panama",
    "Seychelles",
    "Bahamas",
    "Bermuda",
];

/// Date-valued properties usable in temporal analysis.
pub const TEMPORAL_DATE_FIELDS: [&str; 4] = [
    "incorporation_date",
    "closed_date",
    "struck_off_date",
    "dorm_date",
];

/// Reject identifiers that are empty, oversized, or carry characters
/// outside the dataset's id alphabet.
pub fn validate_node_id(node_id: &str) -> Result<()> {
    if node_id.is_empty() {
        return Err(HavenError::Validation("node id must not be empty".into()));
    }
    if node_id.len() > 64 {
        return Err(HavenError::Validation(format!(
            "node id too long ({} chars)",
            node_id.len()
        )));
    }
    if !node_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(HavenError::Validation(format!(
            "node id contains invalid characters: {node_id}"
        )));
    }
    Ok(())
}

/// Relationship types and node labels may end up embedded in query
/// text, so they are held to the same alphabet as identifiers.
pub fn validate_name_fragment(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(HavenError::Validation(format!("invalid {kind}: {value:?}")));
    }
    Ok(())
}

fn validate_limit(limit: u32, ceiling: u32) -> Result<()> {
    if limit == 0 || limit > ceiling {
        return Err(HavenError::Validation(format!(
            "limit must be between 1 and {ceiling}, got {limit}"
        )));
    }
    Ok(())
}

fn validate_depth(max_depth: u32, ceiling: u32) -> Result<()> {
    if max_depth == 0 || max_depth > ceiling {
        return Err(HavenError::Validation(format!(
            "max_depth must be between 1 and {ceiling}, got {max_depth}"
        )));
    }
    Ok(())
}

/// Search offshore entities by name and exact-match filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntitySearch {
    pub name: Option<String>,
    pub jurisdiction: Option<String>,
    pub country_codes: Option<String>,
    pub company_type: Option<String>,
    pub status: Option<String>,
    /// ISO date, inclusive lower bound on incorporation_date.
    pub incorporation_date_from: Option<String>,
    /// ISO date, inclusive upper bound on incorporation_date.
    pub incorporation_date_to: Option<String>,
    pub source: Option<String>,
    #[serde(default = "default_search_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

/// Search officers by name and country filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfficerSearch {
    pub name: Option<String>,
    pub countries: Option<String>,
    pub country_codes: Option<String>,
    pub source: Option<String>,
    #[serde(default = "default_search_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

/// Bounded-depth expansion from a start node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsRequest {
    pub start_node_id: String,
    pub relationship_types: Option<Vec<String>>,
    pub node_types: Option<Vec<String>>,
    #[serde(default = "default_connections_depth")]
    pub max_depth: u32,
    #[serde(default = "default_traversal_limit")]
    pub limit: u32,
}

/// Shortest paths between two identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsRequest {
    pub start_node_id: String,
    pub end_node_id: String,
    pub relationship_types: Option<Vec<String>>,
    #[serde(default = "default_path_depth")]
    pub max_depth: u32,
    #[serde(default = "default_path_limit")]
    pub limit: u32,
}

/// Structural pattern categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Hub,
    Bridge,
    Cluster,
}

/// Pattern detection around a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRequest {
    pub node_id: String,
    #[serde(default = "default_pattern_kind")]
    pub kind: PatternKind,
    #[serde(default = "default_pattern_depth")]
    pub max_depth: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_pattern_limit")]
    pub limit: u32,
}

/// Nodes reachable from at least two of the given seeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonConnectionsRequest {
    pub node_ids: Vec<String>,
    pub relationship_types: Option<Vec<String>>,
    #[serde(default = "default_connections_depth")]
    pub max_depth: u32,
    #[serde(default = "default_pattern_limit")]
    pub limit: u32,
}

/// Nodes dated near a focal node on a date property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalRequest {
    pub node_id: String,
    #[serde(default = "default_date_field")]
    pub date_field: String,
    #[serde(default = "default_time_window")]
    pub time_window_days: u32,
    #[serde(default = "default_traversal_limit")]
    pub limit: u32,
}

/// Compliance scan for risky-jurisdiction nodes in a neighborhood.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScanRequest {
    pub node_id: String,
    /// Overrides the default high-risk jurisdiction set when present.
    pub risk_jurisdictions: Option<Vec<String>>,
    #[serde(default = "default_pattern_depth")]
    pub max_depth: u32,
    #[serde(default = "default_risk_limit")]
    pub limit: u32,
}

/// Database statistics flavors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    #[default]
    Overview,
    BySource,
    ByJurisdiction,
    RelationshipCounts,
}

/// Dataset statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsRequest {
    #[serde(default)]
    pub kind: StatKind,
}

/// Detail lookup for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDetailsRequest {
    pub node_id: String,
    #[serde(default = "default_true")]
    pub include_relationships: bool,
}

fn default_search_limit() -> u32 {
    20
}

fn default_traversal_limit() -> u32 {
    50
}

fn default_connections_depth() -> u32 {
    2
}

fn default_path_depth() -> u32 {
    6
}

fn default_path_limit() -> u32 {
    10
}

fn default_pattern_kind() -> PatternKind {
    PatternKind::Hub
}

fn default_pattern_depth() -> u32 {
    3
}

fn default_min_connections() -> u32 {
    5
}

fn default_pattern_limit() -> u32 {
    20
}

fn default_date_field() -> String {
    "incorporation_date".to_string()
}

fn default_time_window() -> u32 {
    365
}

fn default_risk_limit() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

impl EntitySearch {
    pub fn validate(&self) -> Result<()> {
        validate_limit(self.limit, MAX_SEARCH_LIMIT)
    }
}

impl OfficerSearch {
    pub fn validate(&self) -> Result<()> {
        validate_limit(self.limit, MAX_SEARCH_LIMIT)
    }
}

fn validate_type_lists(
    relationship_types: &Option<Vec<String>>,
    node_types: &Option<Vec<String>>,
) -> Result<()> {
    if let Some(types) = relationship_types {
        for t in types {
            validate_name_fragment("relationship type", t)?;
        }
    }
    if let Some(types) = node_types {
        for t in types {
            validate_name_fragment("node type", t)?;
        }
    }
    Ok(())
}

impl ConnectionsRequest {
    pub fn validate(&self) -> Result<()> {
        validate_node_id(&self.start_node_id)?;
        validate_depth(self.max_depth, MAX_TRAVERSAL_DEPTH)?;
        validate_limit(self.limit, MAX_TRAVERSAL_LIMIT)?;
        validate_type_lists(&self.relationship_types, &self.node_types)
    }
}

impl PathsRequest {
    pub fn validate(&self) -> Result<()> {
        validate_node_id(&self.start_node_id)?;
        validate_node_id(&self.end_node_id)?;
        validate_depth(self.max_depth, MAX_PATH_DEPTH)?;
        validate_limit(self.limit, MAX_PATH_LIMIT)?;
        validate_type_lists(&self.relationship_types, &None)
    }
}

impl PatternRequest {
    pub fn validate(&self) -> Result<()> {
        validate_node_id(&self.node_id)?;
        validate_depth(self.max_depth, MAX_TRAVERSAL_DEPTH)?;
        validate_limit(self.limit, MAX_TRAVERSAL_LIMIT)?;
        if self.min_connections == 0 {
            return Err(HavenError::Validation(
                "min_connections must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl CommonConnectionsRequest {
    pub fn validate(&self) -> Result<()> {
        if self.node_ids.len() < 2 {
            return Err(HavenError::Validation(
                "common connections requires at least 2 node ids".into(),
            ));
        }
        if self.node_ids.len() > MAX_SEEDS {
            return Err(HavenError::Validation(format!(
                "at most {MAX_SEEDS} seed nodes allowed, got {}",
                self.node_ids.len()
            )));
        }
        for id in &self.node_ids {
            validate_node_id(id)?;
        }
        validate_depth(self.max_depth, MAX_TRAVERSAL_DEPTH)?;
        validate_limit(self.limit, MAX_TRAVERSAL_LIMIT)?;
        validate_type_lists(&self.relationship_types, &None)
    }
}

impl TemporalRequest {
    pub fn validate(&self) -> Result<()> {
        validate_node_id(&self.node_id)?;
        if !TEMPORAL_DATE_FIELDS.contains(&self.date_field.as_str()) {
            return Err(HavenError::Validation(format!(
                "date_field must be one of {TEMPORAL_DATE_FIELDS:?}, got {:?}",
                self.date_field
            )));
        }
        if self.time_window_days == 0 || self.time_window_days > 3650 {
            return Err(HavenError::Validation(format!(
                "time_window_days must be between 1 and 3650, got {}",
                self.time_window_days
            )));
        }
        validate_limit(self.limit, MAX_TRAVERSAL_LIMIT)
    }
}

impl RiskScanRequest {
    pub fn validate(&self) -> Result<()> {
        validate_node_id(&self.node_id)?;
        validate_depth(self.max_depth, MAX_TRAVERSAL_DEPTH)?;
        validate_limit(self.limit, MAX_TRAVERSAL_LIMIT)?;
        if let Some(set) = &self.risk_jurisdictions {
            if set.is_empty() {
                return Err(HavenError::Validation(
                    "risk_jurisdictions override must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// The effective jurisdiction set: caller override or the default
    /// offshore-haven list.
    pub fn jurisdictions(&self) -> Vec<String> {
        match &self.risk_jurisdictions {
            Some(set) => set.clone(),
            None => DEFAULT_RISK_JURISDICTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl EntityDetailsRequest {
    pub fn validate(&self) -> Result<()> {
        validate_node_id(&self.node_id)
    }
}

/// Umbrella request tag for protocol adapters (MCP tools, REST bodies).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum QueryRequest {
    SearchEntities(EntitySearch),
    SearchOfficers(OfficerSearch),
    /// Intermediaries share the officer search shape.
    SearchIntermediaries(OfficerSearch),
    EntityDetails(EntityDetailsRequest),
    Connections(ConnectionsRequest),
    ShortestPaths(PathsRequest),
    Patterns(PatternRequest),
    CommonConnections(CommonConnectionsRequest),
    Temporal(TemporalRequest),
    RiskScan(RiskScanRequest),
    Statistics(StatisticsRequest),
}

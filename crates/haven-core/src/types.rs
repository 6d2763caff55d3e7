//! Typed result shapes for graph query operations.
//!
//! Raw store records are mapped into this closed set of variants
//! (entities, officers, paths, pattern matches, temporal buckets, risk
//! entries) rather than passed through as open-ended maps. All nodes
//! and relationships are read-only projections of the upstream
//! dataset.

use serde::{Deserialize, Serialize};

/// Node labels present in the offshore-leaks dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Entity,
    Officer,
    Intermediary,
    Address,
    Other,
}

impl NodeKind {
    /// Map a store label to a kind; unknown labels fold into `Other`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Entity" => Self::Entity,
            "Officer" => Self::Officer,
            "Intermediary" => Self::Intermediary,
            "Address" => Self::Address,
            _ => Self::Other,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Entity => "Entity",
            Self::Officer => "Officer",
            Self::Intermediary => "Intermediary",
            Self::Address => "Address",
            Self::Other => "Other",
        }
    }
}

/// Generic projection of any graph node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSummary {
    pub node_id: String,
    pub kind: NodeKind,
    pub name: String,
    /// Remaining string properties (jurisdiction, status, dates, ...).
    pub properties: serde_json::Value,
}

/// An offshore entity (company, trust, foundation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub node_id: String,
    pub name: String,
    pub jurisdiction: Option<String>,
    pub jurisdiction_description: Option<String>,
    pub company_type: Option<String>,
    pub status: Option<String>,
    pub incorporation_date: Option<String>,
    pub closed_date: Option<String>,
    pub countries: Option<String>,
    pub country_codes: Option<String>,
    pub source_id: Option<String>,
    pub address: Option<String>,
}

/// An individual person acting as an officer of entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficerRecord {
    pub node_id: String,
    pub name: String,
    pub countries: Option<String>,
    pub country_codes: Option<String>,
    pub source_id: Option<String>,
}

/// A directed typed edge between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub rel_type: String,
    pub source_id: String,
    pub target_id: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub data_source: Option<String>,
}

/// An entity with its immediate relationships attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDetails {
    pub entity: EntityRecord,
    pub relationships: Vec<AttachedRelationship>,
}

/// One relationship hanging off a detail lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedRelationship {
    pub rel_type: String,
    pub direction: Direction,
    pub related: NodeSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// An ordered node sequence between two identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRecord {
    /// Edge count.
    pub length: i64,
    /// Distinct relationship types traversed, in path order.
    pub relationship_types: Vec<String>,
    pub nodes: Vec<NodeSummary>,
}

/// A node reached by bounded-depth traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub node: NodeSummary,
    /// Hops from the start node along the first-found shortest route.
    pub distance: i64,
    /// Type of the first relationship on that route.
    pub first_relationship: Option<String>,
}

/// Structural role categories detected in a node's neighborhood.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "lowercase")]
pub enum PatternRecord {
    /// Highly connected node ranked by direct-neighbor count.
    Hub {
        node: NodeSummary,
        connection_count: i64,
    },
    /// Node joining otherwise-separate groups. Approximated via
    /// relationship-type and neighbor-label diversity, not an exact
    /// cut-vertex computation.
    Bridge {
        node: NodeSummary,
        communities_connected: i64,
        total_neighbors: i64,
        relationship_types: Vec<String>,
        neighbor_types: Vec<String>,
    },
    /// Densely mutually-connected neighbor group.
    Cluster {
        members: Vec<String>,
        strength: i64,
        node_types: Vec<String>,
    },
}

/// A node reachable from at least two seed identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonConnectionRecord {
    pub node: NodeSummary,
    /// Seed node ids that reach this node.
    pub connected_seeds: Vec<String>,
    pub connection_count: i64,
    pub relationship_types: Vec<String>,
}

/// Position of a related node's date relative to the focal date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalBucket {
    Before,
    SameDay,
    After,
}

impl TemporalBucket {
    /// Signed day difference (related − focal) to bucket.
    pub fn from_day_diff(day_diff: i64) -> Self {
        match day_diff {
            d if d < 0 => Self::Before,
            0 => Self::SameDay,
            _ => Self::After,
        }
    }
}

/// A node whose date property falls inside the analysis window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalRecord {
    pub node: NodeSummary,
    pub date: Option<String>,
    pub day_difference: i64,
    pub bucket: TemporalBucket,
}

/// Deterministic risk classification for a compliance scan hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// Jurisdiction membership × active status.
    ///
    /// High: risky jurisdiction and active. Medium: risky jurisdiction
    /// but inactive. Low: reachable but outside the risk set.
    pub fn classify(in_risky_jurisdiction: bool, active: bool) -> Self {
        match (in_risky_jurisdiction, active) {
            (true, true) => Self::High,
            (true, false) => Self::Medium,
            (false, _) => Self::Low,
        }
    }
}

/// One hit from a compliance risk scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRecord {
    pub node: NodeSummary,
    pub jurisdiction: Option<String>,
    pub distance: i64,
    pub connection_count: i64,
    pub relationship_types: Vec<String>,
    pub connected_types: Vec<String>,
    pub level: RiskLevel,
}

/// One row of a statistics query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatRecord {
    pub key: String,
    pub detail: Option<String>,
    pub count: i64,
}

/// A paginated result page with execution metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub records: Vec<T>,
    /// Total matching rows when a count query ran; `None` otherwise.
    pub total_count: Option<i64>,
    pub returned_count: usize,
    pub offset: u32,
    pub limit: u32,
    pub has_more: bool,
    pub elapsed_ms: u64,
}

impl<T> Page<T> {
    /// Build a page, deriving `returned_count` and `has_more`.
    ///
    /// `has_more` is exact when the total is known and conservatively
    /// `true` otherwise.
    pub fn new(
        records: Vec<T>,
        total_count: Option<i64>,
        offset: u32,
        limit: u32,
        elapsed_ms: u64,
    ) -> Self {
        let returned_count = records.len();
        let has_more = match total_count {
            Some(total) => (offset as i64 + returned_count as i64) < total,
            None => true,
        };
        Self {
            records,
            total_count,
            returned_count,
            offset,
            limit,
            has_more,
            elapsed_ms,
        }
    }

    /// Page over a fully-materialized result set: the total is the
    /// returned count, so `has_more` is always false.
    pub fn complete(records: Vec<T>, limit: u32, elapsed_ms: u64) -> Self {
        let total = records.len() as i64;
        Self::new(records, Some(total), 0, limit, elapsed_ms)
    }
}

//! Row normalization: raw driver rows into the typed result shapes.
//!
//! Column extraction is driver-bound and kept thin; derivations that
//! carry logic (status classification, temporal bucketing, path
//! assembly) are pure functions so they can be tested without a store.

use serde_json::{Map, Value};

use haven_core::types::{
    AttachedRelationship, CommonConnectionRecord, ConnectionRecord, Direction, EntityDetails,
    EntityRecord, NodeKind, NodeSummary, OfficerRecord, PathRecord, PatternRecord, RiskLevel,
    RiskRecord, StatRecord, TemporalBucket, TemporalRecord,
};
use haven_core::{HavenError, Result};

fn column<T: serde::de::DeserializeOwned>(row: &neo4rs::Row, name: &str) -> Result<T> {
    row.get::<T>(name)
        .map_err(|e| HavenError::Query(format!("missing or mistyped column {name:?}: {e}")))
}

fn opt_column<T: serde::de::DeserializeOwned>(row: &neo4rs::Row, name: &str) -> Option<T> {
    row.get::<T>(name).ok()
}

fn prop(node: &neo4rs::Node, key: &str) -> Option<String> {
    node.get::<String>(key).ok()
}

/// Project a node into the generic summary shape. The id and name are
/// lifted out; every other property lands in the `properties` map.
pub fn node_summary(node: &neo4rs::Node) -> NodeSummary {
    let kind = node
        .labels()
        .first()
        .map(|l| NodeKind::from_label(l))
        .unwrap_or(NodeKind::Other);

    let mut properties = Map::new();
    for key in node.keys() {
        if key == "node_id" || key == "name" {
            continue;
        }
        if let Some(s) = prop(node, key) {
            properties.insert(key.to_string(), Value::String(s));
        } else if let Ok(i) = node.get::<i64>(key) {
            properties.insert(key.to_string(), Value::from(i));
        }
    }

    NodeSummary {
        node_id: prop(node, "node_id").unwrap_or_default(),
        kind,
        name: prop(node, "name").unwrap_or_default(),
        properties: Value::Object(properties),
    }
}

pub fn entity_record(node: &neo4rs::Node) -> EntityRecord {
    EntityRecord {
        node_id: prop(node, "node_id").unwrap_or_default(),
        name: prop(node, "name").unwrap_or_default(),
        jurisdiction: prop(node, "jurisdiction"),
        jurisdiction_description: prop(node, "jurisdiction_description"),
        company_type: prop(node, "company_type"),
        status: prop(node, "status"),
        incorporation_date: prop(node, "incorporation_date"),
        closed_date: prop(node, "closed_date"),
        countries: prop(node, "countries"),
        country_codes: prop(node, "country_codes"),
        source_id: prop(node, "sourceID"),
        address: prop(node, "address"),
    }
}

pub fn officer_record(node: &neo4rs::Node) -> OfficerRecord {
    OfficerRecord {
        node_id: prop(node, "node_id").unwrap_or_default(),
        name: prop(node, "name").unwrap_or_default(),
        countries: prop(node, "countries"),
        country_codes: prop(node, "country_codes"),
        source_id: prop(node, "sourceID"),
    }
}

pub fn entity_rows(rows: &[neo4rs::Row], var: &str) -> Result<Vec<EntityRecord>> {
    rows.iter()
        .map(|row| Ok(entity_record(&column::<neo4rs::Node>(row, var)?)))
        .collect()
}

pub fn officer_rows(rows: &[neo4rs::Row], var: &str) -> Result<Vec<OfficerRecord>> {
    rows.iter()
        .map(|row| Ok(officer_record(&column::<neo4rs::Node>(row, var)?)))
        .collect()
}

/// The single scalar of a count query.
pub fn count_row(rows: &[neo4rs::Row]) -> Result<i64> {
    match rows.first() {
        Some(row) => column(row, "total"),
        None => Ok(0),
    }
}

fn parse_direction(raw: &str) -> Direction {
    if raw == "outgoing" {
        Direction::Outgoing
    } else {
        Direction::Incoming
    }
}

/// Assemble a detail lookup from its per-relationship rows. The entity
/// repeats on every row; relationship columns are null when the node
/// has none.
pub fn entity_details_rows(rows: &[neo4rs::Row]) -> Result<Option<EntityDetails>> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    let entity = entity_record(&column::<neo4rs::Node>(first, "e")?);

    let mut relationships = Vec::new();
    for row in rows {
        let Some(rel_type) = opt_column::<String>(row, "rel_type") else {
            continue;
        };
        let Some(related) = opt_column::<neo4rs::Node>(row, "related") else {
            continue;
        };
        let direction = opt_column::<String>(row, "direction")
            .map(|d| parse_direction(&d))
            .unwrap_or(Direction::Outgoing);
        relationships.push(AttachedRelationship {
            rel_type,
            direction,
            related: node_summary(&related),
        });
    }

    Ok(Some(EntityDetails {
        entity,
        relationships,
    }))
}

pub fn connection_rows(rows: &[neo4rs::Row]) -> Result<Vec<ConnectionRecord>> {
    rows.iter()
        .map(|row| {
            Ok(ConnectionRecord {
                node: node_summary(&column::<neo4rs::Node>(row, "connected")?),
                distance: column(row, "distance")?,
                first_relationship: opt_column(row, "first_relationship"),
            })
        })
        .collect()
}

/// Build a path from the parallel per-node column lists.
pub fn assemble_path(
    length: i64,
    relationship_types: Vec<String>,
    node_ids: Vec<String>,
    node_names: Vec<String>,
    node_labels: Vec<String>,
) -> PathRecord {
    let nodes = node_ids
        .into_iter()
        .enumerate()
        .map(|(i, node_id)| NodeSummary {
            node_id,
            kind: node_labels
                .get(i)
                .map(|l| NodeKind::from_label(l))
                .unwrap_or(NodeKind::Other),
            name: node_names.get(i).cloned().unwrap_or_default(),
            properties: Value::Object(Map::new()),
        })
        .collect();

    PathRecord {
        length,
        relationship_types,
        nodes,
    }
}

pub fn path_rows(rows: &[neo4rs::Row]) -> Result<Vec<PathRecord>> {
    rows.iter()
        .map(|row| {
            Ok(assemble_path(
                column(row, "path_length")?,
                column(row, "relationship_types")?,
                column(row, "node_ids")?,
                column(row, "node_names")?,
                column(row, "node_labels")?,
            ))
        })
        .collect()
}

pub fn hub_rows(rows: &[neo4rs::Row]) -> Result<Vec<PatternRecord>> {
    rows.iter()
        .map(|row| {
            Ok(PatternRecord::Hub {
                node: node_summary(&column::<neo4rs::Node>(row, "connected")?),
                connection_count: column(row, "connection_count")?,
            })
        })
        .collect()
}

pub fn bridge_rows(rows: &[neo4rs::Row]) -> Result<Vec<PatternRecord>> {
    rows.iter()
        .map(|row| {
            Ok(PatternRecord::Bridge {
                node: node_summary(&column::<neo4rs::Node>(row, "bridge")?),
                communities_connected: column(row, "communities_connected")?,
                total_neighbors: column(row, "total_neighbors")?,
                relationship_types: column(row, "relationship_types")?,
                neighbor_types: column(row, "neighbor_types")?,
            })
        })
        .collect()
}

pub fn cluster_rows(rows: &[neo4rs::Row]) -> Result<Vec<PatternRecord>> {
    rows.iter()
        .map(|row| {
            Ok(PatternRecord::Cluster {
                members: column(row, "cluster_nodes")?,
                strength: column(row, "cluster_strength")?,
                node_types: column(row, "node_types")?,
            })
        })
        .collect()
}

pub fn common_connection_rows(rows: &[neo4rs::Row]) -> Result<Vec<CommonConnectionRecord>> {
    rows.iter()
        .map(|row| {
            Ok(CommonConnectionRecord {
                node: node_summary(&column::<neo4rs::Node>(row, "common")?),
                connected_seeds: column(row, "connected_seeds")?,
                connection_count: column(row, "connection_count")?,
                relationship_types: column(row, "relationship_types")?,
            })
        })
        .collect()
}

pub fn temporal_rows(rows: &[neo4rs::Row]) -> Result<Vec<TemporalRecord>> {
    rows.iter()
        .map(|row| {
            let day_difference: i64 = column(row, "day_diff")?;
            Ok(TemporalRecord {
                node: node_summary(&column::<neo4rs::Node>(row, "related")?),
                date: opt_column(row, "related_date"),
                day_difference,
                bucket: TemporalBucket::from_day_diff(day_difference),
            })
        })
        .collect()
}

/// A status string counts as active when it mentions "active" without
/// negation. Missing status defaults to active, the cautious reading
/// for risk scoring.
pub fn is_active_status(status: Option<&str>) -> bool {
    match status {
        Some(s) => {
            let lower = s.to_lowercase();
            !lower.contains("inactive")
                && !lower.contains("defaulted")
                && !lower.contains("struck")
                && !lower.contains("dissolved")
        }
        None => true,
    }
}

pub fn risk_rows(rows: &[neo4rs::Row]) -> Result<Vec<RiskRecord>> {
    rows.iter()
        .map(|row| {
            let status: Option<String> = opt_column(row, "status");
            // Every returned node matched the jurisdiction filter.
            let level = RiskLevel::classify(true, is_active_status(status.as_deref()));
            Ok(RiskRecord {
                node: node_summary(&column::<neo4rs::Node>(row, "risky")?),
                jurisdiction: opt_column(row, "jurisdiction"),
                distance: column(row, "distance")?,
                connection_count: column(row, "connection_count")?,
                relationship_types: column(row, "relationship_types")?,
                connected_types: column(row, "connected_types")?,
                level,
            })
        })
        .collect()
}

pub fn overview_rows(rows: &[neo4rs::Row]) -> Result<Vec<StatRecord>> {
    let Some(row) = rows.first() else {
        return Ok(Vec::new());
    };
    const COUNTERS: [&str; 5] = [
        "entity_count",
        "officer_count",
        "intermediary_count",
        "address_count",
        "relationship_count",
    ];
    COUNTERS
        .iter()
        .map(|key| {
            Ok(StatRecord {
                key: (*key).to_string(),
                detail: None,
                count: column(row, key)?,
            })
        })
        .collect()
}

pub fn keyed_stat_rows(
    rows: &[neo4rs::Row],
    key_col: &str,
    detail_col: Option<&str>,
    count_col: &str,
) -> Result<Vec<StatRecord>> {
    rows.iter()
        .map(|row| {
            Ok(StatRecord {
                key: column(row, key_col)?,
                detail: detail_col.and_then(|c| opt_column(row, c)),
                count: column(row, count_col)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_status_classification() {
        assert!(is_active_status(Some("Active")));
        assert!(is_active_status(Some("active")));
        assert!(is_active_status(None));

        assert!(!is_active_status(Some("Inactive")));
        assert!(!is_active_status(Some("Defaulted")));
        assert!(!is_active_status(Some("Struck / Defunct / Deregistered")));
        assert!(!is_active_status(Some("Dissolved")));
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!(parse_direction("outgoing"), Direction::Outgoing);
        assert_eq!(parse_direction("incoming"), Direction::Incoming);
        assert_eq!(parse_direction("anything else"), Direction::Incoming);
    }

    #[test]
    fn test_path_assembly_zips_parallel_lists() {
        let path = assemble_path(
            2,
            vec!["OFFICER_OF".into(), "REGISTERED_ADDRESS".into()],
            vec!["a".into(), "b".into(), "c".into()],
            vec!["Alpha".into(), "Beta".into(), "Gamma".into()],
            vec!["Officer".into(), "Entity".into(), "Address".into()],
        );

        assert_eq!(path.length, 2);
        assert_eq!(path.nodes.len(), 3);
        assert_eq!(path.nodes[0].node_id, "a");
        assert_eq!(path.nodes[0].kind, NodeKind::Officer);
        assert_eq!(path.nodes[1].name, "Beta");
        assert_eq!(path.nodes[2].kind, NodeKind::Address);
    }

    #[test]
    fn test_path_assembly_tolerates_short_lists() {
        let path = assemble_path(1, vec!["X".into()], vec!["a".into(), "b".into()], vec![], vec![]);
        assert_eq!(path.nodes.len(), 2);
        assert_eq!(path.nodes[0].name, "");
        assert_eq!(path.nodes[1].kind, NodeKind::Other);
    }

    #[test]
    fn test_empty_detail_rows_mean_not_found() {
        assert!(entity_details_rows(&[]).unwrap().is_none());
    }

    #[test]
    fn test_empty_count_is_zero() {
        assert_eq!(count_row(&[]).unwrap(), 0);
    }
}

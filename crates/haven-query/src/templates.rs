//! Cypher templates for the offshore-leaks graph.
//!
//! Every template is a pure function: it validates its request, then
//! compiles query text plus parameter bindings. Variable-length
//! patterns cannot take parameters, so depth bounds and type filters
//! are embedded as literals — but only after validation has confined
//! them to safe integers and the identifier alphabet.

use haven_core::cypher::CompiledQuery;
use haven_core::request::{
    CommonConnectionsRequest, ConnectionsRequest, EntityDetailsRequest, EntitySearch,
    OfficerSearch, PathsRequest, PatternKind, PatternRequest, RiskScanRequest, StatKind,
    StatisticsRequest, TemporalRequest,
};
use haven_core::Result;

use crate::filters::{ConditionSet, MatchKind};

/// A paginated query together with its total-count companion.
#[derive(Debug, Clone)]
pub struct SearchQueries {
    pub page: CompiledQuery,
    pub count: CompiledQuery,
}

fn search_query(
    label: &str,
    var: &'static str,
    conditions: ConditionSet,
    limit: u32,
    offset: u32,
) -> SearchQueries {
    let where_clause = conditions.where_clause();
    let page_text = format!(
        "MATCH ({var}:{label}){where_clause}\n\
         RETURN {var}\n\
         ORDER BY {var}.name\n\
         SKIP $offset LIMIT $limit"
    );
    let count_text = format!(
        "MATCH ({var}:{label}){where_clause}\n\
         RETURN count({var}) AS total"
    );

    let params = conditions.into_params();
    let mut page = CompiledQuery::new(page_text);
    let mut count = CompiledQuery::new(count_text);
    for (name, value) in params {
        page = page.param(name.clone(), value.clone());
        count = count.param(name, value);
    }
    page = page.param("offset", offset).param("limit", limit);

    SearchQueries { page, count }
}

/// Entity search: substring name match plus exact filters, stable
/// name ordering, limit/offset pagination.
pub fn search_entities(req: &EntitySearch) -> Result<SearchQueries> {
    req.validate()?;

    let mut conditions = ConditionSet::new("e");
    conditions.push_opt("name", MatchKind::Contains, req.name.as_deref());
    conditions.push_opt("jurisdiction", MatchKind::Contains, req.jurisdiction.as_deref());
    conditions.push_opt("country_codes", MatchKind::Contains, req.country_codes.as_deref());
    conditions.push_opt("company_type", MatchKind::Exact, req.company_type.as_deref());
    conditions.push_opt("status", MatchKind::Exact, req.status.as_deref());
    conditions.push_opt(
        "incorporation_date",
        MatchKind::DateFrom,
        req.incorporation_date_from.as_deref(),
    );
    conditions.push_opt(
        "incorporation_date",
        MatchKind::DateTo,
        req.incorporation_date_to.as_deref(),
    );
    conditions.push_opt("sourceID", MatchKind::Exact, req.source.as_deref());

    Ok(search_query("Entity", "e", conditions, req.limit, req.offset))
}

fn officer_style_conditions(var: &'static str, req: &OfficerSearch) -> ConditionSet {
    let mut conditions = ConditionSet::new(var);
    conditions.push_opt("name", MatchKind::Contains, req.name.as_deref());
    conditions.push_opt("countries", MatchKind::Contains, req.countries.as_deref());
    conditions.push_opt("country_codes", MatchKind::Contains, req.country_codes.as_deref());
    conditions.push_opt("sourceID", MatchKind::Exact, req.source.as_deref());
    conditions
}

/// Officer search: name/country substring match.
pub fn search_officers(req: &OfficerSearch) -> Result<SearchQueries> {
    req.validate()?;
    let conditions = officer_style_conditions("o", req);
    Ok(search_query("Officer", "o", conditions, req.limit, req.offset))
}

/// Intermediary search; same filter shape as officers.
pub fn search_intermediaries(req: &OfficerSearch) -> Result<SearchQueries> {
    req.validate()?;
    let conditions = officer_style_conditions("i", req);
    Ok(search_query(
        "Intermediary",
        "i",
        conditions,
        req.limit,
        req.offset,
    ))
}

/// Entity detail lookup, one row per attached relationship.
pub fn entity_details(req: &EntityDetailsRequest) -> Result<CompiledQuery> {
    req.validate()?;

    let text = if req.include_relationships {
        "MATCH (e:Entity {node_id: $node_id})\n\
         OPTIONAL MATCH (e)-[r]-(related)\n\
         RETURN e,\n\
                type(r) AS rel_type,\n\
                CASE WHEN startNode(r) = e THEN 'outgoing' ELSE 'incoming' END AS direction,\n\
                related,\n\
                labels(related) AS related_labels"
    } else {
        "MATCH (e:Entity {node_id: $node_id})\n\
         RETURN e, null AS rel_type, null AS direction, null AS related, [] AS related_labels"
    };

    Ok(CompiledQuery::new(text).param("node_id", req.node_id.clone()))
}

/// `:TYPE_A|TYPE_B` fragment for a validated relationship-type list.
fn rel_filter(types: &Option<Vec<String>>) -> String {
    match types {
        Some(types) if !types.is_empty() => format!(":{}", types.join("|")),
        _ => String::new(),
    }
}

/// ` AND ('Entity' IN labels(var) OR ...)` fragment for validated labels.
fn label_filter(var: &str, types: &Option<Vec<String>>) -> String {
    match types {
        Some(types) if !types.is_empty() => {
            let alts: Vec<String> = types
                .iter()
                .map(|t| format!("'{t}' IN labels({var})"))
                .collect();
            format!(" AND ({})", alts.join(" OR "))
        }
        _ => String::new(),
    }
}

/// Bounded-depth expansion: distance-annotated neighborhood of a node.
pub fn connections(req: &ConnectionsRequest) -> Result<CompiledQuery> {
    req.validate()?;

    let rel = rel_filter(&req.relationship_types);
    let node_filter = label_filter("connected", &req.node_types);
    let depth = req.max_depth;
    // Paths are sorted by length before aggregation so the collected
    // first_relationship comes from a route realizing the minimum
    // distance, not an arbitrary longer one.
    let text = format!(
        "MATCH (start {{node_id: $start_node_id}})\n\
         MATCH path = (start)-[{rel}*1..{depth}]-(connected)\n\
         WHERE connected.node_id <> $start_node_id{node_filter}\n\
         WITH connected, path\n\
         ORDER BY length(path)\n\
         WITH connected,\n\
              min(length(path)) AS distance,\n\
              collect(type(relationships(path)[0]))[0] AS first_relationship\n\
         RETURN connected, labels(connected) AS labels, distance, first_relationship\n\
         ORDER BY distance, connected.name\n\
         LIMIT $limit"
    );

    Ok(CompiledQuery::new(text)
        .param("start_node_id", req.start_node_id.clone())
        .param("limit", req.limit))
}

/// All shortest paths between two identifiers.
///
/// Equal-length paths order deterministically on their node-id list;
/// the store's own tie-break is unspecified across versions.
pub fn shortest_paths(req: &PathsRequest) -> Result<CompiledQuery> {
    req.validate()?;

    let rel = rel_filter(&req.relationship_types);
    let depth = req.max_depth;
    let text = format!(
        "MATCH (start {{node_id: $start_node_id}}), (end {{node_id: $end_node_id}})\n\
         MATCH p = allShortestPaths((start)-[{rel}*..{depth}]-(end))\n\
         WITH length(p) AS path_length,\n\
              [r IN relationships(p) | type(r)] AS relationship_types,\n\
              [n IN nodes(p) | n.node_id] AS node_ids,\n\
              [n IN nodes(p) | coalesce(n.name, '')] AS node_names,\n\
              [n IN nodes(p) | labels(n)[0]] AS node_labels\n\
         RETURN path_length, relationship_types, node_ids, node_names, node_labels\n\
         ORDER BY path_length, node_ids\n\
         LIMIT $limit"
    );

    Ok(CompiledQuery::new(text)
        .param("start_node_id", req.start_node_id.clone())
        .param("end_node_id", req.end_node_id.clone())
        .param("limit", req.limit))
}

/// Pattern detection. Hub ranks by neighbor count; bridge approximates
/// structural bridging via relationship/neighbor-type diversity (not a
/// cut-vertex computation); cluster reports densely interconnected
/// neighborhood groups.
pub fn pattern(req: &PatternRequest) -> Result<CompiledQuery> {
    req.validate()?;

    let depth = req.max_depth;
    let text = match req.kind {
        PatternKind::Hub => format!(
            "MATCH (start {{node_id: $node_id}})\n\
             MATCH (start)-[*1..{depth}]-(connected)\n\
             WHERE connected.node_id <> $node_id\n\
             WITH DISTINCT connected\n\
             MATCH (connected)-[]-(neighbor)\n\
             WITH connected, count(DISTINCT neighbor) AS connection_count\n\
             WHERE connection_count >= $min_connections\n\
             RETURN connected, labels(connected) AS labels, connection_count\n\
             ORDER BY connection_count DESC\n\
             LIMIT $limit"
        ),
        PatternKind::Bridge => format!(
            "MATCH (start {{node_id: $node_id}})\n\
             MATCH (start)-[*1..{depth}]-(bridge)\n\
             WHERE bridge.node_id <> $node_id\n\
             WITH DISTINCT bridge\n\
             MATCH (bridge)-[r]-(neighbor)\n\
             WITH bridge,\n\
                  count(DISTINCT type(r)) AS rel_type_count,\n\
                  count(DISTINCT labels(neighbor)[0]) AS neighbor_type_count,\n\
                  count(DISTINCT neighbor) AS total_neighbors,\n\
                  collect(DISTINCT type(r)) AS relationship_types,\n\
                  collect(DISTINCT labels(neighbor)[0]) AS neighbor_types\n\
             WHERE rel_type_count >= 2 AND neighbor_type_count >= 2\n\
               AND total_neighbors >= $min_connections\n\
             RETURN bridge, labels(bridge) AS labels,\n\
                    rel_type_count * neighbor_type_count AS communities_connected,\n\
                    total_neighbors, relationship_types, neighbor_types\n\
             ORDER BY communities_connected DESC, total_neighbors DESC\n\
             LIMIT $limit"
        ),
        // One group per anchor member: the anchor plus its directly
        // interconnected neighborhood peers. Groups may overlap; each
        // is reported as its own row.
        PatternKind::Cluster => format!(
            "MATCH (start {{node_id: $node_id}})\n\
             MATCH (start)-[*1..{depth}]-(member)\n\
             WHERE member.node_id <> $node_id\n\
             WITH collect(DISTINCT member) AS hood\n\
             UNWIND hood AS anchor\n\
             MATCH (anchor)--(peer)\n\
             WHERE peer IN hood AND peer.node_id <> anchor.node_id\n\
             WITH anchor, collect(DISTINCT peer) AS peers\n\
             WHERE size(peers) >= $min_connections\n\
             WITH anchor, peers, size(peers) AS cluster_strength\n\
             UNWIND [anchor] + peers AS node\n\
             WITH anchor.node_id AS anchor_id, cluster_strength,\n\
                  collect(node.name) AS cluster_nodes,\n\
                  collect(DISTINCT labels(node)[0]) AS node_types\n\
             RETURN cluster_nodes, cluster_strength, node_types\n\
             ORDER BY cluster_strength DESC, anchor_id\n\
             LIMIT $limit"
        ),
    };

    Ok(CompiledQuery::new(text)
        .param("node_id", req.node_id.clone())
        .param("min_connections", req.min_connections)
        .param("limit", req.limit))
}

/// Nodes reachable from at least two seed identifiers.
pub fn common_connections(req: &CommonConnectionsRequest) -> Result<CompiledQuery> {
    req.validate()?;

    let rel = rel_filter(&req.relationship_types);
    let depth = req.max_depth;
    let text = format!(
        "MATCH (seed)-[rels{rel}*1..{depth}]-(common)\n\
         WHERE seed.node_id IN $node_ids AND NOT common.node_id IN $node_ids\n\
         UNWIND rels AS rel\n\
         WITH common,\n\
              collect(DISTINCT seed.node_id) AS connected_seeds,\n\
              collect(DISTINCT type(rel)) AS relationship_types\n\
         WHERE size(connected_seeds) >= 2\n\
         RETURN common, labels(common) AS labels, connected_seeds,\n\
                size(connected_seeds) AS connection_count, relationship_types\n\
         ORDER BY connection_count DESC, common.name\n\
         LIMIT $limit"
    );

    Ok(CompiledQuery::new(text)
        .param("node_ids", req.node_ids.clone())
        .param("limit", req.limit))
}

/// Hop radius examined around the focal node in temporal analysis.
/// Fixed rather than caller-supplied: the date-window filter does the
/// narrowing, and wider radii explode on a 2M+ node graph.
pub const TEMPORAL_NEIGHBORHOOD_DEPTH: u32 = 2;

/// Nodes dated within the window around the focal node's date,
/// searched up to [`TEMPORAL_NEIGHBORHOOD_DEPTH`] hops out.
pub fn temporal(req: &TemporalRequest) -> Result<CompiledQuery> {
    req.validate()?;

    // date_field is confined to the allow-list by validate().
    let field = &req.date_field;
    let depth = TEMPORAL_NEIGHBORHOOD_DEPTH;
    let text = format!(
        "MATCH (focus {{node_id: $node_id}})\n\
         WHERE focus.{field} IS NOT NULL\n\
         MATCH (focus)-[*1..{depth}]-(related)\n\
         WHERE related.node_id <> $node_id AND related.{field} IS NOT NULL\n\
         WITH DISTINCT related,\n\
              date(focus.{field}) AS focus_date,\n\
              date(related.{field}) AS related_date\n\
         WITH related, related_date,\n\
              duration.inDays(focus_date, related_date).days AS day_diff\n\
         WHERE abs(day_diff) <= $window_days\n\
         RETURN related, labels(related) AS labels,\n\
                toString(related_date) AS related_date, day_diff\n\
         ORDER BY abs(day_diff) ASC, related.name\n\
         LIMIT $limit"
    );

    Ok(CompiledQuery::new(text)
        .param("node_id", req.node_id.clone())
        .param("window_days", i64::from(req.time_window_days))
        .param("limit", req.limit))
}

/// Risky-jurisdiction neighborhood scan. Risk level derivation happens
/// in the normalizer from jurisdiction membership and status.
pub fn risk_scan(req: &RiskScanRequest) -> Result<CompiledQuery> {
    req.validate()?;

    let depth = req.max_depth;
    let text = format!(
        "MATCH (start {{node_id: $node_id}})\n\
         MATCH path = (start)-[*1..{depth}]-(risky)\n\
         WHERE risky.node_id <> $node_id\n\
           AND (risky.jurisdiction IN $risk_jurisdictions\n\
                OR risky.jurisdiction_description IN $risk_jurisdictions)\n\
         WITH risky, min(length(path)) AS distance\n\
         MATCH (risky)-[r]-(neighbor)\n\
         WITH risky, distance,\n\
              count(DISTINCT neighbor) AS connection_count,\n\
              collect(DISTINCT type(r)) AS relationship_types,\n\
              collect(DISTINCT labels(neighbor)[0]) AS connected_types\n\
         RETURN risky, labels(risky) AS labels,\n\
                coalesce(risky.jurisdiction_description, risky.jurisdiction) AS jurisdiction,\n\
                risky.status AS status,\n\
                distance, connection_count, relationship_types, connected_types\n\
         ORDER BY distance, connection_count DESC\n\
         LIMIT $limit"
    );

    Ok(CompiledQuery::new(text)
        .param("node_id", req.node_id.clone())
        .param("risk_jurisdictions", req.jurisdictions())
        .param("limit", req.limit))
}

/// Dataset statistics.
pub fn statistics(req: &StatisticsRequest) -> Result<CompiledQuery> {
    let text = match req.kind {
        StatKind::Overview => {
            "CALL { MATCH (e:Entity) RETURN count(e) AS entity_count }\n\
             CALL { MATCH (o:Officer) RETURN count(o) AS officer_count }\n\
             CALL { MATCH (i:Intermediary) RETURN count(i) AS intermediary_count }\n\
             CALL { MATCH (a:Address) RETURN count(a) AS address_count }\n\
             CALL { MATCH ()-[r]->() RETURN count(r) AS relationship_count }\n\
             RETURN entity_count, officer_count, intermediary_count,\n\
                    address_count, relationship_count"
        }
        StatKind::BySource => {
            "MATCH (n)\n\
             WHERE n.sourceID IS NOT NULL\n\
             RETURN n.sourceID AS source, labels(n)[0] AS node_type, count(*) AS count\n\
             ORDER BY source, node_type"
        }
        StatKind::ByJurisdiction => {
            "MATCH (e:Entity)\n\
             WHERE e.jurisdiction IS NOT NULL\n\
             RETURN e.jurisdiction AS jurisdiction,\n\
                    e.jurisdiction_description AS description,\n\
                    count(*) AS entity_count\n\
             ORDER BY entity_count DESC\n\
             LIMIT 50"
        }
        StatKind::RelationshipCounts => {
            "MATCH ()-[r]->()\n\
             RETURN type(r) AS relationship_type, count(*) AS count\n\
             ORDER BY count DESC"
        }
    };

    Ok(CompiledQuery::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven_core::cypher::ParamValue;
    use haven_core::HavenError;

    #[test]
    fn test_search_entities_basic() {
        let req = EntitySearch {
            name: Some("Test Entity".into()),
            limit: 10,
            offset: 5,
            ..Default::default()
        };
        let queries = search_entities(&req).unwrap();

        assert!(queries.page.text.contains("MATCH (e:Entity)"));
        assert!(queries.page.text.contains("WHERE"));
        assert!(queries.page.text.contains("toLower(e.name) CONTAINS toLower("));
        assert!(queries.page.text.contains("ORDER BY e.name"));
        assert!(queries.page.text.contains("SKIP $offset LIMIT $limit"));
        assert_eq!(queries.page.get_param("limit"), Some(&ParamValue::Int(10)));
        assert_eq!(queries.page.get_param("offset"), Some(&ParamValue::Int(5)));
    }

    #[test]
    fn test_count_query_shares_filters_without_pagination() {
        let req = EntitySearch {
            name: Some("acme".into()),
            status: Some("Active".into()),
            limit: 20,
            ..Default::default()
        };
        let queries = search_entities(&req).unwrap();

        assert!(queries.count.text.contains("RETURN count(e) AS total"));
        assert!(queries.count.text.contains("toLower(e.name)"));
        assert!(!queries.count.text.contains("LIMIT"));
        assert!(!queries.count.text.contains("ORDER BY"));
        assert!(queries.count.get_param("limit").is_none());
        assert_eq!(
            queries.count.get_param("param_0"),
            Some(&ParamValue::Str("acme".into()))
        );
    }

    #[test]
    fn test_search_entities_full_filters() {
        let req = EntitySearch {
            name: Some("Test".into()),
            jurisdiction: Some("BVI".into()),
            country_codes: Some("VG".into()),
            company_type: Some("Corporation".into()),
            status: Some("Active".into()),
            incorporation_date_from: Some("2020-01-01".into()),
            incorporation_date_to: Some("2020-12-31".into()),
            source: Some("Paradise Papers".into()),
            limit: 20,
            offset: 0,
        };
        let queries = search_entities(&req).unwrap();

        let bound = queries
            .page
            .params
            .iter()
            .filter(|(n, _)| n.starts_with("param_"))
            .count();
        assert_eq!(bound, 8);
        assert!(queries.page.text.contains("e.incorporation_date >= date($param_5)"));
        assert!(queries.page.text.contains("e.sourceID = $param_7"));
    }

    #[test]
    fn test_search_officers_and_intermediaries() {
        let req = OfficerSearch {
            name: Some("John Doe".into()),
            limit: 15,
            ..Default::default()
        };
        let officers = search_officers(&req).unwrap();
        assert!(officers.page.text.contains("MATCH (o:Officer)"));
        assert!(officers.page.text.contains("ORDER BY o.name"));

        let intermediaries = search_intermediaries(&req).unwrap();
        assert!(intermediaries.page.text.contains("MATCH (i:Intermediary)"));
    }

    #[test]
    fn test_connections_embeds_validated_depth_and_filters() {
        let req = ConnectionsRequest {
            start_node_id: "10012345".into(),
            relationship_types: Some(vec!["OFFICER_OF".into(), "SHAREHOLDER_OF".into()]),
            node_types: Some(vec!["Entity".into()]),
            max_depth: 3,
            limit: 50,
        };
        let q = connections(&req).unwrap();

        assert!(q.text.contains("[:OFFICER_OF|SHAREHOLDER_OF*1..3]"));
        assert!(q.text.contains("'Entity' IN labels(connected)"));
        assert!(q.text.contains("ORDER BY distance, connected.name"));
        // first_relationship must come from a minimum-length route, so
        // paths are sorted by length before the collect.
        let sort = q.text.find("ORDER BY length(path)").unwrap();
        let aggregate = q.text.find("collect(type(relationships(path)[0]))").unwrap();
        assert!(sort < aggregate);
        assert_eq!(
            q.get_param("start_node_id"),
            Some(&ParamValue::Str("10012345".into()))
        );
    }

    #[test]
    fn test_connections_rejects_before_compiling() {
        let req = ConnectionsRequest {
            start_node_id: "bad id".into(),
            relationship_types: None,
            node_types: None,
            max_depth: 2,
            limit: 50,
        };
        assert!(matches!(connections(&req), Err(HavenError::Validation(_))));

        let req = ConnectionsRequest {
            start_node_id: "ok".into(),
            relationship_types: None,
            node_types: None,
            max_depth: 9,
            limit: 50,
        };
        assert!(connections(&req).is_err());
    }

    #[test]
    fn test_shortest_paths_deterministic_ordering() {
        let req = PathsRequest {
            start_node_id: "a1".into(),
            end_node_id: "b2".into(),
            relationship_types: None,
            max_depth: 6,
            limit: 10,
        };
        let q = shortest_paths(&req).unwrap();

        assert!(q.text.contains("allShortestPaths"));
        assert!(q.text.contains("[*..6]"));
        assert!(q.text.contains("ORDER BY path_length, node_ids"));
        assert_eq!(q.get_param("limit"), Some(&ParamValue::Int(10)));
    }

    #[test]
    fn test_pattern_hub_ranks_by_connection_count() {
        let req = PatternRequest {
            node_id: "n1".into(),
            kind: PatternKind::Hub,
            max_depth: 3,
            min_connections: 5,
            limit: 20,
        };
        let q = pattern(&req).unwrap();

        assert!(q.text.contains("count(DISTINCT neighbor) AS connection_count"));
        assert!(q.text.contains("connection_count >= $min_connections"));
        assert!(q.text.contains("ORDER BY connection_count DESC"));
        assert_eq!(q.get_param("min_connections"), Some(&ParamValue::Int(5)));
    }

    #[test]
    fn test_pattern_bridge_uses_diversity_heuristic() {
        let req = PatternRequest {
            node_id: "n1".into(),
            kind: PatternKind::Bridge,
            max_depth: 2,
            min_connections: 3,
            limit: 20,
        };
        let q = pattern(&req).unwrap();

        assert!(q.text.contains("count(DISTINCT type(r)) AS rel_type_count"));
        assert!(q.text.contains("communities_connected"));
        assert!(q.text.contains("rel_type_count >= 2"));
    }

    #[test]
    fn test_pattern_cluster_groups_per_anchor() {
        let req = PatternRequest {
            node_id: "n1".into(),
            kind: PatternKind::Cluster,
            max_depth: 3,
            min_connections: 3,
            limit: 20,
        };
        let q = pattern(&req).unwrap();

        // One row per anchor member, not one aggregate blob.
        assert!(q.text.contains("UNWIND hood AS anchor"));
        assert!(q.text.contains("anchor.node_id AS anchor_id"));
        assert!(q.text.contains("size(peers) >= $min_connections"));
        assert!(q.text.contains("ORDER BY cluster_strength DESC"));
        assert!(q.text.contains("LIMIT $limit"));
        assert_eq!(q.get_param("min_connections"), Some(&ParamValue::Int(3)));
    }

    #[test]
    fn test_common_connections_requires_two_seeds() {
        let req = CommonConnectionsRequest {
            node_ids: vec!["a".into(), "b".into()],
            relationship_types: None,
            max_depth: 2,
            limit: 20,
        };
        let q = common_connections(&req).unwrap();
        assert!(q.text.contains("size(connected_seeds) >= 2"));
        assert_eq!(
            q.get_param("node_ids"),
            Some(&ParamValue::StrList(vec!["a".into(), "b".into()]))
        );

        let too_few = CommonConnectionsRequest {
            node_ids: vec!["a".into()],
            relationship_types: None,
            max_depth: 2,
            limit: 20,
        };
        assert!(common_connections(&too_few).is_err());
    }

    #[test]
    fn test_temporal_embeds_allow_listed_field_only() {
        let req = TemporalRequest {
            node_id: "n1".into(),
            date_field: "incorporation_date".into(),
            time_window_days: 180,
            limit: 50,
        };
        let q = temporal(&req).unwrap();
        assert!(q.text.contains("focus.incorporation_date"));
        assert!(q.text.contains("abs(day_diff) <= $window_days"));
        assert!(q.text.contains(&format!("*1..{TEMPORAL_NEIGHBORHOOD_DEPTH}]")));
        assert_eq!(q.get_param("window_days"), Some(&ParamValue::Int(180)));

        let bad = TemporalRequest {
            date_field: "name) RETURN (n".into(),
            ..req
        };
        assert!(temporal(&bad).is_err());
    }

    #[test]
    fn test_risk_scan_binds_jurisdiction_set() {
        let req = RiskScanRequest {
            node_id: "n1".into(),
            risk_jurisdictions: None,
            max_depth: 3,
            limit: 30,
        };
        let q = risk_scan(&req).unwrap();

        assert!(q.text.contains("risky.jurisdiction IN $risk_jurisdictions"));
        match q.get_param("risk_jurisdictions") {
            Some(ParamValue::StrList(set)) => {
                assert_eq!(set.len(), 6);
                assert!(set.iter().any(|j| j == "Cayman Islands"));
            }
            other => panic!("expected jurisdiction list, got {other:?}"),
        }
    }

    #[test]
    fn test_statistics_variants() {
        let overview = statistics(&StatisticsRequest {
            kind: StatKind::Overview,
        })
        .unwrap();
        assert!(overview.text.contains("entity_count"));
        assert!(overview.text.contains("relationship_count"));

        let by_jurisdiction = statistics(&StatisticsRequest {
            kind: StatKind::ByJurisdiction,
        })
        .unwrap();
        assert!(by_jurisdiction.text.contains("ORDER BY entity_count DESC"));
    }
}

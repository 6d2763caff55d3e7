//! The operation facade: one method per analytical operation, each
//! flowing through validation, template compilation, resilient
//! execution, and normalization.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use haven_core::cypher::CompiledQuery;
use haven_core::request::{
    CommonConnectionsRequest, ConnectionsRequest, EntityDetailsRequest, EntitySearch,
    OfficerSearch, PathsRequest, PatternKind, PatternRequest, QueryRequest, RiskScanRequest,
    StatisticsRequest, TemporalRequest,
};
use haven_core::types::{
    CommonConnectionRecord, ConnectionRecord, EntityDetails, EntityRecord, OfficerRecord, Page,
    PathRecord, PatternRecord, RiskRecord, StatRecord, TemporalRecord,
};
use haven_core::{HavenConfig, HavenError, Result};
use haven_graph::executor::QueryOutcome;
use haven_graph::resilience::CircuitState;
use haven_graph::{GraphClient, Resilience};

use crate::normalize;
use crate::templates::{self, SearchQueries};

/// Breaker category for read queries.
pub const CATEGORY_QUERY: &str = "neo4j-query";
/// Breaker category for connection establishment.
pub const CATEGORY_CONNECT: &str = "neo4j-connect";

/// Liveness snapshot for operators and protocol adapters.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub connected: bool,
    pub circuits: Vec<CircuitStatus>,
}

#[derive(Debug, Serialize)]
pub struct CircuitStatus {
    pub category: String,
    pub state: CircuitState,
}

/// Read-only query service over the offshore-leaks graph.
pub struct HavenService {
    client: Arc<GraphClient>,
    resilience: Arc<Resilience>,
    config: HavenConfig,
}

impl HavenService {
    pub fn new(config: HavenConfig) -> Self {
        Self {
            client: Arc::new(GraphClient::new()),
            resilience: Arc::new(Resilience::new(config.resilience.clone())),
            config,
        }
    }

    /// Establish the store connection under the connect breaker.
    pub async fn connect(&self) -> Result<()> {
        self.resilience
            .execute(CATEGORY_CONNECT, || self.client.connect(&self.config.neo4j))
            .await
    }

    pub async fn disconnect(&self) {
        self.client.disconnect().await;
    }

    /// Liveness: a probe query plus the current breaker states.
    pub async fn health(&self) -> HealthReport {
        let connected = self
            .client
            .health_check(self.query_timeout())
            .await
            .unwrap_or(false);
        let circuits = self
            .resilience
            .states()
            .into_iter()
            .map(|(category, state)| CircuitStatus { category, state })
            .collect();
        HealthReport { connected, circuits }
    }

    /// Operator hook: force a category's breaker back to Closed.
    pub fn reset_circuit(&self, category: &str) {
        self.resilience.reset(category);
    }

    fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.config.query.timeout_secs)
    }

    fn run(&self, compiled: CompiledQuery) -> impl std::future::Future<Output = Result<QueryOutcome>> + '_ {
        let timeout = self.query_timeout();
        async move {
            self.resilience
                .execute(CATEGORY_QUERY, || self.client.execute(&compiled, timeout))
                .await
        }
    }

    /// Run a page/count pair and assemble the page.
    async fn run_search<T, F>(&self, queries: SearchQueries, offset: u32, limit: u32, map: F) -> Result<Page<T>>
    where
        F: Fn(&[neo4rs::Row]) -> Result<Vec<T>>,
    {
        let page_outcome = self.run(queries.page).await?;
        let count_outcome = self.run(queries.count).await?;

        let records = map(&page_outcome.rows)?;
        let total = normalize::count_row(&count_outcome.rows)?;
        let elapsed_ms = page_outcome.summary.elapsed_ms + count_outcome.summary.elapsed_ms;

        Ok(Page::new(records, Some(total), offset, limit, elapsed_ms))
    }

    fn clamp_search(&self, limit: u32) -> u32 {
        let max = self.config.query.max_limit;
        if limit > max {
            tracing::debug!(requested = limit, max, "search limit clamped");
            max
        } else {
            limit
        }
    }

    pub async fn search_entities(&self, req: &EntitySearch) -> Result<Page<EntityRecord>> {
        let mut req = req.clone();
        req.limit = self.clamp_search(req.limit);
        let queries = templates::search_entities(&req)?;
        self.run_search(queries, req.offset, req.limit, |rows| {
            normalize::entity_rows(rows, "e")
        })
        .await
    }

    pub async fn search_officers(&self, req: &OfficerSearch) -> Result<Page<OfficerRecord>> {
        let mut req = req.clone();
        req.limit = self.clamp_search(req.limit);
        let queries = templates::search_officers(&req)?;
        self.run_search(queries, req.offset, req.limit, |rows| {
            normalize::officer_rows(rows, "o")
        })
        .await
    }

    pub async fn search_intermediaries(&self, req: &OfficerSearch) -> Result<Page<OfficerRecord>> {
        let mut req = req.clone();
        req.limit = self.clamp_search(req.limit);
        let queries = templates::search_intermediaries(&req)?;
        self.run_search(queries, req.offset, req.limit, |rows| {
            normalize::officer_rows(rows, "i")
        })
        .await
    }

    /// Detail lookup; `None` when no node carries the identifier.
    pub async fn entity_details(&self, req: &EntityDetailsRequest) -> Result<Option<EntityDetails>> {
        let compiled = templates::entity_details(req)?;
        let outcome = self.run(compiled).await?;
        normalize::entity_details_rows(&outcome.rows)
    }

    pub async fn connections(&self, req: &ConnectionsRequest) -> Result<Page<ConnectionRecord>> {
        let compiled = templates::connections(req)?;
        let outcome = self.run(compiled).await?;
        let records = normalize::connection_rows(&outcome.rows)?;
        Ok(Page::complete(records, req.limit, outcome.summary.elapsed_ms))
    }

    /// All shortest paths between two nodes. Disconnected endpoints
    /// produce an empty page, not an error.
    pub async fn shortest_paths(&self, req: &PathsRequest) -> Result<Page<PathRecord>> {
        let compiled = templates::shortest_paths(req)?;
        let outcome = self.run(compiled).await?;
        let records = normalize::path_rows(&outcome.rows)?;
        Ok(Page::complete(records, req.limit, outcome.summary.elapsed_ms))
    }

    pub async fn patterns(&self, req: &PatternRequest) -> Result<Page<PatternRecord>> {
        let compiled = templates::pattern(req)?;
        let outcome = self.run(compiled).await?;
        let records = match req.kind {
            PatternKind::Hub => normalize::hub_rows(&outcome.rows)?,
            PatternKind::Bridge => normalize::bridge_rows(&outcome.rows)?,
            PatternKind::Cluster => normalize::cluster_rows(&outcome.rows)?,
        };
        Ok(Page::complete(records, req.limit, outcome.summary.elapsed_ms))
    }

    pub async fn common_connections(
        &self,
        req: &CommonConnectionsRequest,
    ) -> Result<Page<CommonConnectionRecord>> {
        let compiled = templates::common_connections(req)?;
        let outcome = self.run(compiled).await?;
        let records = normalize::common_connection_rows(&outcome.rows)?;
        Ok(Page::complete(records, req.limit, outcome.summary.elapsed_ms))
    }

    pub async fn temporal(&self, req: &TemporalRequest) -> Result<Page<TemporalRecord>> {
        let compiled = templates::temporal(req)?;
        let outcome = self.run(compiled).await?;
        let records = normalize::temporal_rows(&outcome.rows)?;
        Ok(Page::complete(records, req.limit, outcome.summary.elapsed_ms))
    }

    pub async fn risk_scan(&self, req: &RiskScanRequest) -> Result<Page<RiskRecord>> {
        let compiled = templates::risk_scan(req)?;
        let outcome = self.run(compiled).await?;
        let records = normalize::risk_rows(&outcome.rows)?;
        Ok(Page::complete(records, req.limit, outcome.summary.elapsed_ms))
    }

    pub async fn statistics(&self, req: &StatisticsRequest) -> Result<Vec<StatRecord>> {
        use haven_core::request::StatKind;

        let compiled = templates::statistics(req)?;
        let outcome = self.run(compiled).await?;
        match req.kind {
            StatKind::Overview => normalize::overview_rows(&outcome.rows),
            StatKind::BySource => {
                normalize::keyed_stat_rows(&outcome.rows, "source", Some("node_type"), "count")
            }
            StatKind::ByJurisdiction => normalize::keyed_stat_rows(
                &outcome.rows,
                "jurisdiction",
                Some("description"),
                "entity_count",
            ),
            StatKind::RelationshipCounts => {
                normalize::keyed_stat_rows(&outcome.rows, "relationship_type", None, "count")
            }
        }
    }

    /// Tagged-request entry point for protocol adapters. Results are
    /// serialized to JSON so every operation shares one return shape.
    pub async fn dispatch(&self, request: QueryRequest) -> Result<serde_json::Value> {
        let value = match request {
            QueryRequest::SearchEntities(req) => to_value(self.search_entities(&req).await?)?,
            QueryRequest::SearchOfficers(req) => to_value(self.search_officers(&req).await?)?,
            QueryRequest::SearchIntermediaries(req) => {
                to_value(self.search_intermediaries(&req).await?)?
            }
            QueryRequest::EntityDetails(req) => to_value(self.entity_details(&req).await?)?,
            QueryRequest::Connections(req) => to_value(self.connections(&req).await?)?,
            QueryRequest::ShortestPaths(req) => to_value(self.shortest_paths(&req).await?)?,
            QueryRequest::Patterns(req) => to_value(self.patterns(&req).await?)?,
            QueryRequest::CommonConnections(req) => {
                to_value(self.common_connections(&req).await?)?
            }
            QueryRequest::Temporal(req) => to_value(self.temporal(&req).await?)?,
            QueryRequest::RiskScan(req) => to_value(self.risk_scan(&req).await?)?,
            QueryRequest::Statistics(req) => to_value(self.statistics(&req).await?)?,
        };
        Ok(value)
    }
}

fn to_value<T: Serialize>(value: T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| HavenError::Query(format!("result serialization: {e}")))
}

//! CLI entry point for the haven query service.
//!
//! Designed for subprocess invocation from protocol adapters: each
//! subcommand reads a JSON request from stdin and writes a JSON result
//! to stdout. Logs go to stderr.

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use haven_core::request::{
    CommonConnectionsRequest, ConnectionsRequest, EntityDetailsRequest, EntitySearch,
    OfficerSearch, PathsRequest, PatternRequest, QueryRequest, RiskScanRequest, StatKind,
    StatisticsRequest, TemporalRequest,
};
use haven_core::HavenConfig;
use haven_query::HavenService;

#[derive(Parser)]
#[command(name = "haven-query")]
#[command(about = "Resilient query service for the offshore-leaks graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: haven).
    #[arg(short, long, default_value = "haven", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Run one tagged operation (reads a tagged JSON request from stdin).
    Query,
    /// Search entities by name and filters (reads JSON from stdin).
    SearchEntities,
    /// Search officers (reads JSON from stdin).
    SearchOfficers,
    /// Search intermediaries (reads JSON from stdin).
    SearchIntermediaries,
    /// Entity detail lookup (reads JSON from stdin).
    Details,
    /// Bounded-depth neighborhood expansion (reads JSON from stdin).
    Connections,
    /// All shortest paths between two nodes (reads JSON from stdin).
    Paths,
    /// Hub/bridge/cluster pattern detection (reads JSON from stdin).
    Patterns,
    /// Nodes common to multiple seeds (reads JSON from stdin).
    Common,
    /// Temporal proximity analysis (reads JSON from stdin).
    Temporal,
    /// Risky-jurisdiction neighborhood scan (reads JSON from stdin).
    Risk,
    /// Print dataset statistics.
    Stats {
        /// Flavor: overview, by_source, by_jurisdiction, relationship_counts.
        #[arg(long, default_value = "overview")]
        kind: String,
    },
    /// Report connection liveness and circuit breaker states.
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let config = HavenConfig::load(&cli.config)?;
    let service = HavenService::new(config);

    // Health must report even when the store is unreachable.
    if let Err(e) = service.connect().await {
        if matches!(cli.command, Command::Health) {
            tracing::warn!(error = %e, "connection unavailable for health probe");
        } else {
            return Err(e.into());
        }
    }

    match cli.command {
        Command::Query => {
            let request: QueryRequest = read_request()?;
            emit(&service.dispatch(request).await?)?;
        }
        Command::SearchEntities => {
            let request: EntitySearch = read_request()?;
            emit(&service.search_entities(&request).await?)?;
        }
        Command::SearchOfficers => {
            let request: OfficerSearch = read_request()?;
            emit(&service.search_officers(&request).await?)?;
        }
        Command::SearchIntermediaries => {
            let request: OfficerSearch = read_request()?;
            emit(&service.search_intermediaries(&request).await?)?;
        }
        Command::Details => {
            let request: EntityDetailsRequest = read_request()?;
            emit(&service.entity_details(&request).await?)?;
        }
        Command::Connections => {
            let request: ConnectionsRequest = read_request()?;
            emit(&service.connections(&request).await?)?;
        }
        Command::Paths => {
            let request: PathsRequest = read_request()?;
            emit(&service.shortest_paths(&request).await?)?;
        }
        Command::Patterns => {
            let request: PatternRequest = read_request()?;
            emit(&service.patterns(&request).await?)?;
        }
        Command::Common => {
            let request: CommonConnectionsRequest = read_request()?;
            emit(&service.common_connections(&request).await?)?;
        }
        Command::Temporal => {
            let request: TemporalRequest = read_request()?;
            emit(&service.temporal(&request).await?)?;
        }
        Command::Risk => {
            let request: RiskScanRequest = read_request()?;
            emit(&service.risk_scan(&request).await?)?;
        }
        Command::Stats { ref kind } => {
            let kind = parse_stat_kind(kind)?;
            emit(&service.statistics(&StatisticsRequest { kind }).await?)?;
        }
        Command::Health => {
            emit(&service.health().await)?;
        }
    }

    service.disconnect().await;
    Ok(())
}

fn read_request<T: DeserializeOwned>() -> anyhow::Result<T> {
    let input = std::io::read_to_string(std::io::stdin())?;
    Ok(serde_json::from_str(&input)?)
}

fn emit<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn parse_stat_kind(raw: &str) -> anyhow::Result<StatKind> {
    match raw {
        "overview" => Ok(StatKind::Overview),
        "by_source" => Ok(StatKind::BySource),
        "by_jurisdiction" => Ok(StatKind::ByJurisdiction),
        "relationship_counts" => Ok(StatKind::RelationshipCounts),
        other => anyhow::bail!("unknown stats kind: {other}"),
    }
}

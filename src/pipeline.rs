//! UBO Pipeline
//!
//! Runs the stages over one registry snapshot, strictly in sequence:
//!
//! 1. Deduplicate founders
//! 2. Drop legal founders that are not in the company registry
//! 3. Impute missing `share_percent` (four rules)
//! 4. Drop founders that are still undetermined
//! 5. Resolve the ownership graph
//! 6. Select report rows at or above the threshold
//!
//! Every run produces a `RunSummary` with the counts of each stage.

use std::time::Instant;

use chrono::{DateTime, Utc};
use registry_types::{FounderRecord, OwnershipResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{AggregationPolicy, ResolverConfig};
use crate::dedup::{deduplicate, drop_unreachable_legal_founders, DedupStats};
use crate::imputation::{impute_share_percents, RuleOutcome};
use crate::loader::Registry;
use crate::report::{select_report, ReportBlock};
use crate::resolver::OwnershipGraph;

// ============================================================================
// Result Types
// ============================================================================

/// Audit record of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub threshold: f64,
    pub aggregation: AggregationPolicy,
    pub companies: usize,
    pub dedup: DedupStats,
    pub founders_after_legal_filter: usize,
    pub imputation: Vec<RuleOutcome>,
    /// Founders still without a percentage after imputation
    pub unresolved_founders: usize,
    pub ownership_rows: usize,
    pub companies_reported: usize,
    pub owners_reported: usize,
    pub computation_ms: u64,
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Founders with a resolved percentage, as fed to the resolver
    pub founders: Vec<FounderRecord>,
    pub results: Vec<OwnershipResult>,
    pub report: Vec<ReportBlock>,
    pub summary: RunSummary,
}

pub fn run(registry: &Registry, config: &ResolverConfig) -> PipelineRun {
    let start = Instant::now();
    let started_at = Utc::now();
    let run_id = Uuid::new_v4();

    tracing::info!(%run_id, founders = registry.founders.len(), "founders before cleanup");
    let (founders, dedup) = deduplicate(&registry.founders);
    tracing::info!(%run_id, founders = founders.len(), "founders after duplicate cleanup");

    let mut founders = drop_unreachable_legal_founders(founders, &registry.companies);
    let founders_after_legal_filter = founders.len();
    tracing::info!(
        %run_id,
        founders = founders_after_legal_filter,
        "founders after unreachable legal entity cleanup"
    );

    let imputation = impute_share_percents(&mut founders);

    let before_resolution = founders.len();
    founders.retain(|f| f.share_percent.is_some());
    let unresolved_founders = before_resolution - founders.len();

    let graph = OwnershipGraph::build(&registry.companies, &founders)
        .with_max_depth(config.max_depth);
    let results = graph.resolve(config.aggregation);

    let report = select_report(
        &results,
        &registry.companies,
        &registry.persons,
        config.threshold,
    );
    let owners_reported = report.iter().map(|b| b.owners.len()).sum();

    let summary = RunSummary {
        run_id,
        started_at,
        threshold: config.threshold,
        aggregation: config.aggregation,
        companies: registry.companies.len(),
        dedup,
        founders_after_legal_filter,
        imputation,
        unresolved_founders,
        ownership_rows: results.len(),
        companies_reported: report.len(),
        owners_reported,
        computation_ms: start.elapsed().as_millis() as u64,
    };

    tracing::info!(
        %run_id,
        unresolved = summary.unresolved_founders,
        rows = summary.ownership_rows,
        companies = summary.companies_reported,
        owners = summary.owners_reported,
        "ubo run complete in {}ms",
        summary.computation_ms
    );

    PipelineRun {
        founders,
        results,
        report,
        summary,
    }
}

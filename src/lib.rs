//! UBO Resolver - ultimate beneficial ownership from registry snapshots
//!
//! Takes companies, their direct founders (legal entities or natural
//! persons) and partially known ownership shares, and reports every natural
//! person whose flattened share in a company reaches the threshold (25% by
//! default).
//!
//! ## Pipeline
//! Registry files -> line-break repair -> loader -> dedup -> imputation
//! (four rules) -> ownership graph -> report selection -> TSV
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ubo_resolver::{pipeline, DataFiles, Registry, ResolverConfig};
//!
//! let config = ResolverConfig::default();
//! let files = DataFiles::default().in_dir(std::path::Path::new("data"));
//! let registry = Registry::load(&files, config.repair_line_breaks)?;
//! let run = pipeline::run(&registry, &config);
//! ubo_resolver::report::write_report_file(&run.report, &config.output)?;
//! # Ok::<(), ubo_resolver::UboError>(())
//! ```

// Core error handling
pub mod error;

// Run configuration (YAML + defaults)
pub mod config;

// Source text repair and loading
pub mod loader;
pub mod sanitize;

// Core stages
pub mod dedup;
pub mod imputation;
pub mod report;
pub mod resolver;

// Stage orchestration
pub mod pipeline;

pub use config::{AggregationPolicy, DataFiles, ResolverConfig, DEFAULT_UBO_THRESHOLD};
pub use error::{ConfigError, Result, UboError};
pub use imputation::{ImputationRule, RuleOutcome};
pub use loader::{Registry, RegistrySources};
pub use pipeline::{PipelineRun, RunSummary};
pub use report::{ReportBlock, UboRow};
pub use resolver::OwnershipGraph;

// Registry data types
pub use registry_types::{
    Company, CompanyId, FounderRecord, HolderKind, Inn, NaturalPerson, OwnershipResult,
};

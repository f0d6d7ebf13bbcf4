//! Ownership Graph Resolver
//!
//! Flattens direct holdings into indirect ownership per natural person:
//! 1. Index founders by owned company and companies by INN
//! 2. For every company, walk its founders depth-first, multiplying
//!    `share_percent` along the chain
//! 3. Natural-person founders terminate a chain and emit a row for the
//!    company the walk started from
//! 4. Legal-entity founders continue the walk into the company with that INN
//!
//! Cycles are cut with a path-scoped visited list (a company may appear on
//! many paths, never twice on one). The walk uses an explicit work stack, so
//! deep chains do not grow the call stack.

use std::collections::{HashMap, HashSet};

use registry_types::{Company, CompanyId, FounderRecord, Inn, OwnershipResult};

use crate::config::AggregationPolicy;

// ============================================================================
// Internal Types
// ============================================================================

/// Pending work, popped in the order a recursive walk would visit it
#[derive(Debug)]
enum Step {
    Expand {
        company_id: CompanyId,
        multiplier: f64,
        /// Companies already on this path (ancestors of `company_id`)
        path: Vec<CompanyId>,
    },
    Emit {
        inn: Inn,
        share_percent: f64,
    },
}

// ============================================================================
// OwnershipGraph
// ============================================================================

/// Read-only view of the registry shaped for chain traversal
#[derive(Debug)]
pub struct OwnershipGraph<'a> {
    companies: &'a [Company],
    founders_by_company: HashMap<CompanyId, Vec<&'a FounderRecord>>,
    company_by_inn: HashMap<Inn, CompanyId>,
    max_depth: Option<usize>,
}

impl<'a> OwnershipGraph<'a> {
    pub fn build(companies: &'a [Company], founders: &'a [FounderRecord]) -> Self {
        let mut founders_by_company: HashMap<CompanyId, Vec<&'a FounderRecord>> = HashMap::new();
        for founder in founders {
            founders_by_company
                .entry(founder.company_id)
                .or_default()
                .push(founder);
        }

        let mut company_by_inn = HashMap::with_capacity(companies.len());
        for company in companies {
            company_by_inn.entry(company.inn).or_insert(company.id);
        }

        Self {
            companies,
            founders_by_company,
            company_by_inn,
            max_depth: None,
        }
    }

    /// Limit the number of companies on one path
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve every distinct company, in registry order
    pub fn resolve(&self, policy: AggregationPolicy) -> Vec<OwnershipResult> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        for company in self.companies {
            if seen.insert(company.id) {
                results.extend(self.resolve_company(company.id));
            }
        }

        let paths = results.len();
        let results = aggregate(results, policy);
        tracing::info!(
            companies = seen.len(),
            paths,
            rows = results.len(),
            policy = ?policy,
            "ownership graph resolved"
        );
        results
    }

    /// One row per ownership path from a natural person to `root`
    pub fn resolve_company(&self, root: CompanyId) -> Vec<OwnershipResult> {
        let mut results = Vec::new();
        let mut stack = vec![Step::Expand {
            company_id: root,
            multiplier: 1.0,
            path: Vec::new(),
        }];

        while let Some(step) = stack.pop() {
            match step {
                Step::Emit { inn, share_percent } => results.push(OwnershipResult {
                    company_id: root,
                    inn,
                    share_percent,
                }),
                Step::Expand {
                    company_id,
                    multiplier,
                    path,
                } => {
                    if path.contains(&company_id) {
                        tracing::debug!(
                            root,
                            company_id,
                            ?path,
                            "cycle in ownership graph, branch stopped"
                        );
                        continue;
                    }
                    if self.max_depth.is_some_and(|max| path.len() >= max) {
                        tracing::warn!(root, company_id, "max depth reached, branch stopped");
                        continue;
                    }
                    let children = self.expand(company_id, multiplier, &path);
                    // Reverse so the first founder is handled first
                    stack.extend(children.into_iter().rev());
                }
            }
        }

        results
    }

    /// Work generated by the founders of one company
    fn expand(&self, company_id: CompanyId, multiplier: f64, path: &[CompanyId]) -> Vec<Step> {
        let Some(founders) = self.founders_by_company.get(&company_id) else {
            return Vec::new();
        };

        let mut steps = Vec::with_capacity(founders.len());
        for founder in founders {
            // Undetermined edges are not traversable
            let Some(share_percent) = founder.share_percent else {
                continue;
            };
            let share = multiplier * share_percent;

            if founder.is_person() {
                steps.push(Step::Emit {
                    inn: founder.inn,
                    share_percent: share,
                });
                continue;
            }

            match self.company_by_inn.get(&founder.inn) {
                Some(&owner_id) => {
                    let mut child_path = Vec::with_capacity(path.len() + 1);
                    child_path.extend_from_slice(path);
                    child_path.push(company_id);
                    steps.push(Step::Expand {
                        company_id: owner_id,
                        multiplier: share,
                        path: child_path,
                    });
                }
                None => {
                    tracing::debug!(company_id, inn = %founder.inn, "legal founder not in registry");
                }
            }
        }
        steps
    }
}

/// Apply the multi-path policy. `Sum` keeps the position of the first path.
pub fn aggregate(results: Vec<OwnershipResult>, policy: AggregationPolicy) -> Vec<OwnershipResult> {
    match policy {
        AggregationPolicy::KeepSeparate => results,
        AggregationPolicy::Sum => {
            let mut slot: HashMap<(CompanyId, Inn), usize> = HashMap::new();
            let mut summed: Vec<OwnershipResult> = Vec::new();
            for row in results {
                match slot.get(&(row.company_id, row.inn)) {
                    Some(&pos) => summed[pos].share_percent += row.share_percent,
                    None => {
                        slot.insert((row.company_id, row.inn), summed.len());
                        summed.push(row);
                    }
                }
            }
            summed
        }
    }
}

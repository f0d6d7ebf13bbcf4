//! Share Percentage Imputation
//!
//! Registry data rarely carries a complete `share_percent` column. Four rules
//! fill the gaps, company by company, each one a complete pass over the
//! founder store before the next begins:
//!
//! 1. `ProportionalFromAmount` - every founder has a face-value `share`:
//!    `share_percent = share / Σshare` for all founders (overwrites).
//! 2. `SoleFounder` - a single founder owns 100% (overwrites).
//! 3. `Complement` - exactly one founder is missing a percentage:
//!    it gets `1 - Σ(known percentages)`.
//! 4. `RatioInference` - a founder with both `share > 0` and
//!    `share_percent > 0` gives `percent / amount`; founders with an amount
//!    but no percentage get `share * ratio`.
//!
//! Later rules read the values written by earlier ones, so the order is fixed.
//! Whatever is still missing after rule 4 stays `None` and is never traversed.

use std::collections::HashMap;

use registry_types::{CompanyId, FounderRecord};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// RULES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationRule {
    ProportionalFromAmount,
    SoleFounder,
    Complement,
    RatioInference,
}

impl ImputationRule {
    /// Execution order
    pub const ORDERED: [ImputationRule; 4] = [
        ImputationRule::ProportionalFromAmount,
        ImputationRule::SoleFounder,
        ImputationRule::Complement,
        ImputationRule::RatioInference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProportionalFromAmount => "proportional_from_amount",
            Self::SoleFounder => "sole_founder",
            Self::Complement => "complement",
            Self::RatioInference => "ratio_inference",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ProportionalFromAmount => "all face-value amounts known",
            Self::SoleFounder => "single founder",
            Self::Complement => "all percentages known except one",
            Self::RatioInference => "amount/percentage ratio of one founder known",
        }
    }

    /// Apply the rule to every company in `founders`.
    ///
    /// Returns the number of records whose `share_percent` was set or changed.
    pub fn apply(&self, founders: &mut [FounderRecord]) -> usize {
        let groups = group_by_company(founders);
        groups
            .iter()
            .map(|group| match self {
                Self::ProportionalFromAmount => proportional_from_amount(founders, group),
                Self::SoleFounder => sole_founder(founders, group),
                Self::Complement => complement(founders, group),
                Self::RatioInference => ratio_inference(founders, group),
            })
            .sum()
    }
}

impl std::fmt::Display for ImputationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit record for one rule pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: ImputationRule,
    pub changed: usize,
    pub missing_before: f64,
    pub missing_after: f64,
}

/// Fraction of founder records without a `share_percent` (0.0 when empty)
pub fn missing_share_percent_ratio(founders: &[FounderRecord]) -> f64 {
    if founders.is_empty() {
        return 0.0;
    }
    let missing = founders
        .iter()
        .filter(|f| f.share_percent.is_none())
        .count();
    missing as f64 / founders.len() as f64
}

/// Run all four rules in order over the owned founder store
pub fn impute_share_percents(founders: &mut [FounderRecord]) -> Vec<RuleOutcome> {
    let mut outcomes = Vec::with_capacity(ImputationRule::ORDERED.len());

    for rule in ImputationRule::ORDERED {
        let missing_before = missing_share_percent_ratio(founders);
        let changed = rule.apply(founders);
        let missing_after = missing_share_percent_ratio(founders);

        tracing::info!(
            rule = rule.as_str(),
            "{}: missing share_percent {:.2}% -> {:.2}% ({} records updated)",
            rule.description(),
            missing_before * 100.0,
            missing_after * 100.0,
            changed
        );

        outcomes.push(RuleOutcome {
            rule,
            changed,
            missing_before,
            missing_after,
        });
    }

    outcomes
}

// ============================================================================
// RULE BODIES
// ============================================================================

/// Record indexes per company, companies in first-appearance order
fn group_by_company(founders: &[FounderRecord]) -> Vec<Vec<usize>> {
    let mut slot: HashMap<CompanyId, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (idx, founder) in founders.iter().enumerate() {
        let pos = *slot.entry(founder.company_id).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[pos].push(idx);
    }
    groups
}

fn set_share_percent(founder: &mut FounderRecord, value: f64) -> usize {
    if founder.share_percent == Some(value) {
        return 0;
    }
    founder.share_percent = Some(value);
    1
}

fn proportional_from_amount(founders: &mut [FounderRecord], group: &[usize]) -> usize {
    let mut total = Decimal::ZERO;
    for &idx in group {
        match founders[idx].share {
            Some(share) => total += share,
            None => return 0,
        }
    }
    if total.is_zero() {
        return 0;
    }

    let mut changed = 0;
    for &idx in group {
        let Some(share) = founders[idx].share else {
            continue;
        };
        if let Some(fraction) = share.checked_div(total).and_then(|d| d.to_f64()) {
            changed += set_share_percent(&mut founders[idx], fraction);
        }
    }
    changed
}

fn sole_founder(founders: &mut [FounderRecord], group: &[usize]) -> usize {
    match group {
        [only] => set_share_percent(&mut founders[*only], 1.0),
        _ => 0,
    }
}

fn complement(founders: &mut [FounderRecord], group: &[usize]) -> usize {
    let missing: Vec<usize> = group
        .iter()
        .copied()
        .filter(|&idx| founders[idx].share_percent.is_none())
        .collect();
    let [target] = missing.as_slice() else {
        return 0;
    };

    let known: f64 = group
        .iter()
        .filter_map(|&idx| founders[idx].share_percent)
        .sum();
    set_share_percent(&mut founders[*target], 1.0 - known)
}

fn ratio_inference(founders: &mut [FounderRecord], group: &[usize]) -> usize {
    let reference = group.iter().find_map(|&idx| {
        let founder = &founders[idx];
        let share = founder.share?;
        let percent = founder.share_percent?;
        (share > Decimal::ZERO && percent > 0.0).then_some((share, percent))
    });
    let Some((ref_share, ref_percent)) = reference else {
        return 0;
    };
    let Some(ref_amount) = ref_share.to_f64() else {
        return 0;
    };
    let ratio = ref_percent / ref_amount;

    let mut changed = 0;
    for &idx in group {
        let founder = &mut founders[idx];
        if founder.share_percent.is_some() {
            continue;
        }
        if let Some(amount) = founder.share.and_then(|s| s.to_f64()) {
            changed += set_share_percent(founder, amount * ratio);
        }
    }
    changed
}

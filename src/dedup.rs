//! Founder Deduplication
//!
//! Registry exports repeat founder rows. Two rows are duplicates when they
//! share `(inn, company_id, share)`; within such a group a row carrying a
//! `share_percent` is authoritative:
//!
//! - no row has a percentage: the first row is kept
//! - one row has a percentage: only that row is kept
//! - several rows have one: all of them are kept (ambiguous, counted and logged)
//!
//! Legal founders that do not resolve to a known company are dropped
//! separately, since their own founders can never be reached.

use std::collections::{HashMap, HashSet};

use registry_types::{Company, CompanyId, FounderRecord, Inn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

type IdentityKey = (Inn, CompanyId, Option<Decimal>);

/// Counts from one deduplication pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupStats {
    pub input: usize,
    pub output: usize,
    /// Key groups holding more than one row with a percentage
    pub ambiguous_groups: usize,
}

/// Remove duplicate founder rows. Kept rows stay in input order.
pub fn deduplicate(founders: &[FounderRecord]) -> (Vec<FounderRecord>, DedupStats) {
    let mut groups: HashMap<IdentityKey, Vec<usize>> = HashMap::new();
    let mut group_order: Vec<IdentityKey> = Vec::new();

    for (idx, founder) in founders.iter().enumerate() {
        let key = founder.identity_key();
        let members = groups.entry(key).or_insert_with(|| {
            group_order.push(key);
            Vec::new()
        });
        members.push(idx);
    }

    let mut keep = vec![false; founders.len()];
    let mut ambiguous_groups = 0;

    for key in &group_order {
        let members = &groups[key];
        let authoritative: Vec<usize> = members
            .iter()
            .copied()
            .filter(|&idx| founders[idx].share_percent.is_some())
            .collect();

        match authoritative.len() {
            0 => keep[members[0]] = true,
            1 => keep[authoritative[0]] = true,
            n => {
                ambiguous_groups += 1;
                tracing::debug!(
                    inn = %key.0,
                    company_id = key.1,
                    rows = n,
                    "duplicate founder rows with several percentages kept as-is"
                );
                for idx in authoritative {
                    keep[idx] = true;
                }
            }
        }
    }

    let cleaned: Vec<FounderRecord> = founders
        .iter()
        .zip(&keep)
        .filter(|(_, kept)| **kept)
        .map(|(founder, _)| founder.clone())
        .collect();

    if ambiguous_groups > 0 {
        tracing::warn!(
            ambiguous_groups,
            "founder duplicates with conflicting percentages were not reconciled"
        );
    }

    let stats = DedupStats {
        input: founders.len(),
        output: cleaned.len(),
        ambiguous_groups,
    };
    (cleaned, stats)
}

/// Drop legal-entity founders whose INN is not a known company's INN.
/// Natural-person founders always pass.
pub fn drop_unreachable_legal_founders(
    founders: Vec<FounderRecord>,
    companies: &[Company],
) -> Vec<FounderRecord> {
    let known: HashSet<Inn> = companies.iter().map(|c| c.inn).collect();
    founders
        .into_iter()
        .filter(|f| f.is_person() || known.contains(&f.inn))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legal(company_id: CompanyId, inn: u64) -> FounderRecord {
        FounderRecord::legal(company_id, Inn::new(inn))
    }

    #[test]
    fn test_authoritative_duplicate_wins() {
        let founders = vec![
            legal(1, 10).with_share(Decimal::new(40, 0)),
            legal(1, 10)
                .with_share(Decimal::new(40, 0))
                .with_share_percent(0.4),
        ];
        let (cleaned, stats) = deduplicate(&founders);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].share_percent, Some(0.4));
        assert_eq!(stats.input, 2);
        assert_eq!(stats.output, 1);
    }

    #[test]
    fn test_plain_duplicates_keep_first() {
        let founders = vec![
            legal(1, 10),
            legal(1, 10),
            legal(1, 11),
            legal(1, 10),
        ];
        let (cleaned, _) = deduplicate(&founders);
        assert_eq!(cleaned, vec![legal(1, 10), legal(1, 11)]);
    }

    #[test]
    fn test_different_share_is_a_different_record() {
        let founders = vec![
            legal(1, 10).with_share(Decimal::new(10, 0)),
            legal(1, 10).with_share(Decimal::new(20, 0)),
            legal(1, 10),
        ];
        let (cleaned, _) = deduplicate(&founders);
        assert_eq!(cleaned.len(), 3);
    }

    #[test]
    fn test_several_percentages_are_all_kept() {
        let founders = vec![
            legal(1, 10).with_share_percent(0.3),
            legal(1, 10),
            legal(1, 10).with_share_percent(0.5),
        ];
        let (cleaned, stats) = deduplicate(&founders);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].share_percent, Some(0.3));
        assert_eq!(cleaned[1].share_percent, Some(0.5));
        assert_eq!(stats.ambiguous_groups, 1);
    }

    #[test]
    fn test_input_is_not_mutated_and_order_is_preserved() {
        let founders = vec![
            legal(2, 20),
            FounderRecord::person(1, Inn::new(5)),
            legal(1, 10).with_share_percent(1.0),
        ];
        let snapshot = founders.clone();
        let (cleaned, _) = deduplicate(&founders);
        assert_eq!(founders, snapshot);
        assert_eq!(cleaned, snapshot);
    }

    #[test]
    fn test_unreachable_legal_founders_are_dropped() {
        let companies = vec![Company {
            id: 1,
            inn: Inn::new(10),
            ogrn: "1".to_string(),
            full_name: "OOO Alfa".to_string(),
        }];
        let founders = vec![
            legal(2, 10),
            legal(2, 99),
            FounderRecord::person(2, Inn::new(99)),
        ];
        let kept = drop_unreachable_legal_founders(founders, &companies);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].inn, Inn::new(10));
        assert!(kept[1].is_person());
    }
}

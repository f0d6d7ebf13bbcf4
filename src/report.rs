//! UBO Report
//!
//! Selection: flattened rows at or above the threshold, grouped by company
//! (ascending id), rows in resolver order. Companies without a qualifying
//! row are left out.
//!
//! Output: one block per company, tab-delimited
//!
//! ```text
//! <company_id>  <ogrn>  <inn>  <full_name>
//!               <inn padded to 12>  <last first second>  <share, % with 2 decimals>
//! ```

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;

use registry_types::{Company, CompanyId, Inn, NaturalPerson, OwnershipResult};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UboError};

// =============================================================================
// RESPONSE STRUCTS
// =============================================================================

/// A natural person reported for one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UboRow {
    pub inn: Inn,
    pub full_name: String,
    /// Flattened share as a fraction
    pub share_percent: f64,
}

/// All reported persons of one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBlock {
    pub company: Company,
    pub owners: Vec<UboRow>,
}

// =============================================================================
// SELECTION
// =============================================================================

pub fn select_report(
    results: &[OwnershipResult],
    companies: &[Company],
    persons: &[NaturalPerson],
    threshold: f64,
) -> Vec<ReportBlock> {
    let mut company_by_id: HashMap<CompanyId, &Company> = HashMap::new();
    for company in companies {
        company_by_id.entry(company.id).or_insert(company);
    }
    let mut person_by_inn: HashMap<Inn, &NaturalPerson> = HashMap::new();
    for person in persons {
        person_by_inn.entry(person.inn).or_insert(person);
    }

    let mut qualifying: BTreeMap<CompanyId, Vec<&OwnershipResult>> = BTreeMap::new();
    for row in results.iter().filter(|r| r.share_percent >= threshold) {
        qualifying.entry(row.company_id).or_default().push(row);
    }

    let mut blocks = Vec::with_capacity(qualifying.len());
    for (company_id, rows) in qualifying {
        let Some(company) = company_by_id.get(&company_id) else {
            tracing::debug!(company_id, "qualifying company not in registry, skipped");
            continue;
        };

        let owners: Vec<UboRow> = rows
            .into_iter()
            .filter_map(|row| match person_by_inn.get(&row.inn) {
                Some(person) => Some(UboRow {
                    inn: row.inn,
                    full_name: person.full_name(),
                    share_percent: row.share_percent,
                }),
                None => {
                    tracing::debug!(company_id, inn = %row.inn, "person not in registry, row skipped");
                    None
                }
            })
            .collect();

        if owners.is_empty() {
            continue;
        }
        blocks.push(ReportBlock {
            company: (*company).clone(),
            owners,
        });
    }

    blocks
}

// =============================================================================
// FORMATTING
// =============================================================================

/// Percentage with two decimals, e.g. 0.3 -> "30.00"
pub fn format_share(share_percent: f64) -> String {
    format!("{:.2}", share_percent * 100.0)
}

pub fn write_report<W: Write>(blocks: &[ReportBlock], writer: W) -> Result<()> {
    let mut tsv = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer);

    for block in blocks {
        let company = &block.company;
        tsv.write_record([
            company.id.to_string(),
            company.ogrn.clone(),
            company.inn.to_string(),
            company.full_name.clone(),
        ])?;
        for owner in &block.owners {
            tsv.write_record([
                String::new(),
                owner.inn.padded(),
                owner.full_name.clone(),
                format_share(owner.share_percent),
            ])?;
        }
    }

    tsv.flush()?;
    Ok(())
}

pub fn write_report_file(blocks: &[ReportBlock], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|source| UboError::File {
        path: path.to_path_buf(),
        source,
    })?;
    write_report(blocks, std::io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(id: CompanyId) -> Company {
        Company {
            id,
            inn: Inn::new(7700000000 + id as u64),
            ogrn: format!("102770000000{id}"),
            full_name: format!("OOO Company {id}"),
        }
    }

    fn person(inn: u64, second_name: &str) -> NaturalPerson {
        NaturalPerson {
            inn: Inn::new(inn),
            last_name: "Petrov".to_string(),
            first_name: "Petr".to_string(),
            second_name: second_name.to_string(),
        }
    }

    fn row(company_id: CompanyId, inn: u64, share_percent: f64) -> OwnershipResult {
        OwnershipResult {
            company_id,
            inn: Inn::new(inn),
            share_percent,
        }
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let companies = vec![company(1)];
        let persons = vec![person(1, "Petrovich"), person(2, "Petrovich")];
        let results = vec![row(1, 1, 0.25), row(1, 2, 0.2499999)];

        let blocks = select_report(&results, &companies, &persons, 0.25);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].owners.len(), 1);
        assert_eq!(blocks[0].owners[0].inn, Inn::new(1));
    }

    #[test]
    fn test_companies_sorted_and_empty_ones_omitted() {
        let companies = vec![company(3), company(1), company(2)];
        let persons = vec![person(1, "")];
        let results = vec![row(3, 1, 0.5), row(2, 1, 0.1), row(1, 1, 0.9)];

        let blocks = select_report(&results, &companies, &persons, 0.25);
        let ids: Vec<CompanyId> = blocks.iter().map(|b| b.company.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_rows_keep_resolver_order_and_unknown_persons_are_skipped() {
        let companies = vec![company(1)];
        let persons = vec![person(5, ""), person(4, "")];
        let results = vec![row(1, 5, 0.3), row(1, 99, 0.4), row(1, 4, 0.3)];

        let blocks = select_report(&results, &companies, &persons, 0.25);
        let inns: Vec<u64> = blocks[0].owners.iter().map(|o| o.inn.value()).collect();
        assert_eq!(inns, vec![5, 4]);
    }

    #[test]
    fn test_company_with_only_unknown_persons_is_omitted() {
        let companies = vec![company(1)];
        let blocks = select_report(&[row(1, 99, 1.0)], &companies, &[], 0.25);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_write_report_format() {
        let blocks = vec![ReportBlock {
            company: company(7),
            owners: vec![UboRow {
                inn: Inn::new(500100732),
                full_name: person(500100732, "").full_name(),
                share_percent: 0.3,
            }],
        }];
        let mut out = Vec::new();
        write_report(&blocks, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "7\t1027700000007\t7700000007\tOOO Company 7\n\
             \t000500100732\tPetrov Petr \t30.00\n"
        );
    }

    #[test]
    fn test_format_share_rounds_to_two_decimals() {
        assert_eq!(format_share(0.25), "25.00");
        assert_eq!(format_share(1.0 / 3.0), "33.33");
        assert_eq!(format_share(1.0), "100.00");
    }
}

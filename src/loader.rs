//! Registry Loader
//!
//! Reads the three tab-delimited registry exports into typed records:
//!
//! | file                  | consumed columns                                         |
//! |-----------------------|----------------------------------------------------------|
//! | `company.tsv`         | `id, inn, ogrn, full_name`                               |
//! | `founder_legal.tsv`   | `inn, company_id, share, share_percent`                  |
//! | `founder_natural.tsv` | same + `last_name, first_name, second_name` (optional)   |
//!
//! Other columns are ignored. Legal and natural founders are merged into one
//! collection tagged by `HolderKind`; the natural founder file doubles as the
//! person registry.
//!
//! Structural problems (missing column, unparsable key) are fatal. Empty
//! optional cells become `None`.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use registry_types::{Company, CompanyId, FounderRecord, HolderKind, Inn, NaturalPerson};
use rust_decimal::Decimal;

use crate::config::DataFiles;
use crate::error::{Result, UboError};
use crate::sanitize::repair_line_breaks;

// ============================================================================
// REGISTRY SNAPSHOT
// ============================================================================

/// One fully loaded registry snapshot
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub companies: Vec<Company>,
    /// Legal founders first, then natural founders, each in file order
    pub founders: Vec<FounderRecord>,
    pub persons: Vec<NaturalPerson>,
}

/// Raw text of the three registry files
#[derive(Debug, Clone, Copy)]
pub struct RegistrySources<'a> {
    pub company: &'a str,
    pub founder_legal: &'a str,
    pub founder_natural: &'a str,
}

impl Registry {
    /// Read, optionally repair, and parse the registry files
    pub fn load(files: &DataFiles, repair: bool) -> Result<Self> {
        let company = read_source(&files.company, repair)?;
        let founder_legal = read_source(&files.founder_legal, repair)?;
        let founder_natural = read_source(&files.founder_natural, repair)?;

        Self::from_sources(RegistrySources {
            company: &company,
            founder_legal: &founder_legal,
            founder_natural: &founder_natural,
        })
    }

    pub fn from_sources(sources: RegistrySources<'_>) -> Result<Self> {
        let companies = parse_companies(sources.company)?;
        let mut founders = parse_founders(
            sources.founder_legal,
            "founder_legal",
            HolderKind::LegalEntity,
        )?;
        founders.extend(parse_founders(
            sources.founder_natural,
            "founder_natural",
            HolderKind::NaturalPerson,
        )?);
        let persons = parse_persons(sources.founder_natural)?;

        tracing::info!(
            companies = companies.len(),
            founders = founders.len(),
            persons = persons.len(),
            "registry loaded"
        );

        Ok(Self {
            companies,
            founders,
            persons,
        })
    }
}

fn read_source(path: &Path, repair: bool) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|source| UboError::File {
        path: path.to_path_buf(),
        source,
    })?;
    if !repair {
        return Ok(content);
    }

    let repaired = repair_line_breaks(&content);
    tracing::info!(
        file = %path.display(),
        joined_lines = repaired.joined_lines,
        "line-break check complete"
    );
    Ok(repaired.text)
}

// ============================================================================
// COLUMN ACCESS
// ============================================================================

/// Header lookup for one tab-delimited source
struct Table {
    name: &'static str,
    headers: csv::StringRecord,
    rows: Vec<csv::StringRecord>,
}

impl Table {
    fn parse(content: &str, name: &'static str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            rows.push(record);
        }

        Ok(Self {
            name,
            headers,
            rows,
        })
    }

    fn column(&self, column: &str) -> Result<usize> {
        self.optional_column(column).ok_or_else(|| UboError::MissingColumn {
            column: column.to_string(),
            source_name: self.name.to_string(),
        })
    }

    fn optional_column(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == column)
    }

    /// Trimmed cell, `None` when absent or empty
    fn cell<'r>(row: &'r csv::StringRecord, idx: usize) -> Option<&'r str> {
        row.get(idx).map(str::trim).filter(|s| !s.is_empty())
    }

    fn required<T: FromStr>(
        &self,
        row_no: usize,
        row: &csv::StringRecord,
        idx: usize,
        field: &str,
    ) -> Result<T> {
        let raw = Self::cell(row, idx)
            .ok_or_else(|| UboError::invalid_field(self.name, row_no, field, ""))?;
        raw.parse::<T>()
            .map_err(|_| UboError::invalid_field(self.name, row_no, field, raw))
    }

    fn text(row: &csv::StringRecord, idx: Option<usize>) -> String {
        idx.and_then(|i| Self::cell(row, i))
            .unwrap_or_default()
            .to_string()
    }
}

/// `company_id` / `id` cells may be exported as floats ("12.0")
fn parse_company_id(raw: &str) -> Option<CompanyId> {
    raw.parse::<CompanyId>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && v.is_finite())
            .map(|v| v as CompanyId)
    })
}

fn parse_share(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

// ============================================================================
// PARSERS
// ============================================================================

fn parse_companies(content: &str) -> Result<Vec<Company>> {
    let table = Table::parse(content, "company")?;
    let id_col = table.column("id")?;
    let inn_col = table.column("inn")?;
    let ogrn_col = table.optional_column("ogrn");
    let name_col = table.optional_column("full_name");

    let mut companies = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        let row_no = idx + 1;
        let raw_id = Table::cell(row, id_col).unwrap_or_default();
        let id = parse_company_id(raw_id)
            .ok_or_else(|| UboError::invalid_field(table.name, row_no, "id", raw_id))?;
        let inn: Inn = table.required(row_no, row, inn_col, "inn")?;

        companies.push(Company {
            id,
            inn,
            ogrn: Table::text(row, ogrn_col),
            full_name: Table::text(row, name_col),
        });
    }
    Ok(companies)
}

fn parse_founders(
    content: &str,
    name: &'static str,
    kind: HolderKind,
) -> Result<Vec<FounderRecord>> {
    let table = Table::parse(content, name)?;
    let inn_col = table.column("inn")?;
    let company_col = table.column("company_id")?;
    let share_col = table.column("share")?;
    let percent_col = table.column("share_percent")?;

    let mut founders = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        let row_no = idx + 1;
        let inn: Inn = table.required(row_no, row, inn_col, "inn")?;
        let raw_company = Table::cell(row, company_col).unwrap_or_default();
        let company_id = parse_company_id(raw_company)
            .ok_or_else(|| UboError::invalid_field(table.name, row_no, "company_id", raw_company))?;

        let share = match Table::cell(row, share_col) {
            Some(raw) => Some(
                parse_share(raw)
                    .ok_or_else(|| UboError::invalid_field(table.name, row_no, "share", raw))?,
            ),
            None => None,
        };
        let share_percent = match Table::cell(row, percent_col) {
            Some(raw) => Some(
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| !v.is_nan())
                    .ok_or_else(|| {
                        UboError::invalid_field(table.name, row_no, "share_percent", raw)
                    })?,
            ),
            None => None,
        };

        founders.push(FounderRecord {
            company_id,
            inn,
            kind,
            share,
            share_percent,
        });
    }
    Ok(founders)
}

fn parse_persons(content: &str) -> Result<Vec<NaturalPerson>> {
    let table = Table::parse(content, "founder_natural")?;
    let inn_col = table.column("inn")?;
    let last_col = table.column("last_name")?;
    let first_col = table.column("first_name")?;
    let second_col = table.optional_column("second_name");

    let mut seen = HashSet::new();
    let mut persons = Vec::new();
    for (idx, row) in table.rows.iter().enumerate() {
        let inn: Inn = table.required(idx + 1, row, inn_col, "inn")?;
        // First row per INN wins
        if !seen.insert(inn) {
            continue;
        }
        persons.push(NaturalPerson {
            inn,
            last_name: Table::text(row, Some(last_col)),
            first_name: Table::text(row, Some(first_col)),
            second_name: Table::text(row, second_col),
        });
    }
    Ok(persons)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPANY: &str = "id\tinn\togrn\tfull_name\tokved\n\
        1\t7701000001\t1027700000001\tOOO Alfa\t62.01\n\
        2\t7701000002.0\t1027700000002\tAO Beta\t\n";

    const LEGAL: &str = "inn\tcompany_id\tshare\tshare_percent\n\
        7701000002\t1\t6000.00\t\n";

    const NATURAL: &str = "inn\tcompany_id\tshare\tshare_percent\tlast_name\tfirst_name\tsecond_name\n\
        500100732259\t1\t4000\t0.4\tIvanov\tIvan\tIvanovich\n\
        500100732259\t2\t\t\tIvanov\tIvan\tIvanovich\n\
        12345\t2\t\t\tSmith\tJohn\n";

    fn sources() -> RegistrySources<'static> {
        RegistrySources {
            company: COMPANY,
            founder_legal: LEGAL,
            founder_natural: NATURAL,
        }
    }

    #[test]
    fn test_loads_all_three_sources() {
        let registry = Registry::from_sources(sources()).unwrap();
        assert_eq!(registry.companies.len(), 2);
        assert_eq!(registry.companies[1].inn, Inn::new(7701000002));
        assert_eq!(registry.companies[1].full_name, "AO Beta");

        assert_eq!(registry.founders.len(), 4);
        assert_eq!(registry.founders[0].kind, HolderKind::LegalEntity);
        assert_eq!(registry.founders[0].share, Some(Decimal::new(6000, 0)));
        assert_eq!(registry.founders[0].share_percent, None);
        assert!(registry.founders[1..].iter().all(|f| f.is_person()));
        assert_eq!(registry.founders[1].share_percent, Some(0.4));
        assert_eq!(registry.founders[2].share, None);
    }

    #[test]
    fn test_persons_dedupe_by_inn_and_tolerate_missing_patronymic() {
        let registry = Registry::from_sources(sources()).unwrap();
        assert_eq!(registry.persons.len(), 2);
        assert_eq!(registry.persons[0].second_name, "Ivanovich");
        assert_eq!(registry.persons[1].inn, Inn::new(12345));
        assert_eq!(registry.persons[1].second_name, "");
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let err = Registry::from_sources(RegistrySources {
            founder_legal: "inn\tcompany_id\tshare\n1\t1\t10\n",
            ..sources()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            UboError::MissingColumn { ref column, .. } if column == "share_percent"
        ));
    }

    #[test]
    fn test_unparsable_key_is_fatal() {
        let err = Registry::from_sources(RegistrySources {
            company: "id\tinn\togrn\tfull_name\nabc\t1\t1\tX\n",
            ..sources()
        })
        .unwrap_err();
        assert!(err.to_string().contains("'abc'"));
    }

    #[test]
    fn test_load_repairs_broken_records() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("company.tsv"),
            "id\tinn\togrn\tfull_name\n1\t7701000001\t1\tOOO Alfa\n and Co\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("founder_legal.tsv"), LEGAL).unwrap();
        std::fs::write(dir.path().join("founder_natural.tsv"), NATURAL).unwrap();

        let files = DataFiles::default().in_dir(dir.path());
        let registry = Registry::load(&files, true).unwrap();
        assert_eq!(registry.companies.len(), 1);
        assert_eq!(registry.companies[0].full_name, "OOO Alfa and Co");
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = DataFiles::default().in_dir(dir.path());
        let err = Registry::load(&files, false).unwrap_err();
        assert!(matches!(err, UboError::File { .. }));
    }
}

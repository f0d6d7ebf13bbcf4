//! Registry Types - Level 1 Foundation Types
//!
//! Pure data structures shared by every stage of the beneficial ownership
//! pipeline. Nothing in here knows how records are loaded, imputed or
//! resolved.
//!
//! ## Contents
//!
//! - Tax identifiers (`Inn`)
//! - Companies and natural persons from the registry snapshot
//! - Founder records (direct ownership edges)
//! - Flattened ownership rows produced by the resolver
//!
//! ## Rules
//!
//! 1. **NO BUSINESS LOGIC** - Only data structures, constructors and accessors
//! 2. **NO WORKSPACE DEPENDENCIES**
//! 3. **SERIALIZABLE** - All types support serde

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Internal company key as it appears in the `company_id` / `id` columns.
pub type CompanyId = i64;

// ============================================================================
// TAX IDENTIFIER
// ============================================================================

/// Taxpayer identification number.
///
/// Registry exports store INNs as numbers, so leading zeros are lost and some
/// tools append a `.0`. Both forms parse to the same value; `padded()` restores
/// the canonical 12-digit form for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inn(u64);

impl Inn {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Zero-padded 12-digit rendering
    pub fn padded(&self) -> String {
        format!("{:012}", self.0)
    }
}

impl std::fmt::Display for Inn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid INN '{raw}'")]
pub struct InnParseError {
    pub raw: String,
}

impl FromStr for Inn {
    type Err = InnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InnParseError { raw: s.to_string() };
        let trimmed = s.trim();
        let digits = match trimmed.split_once('.') {
            Some((int_part, frac)) if frac.chars().all(|c| c == '0') => int_part,
            Some(_) => return Err(err()),
            None => trimmed,
        };
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        digits.parse::<u64>().map(Inn).map_err(|_| err())
    }
}

// ============================================================================
// REGISTRY ENTITIES
// ============================================================================

/// A legal entity from the company registry. Never mutated after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub inn: Inn,
    pub ogrn: String,
    pub full_name: String,
}

/// A natural person, looked up by INN when rendering report rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalPerson {
    pub inn: Inn,
    pub last_name: String,
    pub first_name: String,
    /// Patronymic, may be empty
    pub second_name: String,
}

impl NaturalPerson {
    /// "Last First Second"; an empty patronymic keeps its separator.
    pub fn full_name(&self) -> String {
        format!("{} {} {}", self.last_name, self.first_name, self.second_name)
    }
}

// ============================================================================
// OWNERSHIP EDGES
// ============================================================================

/// Who holds a founder stake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolderKind {
    LegalEntity,
    NaturalPerson,
}

/// Direct holding of `inn` in company `company_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FounderRecord {
    pub company_id: CompanyId,
    /// Holder's INN: a `Company::inn` for legal entities, a `NaturalPerson::inn` otherwise
    pub inn: Inn,
    pub kind: HolderKind,
    /// Face-value amount of the holding
    pub share: Option<Decimal>,
    /// Direct fraction of the company in [0, 1]
    pub share_percent: Option<f64>,
}

impl FounderRecord {
    pub fn legal(company_id: CompanyId, inn: Inn) -> Self {
        Self {
            company_id,
            inn,
            kind: HolderKind::LegalEntity,
            share: None,
            share_percent: None,
        }
    }

    pub fn person(company_id: CompanyId, inn: Inn) -> Self {
        Self {
            company_id,
            inn,
            kind: HolderKind::NaturalPerson,
            share: None,
            share_percent: None,
        }
    }

    pub fn with_share(mut self, share: Decimal) -> Self {
        self.share = Some(share);
        self
    }

    pub fn with_share_percent(mut self, share_percent: f64) -> Self {
        self.share_percent = Some(share_percent);
        self
    }

    pub fn is_person(&self) -> bool {
        self.kind == HolderKind::NaturalPerson
    }

    /// Duplicate identity: `(inn, company_id, share)`
    pub fn identity_key(&self) -> (Inn, CompanyId, Option<Decimal>) {
        // normalize() so that 60 and 60.00 land in the same group
        (self.inn, self.company_id, self.share.map(|s| s.normalize()))
    }
}

/// Flattened indirect ownership of a natural person in a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipResult {
    pub company_id: CompanyId,
    pub inn: Inn,
    pub share_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inn_parsing_accepts_numeric_export_forms() {
        assert_eq!("7701234567".parse::<Inn>().unwrap(), Inn::new(7701234567));
        assert_eq!(" 7701234567 ".parse::<Inn>().unwrap(), Inn::new(7701234567));
        assert_eq!("7701234567.0".parse::<Inn>().unwrap(), Inn::new(7701234567));
    }

    #[test]
    fn test_inn_parsing_rejects_garbage() {
        assert!("".parse::<Inn>().is_err());
        assert!("77O1".parse::<Inn>().is_err());
        assert!("12.5".parse::<Inn>().is_err());
        assert!("-12".parse::<Inn>().is_err());
    }

    #[test]
    fn test_inn_padding() {
        assert_eq!(Inn::new(123456789).padded(), "000123456789");
        assert_eq!(Inn::new(771234567890).padded(), "771234567890");
    }

    #[test]
    fn test_full_name_keeps_empty_patronymic_segment() {
        let person = NaturalPerson {
            inn: Inn::new(1),
            last_name: "Ivanov".to_string(),
            first_name: "Ivan".to_string(),
            second_name: String::new(),
        };
        assert_eq!(person.full_name(), "Ivanov Ivan ");
    }

    #[test]
    fn test_identity_key_ignores_decimal_scale() {
        let a = FounderRecord::legal(1, Inn::new(5)).with_share(Decimal::new(60, 0));
        let b = FounderRecord::legal(1, Inn::new(5)).with_share(Decimal::new(6000, 2));
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_inn_serializes_as_number() {
        let json = serde_json::to_string(&Inn::new(42)).unwrap();
        assert_eq!(json, "42");
    }
}

//! # Bracket Tables
//!
//! Simples Nacional bracket schedules ("Anexos") and bracket resolution.
//!
//! ## Effective Rate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  effective = max(0, (RBT12 × nominal/100 − deduction) / RBT12 × 100)    │
//! │                                                                         │
//! │  Anexo III, RBT12 = 250 000                                             │
//! │    bracket 2: up to 360 000, nominal 11.2%, deduction 9 360             │
//! │    (250 000 × 0.112 − 9 360) / 250 000 × 100 = 7.456%                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tables are static reference data. The statutory schedules ship with the
//! crate; a [`BracketCatalog`] may carry per-Anexo overrides from config.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Anexo
// =============================================================================

/// A named Simples Nacional bracket schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Anexo {
    I,
    II,
    III,
    IV,
    V,
}

impl Anexo {
    pub const ALL: [Anexo; 5] = [Anexo::I, Anexo::II, Anexo::III, Anexo::IV, Anexo::V];

    fn index(self) -> usize {
        match self {
            Anexo::I => 0,
            Anexo::II => 1,
            Anexo::III => 2,
            Anexo::IV => 3,
            Anexo::V => 4,
        }
    }

    fn roman(self) -> &'static str {
        match self {
            Anexo::I => "I",
            Anexo::II => "II",
            Anexo::III => "III",
            Anexo::IV => "IV",
            Anexo::V => "V",
        }
    }
}

impl std::fmt::Display for Anexo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Anexo {}", self.roman())
    }
}

impl std::str::FromStr for Anexo {
    type Err = ValidationError;

    /// Accepts "Anexo III", "anexo_iii", "III" and "3".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let key = upper
            .trim_start_matches("ANEXO")
            .trim_start_matches(['_', '-', ' '])
            .trim();
        match key {
            "I" | "1" => Ok(Anexo::I),
            "II" | "2" => Ok(Anexo::II),
            "III" | "3" => Ok(Anexo::III),
            "IV" | "4" => Ok(Anexo::IV),
            "V" | "5" => Ok(Anexo::V),
            _ => Err(ValidationError::InvalidFormat {
                field: "anexo".to_string(),
                reason: format!("unknown bracket table '{}'", s),
            }),
        }
    }
}

// =============================================================================
// Bracket & Table
// =============================================================================

/// One row of a bracket table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    /// Inclusive RBT12 ceiling of this bracket.
    pub upper_limit: f64,
    /// Nominal rate, percent.
    pub nominal_rate: f64,
    /// Amount subtracted before dividing by RBT12.
    pub deduction: f64,
}

impl Bracket {
    pub const fn new(upper_limit: f64, nominal_rate: f64, deduction: f64) -> Self {
        Bracket {
            upper_limit,
            nominal_rate,
            deduction,
        }
    }
}

/// An ordered bracket schedule for one Anexo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BracketTable {
    pub anexo: Anexo,
    pub brackets: Vec<Bracket>,
}

impl BracketTable {
    pub fn new(anexo: Anexo, brackets: Vec<Bracket>) -> Self {
        BracketTable { anexo, brackets }
    }

    /// Statutory schedule for `anexo` (LC 123/2006, as amended by LC 155/2016).
    pub fn statutory(anexo: Anexo) -> Self {
        let rows: [(f64, f64, f64); 6] = match anexo {
            Anexo::I => [
                (180_000.0, 4.0, 0.0),
                (360_000.0, 7.3, 5_940.0),
                (720_000.0, 9.5, 13_860.0),
                (1_800_000.0, 10.7, 22_500.0),
                (3_600_000.0, 14.3, 87_300.0),
                (4_800_000.0, 19.0, 378_000.0),
            ],
            Anexo::II => [
                (180_000.0, 4.5, 0.0),
                (360_000.0, 7.8, 5_940.0),
                (720_000.0, 10.0, 13_860.0),
                (1_800_000.0, 11.2, 22_500.0),
                (3_600_000.0, 14.7, 85_500.0),
                (4_800_000.0, 30.0, 720_000.0),
            ],
            Anexo::III => [
                (180_000.0, 6.0, 0.0),
                (360_000.0, 11.2, 9_360.0),
                (720_000.0, 13.5, 17_640.0),
                (1_800_000.0, 16.0, 35_640.0),
                (3_600_000.0, 21.0, 125_640.0),
                (4_800_000.0, 33.0, 648_000.0),
            ],
            Anexo::IV => [
                (180_000.0, 4.5, 0.0),
                (360_000.0, 9.0, 8_100.0),
                (720_000.0, 10.2, 12_420.0),
                (1_800_000.0, 14.0, 39_780.0),
                (3_600_000.0, 22.0, 183_780.0),
                (4_800_000.0, 33.0, 828_000.0),
            ],
            Anexo::V => [
                (180_000.0, 15.5, 0.0),
                (360_000.0, 18.0, 4_500.0),
                (720_000.0, 19.5, 9_900.0),
                (1_800_000.0, 20.5, 17_100.0),
                (3_600_000.0, 23.0, 62_100.0),
                (4_800_000.0, 30.5, 540_000.0),
            ],
        };

        BracketTable {
            anexo,
            brackets: rows
                .iter()
                .map(|&(limit, rate, deduction)| Bracket::new(limit, rate, deduction))
                .collect(),
        }
    }

    /// Checks that the table is non-empty, finite and strictly ascending.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let field = format!("{} brackets", self.anexo);

        if self.brackets.is_empty() {
            return Err(ValidationError::Required { field });
        }

        let finite = self.brackets.iter().all(|b| {
            b.upper_limit.is_finite() && b.nominal_rate.is_finite() && b.deduction.is_finite()
        });
        if !finite {
            return Err(ValidationError::InvalidFormat {
                field,
                reason: "all values must be finite numbers".to_string(),
            });
        }

        if self
            .brackets
            .windows(2)
            .any(|pair| pair[1].upper_limit <= pair[0].upper_limit)
        {
            return Err(ValidationError::InvalidFormat {
                field,
                reason: "upper limits must be strictly ascending".to_string(),
            });
        }

        Ok(())
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// The five bracket tables in effect for a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketCatalog {
    tables: [BracketTable; 5],
}

impl BracketCatalog {
    /// Catalog with the statutory schedules.
    pub fn statutory() -> Self {
        BracketCatalog {
            tables: Anexo::ALL.map(BracketTable::statutory),
        }
    }

    /// Replaces the table for `table.anexo`.
    pub fn with_override(mut self, table: BracketTable) -> Self {
        let idx = table.anexo.index();
        self.tables[idx] = table;
        self
    }

    pub fn table(&self, anexo: Anexo) -> &BracketTable {
        &self.tables[anexo.index()]
    }

    pub fn tables(&self) -> impl Iterator<Item = &BracketTable> {
        self.tables.iter()
    }
}

impl Default for BracketCatalog {
    fn default() -> Self {
        Self::statutory()
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// The bracket selected for a revenue figure and its effective rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BracketResolution {
    pub bracket: Bracket,
    /// 1-based position of the bracket within its table.
    pub position: usize,
    /// Revenue actually used (`1` when the input was zero or negative).
    pub revenue_used: f64,
    /// Effective rate, percent.
    pub effective_rate: f64,
}

/// Resolves the bracket for `revenue` in `table`.
///
/// ## Rules
/// - `revenue <= 0` (or non-finite) is replaced by `1`
/// - first bracket with `upper_limit >= revenue` wins
/// - revenue above every ceiling falls into the last bracket
/// - effective rate is floored at zero
///
/// Returns `None` only for an empty table.
pub fn resolve(table: &BracketTable, revenue: f64) -> Option<BracketResolution> {
    let last = table.brackets.len().checked_sub(1)?;
    let r = if revenue.is_finite() && revenue > 0.0 {
        revenue
    } else {
        1.0
    };

    let index = table
        .brackets
        .iter()
        .position(|b| b.upper_limit >= r)
        .unwrap_or(last);
    let bracket = table.brackets[index];

    let effective_rate = (((r * bracket.nominal_rate / 100.0 - bracket.deduction) / r) * 100.0).max(0.0);

    debug!(
        anexo = %table.anexo,
        revenue = r,
        position = index + 1,
        effective_rate,
        "Resolved Simples Nacional bracket"
    );

    Some(BracketResolution {
        bracket,
        position: index + 1,
        revenue_used: r,
        effective_rate,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anexo_iii_second_bracket() {
        let table = BracketTable::statutory(Anexo::III);
        let res = resolve(&table, 250_000.0).unwrap();

        assert_eq!(res.position, 2);
        assert_eq!(res.bracket.upper_limit, 360_000.0);
        assert!((res.effective_rate - 7.456).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let table = BracketTable::statutory(Anexo::III);
        assert_eq!(resolve(&table, 180_000.0).unwrap().position, 1);
        assert_eq!(resolve(&table, 180_000.01).unwrap().position, 2);
    }

    #[test]
    fn test_first_bracket_effective_equals_nominal() {
        let table = BracketTable::statutory(Anexo::I);
        let res = resolve(&table, 100_000.0).unwrap();
        assert!((res.effective_rate - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_revenue_substitutes_one() {
        let table = BracketTable::statutory(Anexo::III);
        let res = resolve(&table, 0.0).unwrap();
        assert_eq!(res.revenue_used, 1.0);
        assert_eq!(res.position, 1);
        assert!((res.effective_rate - 6.0).abs() < 1e-12);

        let res = resolve(&table, -50.0).unwrap();
        assert_eq!(res.revenue_used, 1.0);
    }

    #[test]
    fn test_revenue_above_ceiling_uses_last_bracket() {
        let table = BracketTable::statutory(Anexo::V);
        let res = resolve(&table, 9_000_000.0).unwrap();
        assert_eq!(res.position, 6);
        assert_eq!(res.bracket.nominal_rate, 30.5);
    }

    #[test]
    fn test_effective_rate_floored_at_zero() {
        let table = BracketTable::new(
            Anexo::I,
            vec![Bracket::new(100.0, 1.0, 0.0), Bracket::new(1_000.0, 2.0, 500.0)],
        );
        let res = resolve(&table, 200.0).unwrap();
        assert_eq!(res.effective_rate, 0.0);
    }

    #[test]
    fn test_empty_table_has_no_resolution() {
        let table = BracketTable::new(Anexo::II, Vec::new());
        assert!(resolve(&table, 1_000.0).is_none());
    }

    #[test]
    fn test_anexo_parsing_and_display() {
        assert_eq!("Anexo III".parse::<Anexo>().unwrap(), Anexo::III);
        assert_eq!("anexo_v".parse::<Anexo>().unwrap(), Anexo::V);
        assert_eq!("iv".parse::<Anexo>().unwrap(), Anexo::IV);
        assert_eq!("2".parse::<Anexo>().unwrap(), Anexo::II);
        assert!("VI".parse::<Anexo>().is_err());
        assert_eq!(Anexo::III.to_string(), "Anexo III");
    }

    #[test]
    fn test_statutory_tables_are_valid() {
        for table in BracketCatalog::statutory().tables() {
            assert!(table.validate().is_ok(), "{} invalid", table.anexo);
            assert_eq!(table.brackets.len(), 6);
        }
    }

    #[test]
    fn test_table_validation_rejects_unsorted() {
        let table = BracketTable::new(
            Anexo::I,
            vec![Bracket::new(500.0, 1.0, 0.0), Bracket::new(100.0, 2.0, 0.0)],
        );
        assert!(table.validate().is_err());
        assert!(BracketTable::new(Anexo::I, vec![]).validate().is_err());
    }

    #[test]
    fn test_catalog_override() {
        let custom = BracketTable::new(Anexo::IV, vec![Bracket::new(1e9, 10.0, 0.0)]);
        let catalog = BracketCatalog::statutory().with_override(custom.clone());
        assert_eq!(catalog.table(Anexo::IV), &custom);
        assert_eq!(catalog.table(Anexo::III), &BracketTable::statutory(Anexo::III));
    }
}

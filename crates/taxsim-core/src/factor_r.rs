//! # Factor R Advisor
//!
//! Payroll-to-revenue ratio used to decide between Anexo III and Anexo V
//! for service activities under Simples Nacional.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ratio = FS12 / RBT12                                                   │
//! │                                                                         │
//! │  Anexo III  and ratio <  0.28  → warn: activity falls under Anexo V    │
//! │  Anexo III  and ratio >= 0.28  → compatible                            │
//! │  Anexo V    and ratio >= 0.28  → warn: activity falls under Anexo III  │
//! │  Anexo V    and ratio <  0.28  → compatible                            │
//! │  Anexo I/II/IV                 → not Factor-R gated                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Advisory only: the report never changes the tax computed.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::brackets::Anexo;
use crate::validation::NumericInput;

/// Ratio at or above which Anexo III applies.
pub const FACTOR_R_THRESHOLD: f64 = 0.28;

/// Outcome category of a Factor R check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactorRStatus {
    /// The selected Anexo agrees with the ratio.
    Compatible,
    /// The ratio points to a different Anexo than the one selected.
    Mismatch,
    /// The selected Anexo is not decided by Factor R.
    NotGated,
    /// Ratio could not be computed from the inputs.
    Unavailable,
}

/// Factor R ratio plus its advisory note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FactorRReport {
    pub ratio: Option<f64>,
    pub anexo: Option<Anexo>,
    pub status: FactorRStatus,
    pub note: String,
    /// Anexo the ratio points to, for Factor-R gated tables.
    pub suggested_anexo: Option<Anexo>,
}

/// Computes Factor R and the advisory for the selected table.
pub fn advise(rbt12: Option<f64>, fs12: Option<f64>, anexo: Option<Anexo>) -> FactorRReport {
    let unavailable = |note: &str| FactorRReport {
        ratio: None,
        anexo,
        status: FactorRStatus::Unavailable,
        note: note.to_string(),
        suggested_anexo: None,
    };

    let fs12 = match NumericInput::classify(fs12) {
        NumericInput::Valid(v) => v,
        NumericInput::Missing => {
            return unavailable("Factor R could not be computed: FS12 not informed")
        }
        NumericInput::Invalid => {
            return unavailable("Factor R could not be computed: FS12 is not a valid amount")
        }
    };
    let rbt12 = match NumericInput::classify(rbt12) {
        NumericInput::Valid(v) if v > 0.0 => v,
        _ => return unavailable("Factor R could not be computed: RBT12 must be greater than zero"),
    };

    let ratio = fs12 / rbt12;
    let suggested = if ratio >= FACTOR_R_THRESHOLD {
        Anexo::III
    } else {
        Anexo::V
    };
    let pct = ratio * 100.0;

    let (status, note, suggested_anexo) = match anexo {
        Some(Anexo::III) if ratio < FACTOR_R_THRESHOLD => (
            FactorRStatus::Mismatch,
            format!(
                "Factor R {:.2}% is below 28%: this activity would ordinarily fall under Anexo V",
                pct
            ),
            Some(suggested),
        ),
        Some(Anexo::V) if ratio >= FACTOR_R_THRESHOLD => (
            FactorRStatus::Mismatch,
            format!(
                "Factor R {:.2}% is at or above 28%: this activity would ordinarily fall under Anexo III",
                pct
            ),
            Some(suggested),
        ),
        Some(table @ (Anexo::III | Anexo::V)) => (
            FactorRStatus::Compatible,
            format!("Factor R {:.2}% is consistent with {}", pct, table),
            Some(suggested),
        ),
        Some(table) => (
            FactorRStatus::NotGated,
            format!("Factor R {:.2}%; {} is not directly Factor-R gated", pct, table),
            None,
        ),
        None => (
            FactorRStatus::NotGated,
            format!("Factor R {:.2}%; no Anexo selected", pct),
            Some(suggested),
        ),
    };

    debug!(ratio, ?status, "Factor R computed");

    FactorRReport {
        ratio: Some(ratio),
        anexo,
        status,
        note,
        suggested_anexo,
    }
}

//! # Regime Calculators
//!
//! One calculator per tax regime, selected once per run by matching on
//! [`RegimeInputs`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RegimeInputs ──match──┬── SimplesNacional ──► simples_nacional::calc  │
//! │                        ├── LucroPresumido  ──► lucro_presumido::calc   │
//! │                        └── LucroReal       ──► lucro_real::calc        │
//! │                                                                         │
//! │  Every calculator receives the same gross revenue: the finalized       │
//! │  cart total produced by the rateio allocator.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod lucro_presumido;
pub mod lucro_real;
pub mod simples_nacional;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::brackets::{BracketCatalog, BracketResolution};
use crate::types::{RegimeInputs, TaxComponent};
use crate::validation::NumericInput;

/// What a regime calculator produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RegimeOutcome {
    pub components: Vec<TaxComponent>,
    /// Profit base the income taxes were computed on, signed.
    pub profit_base: Option<f64>,
    /// Simples Nacional only.
    pub bracket: Option<BracketResolution>,
}

impl RegimeOutcome {
    /// Sum of all component values.
    pub fn total(&self) -> f64 {
        self.components.iter().map(|c| c.value).sum()
    }
}

/// Runs the calculator selected by `inputs` against `gross_revenue`.
pub fn calculate(
    inputs: &RegimeInputs,
    gross_revenue: f64,
    catalog: &BracketCatalog,
) -> RegimeOutcome {
    match inputs {
        RegimeInputs::SimplesNacional(sn) => simples_nacional::calculate(sn, gross_revenue, catalog),
        RegimeInputs::LucroPresumido(lp) => lucro_presumido::calculate(lp, gross_revenue),
        RegimeInputs::LucroReal(lr) => lucro_real::calculate(lr, gross_revenue),
    }
}

/// Municipal service tax, shared by Lucro Presumido and Lucro Real.
///
/// Omitted when no rate is supplied; a supplied but invalid rate yields a
/// zero component with a note.
pub(crate) fn iss_component(gross_revenue: f64, rate: Option<f64>) -> Option<TaxComponent> {
    match NumericInput::classify(rate) {
        NumericInput::Missing => None,
        NumericInput::Invalid => Some(
            TaxComponent::new("ISS", 0.0)
                .with_note("ISS rate is not a valid percentage; ISS not computed"),
        ),
        NumericInput::Valid(rate) => {
            Some(TaxComponent::new("ISS", gross_revenue * rate / 100.0).with_rate(rate))
        }
    }
}

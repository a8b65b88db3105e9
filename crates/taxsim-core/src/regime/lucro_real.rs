//! Lucro Real: income taxes on actual profit, non-cumulative PIS/COFINS with
//! credits.
//!
//! ```text
//! profit         = gross − deductible expenses        (signed)
//! IRPJ           = max(profit, 0) × 15%
//! IRPJ adicional = max(0, profit × 3 − 60 000) × 10% / 3
//! CSLL           = max(profit, 0) × 9%
//! PIS            = max(0, gross × 1.65% − PIS credit)
//! COFINS         = max(0, gross × 7.6% − COFINS credit)
//! ISS            = gross × rate                        (when supplied)
//! ```
//!
//! The additional IRPJ triples the profit against the quarterly 60 000
//! threshold and divides the surtax back by three. The multiply/divide is
//! kept literally; it is not equivalent to comparing against 20 000 once
//! rounding and negative profits are involved.

use super::{iss_component, RegimeOutcome};
use crate::types::{RealInputs, TaxComponent};
use crate::validation::NumericInput;

pub const IRPJ_RATE: f64 = 0.15;
pub const IRPJ_ADDITIONAL_RATE: f64 = 0.10;
pub const IRPJ_ADDITIONAL_QUARTER_THRESHOLD: f64 = 60_000.0;
pub const CSLL_RATE: f64 = 0.09;
pub const PIS_RATE: f64 = 0.0165;
pub const COFINS_RATE: f64 = 0.076;

pub fn calculate(inputs: &RealInputs, gross_revenue: f64) -> RegimeOutcome {
    let expenses = NumericInput::classify(inputs.deductible_expenses);
    let pis_credit = NumericInput::classify(inputs.pis_credit);
    let cofins_credit = NumericInput::classify(inputs.cofins_credit);

    let profit = gross_revenue - expenses.or(0.0);
    let taxable = profit.max(0.0);

    let mut profit_note = format!("Pre-tax profit {:.2}", profit);
    if expenses == NumericInput::Invalid {
        profit_note.push_str("; deductible expenses invalid, treated as 0");
    }

    let additional = (profit * 3.0 - IRPJ_ADDITIONAL_QUARTER_THRESHOLD).max(0.0)
        * IRPJ_ADDITIONAL_RATE
        / 3.0;

    let mut components = vec![
        TaxComponent::new("IRPJ", taxable * IRPJ_RATE)
            .with_rate(IRPJ_RATE * 100.0)
            .with_note(profit_note.clone()),
        TaxComponent::new("IRPJ Additional", additional)
            .with_rate(IRPJ_ADDITIONAL_RATE * 100.0)
            .with_note("Profit x3 against the 60 000 quarterly threshold, divided by 3"),
        TaxComponent::new("CSLL", taxable * CSLL_RATE)
            .with_rate(CSLL_RATE * 100.0)
            .with_note(profit_note),
        credited("PIS", gross_revenue, PIS_RATE, pis_credit),
        credited("COFINS", gross_revenue, COFINS_RATE, cofins_credit),
    ];

    components.extend(iss_component(gross_revenue, inputs.iss_rate));

    RegimeOutcome {
        components,
        profit_base: Some(profit),
        bracket: None,
    }
}

/// Non-cumulative contribution: gross × rate minus credit, floored at zero.
fn credited(name: &str, gross_revenue: f64, rate: f64, credit: NumericInput) -> TaxComponent {
    let value = (gross_revenue * rate - credit.or(0.0)).max(0.0);
    let note = match credit {
        NumericInput::Valid(c) => format!("Non-cumulative, credit {:.2}", c),
        NumericInput::Missing => "Non-cumulative, no credit informed".to_string(),
        NumericInput::Invalid => "Non-cumulative, credit invalid and ignored".to_string(),
    };
    TaxComponent::new(name, value)
        .with_rate(rate * 100.0)
        .with_note(note)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(outcome: &RegimeOutcome, name: &str) -> Option<f64> {
        outcome
            .components
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value)
    }

    #[test]
    fn test_profit_scenario() {
        let inputs = RealInputs {
            deductible_expenses: Some(40_000.0),
            ..Default::default()
        };
        let outcome = calculate(&inputs, 100_000.0);

        assert_eq!(outcome.profit_base, Some(60_000.0));
        assert!((value(&outcome, "IRPJ").unwrap() - 9_000.0).abs() < 1e-6);
        assert!((value(&outcome, "IRPJ Additional").unwrap() - 4_000.0).abs() < 1e-6);
        assert!((value(&outcome, "CSLL").unwrap() - 5_400.0).abs() < 1e-6);
        assert!((value(&outcome, "PIS").unwrap() - 1_650.0).abs() < 1e-6);
        assert!((value(&outcome, "COFINS").unwrap() - 7_600.0).abs() < 1e-6);
    }

    #[test]
    fn test_negative_profit_clamps_income_taxes() {
        let inputs = RealInputs {
            deductible_expenses: Some(150_000.0),
            ..Default::default()
        };
        let outcome = calculate(&inputs, 100_000.0);

        assert_eq!(outcome.profit_base, Some(-50_000.0));
        assert_eq!(value(&outcome, "IRPJ").unwrap(), 0.0);
        assert_eq!(value(&outcome, "IRPJ Additional").unwrap(), 0.0);
        assert_eq!(value(&outcome, "CSLL").unwrap(), 0.0);
        assert!(value(&outcome, "PIS").unwrap() > 0.0);
    }

    #[test]
    fn test_additional_boundary() {
        // profit 20 000 → 60 000 − 60 000 = 0
        let outcome = calculate(&RealInputs::default(), 20_000.0);
        assert_eq!(value(&outcome, "IRPJ Additional").unwrap(), 0.0);

        // profit 20 300 → 900 × 10% / 3 = 30
        let outcome = calculate(&RealInputs::default(), 20_300.0);
        assert!((value(&outcome, "IRPJ Additional").unwrap() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_credits_floor_at_zero() {
        let inputs = RealInputs {
            pis_credit: Some(1_000_000.0),
            cofins_credit: Some(100.0),
            ..Default::default()
        };
        let outcome = calculate(&inputs, 10_000.0);
        assert_eq!(value(&outcome, "PIS").unwrap(), 0.0);
        assert!((value(&outcome, "COFINS").unwrap() - 660.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_inputs_fall_back_to_zero() {
        let inputs = RealInputs {
            deductible_expenses: Some(-5.0),
            pis_credit: Some(f64::NAN),
            cofins_credit: None,
            iss_rate: Some(2.0),
        };
        let outcome = calculate(&inputs, 10_000.0);
        assert_eq!(outcome.profit_base, Some(10_000.0));
        assert!((value(&outcome, "PIS").unwrap() - 165.0).abs() < 1e-6);
        assert!((value(&outcome, "ISS").unwrap() - 200.0).abs() < 1e-6);

        let irpj = outcome.components.iter().find(|c| c.name == "IRPJ").unwrap();
        assert!(irpj.note.as_deref().unwrap().contains("treated as 0"));
    }
}

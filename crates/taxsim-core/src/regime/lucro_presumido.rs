//! Lucro Presumido: income taxes on a presumed profit base, cumulative
//! PIS/COFINS on gross revenue.
//!
//! ```text
//! base          = gross × 32%
//! IRPJ          = base × 15%
//! IRPJ adicional= max(0, base − 20 000) × 10%   (single period, not annualized)
//! CSLL          = base × 9%
//! PIS           = gross × 0.65%
//! COFINS        = gross × 3%
//! ISS           = gross × rate            (only when a rate is supplied)
//! ```

use super::{iss_component, RegimeOutcome};
use crate::types::{PresumidoInputs, TaxComponent};

/// Presumed profit ratio for service activities.
pub const PRESUMPTION_RATIO: f64 = 0.32;
pub const IRPJ_RATE: f64 = 0.15;
pub const IRPJ_ADDITIONAL_RATE: f64 = 0.10;
pub const IRPJ_ADDITIONAL_THRESHOLD: f64 = 20_000.0;
pub const CSLL_RATE: f64 = 0.09;
pub const PIS_RATE: f64 = 0.0065;
pub const COFINS_RATE: f64 = 0.03;

pub fn calculate(inputs: &PresumidoInputs, gross_revenue: f64) -> RegimeOutcome {
    let base = gross_revenue * PRESUMPTION_RATIO;
    let base_note = format!("Presumed base {:.2} (32% of revenue)", base);

    let mut components = Vec::with_capacity(6);

    components.push(
        TaxComponent::new("IRPJ", base * IRPJ_RATE)
            .with_rate(IRPJ_RATE * 100.0)
            .with_note(base_note.clone()),
    );

    let additional = (base - IRPJ_ADDITIONAL_THRESHOLD).max(0.0) * IRPJ_ADDITIONAL_RATE;
    if additional > 0.0 {
        components.push(
            TaxComponent::new("IRPJ Additional", additional)
                .with_rate(IRPJ_ADDITIONAL_RATE * 100.0)
                .with_note(format!(
                    "On the base portion above {:.2}",
                    IRPJ_ADDITIONAL_THRESHOLD
                )),
        );
    }

    components.push(
        TaxComponent::new("CSLL", base * CSLL_RATE)
            .with_rate(CSLL_RATE * 100.0)
            .with_note(base_note),
    );
    components.push(
        TaxComponent::new("PIS", gross_revenue * PIS_RATE)
            .with_rate(PIS_RATE * 100.0)
            .with_note("Cumulative regime"),
    );
    components.push(
        TaxComponent::new("COFINS", gross_revenue * COFINS_RATE)
            .with_rate(COFINS_RATE * 100.0)
            .with_note("Cumulative regime"),
    );

    components.extend(iss_component(gross_revenue, inputs.iss_rate));

    RegimeOutcome {
        components,
        profit_base: Some(base),
        bracket: None,
    }
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
    fn test_components_below_additional_threshold() {
        // base = 32 000 × 0.32 = 10 240, below 20 000
        let outcome = calculate(&PresumidoInputs::default(), 32_000.0);

        assert!((value(&outcome, "IRPJ").unwrap() - 1_536.0).abs() < 1e-6);
        assert!(value(&outcome, "IRPJ Additional").is_none());
        assert!((value(&outcome, "CSLL").unwrap() - 921.6).abs() < 1e-6);
        assert!((value(&outcome, "PIS").unwrap() - 208.0).abs() < 1e-6);
        assert!((value(&outcome, "COFINS").unwrap() - 960.0).abs() < 1e-6);
        assert!(value(&outcome, "ISS").is_none());
        assert_eq!(outcome.components.len(), 4);
    }

    #[test]
    fn test_additional_irpj_above_threshold() {
        // base = 100 000 × 0.32 = 32 000; additional = 12 000 × 10% = 1 200
        let outcome = calculate(&PresumidoInputs::default(), 100_000.0);
        assert!((value(&outcome, "IRPJ").unwrap() - 4_800.0).abs() < 1e-6);
        assert!((value(&outcome, "IRPJ Additional").unwrap() - 1_200.0).abs() < 1e-6);
        assert!((outcome.profit_base.unwrap() - 32_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_iss_when_rate_supplied() {
        let inputs = PresumidoInputs { iss_rate: Some(5.0) };
        let outcome = calculate(&inputs, 10_000.0);
        assert!((value(&outcome, "ISS").unwrap() - 500.0).abs() < 1e-6);
        assert_eq!(outcome.components.last().unwrap().name, "ISS");
    }

    #[test]
    fn test_zero_revenue() {
        let outcome = calculate(&PresumidoInputs::default(), 0.0);
        assert_eq!(outcome.total(), 0.0);
    }
}

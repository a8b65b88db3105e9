//! Simples Nacional: a single DAS amount at the effective bracket rate.

use tracing::debug;

use super::RegimeOutcome;
use crate::brackets::{resolve, BracketCatalog};
use crate::types::{SimplesInputs, TaxComponent};
use crate::validation::NumericInput;

pub const COMPONENT_NAME: &str = "Simples Nacional (DAS)";

/// Computes DAS = gross revenue × effective rate.
///
/// A missing/invalid RBT12, a missing Anexo or an empty table yields a zero
/// component with a note rather than an error.
pub fn calculate(inputs: &SimplesInputs, gross_revenue: f64, catalog: &BracketCatalog) -> RegimeOutcome {
    let unavailable = |note: String| RegimeOutcome {
        components: vec![TaxComponent::new(COMPONENT_NAME, 0.0).with_note(note)],
        profit_base: None,
        bracket: None,
    };

    let rbt12 = match NumericInput::classify(inputs.rbt12) {
        NumericInput::Valid(v) => v,
        NumericInput::Missing => {
            return unavailable("RBT12 not informed; DAS not estimated".to_string())
        }
        NumericInput::Invalid => {
            return unavailable("RBT12 is not a valid amount; DAS not estimated".to_string())
        }
    };

    let Some(anexo) = inputs.anexo else {
        return unavailable("No Anexo selected; DAS not estimated".to_string());
    };

    let table = catalog.table(anexo);
    let Some(resolution) = resolve(table, rbt12) else {
        return unavailable(format!("{} has no brackets configured; DAS not estimated", anexo));
    };

    let das = gross_revenue * resolution.effective_rate / 100.0;
    debug!(%anexo, rbt12, das, "Simples Nacional DAS estimated");

    RegimeOutcome {
        components: vec![TaxComponent::new(COMPONENT_NAME, das)
            .with_rate(resolution.effective_rate)
            .with_note(format!(
                "{}, bracket {} (up to {:.2}), RBT12 {:.2}",
                anexo, resolution.position, resolution.bracket.upper_limit, rbt12
            ))],
        profit_base: None,
        bracket: Some(resolution),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brackets::{Anexo, BracketTable};

    fn inputs(rbt12: Option<f64>, anexo: Option<Anexo>) -> SimplesInputs {
        SimplesInputs {
            rbt12,
            fs12: None,
            anexo,
        }
    }

    #[test]
    fn test_das_uses_effective_rate() {
        let catalog = BracketCatalog::statutory();
        let outcome = calculate(&inputs(Some(250_000.0), Some(Anexo::III)), 10_000.0, &catalog);

        let das = &outcome.components[0];
        assert_eq!(das.name, COMPONENT_NAME);
        assert!((das.value - 745.6).abs() < 1e-6);
        assert!((das.rate.unwrap() - 7.456).abs() < 1e-9);
        assert!(das.note.as_deref().unwrap().contains("Anexo III"));
        assert_eq!(outcome.bracket.unwrap().position, 2);
    }

    #[test]
    fn test_missing_rbt12_yields_zero_with_note() {
        let catalog = BracketCatalog::statutory();
        let outcome = calculate(&inputs(None, Some(Anexo::III)), 10_000.0, &catalog);
        assert_eq!(outcome.components[0].value, 0.0);
        assert!(outcome.components[0].note.as_deref().unwrap().contains("not informed"));
        assert!(outcome.bracket.is_none());
    }

    #[test]
    fn test_invalid_rbt12_yields_zero_with_note() {
        let catalog = BracketCatalog::statutory();
        let outcome = calculate(&inputs(Some(f64::NAN), Some(Anexo::III)), 10_000.0, &catalog);
        assert_eq!(outcome.components[0].value, 0.0);
        assert!(outcome.components[0].note.as_deref().unwrap().contains("not a valid"));
    }

    #[test]
    fn test_zero_rbt12_resolves_first_bracket() {
        let catalog = BracketCatalog::statutory();
        let outcome = calculate(&inputs(Some(0.0), Some(Anexo::I)), 1_000.0, &catalog);
        assert!((outcome.components[0].value - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_anexo_or_empty_table() {
        let catalog = BracketCatalog::statutory();
        let outcome = calculate(&inputs(Some(100_000.0), None), 1_000.0, &catalog);
        assert_eq!(outcome.components[0].value, 0.0);

        let catalog = BracketCatalog::statutory().with_override(BracketTable::new(Anexo::II, vec![]));
        let outcome = calculate(&inputs(Some(100_000.0), Some(Anexo::II)), 1_000.0, &catalog);
        assert_eq!(outcome.components[0].value, 0.0);
        assert!(outcome.components[0].note.as_deref().unwrap().contains("no brackets"));
    }
}

//! # Scenario Files
//!
//! A scenario is everything one "Simular" click needs: the picked catalog
//! items, the target total, the regime and its inputs.
//!
//! ## Loading
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  scenario.toml / scenario.json                                          │
//! │        │ serde                                                          │
//! │        ▼                                                                │
//! │  Scenario ──── build_session(&SimulatorConfig) ───► SimulationSession   │
//! │                   │                                                     │
//! │                   ├─ items added in file order                          │
//! │                   ├─ participation overrides applied                    │
//! │                   ├─ missing rates filled from [engine] defaults        │
//! │                   └─ no regime at all → engine.default_regime           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```toml
//! clientRegime = "lucro_presumido"
//! targetTotal = "1.200,00"
//!
//! [[items]]
//! id = "SRV-001"
//! description = "Consulting hour"
//! unitCost = 80.0
//! listPrice = 150.0
//! eligibleForRateio = true
//! quantity = 8
//!
//! [fields.presumido]
//! issRate = 5.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use taxsim_core::validation::parse_optional_amount;
use taxsim_core::{CatalogItem, PurchaseTaxInputs, RegimeFields, RegimeKind, SimulationSession};

use crate::config::{regime_name, SimulatorConfig};
use crate::error::{CliError, CliResult};

/// A number, or text in a form-style format ("1.200,50", "R$ 900").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    /// Unparsable text yields `NaN`, which downstream treats as invalid.
    pub fn value(&self) -> Option<f64> {
        match self {
            Amount::Number(v) => Some(*v),
            Amount::Text(raw) => parse_optional_amount(Some(raw)),
        }
    }
}

/// One picked catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioItem {
    #[serde(flatten)]
    pub item: CatalogItem,

    #[serde(default = "default_quantity")]
    pub quantity: f64,

    /// Overrides the item's default rateio participation.
    #[serde(default)]
    pub participates: Option<bool>,
}

fn default_quantity() -> f64 {
    1.0
}

/// A complete simulation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Regime on record for the client company.
    #[serde(default, with = "regime_name", skip_serializing_if = "Option::is_none")]
    pub client_regime: Option<RegimeKind>,

    /// Manual selection, wins over `client_regime`.
    #[serde(default, with = "regime_name", skip_serializing_if = "Option::is_none")]
    pub regime: Option<RegimeKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_total: Option<Amount>,

    #[serde(default)]
    pub items: Vec<ScenarioItem>,

    #[serde(default)]
    pub fields: RegimeFields,

    #[serde(default)]
    pub purchase: PurchaseTaxInputs,
}

impl Scenario {
    /// Reads a scenario, picking the format from the file extension.
    pub fn load(path: &Path) -> CliResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CliError::ScenarioLoadFailed(format!("{}: {}", path.display(), e)))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let scenario = match ext.as_str() {
            "toml" => Self::from_toml(&contents)?,
            "json" => Self::from_json(&contents)?,
            other => return Err(CliError::UnsupportedFormat(other.to_string())),
        };

        info!(
            path = %path.display(),
            items = scenario.items.len(),
            "Scenario loaded"
        );
        Ok(scenario)
    }

    pub fn from_toml(contents: &str) -> CliResult<Self> {
        toml::from_str(contents).map_err(|e| CliError::ScenarioLoadFailed(e.to_string()))
    }

    pub fn from_json(contents: &str) -> CliResult<Self> {
        serde_json::from_str(contents).map_err(|e| CliError::ScenarioLoadFailed(e.to_string()))
    }

    /// Builds a session ready to run, applying config defaults.
    pub fn build_session(&self, config: &SimulatorConfig) -> CliResult<SimulationSession> {
        let mut session =
            SimulationSession::for_client(config.bracket_catalog(), self.client_regime);

        for entry in &self.items {
            session.add_item(&entry.item, entry.quantity)?;
            if let Some(participates) = entry.participates {
                session.set_participation(&entry.item.id, participates)?;
            }
        }

        let engine = &config.engine;

        let mut fields = self.fields.clone();
        fields.presumido.iss_rate = fields.presumido.iss_rate.or(engine.iss_rate);
        fields.real.iss_rate = fields.real.iss_rate.or(engine.iss_rate);
        session.set_regime_fields(fields);

        session.set_purchase_inputs(PurchaseTaxInputs {
            icms_purchase_rate: self.purchase.icms_purchase_rate.or(engine.icms_purchase_rate),
            difal_rate: self.purchase.difal_rate.or(engine.difal_rate),
        });

        let selected = match (self.regime, self.client_regime) {
            (Some(regime), _) => Some(regime),
            (None, Some(_)) => None,
            (None, None) => {
                if let Some(default) = engine.default_regime {
                    debug!(regime = %default, "Using configured default regime");
                }
                engine.default_regime
            }
        };
        session.select_regime(selected);

        session.set_target_total(self.target_total.as_ref().and_then(Amount::value));

        Ok(session)
    }
}

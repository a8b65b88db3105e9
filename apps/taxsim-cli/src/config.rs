//! # Simulator Configuration
//!
//! Defaults the CLI applies to every scenario, plus bracket table overrides.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TAXSIM_DEFAULT_REGIME=lucro_presumido                              │
//! │     TAXSIM_ICMS_PURCHASE_RATE=12                                       │
//! │     TAXSIM_DIFAL_RATE=6                                                │
//! │     TAXSIM_LOG=debug                                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/simulator/taxsim.toml (Linux)                            │
//! │     ~/Library/Application Support/com.taxsim.simulator/taxsim.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     statutory tables, no default regime, no purchase-tax rates         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [engine]
//! default_regime = "lucro_presumido"
//! icms_purchase_rate = 12.0
//! difal_rate = 6.0
//! iss_rate = 5.0
//!
//! [[tables]]
//! anexo = "III"
//! brackets = [
//!   { upperLimit = 180000.0, nominalRate = 6.0, deduction = 0.0 },
//!   { upperLimit = 360000.0, nominalRate = 11.2, deduction = 9360.0 },
//! ]
//!
//! [logging]
//! filter = "info,taxsim=debug"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use taxsim_core::validation::validate_rate_percent;
use taxsim_core::{BracketCatalog, BracketTable, RegimeKind};

use crate::error::{CliError, CliResult};

// =============================================================================
// Engine Settings
// =============================================================================

/// Defaults applied when a scenario leaves a value out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Regime used when the scenario names neither a client nor a selected
    /// regime.
    #[serde(default, with = "regime_name", skip_serializing_if = "Option::is_none")]
    pub default_regime: Option<RegimeKind>,

    /// ICMS embedded in purchases, percent of cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icms_purchase_rate: Option<f64>,

    /// Interstate differential (DIFAL), percent of cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difal_rate: Option<f64>,

    /// Municipal ISS rate for Lucro Presumido and Lucro Real.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss_rate: Option<f64>,
}

// =============================================================================
// Logging Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info,taxsim=debug".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete simulator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub engine: EngineSettings,

    /// Bracket table overrides, at most one per Anexo.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<BracketTable>,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl SimulatorConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (taxsim.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CliResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading simulator config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load simulator config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_toml(contents: &str) -> CliResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CliResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CliError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Simulator config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CliResult<()> {
        let rates = [
            ("engine.icms_purchase_rate", self.engine.icms_purchase_rate),
            ("engine.difal_rate", self.engine.difal_rate),
            ("engine.iss_rate", self.engine.iss_rate),
        ];
        for (field, rate) in rates {
            if let Some(rate) = rate {
                validate_rate_percent(field, rate)?;
            }
        }

        let mut seen = HashSet::new();
        for table in &self.tables {
            if !seen.insert(table.anexo) {
                return Err(CliError::InvalidConfig(format!(
                    "{} is overridden more than once",
                    table.anexo
                )));
            }
            table.validate()?;
        }

        if self.logging.filter.trim().is_empty() {
            return Err(CliError::InvalidConfig(
                "logging.filter must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(regime) = lookup("TAXSIM_DEFAULT_REGIME") {
            match regime.parse::<RegimeKind>() {
                Ok(parsed) => {
                    debug!(regime = %parsed, "Overriding default regime from environment");
                    self.engine.default_regime = Some(parsed);
                }
                Err(_) => warn!(regime = %regime, "Unknown regime in environment"),
            }
        }

        if let Some(rate) = lookup("TAXSIM_ICMS_PURCHASE_RATE") {
            match rate.parse::<f64>() {
                Ok(r) => self.engine.icms_purchase_rate = Some(r),
                Err(_) => warn!(rate = %rate, "Ignoring non-numeric TAXSIM_ICMS_PURCHASE_RATE"),
            }
        }

        if let Some(rate) = lookup("TAXSIM_DIFAL_RATE") {
            match rate.parse::<f64>() {
                Ok(r) => self.engine.difal_rate = Some(r),
                Err(_) => warn!(rate = %rate, "Ignoring non-numeric TAXSIM_DIFAL_RATE"),
            }
        }

        if let Some(filter) = lookup("TAXSIM_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "taxsim", "simulator")
            .map(|dirs| dirs.config_dir().join("taxsim.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Statutory tables with the configured overrides applied.
    pub fn bracket_catalog(&self) -> BracketCatalog {
        self.tables
            .iter()
            .cloned()
            .fold(BracketCatalog::statutory(), BracketCatalog::with_override)
    }
}

/// `RegimeKind` as the lenient names accepted by its `FromStr`.
pub(crate) mod regime_name {
    use serde::{Deserialize, Deserializer, Serializer};
    use taxsim_core::RegimeKind;

    pub fn serialize<S>(value: &Option<RegimeKind>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(kind) => serializer.serialize_str(match kind {
                RegimeKind::SimplesNacional => "simples_nacional",
                RegimeKind::LucroPresumido => "lucro_presumido",
                RegimeKind::LucroReal => "lucro_real",
            }),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<RegimeKind>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| s.parse().map_err(serde::de::Error::custom))
            .transpose()
    }
}

//! # Domain Types
//!
//! Core domain types used throughout the simulator.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogItem    │   │    CartLine     │   │  RegimeInputs   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │──►│  item (frozen)  │   │  SimplesNacional│       │
//! │  │  list_price     │   │  quantity       │   │  LucroPresumido │       │
//! │  │  unit_cost      │   │  final_unit_    │   │  LucroReal      │       │
//! │  │  eligible_for_  │   │    price        │   └────────┬────────┘       │
//! │  │    rateio       │   │  participates_  │            │                │
//! │  └─────────────────┘   │    in_rateio    │            ▼                │
//! │                        └────────┬────────┘   ┌─────────────────┐       │
//! │                                 │            │  TaxComponent   │       │
//! │                                 ▼            └────────┬────────┘       │
//! │                        ┌─────────────────────────────┴──┐              │
//! │                        │        SimulationResult        │              │
//! │                        └────────────────────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::brackets::Anexo;
use crate::error::ValidationError;
use crate::factor_r::FactorRReport;
use crate::rateio::DiscountSummary;

// =============================================================================
// Catalog Item
// =============================================================================

/// A product or service offered by the client company.
///
/// Reference data owned by the external catalog; the engine never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Stable identifier, used as the cart key.
    pub id: String,

    /// Display name.
    pub description: String,

    /// Unit of measure ("UN", "KG", "H").
    #[serde(default = "default_unit")]
    pub unit: String,

    /// Acquisition cost per unit.
    #[serde(default)]
    pub unit_cost: f64,

    /// Catalog price per unit, before any rateio discount.
    pub list_price: f64,

    /// Whether new cart lines of this item take part in discount rateio.
    #[serde(default)]
    pub eligible_for_rateio: bool,
}

fn default_unit() -> String {
    "UN".to_string()
}

// =============================================================================
// Cart Line
// =============================================================================

/// A catalog item placed in the simulation cart.
///
/// ## Design Notes
/// - `item`: frozen copy of the catalog entry at the time it was added
/// - `final_unit_price` / `discount_percent`: written only by the rateio
///   allocator, through wholesale replacement of the line set
/// - `participates_in_rateio`: starts from `item.eligible_for_rateio` and can
///   be toggled per line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item: CatalogItem,
    pub quantity: f64,
    pub final_unit_price: f64,
    pub discount_percent: f64,
    pub participates_in_rateio: bool,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a line at list price with the item's default participation.
    pub fn from_item(item: &CatalogItem, quantity: f64) -> Self {
        CartLine {
            item: item.clone(),
            quantity,
            final_unit_price: item.list_price,
            discount_percent: 0.0,
            participates_in_rateio: item.eligible_for_rateio,
            added_at: Utc::now(),
        }
    }

    /// Catalog item id of this line.
    #[inline]
    pub fn item_id(&self) -> &str {
        &self.item.id
    }

    /// List price × quantity.
    #[inline]
    pub fn list_total(&self) -> f64 {
        self.item.list_price * self.quantity
    }

    /// Final unit price × quantity. This is the line's revenue.
    #[inline]
    pub fn final_total(&self) -> f64 {
        self.final_unit_price * self.quantity
    }

    /// Unit cost × quantity.
    #[inline]
    pub fn total_cost(&self) -> f64 {
        self.item.unit_cost * self.quantity
    }

    /// Restores list pricing on this line.
    pub(crate) fn reset_pricing(&mut self) {
        self.final_unit_price = self.item.list_price;
        self.discount_percent = 0.0;
    }
}

/// Sum of finalized line totals.
///
/// The allocator's output and the revenue handed to the regime calculators
/// both come from this function, so they agree bit-for-bit.
pub fn finalized_total(lines: &[CartLine]) -> f64 {
    lines.iter().map(CartLine::final_total).sum()
}

/// Sum of line totals at list price.
pub fn list_total(lines: &[CartLine]) -> f64 {
    lines.iter().map(CartLine::list_total).sum()
}

// =============================================================================
// Regime Kind
// =============================================================================

/// The three tax regimes a client company can be under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegimeKind {
    SimplesNacional,
    LucroPresumido,
    LucroReal,
}

impl std::fmt::Display for RegimeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegimeKind::SimplesNacional => write!(f, "Simples Nacional"),
            RegimeKind::LucroPresumido => write!(f, "Lucro Presumido"),
            RegimeKind::LucroReal => write!(f, "Lucro Real"),
        }
    }
}

impl std::str::FromStr for RegimeKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "simples_nacional" | "simples" | "sn" => Ok(RegimeKind::SimplesNacional),
            "lucro_presumido" | "presumido" | "lp" => Ok(RegimeKind::LucroPresumido),
            "lucro_real" | "real" | "lr" => Ok(RegimeKind::LucroReal),
            _ => Err(ValidationError::InvalidFormat {
                field: "regime".to_string(),
                reason: format!(
                    "unknown regime '{}', expected simples_nacional, lucro_presumido or lucro_real",
                    s
                ),
            }),
        }
    }
}

// =============================================================================
// Regime Inputs
// =============================================================================

/// Simples Nacional inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SimplesInputs {
    /// Trailing twelve-month gross revenue.
    #[serde(default)]
    pub rbt12: Option<f64>,
    /// Trailing twelve-month payroll, for Factor R.
    #[serde(default)]
    pub fs12: Option<f64>,
    /// Selected bracket table.
    #[serde(default)]
    pub anexo: Option<Anexo>,
}

/// Lucro Presumido inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PresumidoInputs {
    /// Municipal service tax rate, percent.
    #[serde(default)]
    pub iss_rate: Option<f64>,
}

/// Lucro Real inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RealInputs {
    #[serde(default)]
    pub deductible_expenses: Option<f64>,
    #[serde(default)]
    pub pis_credit: Option<f64>,
    #[serde(default)]
    pub cofins_credit: Option<f64>,
    /// Municipal service tax rate, percent.
    #[serde(default)]
    pub iss_rate: Option<f64>,
}

/// Regime selection plus its regime-specific inputs. Exactly one variant is
/// active per simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "regime", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegimeInputs {
    SimplesNacional(SimplesInputs),
    LucroPresumido(PresumidoInputs),
    LucroReal(RealInputs),
}

impl RegimeInputs {
    /// The regime this input set belongs to.
    pub fn kind(&self) -> RegimeKind {
        match self {
            RegimeInputs::SimplesNacional(_) => RegimeKind::SimplesNacional,
            RegimeInputs::LucroPresumido(_) => RegimeKind::LucroPresumido,
            RegimeInputs::LucroReal(_) => RegimeKind::LucroReal,
        }
    }
}

/// Form values for all three regimes, kept side by side.
///
/// Switching the selected regime must not discard what was typed for the
/// others; [`RegimeFields::resolve`] picks one set at run time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RegimeFields {
    #[serde(default)]
    pub simples: SimplesInputs,
    #[serde(default)]
    pub presumido: PresumidoInputs,
    #[serde(default)]
    pub real: RealInputs,
}

impl RegimeFields {
    /// Builds the active input variant for `kind`.
    pub fn resolve(&self, kind: RegimeKind) -> RegimeInputs {
        match kind {
            RegimeKind::SimplesNacional => RegimeInputs::SimplesNacional(self.simples.clone()),
            RegimeKind::LucroPresumido => RegimeInputs::LucroPresumido(self.presumido.clone()),
            RegimeKind::LucroReal => RegimeInputs::LucroReal(self.real.clone()),
        }
    }
}

// =============================================================================
// Purchase-Side Inputs
// =============================================================================

/// Rates for the purchase-side estimates, applied to total item cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseTaxInputs {
    /// ICMS embedded in purchases, percent of cost.
    #[serde(default)]
    pub icms_purchase_rate: Option<f64>,
    /// Interstate ICMS rate differential (DIFAL), percent of cost.
    #[serde(default)]
    pub difal_rate: Option<f64>,
}

// =============================================================================
// Tax Component
// =============================================================================

/// One named tax line produced by a regime calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxComponent {
    pub name: String,
    pub value: f64,
    /// Rate annotation, percent.
    pub rate: Option<f64>,
    pub note: Option<String>,
}

impl TaxComponent {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        TaxComponent {
            name: name.into(),
            value,
            rate: None,
            note: None,
        }
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

// =============================================================================
// Simulation Result
// =============================================================================

/// A finalized cart line with its revenue, cost and margin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineBreakdown {
    pub line: CartLine,
    pub revenue: f64,
    pub cost: f64,
    pub margin: f64,
}

impl From<&CartLine> for LineBreakdown {
    fn from(line: &CartLine) -> Self {
        let revenue = line.final_total();
        let cost = line.total_cost();
        LineBreakdown {
            line: line.clone(),
            revenue,
            cost,
            margin: revenue - cost,
        }
    }
}

/// Everything one simulation run produces. Recomputed wholesale on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub id: String,
    #[ts(as = "String")]
    pub simulated_at: DateTime<Utc>,
    pub regime: RegimeKind,

    /// Sum of finalized line totals (faturamento).
    pub gross_revenue: f64,
    pub total_cost: f64,
    pub purchase_tax: f64,
    pub interstate_differential: f64,
    pub sales_tax_total: f64,
    /// Signed: revenue - cost - sales tax - purchase-side estimates.
    pub gross_margin: f64,
    pub gross_margin_percent: f64,
    /// Lucro Real pre-tax profit or Lucro Presumido base; signed.
    pub profit_base: Option<f64>,

    pub components: Vec<TaxComponent>,
    pub lines: Vec<LineBreakdown>,
    pub discount: DiscountSummary,
    /// Only under Simples Nacional.
    pub factor_r: Option<FactorRReport>,
}

// =============================================================================
// Unit Tests
// =============================================================================

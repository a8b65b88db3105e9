//! # Simulation Orchestration
//!
//! Composes rateio, the regime calculators and the Factor R advisor into one
//! [`SimulationResult`], and tracks whether that result is still current.
//!
//! ## Session State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │        any cart / target / regime / input change                        │
//! │     ┌──────────────────────────────────────────────┐                    │
//! │     ▼                                              │                    │
//! │  ┌──────────────┐   run()                   ┌──────┴───────┐            │
//! │  │ Unsimulated  │──────────────────────────►│  Simulated   │            │
//! │  │  (initial)   │  needs ≥ 1 line and a     │ holds result │            │
//! │  └──────────────┘  resolvable regime        └──────────────┘            │
//! │                                                    │                    │
//! │                              submission() / can_submit() only here      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Run Pipeline
//! ```text
//! cart lines + target ──► rateio::allocate ──► finalized lines
//!                                                   │ finalized_total()
//!                                                   ▼
//!              RegimeInputs ──► regime::calculate(gross revenue)
//!                                                   │
//!              Simples only ──► factor_r::advise    │
//!                                                   ▼
//!                                          SimulationResult
//! ```
//!
//! Every result is computed in full before the session publishes it, so a
//! half-updated state (new prices, old taxes) is never observable.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::brackets::BracketCatalog;
use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::factor_r;
use crate::rateio::{self, Allocation, DiscountSummary};
use crate::regime;
use crate::types::{
    finalized_total, CartLine, CatalogItem, LineBreakdown, PresumidoInputs, PurchaseTaxInputs,
    RealInputs, RegimeFields, RegimeInputs, RegimeKind, SimplesInputs, SimulationResult,
};
use crate::validation::NumericInput;

// =============================================================================
// Pure Orchestration
// =============================================================================

/// Runs the full pipeline over `lines` and `target`.
pub fn simulate(
    lines: &[CartLine],
    target: Option<f64>,
    inputs: &RegimeInputs,
    purchase: &PurchaseTaxInputs,
    catalog: &BracketCatalog,
) -> SimulationResult {
    let allocation = rateio::allocate(lines, target);
    assemble(&allocation, inputs, purchase, catalog)
}

/// Builds the result for an already computed allocation.
pub fn assemble(
    allocation: &Allocation,
    inputs: &RegimeInputs,
    purchase: &PurchaseTaxInputs,
    catalog: &BracketCatalog,
) -> SimulationResult {
    let lines = &allocation.lines;
    let gross_revenue = finalized_total(lines);
    let total_cost: f64 = lines.iter().map(CartLine::total_cost).sum();

    let outcome = regime::calculate(inputs, gross_revenue, catalog);
    let sales_tax_total = outcome.total();

    let factor_r = match inputs {
        RegimeInputs::SimplesNacional(sn) => Some(factor_r::advise(sn.rbt12, sn.fs12, sn.anexo)),
        _ => None,
    };

    let purchase_tax = total_cost * NumericInput::classify(purchase.icms_purchase_rate).or(0.0) / 100.0;
    let interstate_differential =
        total_cost * NumericInput::classify(purchase.difal_rate).or(0.0) / 100.0;

    let gross_margin =
        gross_revenue - total_cost - sales_tax_total - purchase_tax - interstate_differential;
    let gross_margin_percent = if gross_revenue > 0.0 {
        gross_margin / gross_revenue * 100.0
    } else {
        0.0
    };

    SimulationResult {
        id: Uuid::new_v4().to_string(),
        simulated_at: Utc::now(),
        regime: inputs.kind(),
        gross_revenue,
        total_cost,
        purchase_tax,
        interstate_differential,
        sales_tax_total,
        gross_margin,
        gross_margin_percent,
        profit_base: outcome.profit_base,
        components: outcome.components,
        lines: lines.iter().map(LineBreakdown::from).collect(),
        discount: allocation.summary.clone(),
        factor_r,
    }
}

// =============================================================================
// Session
// =============================================================================

/// Whether the session holds a current result.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationState {
    Unsimulated,
    Simulated(Box<SimulationResult>),
}

/// One simulation in flight: the cart, its inputs and the last result.
///
/// ## Invariants
/// - cart pricing always reflects a full rateio run over the current lines
///   and target
/// - `Simulated` is only reachable through [`SimulationSession::run`]
/// - every mutation returns the session to `Unsimulated`
#[derive(Debug, Clone)]
pub struct SimulationSession {
    cart: Cart,
    target_total: Option<f64>,
    client_regime: Option<RegimeKind>,
    selected_regime: Option<RegimeKind>,
    fields: RegimeFields,
    purchase: PurchaseTaxInputs,
    catalog: BracketCatalog,
    discount: DiscountSummary,
    state: SimulationState,
}

impl SimulationSession {
    pub fn new(catalog: BracketCatalog) -> Self {
        let cart = Cart::new();
        let discount = rateio::allocate(cart.lines(), None).summary;
        SimulationSession {
            cart,
            target_total: None,
            client_regime: None,
            selected_regime: None,
            fields: RegimeFields::default(),
            purchase: PurchaseTaxInputs::default(),
            catalog,
            discount,
            state: SimulationState::Unsimulated,
        }
    }

    /// Session for a client company whose regime is on record.
    pub fn for_client(catalog: BracketCatalog, client_regime: Option<RegimeKind>) -> Self {
        let mut session = Self::new(catalog);
        session.client_regime = client_regime;
        session
    }

    // -------------------------------------------------------------------------
    // Cart mutations (re-run rateio)
    // -------------------------------------------------------------------------

    pub fn add_item(&mut self, item: &CatalogItem, quantity: f64) -> CoreResult<()> {
        self.cart.add_item(item, quantity)?;
        self.cart_changed();
        Ok(())
    }

    pub fn remove_line(&mut self, item_id: &str) -> CoreResult<CartLine> {
        let removed = self.cart.remove_line(item_id)?;
        self.cart_changed();
        Ok(removed)
    }

    pub fn set_quantity(&mut self, item_id: &str, quantity: f64) -> CoreResult<()> {
        self.cart.set_quantity(item_id, quantity)?;
        self.cart_changed();
        Ok(())
    }

    pub fn set_participation(&mut self, item_id: &str, participates: bool) -> CoreResult<()> {
        self.cart.set_participation(item_id, participates)?;
        self.cart_changed();
        Ok(())
    }

    /// Sets or clears the desired final invoice total.
    pub fn set_target_total(&mut self, target: Option<f64>) {
        self.target_total = target;
        self.cart_changed();
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.target_total = None;
        self.cart_changed();
    }

    // -------------------------------------------------------------------------
    // Input mutations
    // -------------------------------------------------------------------------

    /// Manual regime selection; takes precedence over the client's regime.
    pub fn select_regime(&mut self, regime: Option<RegimeKind>) {
        self.selected_regime = regime;
        self.invalidate();
    }

    pub fn set_client_regime(&mut self, regime: Option<RegimeKind>) {
        self.client_regime = regime;
        self.invalidate();
    }

    pub fn set_simples_inputs(&mut self, inputs: SimplesInputs) {
        self.fields.simples = inputs;
        self.invalidate();
    }

    pub fn set_presumido_inputs(&mut self, inputs: PresumidoInputs) {
        self.fields.presumido = inputs;
        self.invalidate();
    }

    pub fn set_real_inputs(&mut self, inputs: RealInputs) {
        self.fields.real = inputs;
        self.invalidate();
    }

    pub fn set_regime_fields(&mut self, fields: RegimeFields) {
        self.fields = fields;
        self.invalidate();
    }

    pub fn set_purchase_inputs(&mut self, purchase: PurchaseTaxInputs) {
        self.purchase = purchase;
        self.invalidate();
    }

    // -------------------------------------------------------------------------
    // Run & submit
    // -------------------------------------------------------------------------

    /// Runs the simulation and enters `Simulated`.
    ///
    /// ## Errors
    /// - [`CoreError::EmptyCart`] with no lines
    /// - [`CoreError::RegimeUnresolved`] with neither a selected nor a
    ///   client regime
    ///
    /// On error the session is left exactly as it was.
    pub fn run(&mut self) -> CoreResult<&SimulationResult> {
        if self.cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        let kind = self.resolved_regime().ok_or(CoreError::RegimeUnresolved)?;
        let inputs = self.fields.resolve(kind);

        let allocation = rateio::allocate(self.cart.lines(), self.target_total);
        let result = assemble(&allocation, &inputs, &self.purchase, &self.catalog);

        info!(
            regime = %kind,
            lines = result.lines.len(),
            gross_revenue = result.gross_revenue,
            sales_tax_total = result.sales_tax_total,
            "Simulation completed"
        );

        self.discount = allocation.summary;
        self.cart.replace_lines(allocation.lines);
        self.state = SimulationState::Simulated(Box::new(result));
        self.submission()
    }

    /// The current result, for the "save" and "send to office" actions.
    pub fn submission(&self) -> CoreResult<&SimulationResult> {
        self.result().ok_or(CoreError::StaleSimulation)
    }

    pub fn can_submit(&self) -> bool {
        self.is_simulated()
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Manual selection first, then the client's recorded regime.
    pub fn resolved_regime(&self) -> Option<RegimeKind> {
        self.selected_regime.or(self.client_regime)
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self.state, SimulationState::Simulated(_))
    }

    /// The last result, only while it is current.
    pub fn result(&self) -> Option<&SimulationResult> {
        match &self.state {
            SimulationState::Simulated(result) => Some(result),
            SimulationState::Unsimulated => None,
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn target_total(&self) -> Option<f64> {
        self.target_total
    }

    /// Discount figures of the latest rateio run.
    pub fn discount(&self) -> &DiscountSummary {
        &self.discount
    }

    pub fn regime_fields(&self) -> &RegimeFields {
        &self.fields
    }

    pub fn purchase_inputs(&self) -> &PurchaseTaxInputs {
        &self.purchase
    }

    pub fn catalog(&self) -> &BracketCatalog {
        &self.catalog
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Full rateio over the current line set, swapped in as one unit.
    fn cart_changed(&mut self) {
        let allocation = rateio::allocate(self.cart.lines(), self.target_total);
        self.discount = allocation.summary;
        self.cart.replace_lines(allocation.lines);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        if self.is_simulated() {
            debug!("Simulation inputs changed, result is stale");
        }
        self.state = SimulationState::Unsimulated;
    }
}

impl Default for SimulationSession {
    fn default() -> Self {
        Self::new(BracketCatalog::statutory())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brackets::Anexo;
    use crate::factor_r::FactorRStatus;
    use crate::rateio::AllocationStatus;

    fn item(id: &str, price: f64, cost: f64, eligible: bool) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            description: format!("Item {}", id),
            unit: "UN".to_string(),
            unit_cost: cost,
            list_price: price,
            eligible_for_rateio: eligible,
        }
    }

    fn component<'a>(result: &'a SimulationResult, name: &str) -> Option<&'a crate::TaxComponent> {
        result.components.iter().find(|c| c.name == name)
    }

    #[test]
    fn test_run_requires_lines_and_regime() {
        let mut session = SimulationSession::default();
        session.select_regime(Some(RegimeKind::LucroPresumido));
        assert!(matches!(session.run(), Err(CoreError::EmptyCart)));

        let mut session = SimulationSession::default();
        session.add_item(&item("A", 100.0, 50.0, true), 1.0).unwrap();
        assert!(matches!(session.run(), Err(CoreError::RegimeUnresolved)));
        assert!(!session.is_simulated());
    }

    #[test]
    fn test_client_regime_is_used_when_nothing_selected() {
        let mut session =
            SimulationSession::for_client(BracketCatalog::statutory(), Some(RegimeKind::LucroReal));
        session.add_item(&item("A", 100.0, 50.0, true), 1.0).unwrap();
        assert_eq!(session.run().unwrap().regime, RegimeKind::LucroReal);

        session.select_regime(Some(RegimeKind::LucroPresumido));
        assert_eq!(session.run().unwrap().regime, RegimeKind::LucroPresumido);
    }

    #[test]
    fn test_mutation_makes_result_stale() {
        let mut session = SimulationSession::default();
        session.select_regime(Some(RegimeKind::LucroPresumido));
        session.add_item(&item("A", 100.0, 50.0, true), 1.0).unwrap();
        session.run().unwrap();
        assert!(session.can_submit());
        assert!(session.submission().is_ok());

        session.set_target_total(Some(90.0));
        assert!(!session.can_submit());
        assert!(matches!(session.submission(), Err(CoreError::StaleSimulation)));
        assert!(session.result().is_none());

        session.run().unwrap();
        session.set_presumido_inputs(PresumidoInputs { iss_rate: Some(5.0) });
        assert!(!session.is_simulated());
    }

    #[test]
    fn test_failed_mutation_keeps_state() {
        let mut session = SimulationSession::default();
        session.select_regime(Some(RegimeKind::LucroPresumido));
        session.add_item(&item("A", 100.0, 50.0, true), 1.0).unwrap();
        session.run().unwrap();

        assert!(session.set_participation("missing", false).is_err());
        assert!(session.is_simulated());
    }

    #[test]
    fn test_cart_is_repriced_on_every_change() {
        let mut session = SimulationSession::default();
        session.add_item(&item("A", 1_000.0, 0.0, true), 1.0).unwrap();
        session.add_item(&item("B", 500.0, 0.0, true), 1.0).unwrap();
        session.set_target_total(Some(1_200.0));

        // both participate: 300 split 2:1
        assert!((session.cart().line("A").unwrap().final_unit_price - 800.0).abs() < 1e-9);
        assert!((session.cart().line("B").unwrap().final_unit_price - 400.0).abs() < 1e-9);

        session.set_participation("B", false).unwrap();
        assert!((session.cart().line("A").unwrap().final_unit_price - 700.0).abs() < 1e-9);
        assert_eq!(session.cart().line("B").unwrap().final_unit_price, 500.0);

        session.set_participation("B", true).unwrap();
        assert!((session.cart().line("B").unwrap().final_unit_price - 400.0).abs() < 1e-9);

        session.remove_line("B").unwrap();
        assert!((session.cart().line("A").unwrap().final_unit_price - 1_000.0).abs() < 1e-9);
        assert_eq!(session.discount().status, AllocationStatus::TargetNotBelowList);
    }

    #[test]
    fn test_simples_result_carries_factor_r() {
        let mut session = SimulationSession::default();
        session.select_regime(Some(RegimeKind::SimplesNacional));
        session.set_simples_inputs(SimplesInputs {
            rbt12: Some(250_000.0),
            fs12: Some(50_000.0),
            anexo: Some(Anexo::III),
        });
        session.add_item(&item("A", 10_000.0, 4_000.0, true), 1.0).unwrap();

        let result = session.run().unwrap();
        let das = component(result, crate::regime::simples_nacional::COMPONENT_NAME).unwrap();
        assert!((das.value - 745.6).abs() < 1e-6);

        let factor_r = result.factor_r.as_ref().unwrap();
        assert_eq!(factor_r.status, FactorRStatus::Mismatch);
        assert!((factor_r.ratio.unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_non_simples_has_no_factor_r() {
        let mut session = SimulationSession::default();
        session.select_regime(Some(RegimeKind::LucroReal));
        session.add_item(&item("A", 100.0, 50.0, true), 1.0).unwrap();
        assert!(session.run().unwrap().factor_r.is_none());
    }

    #[test]
    fn test_result_aggregates() {
        let lines = vec![
            CartLine::from_item(&item("A", 1_000.0, 600.0, true), 1.0),
            CartLine::from_item(&item("B", 500.0, 200.0, false), 2.0),
        ];
        let inputs = RegimeInputs::LucroReal(RealInputs {
            deductible_expenses: Some(800.0),
            ..Default::default()
        });
        let purchase = PurchaseTaxInputs {
            icms_purchase_rate: Some(10.0),
            difal_rate: Some(5.0),
        };
        let result = simulate(
            &lines,
            Some(1_800.0),
            &inputs,
            &purchase,
            &BracketCatalog::statutory(),
        );

        assert!((result.gross_revenue - 1_800.0).abs() < 1e-6);
        assert!((result.total_cost - 1_000.0).abs() < 1e-9);
        assert!((result.purchase_tax - 100.0).abs() < 1e-9);
        assert!((result.interstate_differential - 50.0).abs() < 1e-9);
        assert!((result.profit_base.unwrap() - 1_000.0).abs() < 1e-6);

        let line_sum: f64 = result.lines.iter().map(|l| l.revenue).sum();
        assert!((line_sum - result.gross_revenue).abs() < 1e-6);

        let expected_margin = result.gross_revenue
            - result.total_cost
            - result.sales_tax_total
            - result.purchase_tax
            - result.interstate_differential;
        assert!((result.gross_margin - expected_margin).abs() < 1e-9);
        assert!((result.discount.required_discount - 200.0).abs() < 1e-9);
    }
}

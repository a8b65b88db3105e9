//! # taxsim-core: Pure Tax Simulation Engine
//!
//! This crate is the **heart** of the accounting-office tax simulator. It
//! contains all simulation logic as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TaxSim Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Portal UI / taxsim-cli (scenario files)              │   │
//! │  │   Catalog ──► Cart ──► Regime inputs ──► "Simular" ──► Result  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ taxsim-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ brackets  │  │  regime   │  │ factor_r  │  │  rateio   │  │   │
//! │  │   │ Anexo I-V │  │ SN/LP/LR  │  │ FS12/RBT12│  │ discount  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                        ▲                                        │   │
//! │  │                 ┌──────┴──────┐                                 │   │
//! │  │                 │ simulation  │  session state machine          │   │
//! │  │                 └─────────────┘                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CatalogItem, CartLine, TaxComponent, results)
//! - [`brackets`] - Simples Nacional bracket tables and resolution
//! - [`regime`] - The three regime calculators behind one sum type
//! - [`factor_r`] - Payroll/revenue advisory ratio
//! - [`rateio`] - Proportional discount back-allocation
//! - [`cart`] - Session-owned ordered line set
//! - [`simulation`] - Orchestration and the Unsimulated/Simulated session
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation and amount parsing
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, every recompute is full
//! 2. **No I/O**: the CLI owns files, config and the log subscriber
//! 3. **Best-effort results**: calculators attach notes instead of failing
//! 4. **Explicit Errors**: session preconditions are typed, never strings
//!
//! ## Example Usage
//!
//! ```rust
//! use taxsim_core::brackets::{resolve, Anexo, BracketCatalog};
//!
//! let catalog = BracketCatalog::statutory();
//! let resolution = resolve(catalog.table(Anexo::III), 250_000.0).unwrap();
//!
//! assert_eq!(resolution.bracket.upper_limit, 360_000.0);
//! assert!((resolution.effective_rate - 7.456).abs() < 1e-9);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod brackets;
pub mod cart;
pub mod error;
pub mod factor_r;
pub mod rateio;
pub mod regime;
pub mod simulation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use brackets::{Anexo, Bracket, BracketCatalog, BracketTable};
pub use cart::Cart;
pub use error::{CoreError, CoreResult, ValidationError};
pub use simulation::{simulate, SimulationSession, SimulationState};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single simulation cart.
pub const MAX_CART_LINES: usize = 200;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Catches typing mistakes (an extra zero in a quote) before they reach the
/// allocator. Quantities are fractional because units include kg, m, h.
pub const MAX_LINE_QUANTITY: f64 = 1_000_000.0;

/// Tolerance used when checking that finalized line totals reconcile with
/// the revenue handed to the regime calculators.
pub const RECONCILIATION_TOLERANCE: f64 = 1e-6;

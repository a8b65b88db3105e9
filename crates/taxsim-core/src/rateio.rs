//! # Discount Rateio
//!
//! Back-allocates the discount needed to reach a target invoice total across
//! the lines that participate in rateio, proportionally to their list totals.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list total  = Σ list_price × qty                     (all lines)       │
//! │  discount    = list total − target                                     │
//! │  rateio base = Σ list_price × qty                     (participating)   │
//! │                                                                         │
//! │  per participating line:                                                │
//! │    share      = discount × line list total / rateio base                │
//! │    unit price = list_price − share / qty                                │
//! │    discount % = (list_price − unit price) / list_price × 100            │
//! │                                                                         │
//! │  Example: 1 000 (participates) + 500 (does not), target 1 200           │
//! │    discount 300 → line 1 becomes 700, line 2 stays 500                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reset Policy
//! No target, a target that is not a finite positive number, or a target at
//! or above the list total restores list pricing on every line. A target at
//! or above list total is a deliberate no-op: the simulator only discounts.
//!
//! Every call recomputes from list prices and the full line set, so toggling
//! a participation flag twice reproduces the original pricing exactly.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::types::{finalized_total, list_total, CartLine};

/// Why the allocator did or did not discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStatus {
    NoTarget,
    InvalidTarget,
    /// Target is equal to or above the list total.
    TargetNotBelowList,
    /// A discount was required but no line participates in rateio.
    NoEligibleLines,
    Applied,
}

/// Discount figures for one allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountSummary {
    pub target: Option<f64>,
    pub gross_list_total: f64,
    /// Discount needed to reach the target (0 unless the target is below list).
    pub required_discount: f64,
    pub required_discount_percent: f64,
    /// Discount actually absorbed by the lines.
    pub applied_discount: f64,
    pub applied_discount_percent: f64,
    pub status: AllocationStatus,
    /// Some line ended below zero because the rateio base was too small.
    pub negative_prices: bool,
}

/// Allocator output: the replacement line set plus its summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub lines: Vec<CartLine>,
    pub summary: DiscountSummary,
}

/// Recomputes final unit prices for `lines` against `target`.
pub fn allocate(lines: &[CartLine], target: Option<f64>) -> Allocation {
    let gross_list_total = list_total(lines);
    let mut out: Vec<CartLine> = lines.to_vec();
    out.iter_mut().for_each(CartLine::reset_pricing);

    let untouched = |out: Vec<CartLine>, status: AllocationStatus, required: f64| {
        let required_percent = percent_of(required, gross_list_total);
        Allocation {
            lines: out,
            summary: DiscountSummary {
                target,
                gross_list_total,
                required_discount: required,
                required_discount_percent: required_percent,
                applied_discount: 0.0,
                applied_discount_percent: 0.0,
                status,
                negative_prices: false,
            },
        }
    };

    let target_value = match target {
        None => return untouched(out, AllocationStatus::NoTarget, 0.0),
        Some(t) if !t.is_finite() || t <= 0.0 => {
            debug!(target = t, "Ignoring invalid rateio target");
            return untouched(out, AllocationStatus::InvalidTarget, 0.0);
        }
        Some(t) if t >= gross_list_total => {
            return untouched(out, AllocationStatus::TargetNotBelowList, 0.0)
        }
        Some(t) => t,
    };

    let required = gross_list_total - target_value;
    let rateio_base: f64 = out
        .iter()
        .filter(|l| l.participates_in_rateio)
        .map(CartLine::list_total)
        .sum();

    if rateio_base <= 0.0 {
        warn!(required, "No line participates in rateio, target cannot be honored");
        return untouched(out, AllocationStatus::NoEligibleLines, required);
    }

    for line in out.iter_mut().filter(|l| l.participates_in_rateio) {
        if line.quantity <= 0.0 {
            continue;
        }
        let list_price = line.item.list_price;
        let share = required * (line.list_total() / rateio_base);
        line.final_unit_price = list_price - share / line.quantity;
        line.discount_percent = if list_price > 0.0 {
            (list_price - line.final_unit_price) / list_price * 100.0
        } else {
            0.0
        };
    }

    let applied = gross_list_total - finalized_total(&out);
    let negative_prices = out.iter().any(|l| l.final_unit_price < 0.0);
    if negative_prices {
        warn!(required, rateio_base, "Rateio drove a unit price below zero");
    }
    debug!(
        required,
        rateio_base,
        participating = out.iter().filter(|l| l.participates_in_rateio).count(),
        "Rateio applied"
    );

    Allocation {
        summary: DiscountSummary {
            target,
            gross_list_total,
            required_discount: required,
            required_discount_percent: percent_of(required, gross_list_total),
            applied_discount: applied,
            applied_discount_percent: percent_of(applied, gross_list_total),
            status: AllocationStatus::Applied,
            negative_prices,
        },
        lines: out,
    }
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Simulation Cart
//!
//! The ordered set of lines owned by one simulation session.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Session Action            Cart Method             Line Set Change      │
//! │  ──────────────            ───────────             ───────────────      │
//! │                                                                         │
//! │  Add catalog item ───────► add_item() ──────────► push / qty += n      │
//! │  Change quantity ────────► set_quantity() ──────► lines[i].qty = n     │
//! │  Toggle rateio ──────────► set_participation() ─► lines[i].flag = b    │
//! │  Remove item ────────────► remove_line() ───────► lines.remove(i)      │
//! │  Rateio recompute ───────► replace_lines() ─────► whole set swapped    │
//! │                                                                         │
//! │  Lines are unique by catalog item id and keep insertion order.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart never prices lines itself; the session re-runs the rateio
//! allocator after every change and swaps the result in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{finalized_total, list_total, CartLine, CatalogItem};
use crate::validation::{validate_cart_size, validate_catalog_item, validate_quantity};
use crate::MAX_CART_LINES;

/// Ordered cart lines, unique by catalog item id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
    /// When the cart was created/last cleared.
    created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds an item, or increases the quantity of its existing line.
    ///
    /// An existing line keeps its participation flag.
    pub fn add_item(&mut self, item: &CatalogItem, quantity: f64) -> CoreResult<()> {
        validate_catalog_item(item)?;
        validate_quantity(quantity)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id() == item.id) {
            let new_qty = line.quantity + quantity;
            validate_quantity(new_qty)?;
            line.quantity = new_qty;
            return Ok(());
        }

        validate_cart_size(self.lines.len()).map_err(|_| CoreError::CartTooLarge {
            max: MAX_CART_LINES,
        })?;

        self.lines.push(CartLine::from_item(item, quantity));
        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn set_quantity(&mut self, item_id: &str, quantity: f64) -> CoreResult<()> {
        if quantity == 0.0 {
            return self.remove_line(item_id).map(|_| ());
        }
        validate_quantity(quantity)?;
        self.line_mut(item_id)?.quantity = quantity;
        Ok(())
    }

    /// Sets whether a line takes part in discount rateio.
    pub fn set_participation(&mut self, item_id: &str, participates: bool) -> CoreResult<()> {
        self.line_mut(item_id)?.participates_in_rateio = participates;
        Ok(())
    }

    /// Removes and returns the line for `item_id`.
    pub fn remove_line(&mut self, item_id: &str) -> CoreResult<CartLine> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.item_id() == item_id)
            .ok_or_else(|| CoreError::LineNotFound(item_id.to_string()))?;
        Ok(self.lines.remove(idx))
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Swaps in a freshly priced line set.
    ///
    /// The replacement must describe the same lines in the same order; only
    /// pricing fields may differ.
    pub(crate) fn replace_lines(&mut self, lines: Vec<CartLine>) {
        debug_assert_eq!(lines.len(), self.lines.len());
        debug_assert!(lines
            .iter()
            .zip(&self.lines)
            .all(|(new, old)| new.item_id() == old.item_id()));
        self.lines = lines;
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, item_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id() == item_id)
    }

    fn line_mut(&mut self, item_id: &str) -> CoreResult<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|l| l.item_id() == item_id)
            .ok_or_else(|| CoreError::LineNotFound(item_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Sum of list totals.
    pub fn list_total(&self) -> f64 {
        list_total(&self.lines)
    }

    /// Sum of finalized line totals.
    pub fn finalized_total(&self) -> f64 {
        finalized_total(&self.lines)
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn item(id: &str, price: f64) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            description: format!("Item {}", id),
            unit: "UN".to_string(),
            unit_cost: price * 0.6,
            list_price: price,
            eligible_for_rateio: true,
        }
    }

    #[test]
    fn test_add_item() {
        let mut cart = Cart::new();
        cart.add_item(&item("A", 10.0), 2.0).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.list_total(), 20.0);
        assert_eq!(cart.finalized_total(), 20.0);
    }

    #[test]
    fn test_add_same_item_increases_quantity() {
        let mut cart = Cart::new();
        cart.add_item(&item("A", 10.0), 2.0).unwrap();
        cart.set_participation("A", false).unwrap();
        cart.add_item(&item("A", 10.0), 3.0).unwrap();

        assert_eq!(cart.len(), 1);
        let line = cart.line("A").unwrap();
        assert_eq!(line.quantity, 5.0);
        assert!(!line.participates_in_rateio);
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.add_item(&item("A", 10.0), 0.0),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
        assert!(cart.add_item(&item("", 10.0), 1.0).is_err());
        assert!(cart.add_item(&item("B", -1.0), 1.0).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_size_limit() {
        let mut cart = Cart::new();
        for i in 0..crate::MAX_CART_LINES {
            cart.add_item(&item(&format!("I{}", i), 1.0), 1.0).unwrap();
        }
        assert!(matches!(
            cart.add_item(&item("overflow", 1.0), 1.0),
            Err(CoreError::CartTooLarge { .. })
        ));
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add_item(&item("A", 10.0), 2.0).unwrap();
        cart.set_quantity("A", 4.0).unwrap();
        assert_eq!(cart.line("A").unwrap().quantity, 4.0);

        cart.set_quantity("A", 0.0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_unknown_line_errors() {
        let mut cart = Cart::new();
        assert!(matches!(cart.remove_line("X"), Err(CoreError::LineNotFound(_))));
        assert!(matches!(cart.set_participation("X", true), Err(CoreError::LineNotFound(_))));
        assert!(matches!(cart.set_quantity("X", 1.0), Err(CoreError::LineNotFound(_))));
    }

    #[test]
    fn test_order_is_preserved() {
        let mut cart = Cart::new();
        for id in ["C", "A", "B"] {
            cart.add_item(&item(id, 1.0), 1.0).unwrap();
        }
        cart.remove_line("A").unwrap();
        let ids: Vec<&str> = cart.lines().iter().map(|l| l.item_id()).collect();
        assert_eq!(ids, ["C", "B"]);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_item(&item("A", 10.0), 1.0).unwrap();
        cart.clear();
        assert!(cart.is_empty());
    }
}

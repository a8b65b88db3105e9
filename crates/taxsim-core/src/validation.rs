//! # Validation Module
//!
//! Input validation utilities for the simulator.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form / scenario file                                         │
//! │  └── Raw text such as "R$ 250.000,00"                                  │
//! │           │                                                             │
//! │           ▼  parse_amount()                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Cart input: hard errors (ValidationError)                         │
//! │  └── Regime input: classified, never rejected (NumericInput)           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Calculators                                                  │
//! │  └── Missing/Invalid → neutral default + note                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use taxsim_core::validation::{parse_amount, validate_quantity};
//!
//! assert_eq!(parse_amount("R$ 1.234,56").unwrap(), 1234.56);
//! assert!(validate_quantity(2.5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::CatalogItem;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Classification
// =============================================================================

/// A regime-specific numeric field after classification.
///
/// Calculators branch on this instead of rejecting input: a missing or
/// invalid field degrades the affected component, never the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericInput {
    /// The field was left blank.
    Missing,
    /// The field was supplied but is not a finite, non-negative number.
    Invalid,
    /// A usable value.
    Valid(f64),
}

impl NumericInput {
    /// Classifies an optional amount. Negative and non-finite values are
    /// invalid; zero is valid.
    pub fn classify(value: Option<f64>) -> Self {
        match value {
            None => NumericInput::Missing,
            Some(v) if v.is_finite() && v >= 0.0 => NumericInput::Valid(v),
            Some(_) => NumericInput::Invalid,
        }
    }

    /// Returns the value, or `default` when missing or invalid.
    pub fn or(self, default: f64) -> f64 {
        match self {
            NumericInput::Valid(v) => v,
            _ => default,
        }
    }
}

// =============================================================================
// Amount Parsing
// =============================================================================

/// Parses a monetary or percentage amount typed by a user.
///
/// ## Accepted Forms
/// - `1234.56`, `1234,56`
/// - `1.234,56` (pt-BR grouping), `1,234.56` (en grouping)
/// - `R$ 250.000,00`, `7,5%`
///
/// When both separators appear, the last one is the decimal separator.
/// With only dots, a single dot is decimal and several dots are grouping.
pub fn parse_amount(raw: &str) -> ValidationResult<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("R$")
        .trim_end_matches('%')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(ValidationError::Required {
            field: "amount".to_string(),
        });
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');

    let normalized = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) => cleaned.replace('.', "").replace(',', "."),
        (Some(_), None) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    let value: f64 = normalized
        .parse()
        .map_err(|_| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: format!("'{}' is not a number", raw.trim()),
        })?;

    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    Ok(value)
}

/// Parses an optional form field.
///
/// Blank input is `None`. Unparsable input becomes `Some(NaN)` so the
/// calculators can tell "not informed" from "informed but invalid".
pub fn parse_optional_amount(raw: Option<&str>) -> Option<f64> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }
    match parse_amount(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(input = raw, error = %err, "Unparsable amount kept as invalid");
            Some(f64::NAN)
        }
    }
}

// =============================================================================
// Cart Validators
// =============================================================================

/// Validates a catalog item identifier.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
pub fn validate_item_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "item id".to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::InvalidFormat {
            field: "item id".to_string(),
            reason: "must be at most 64 characters".to_string(),
        });
    }

    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be finite and positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: f64) -> ValidationResult<()> {
    if !qty.is_finite() || qty <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0.0,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price or unit cost.
///
/// ## Rules
/// - Must be finite and non-negative
/// - Zero is allowed (free items, unknown cost)
pub fn validate_price(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0.0,
            max: f64::MAX,
        });
    }

    Ok(())
}

/// Validates a percentage rate (0 to 100).
pub fn validate_rate_percent(field: &str, rate: f64) -> ValidationResult<()> {
    if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0.0,
            max: 100.0,
        });
    }

    Ok(())
}

/// Validates cart size before adding another line.
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0.0,
            max: MAX_CART_LINES as f64,
        });
    }

    Ok(())
}

/// Validates a catalog item before it enters a cart.
pub fn validate_catalog_item(item: &CatalogItem) -> ValidationResult<()> {
    validate_item_id(&item.id)?;
    validate_price("unit cost", item.unit_cost)?;
    validate_price("list price", item.list_price)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount("1234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("1234,56").unwrap(), 1234.56);
        assert_eq!(parse_amount("1.234,56").unwrap(), 1234.56);
        assert_eq!(parse_amount("1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("R$ 250.000,00").unwrap(), 250_000.0);
        assert_eq!(parse_amount("1.250.000").unwrap(), 1_250_000.0);
        assert_eq!(parse_amount("7,5%").unwrap(), 7.5);
        assert_eq!(parse_amount("  42 ").unwrap(), 42.0);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("   ").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("12a").is_err());
        assert!(parse_amount("inf").is_err());
    }

    #[test]
    fn test_parse_optional_amount() {
        assert_eq!(parse_optional_amount(None), None);
        assert_eq!(parse_optional_amount(Some("  ")), None);
        assert_eq!(parse_optional_amount(Some("10,5")), Some(10.5));
        assert!(parse_optional_amount(Some("dez")).unwrap().is_nan());
    }

    #[test]
    fn test_numeric_input_classify() {
        assert_eq!(NumericInput::classify(None), NumericInput::Missing);
        assert_eq!(NumericInput::classify(Some(0.0)), NumericInput::Valid(0.0));
        assert_eq!(NumericInput::classify(Some(-1.0)), NumericInput::Invalid);
        assert_eq!(NumericInput::classify(Some(f64::NAN)), NumericInput::Invalid);
        assert_eq!(NumericInput::classify(Some(f64::INFINITY)), NumericInput::Invalid);
        assert_eq!(NumericInput::Invalid.or(0.0), 0.0);
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1.0).is_ok());
        assert!(validate_quantity(0.25).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(validate_quantity(0.0).is_err());
        assert!(validate_quantity(-1.0).is_err());
        assert!(validate_quantity(f64::NAN).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1.0).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price("list price", 0.0).is_ok());
        assert!(validate_price("list price", 10.99).is_ok());
        assert!(validate_price("list price", -0.01).is_err());
        assert!(validate_price("list price", f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_item_id() {
        assert!(validate_item_id("SERV-001").is_ok());
        assert!(validate_item_id("").is_err());
        assert!(validate_item_id("   ").is_err());
        assert!(validate_item_id(&"A".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_rate_percent() {
        assert!(validate_rate_percent("iss", 0.0).is_ok());
        assert!(validate_rate_percent("iss", 5.0).is_ok());
        assert!(validate_rate_percent("iss", 100.0).is_ok());
        assert!(validate_rate_percent("iss", 100.1).is_err());
        assert!(validate_rate_percent("iss", -2.0).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES).is_err());
    }
}

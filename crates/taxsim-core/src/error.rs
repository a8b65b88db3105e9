//! # Error Types
//!
//! Domain-specific error types for taxsim-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  taxsim-core errors (this file)                                        │
//! │  ├── CoreError        - Session / cart operation failures              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  taxsim-cli errors (app)                                               │
//! │  └── CliError         - Config and scenario file failures              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CliError → stderr                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! The calculators never fail. A missing RBT12, a zero rateio base or a
//! target above the list total all produce a complete result with notes.
//! Errors here only guard session preconditions and malformed cart input.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Simulation session errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No cart line exists for the given catalog item id.
    #[error("Item not in cart: {0}")]
    LineNotFound(String),

    /// A run was requested on an empty cart.
    ///
    /// ## User Workflow
    /// ```text
    /// Click "Simular" with no items
    ///      │
    ///      ▼
    /// run() → EmptyCart
    ///      │
    ///      ▼
    /// UI shows: "Add at least one item"
    /// ```
    #[error("Cannot simulate an empty cart")]
    EmptyCart,

    /// Neither a client regime nor a manual selection is available.
    #[error("No tax regime selected and the client has no recorded regime")]
    RegimeUnresolved,

    /// Save/submit was requested while the last result is stale.
    #[error("Simulation is out of date, run it again before saving or submitting")]
    StaleSimulation,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised when cart or catalog input doesn't meet requirements, before any
/// line reaches the allocator.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Invalid format (e.g., unparsable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., same item id added twice to a catalog).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::LineNotFound("SKU-9".to_string());
        assert_eq!(err.to_string(), "Item not in cart: SKU-9");

        let err = CoreError::CartTooLarge { max: 200 };
        assert_eq!(err.to_string(), "Cart cannot have more than 200 lines");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");

        let err = ValidationError::InvalidFormat {
            field: "rbt12".to_string(),
            reason: "not a number".to_string(),
        };
        assert_eq!(err.to_string(), "rbt12 has invalid format: not a number");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

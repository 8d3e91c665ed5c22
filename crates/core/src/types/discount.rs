//! Coupon discount state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Message shown when the backend rejects a code.
pub const INVALID_COUPON_MESSAGE: &str = "Invalid coupon code";

/// Message shown when a code could not be verified.
pub const COUPON_ERROR_MESSAGE: &str = "Error verifying coupon";

/// Outcome of the last coupon redemption.
///
/// `code` is non-empty only while a discount is applied. A rejected or failed
/// redemption clears the code and zeroes the percentage but keeps a message
/// for the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscountInfo {
    pub code: String,
    pub percentage: Decimal,
    pub message: String,
}

impl DiscountInfo {
    /// A successfully applied discount.
    #[must_use]
    pub fn applied(code: impl Into<String>, percentage: Decimal) -> Self {
        let percentage = percentage.normalize();
        Self {
            code: code.into(),
            percentage,
            message: format!("{percentage}% discount applied!"),
        }
    }

    /// The backend did not recognise the code.
    #[must_use]
    pub fn invalid() -> Self {
        Self::cleared(INVALID_COUPON_MESSAGE)
    }

    /// The code could not be verified.
    #[must_use]
    pub fn error() -> Self {
        Self::cleared(COUPON_ERROR_MESSAGE)
    }

    fn cleared(message: &str) -> Self {
        Self {
            code: String::new(),
            percentage: Decimal::ZERO,
            message: message.to_string(),
        }
    }

    /// Whether a discount is currently applied.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        !self.code.is_empty() && self.percentage > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applied_message_drops_trailing_zeros() {
        let info = DiscountInfo::applied("SAVE20", Decimal::new(2000, 2));
        assert_eq!(info.code, "SAVE20");
        assert_eq!(info.percentage, Decimal::from(20));
        assert_eq!(info.message, "20% discount applied!");
        assert!(info.is_applied());

        let info = DiscountInfo::applied("HALF", Decimal::new(125, 1));
        assert_eq!(info.message, "12.5% discount applied!");
    }

    #[test]
    fn test_cleared_states_keep_message() {
        let invalid = DiscountInfo::invalid();
        assert!(invalid.code.is_empty());
        assert_eq!(invalid.percentage, Decimal::ZERO);
        assert_eq!(invalid.message, "Invalid coupon code");
        assert!(!invalid.is_applied());

        assert_eq!(DiscountInfo::error().message, "Error verifying coupon");
        assert!(!DiscountInfo::default().is_applied());
    }
}

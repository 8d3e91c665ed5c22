//! Coupon redemption.
//!
//! The backend answers `POST /coupon/verify-coupon` with either a discount
//! percentage or an "Invalid coupon code" message. Anything else is reported
//! as [`CouponOutcome::Unrecognized`] and leaves the applied discount alone.

use std::str::FromStr;
use std::sync::Arc;

use bestie_core::DiscountInfo;
use bestie_core::types::discount::INVALID_COUPON_MESSAGE;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::backend::CartBackend;

/// Result of redeeming a coupon code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponOutcome {
    /// The code is valid; the discount replaces any previous one.
    Applied(DiscountInfo),
    /// The backend does not know the code.
    Rejected(DiscountInfo),
    /// The code could not be verified.
    Failed(DiscountInfo),
    /// The backend answered with a shape that is neither a discount nor a
    /// rejection.
    Unrecognized,
}

impl CouponOutcome {
    /// Discount state carried by the outcome.
    #[must_use]
    pub const fn discount(&self) -> Option<&DiscountInfo> {
        match self {
            Self::Applied(info) | Self::Rejected(info) | Self::Failed(info) => Some(info),
            Self::Unrecognized => None,
        }
    }

    /// Message for the shopper.
    #[must_use]
    pub fn message(&self) -> &str {
        self.discount()
            .map_or("Unexpected response while verifying coupon", |info| {
                info.message.as_str()
            })
    }

    /// Discount state after this outcome, given the `previous` one.
    #[must_use]
    pub fn resolve(&self, previous: &DiscountInfo) -> DiscountInfo {
        self.discount().unwrap_or(previous).clone()
    }
}

/// Verifies coupon codes against the backend.
#[derive(Clone)]
pub struct CouponValidator {
    backend: Arc<dyn CartBackend>,
}

impl std::fmt::Debug for CouponValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CouponValidator").finish_non_exhaustive()
    }
}

impl CouponValidator {
    #[must_use]
    pub fn new(backend: Arc<dyn CartBackend>) -> Self {
        Self { backend }
    }

    /// Redeem `code`. Blank codes are rejected without a request.
    #[instrument(skip(self))]
    pub async fn redeem(&self, code: &str) -> CouponOutcome {
        let code = code.trim();
        if code.is_empty() {
            return CouponOutcome::Rejected(DiscountInfo::invalid());
        }

        let outcome = match self.backend.verify_coupon(code).await {
            Ok(body) => classify(code, &body),
            Err(e) => {
                warn!(error = %e, "Coupon verification failed");
                CouponOutcome::Failed(DiscountInfo::error())
            }
        };

        match &outcome {
            CouponOutcome::Applied(info) => info!(percentage = %info.percentage, "Coupon applied"),
            CouponOutcome::Rejected(_) => info!("Coupon rejected"),
            CouponOutcome::Failed(_) => warn!("Coupon could not be verified"),
            CouponOutcome::Unrecognized => warn!("Unrecognized coupon response"),
        }
        outcome
    }
}

/// Classify a verification response body.
#[must_use]
pub fn classify(code: &str, body: &Value) -> CouponOutcome {
    if body.get("message").and_then(Value::as_str) == Some(INVALID_COUPON_MESSAGE) {
        return CouponOutcome::Rejected(DiscountInfo::invalid());
    }

    let percentage = match body.get("discountPercentage") {
        None | Some(Value::Null) => return CouponOutcome::Unrecognized,
        Some(raw) => parse_percentage(raw),
    };

    match percentage {
        Some(p) if p.is_zero() => CouponOutcome::Unrecognized,
        Some(p) if p > Decimal::ZERO && p <= Decimal::ONE_HUNDRED => {
            CouponOutcome::Applied(DiscountInfo::applied(code, p))
        }
        _ => CouponOutcome::Failed(DiscountInfo::error()),
    }
}

/// Percentages arrive as JSON numbers, occasionally as numeric strings.
fn parse_percentage(raw: &Value) -> Option<Decimal> {
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_percentage_applies() {
        let outcome = classify("SAVE20", &json!({"discountPercentage": 20}));
        assert_eq!(
            outcome,
            CouponOutcome::Applied(DiscountInfo {
                code: "SAVE20".to_string(),
                percentage: Decimal::from(20),
                message: "20% discount applied!".to_string(),
            })
        );
    }

    #[test]
    fn test_fractional_and_string_percentages() {
        let outcome = classify("HALF", &json!({"discountPercentage": 12.5}));
        assert_eq!(outcome.message(), "12.5% discount applied!");

        let outcome = classify("STR", &json!({"discountPercentage": "15"}));
        assert_eq!(outcome.discount().unwrap().percentage, Decimal::from(15));
    }

    #[test]
    fn test_invalid_message_rejects() {
        let outcome = classify("INVALID", &json!({"message": "Invalid coupon code"}));
        let CouponOutcome::Rejected(info) = &outcome else {
            panic!("expected rejection, got {outcome:?}");
        };
        assert_eq!(info.percentage, Decimal::ZERO);
        assert!(info.code.is_empty());
        assert!(!info.message.is_empty());
    }

    #[test]
    fn test_out_of_range_percentage_fails() {
        for body in [
            json!({"discountPercentage": 150}),
            json!({"discountPercentage": -5}),
            json!({"discountPercentage": "lots"}),
            json!({"discountPercentage": true}),
        ] {
            assert_eq!(
                classify("X", &body),
                CouponOutcome::Failed(DiscountInfo::error()),
                "{body}"
            );
        }
    }

    #[test]
    fn test_other_shapes_are_unrecognized() {
        for body in [
            json!({}),
            json!({"message": "Coupon expired"}),
            json!({"discountPercentage": 0}),
            json!({"discountPercentage": null}),
            json!("ok"),
        ] {
            assert_eq!(classify("X", &body), CouponOutcome::Unrecognized, "{body}");
        }
    }

    #[test]
    fn test_unrecognized_keeps_previous_discount() {
        let previous = DiscountInfo::applied("SAVE10", Decimal::from(10));
        assert_eq!(CouponOutcome::Unrecognized.resolve(&previous), previous);

        let rejected = CouponOutcome::Rejected(DiscountInfo::invalid());
        assert_eq!(rejected.resolve(&previous), DiscountInfo::invalid());
    }
}

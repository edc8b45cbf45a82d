use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::promo_code::{DiscountType, PromoCode},
};

// ============================================================================
// Repo Trait
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewPromoCode {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait PromoCodeRepo: Send + Sync {
    /// Case-normalized lookup of an active code. Inactive codes are filtered
    /// at query time so "not found" and "inactive" are indistinguishable.
    async fn get_active_by_code(&self, code: &str) -> AppResult<Option<PromoCode>>;

    /// Single atomic conditional increment of `current_uses`. The validity
    /// conditions (active, unexpired, under cap) are re-checked inside the
    /// update itself, not read-modify-write in application code. Returns
    /// whether a row was actually incremented.
    async fn increment_usage(&self, code: &str) -> AppResult<bool>;

    async fn create(&self, input: &NewPromoCode) -> AppResult<PromoCode>;

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<bool>;

    async fn list_all(&self) -> AppResult<Vec<PromoCode>>;
}

// ============================================================================
// Validation Result
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PromoCodeValidation {
    pub is_valid: bool,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PromoCodeValidation {
    fn rejected(reason: &str) -> Self {
        PromoCodeValidation {
            is_valid: false,
            discount_type: DiscountType::Percentage,
            discount_value: 0.0,
            error: Some(reason.to_string()),
        }
    }
}

/// Final price after applying a discount, clamped at zero. Pure and
/// deterministic for a given input triple.
pub fn calculate_discounted_price(
    original_price: f64,
    discount: f64,
    discount_type: DiscountType,
) -> f64 {
    let discounted = match discount_type {
        DiscountType::Percentage => original_price - original_price * discount / 100.0,
        DiscountType::Fixed => original_price - discount,
    };
    discounted.max(0.0)
}

// ============================================================================
// Use Cases
// ============================================================================

pub struct PromoCodeUseCases {
    codes: Arc<dyn PromoCodeRepo>,
}

impl PromoCodeUseCases {
    pub fn new(codes: Arc<dyn PromoCodeRepo>) -> Self {
        Self { codes }
    }

    /// Validate a code for display/pricing. Fails closed: every expected
    /// rejection and every infrastructure error comes back as
    /// `is_valid: false` with a reason, never as an Err.
    pub async fn validate(&self, code: &str) -> PromoCodeValidation {
        let normalized = code.trim().to_uppercase();
        if normalized.is_empty() {
            return PromoCodeValidation::rejected("Promo code not found or inactive");
        }

        let promo = match self.codes.get_active_by_code(&normalized).await {
            Ok(Some(promo)) => promo,
            Ok(None) => {
                return PromoCodeValidation::rejected("Promo code not found or inactive");
            }
            Err(error) => {
                tracing::warn!(%error, code = %normalized, "Promo code lookup failed");
                return PromoCodeValidation::rejected("Unable to validate promo code");
            }
        };

        if promo.is_expired(Utc::now()) {
            return PromoCodeValidation::rejected("Promo code has expired");
        }

        if promo.is_exhausted() {
            return PromoCodeValidation::rejected("Promo code usage limit reached");
        }

        PromoCodeValidation {
            is_valid: true,
            discount_type: promo.discount_type,
            discount_value: promo.discount_value,
            error: None,
        }
    }

    /// Redeem a code by bumping its usage counter. The conditional update
    /// closes the validate-then-apply race: under concurrent redemption only
    /// as many calls succeed as the cap allows. Failure is non-fatal to the
    /// activation that triggered it.
    pub async fn apply(&self, code: &str) -> bool {
        let normalized = code.trim().to_uppercase();
        match self.codes.increment_usage(&normalized).await {
            Ok(applied) => {
                if !applied {
                    tracing::warn!(code = %normalized, "Promo code no longer redeemable");
                }
                applied
            }
            Err(error) => {
                tracing::warn!(%error, code = %normalized, "Promo code increment failed");
                false
            }
        }
    }

    pub async fn create(&self, input: &NewPromoCode) -> AppResult<PromoCode> {
        let code = input.code.trim().to_uppercase();
        if code.is_empty() {
            return Err(AppError::InvalidInput("Promo code is required".into()));
        }
        if input.discount_value <= 0.0 {
            return Err(AppError::InvalidInput(
                "Discount value must be positive".into(),
            ));
        }
        if input.discount_type == DiscountType::Percentage && input.discount_value > 100.0 {
            return Err(AppError::InvalidInput(
                "Percentage discount cannot exceed 100".into(),
            ));
        }
        if input.max_uses.is_some_and(|max| max <= 0) {
            return Err(AppError::InvalidInput(
                "Usage limit must be positive".into(),
            ));
        }

        self.codes
            .create(&NewPromoCode {
                code,
                ..input.clone()
            })
            .await
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<()> {
        if self.codes.set_active(id, is_active).await? {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }

    pub async fn list(&self) -> AppResult<Vec<PromoCode>> {
        self.codes.list_all().await
    }
}

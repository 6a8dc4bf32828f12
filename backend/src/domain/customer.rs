//! Customer entity and its value types.
//!
//! A customer is created once at registration and afterwards mutated only by
//! referral credits (on someone else's registration), discount redemption,
//! gift redemption, and roster edits. Records are never deleted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::normalize::normalize_phone;

/// Discount points granted to a referrer per credited referral.
pub const DISCOUNT_STEP: u8 = 5;
/// Ceiling for the accrued discount percentage.
pub const DISCOUNT_CAP: u8 = 25;

/// Discount percentage after crediting one referral, saturating at the cap.
///
/// # Examples
/// ```
/// use backend::domain::customer::{credited_discount, DISCOUNT_CAP};
///
/// assert_eq!(credited_discount(10), 15);
/// assert_eq!(credited_discount(22), DISCOUNT_CAP);
/// ```
pub fn credited_discount(current: u8) -> u8 {
    current.saturating_add(DISCOUNT_STEP).min(DISCOUNT_CAP)
}

/// Validation errors raised by customer value constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomerValidationError {
    /// Name is empty once trimmed.
    #[error("full name must not be empty")]
    EmptyName,
    /// Phone has no digits left after normalization.
    #[error("phone must contain at least one digit")]
    EmptyPhone,
    /// Discount percentage exceeds the accrual cap.
    #[error("discount percentage must not exceed {max}")]
    DiscountOutOfRange { max: u8 },
}

/// Stable customer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
pub struct CustomerId(Uuid);

impl CustomerId {
    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Normalized phone number: digits only, country prefix stripped.
///
/// Construction normalizes the raw input, so a `Phone` is always in canonical
/// form and two equal values denote the same line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "3001234567")]
pub struct Phone(String);

impl Phone {
    /// Normalize and validate a raw phone input.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CustomerValidationError> {
        let normalized = normalize_phone(raw.as_ref());
        if normalized.is_empty() {
            return Err(CustomerValidationError::EmptyPhone);
        }
        Ok(Self(normalized))
    }

    /// Borrow the digits.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<Phone> for String {
    fn from(value: Phone) -> Self {
        value.0
    }
}

impl TryFrom<String> for Phone {
    type Error = CustomerValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Gift eligibility state.
///
/// Registration without a referrer leaves the customer outside the gift
/// programme entirely; a credited referrer makes the gift pending until it is
/// redeemed. The wire and storage representation is a nullable boolean
/// (`null` / `false` / `true`), matching the ledger's record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum GiftStatus {
    /// No referrer at registration; never eligible.
    NotEligible,
    /// Referrer credited; gift not yet handed over.
    Pending,
    /// Gift handed over.
    Claimed,
}

impl GiftStatus {
    /// Whether the customer still has a gift to collect.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl From<Option<bool>> for GiftStatus {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::NotEligible,
            Some(false) => Self::Pending,
            Some(true) => Self::Claimed,
        }
    }
}

impl From<GiftStatus> for Option<bool> {
    fn from(value: GiftStatus) -> Self {
        match value {
            GiftStatus::NotEligible => None,
            GiftStatus::Pending => Some(false),
            GiftStatus::Claimed => Some(true),
        }
    }
}

/// Customer ledger record.
///
/// ## Invariants
/// - `normalized_name` is the canonical form of `full_name`.
/// - `discount_percentage` stays within `[0, DISCOUNT_CAP]`.
/// - `id` and `created_at` are assigned at creation and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Stable identifier assigned by the store.
    pub id: CustomerId,
    /// Name as entered, trimmed.
    #[schema(example = "José Pérez")]
    pub full_name: String,
    /// Canonical form of the name, used for duplicate detection.
    #[schema(example = "jose perez")]
    pub normalized_name: String,
    /// Canonical phone number.
    pub phone: Phone,
    /// Times this customer was cited as a valid referrer.
    pub referral_count: u32,
    /// Accrued discount percentage.
    #[schema(maximum = 25)]
    pub discount_percentage: u8,
    /// Times the accrued discount was redeemed.
    pub discount_redemption_count: u32,
    /// Gift eligibility state.
    #[schema(value_type = Option<bool>)]
    pub gift_claimed: GiftStatus,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 5)]
    #[case(10, 15)]
    #[case(20, 25)]
    #[case(22, 25)]
    #[case(25, 25)]
    fn discount_credit_steps_and_caps(#[case] current: u8, #[case] expected: u8) {
        assert_eq!(credited_discount(current), expected);
    }

    #[rstest]
    fn phone_constructor_normalizes() {
        let phone = Phone::new("+57 300 1234567").expect("valid phone");
        assert_eq!(phone.as_str(), "3001234567");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("sin numeros")]
    fn phone_rejects_digitless_input(#[case] raw: &str) {
        assert_eq!(Phone::new(raw), Err(CustomerValidationError::EmptyPhone));
    }

    #[rstest]
    #[case(None, GiftStatus::NotEligible)]
    #[case(Some(false), GiftStatus::Pending)]
    #[case(Some(true), GiftStatus::Claimed)]
    fn gift_status_round_trips_nullable_bool(#[case] raw: Option<bool>, #[case] status: GiftStatus) {
        assert_eq!(GiftStatus::from(raw), status);
        assert_eq!(Option::<bool>::from(status), raw);
    }

    #[rstest]
    fn gift_status_serializes_as_nullable_bool() {
        let json = serde_json::to_string(&GiftStatus::Pending).expect("serialize");
        assert_eq!(json, "false");
        let json = serde_json::to_string(&GiftStatus::NotEligible).expect("serialize");
        assert_eq!(json, "null");
    }

    #[rstest]
    fn customer_serializes_camel_case() {
        let customer = Customer {
            id: CustomerId::random(),
            full_name: "José Pérez".into(),
            normalized_name: "jose perez".into(),
            phone: Phone::new("3001234567").expect("valid phone"),
            referral_count: 2,
            discount_percentage: 10,
            discount_redemption_count: 0,
            gift_claimed: GiftStatus::Pending,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&customer).expect("serialize");
        assert_eq!(value["fullName"], "José Pérez");
        assert_eq!(value["giftClaimed"], false);
        assert_eq!(value["referralCount"], 2);
        assert!(value.get("full_name").is_none());
    }
}

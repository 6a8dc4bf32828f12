//! Ports the ledger uses to reach its record store.
//!
//! The store is an external collaborator exposing record-oriented CRUD over
//! the `customers` collection. Adapters map their infrastructure failures
//! into [`CustomerStoreError`] variants so the ledger never sees transport
//! details.

use async_trait::async_trait;
use thiserror::Error;

use super::customer::{Customer, CustomerId, GiftStatus, Phone};

/// Errors surfaced by customer store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomerStoreError {
    /// Store connection could not be established or was lost.
    #[error("customer store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("customer store query failed: {message}")]
    Query { message: String },
    /// The store rejected an insert that collides with an existing record.
    #[error("customer store rejected a duplicate {field}")]
    Duplicate { field: String },
}

impl CustomerStoreError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Helper for uniqueness violations, naming the colliding field.
    pub fn duplicate(field: impl Into<String>) -> Self {
        Self::Duplicate {
            field: field.into(),
        }
    }
}

/// A customer record ready for insertion.
///
/// Identifier and creation timestamp are assigned by the store; counters
/// start at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    /// Name as entered, trimmed.
    pub full_name: String,
    /// Canonical form of the name.
    pub normalized_name: String,
    /// Canonical phone number.
    pub phone: Phone,
    /// `Pending` when a referrer was credited, `NotEligible` otherwise.
    pub gift_claimed: GiftStatus,
}

/// Post-credit counter values for a referrer, applied as a single update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferrerCredit {
    /// The customer receiving the credit.
    pub referrer_id: CustomerId,
    /// Referral count after the credit.
    pub referral_count: u32,
    /// Discount percentage after the credit, already capped.
    pub discount_percentage: u8,
}

/// Full-record replacement used by roster edits.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerUpdate {
    /// Name as entered, trimmed.
    pub full_name: String,
    /// Canonical form of the name.
    pub normalized_name: String,
    /// Canonical phone number.
    pub phone: Phone,
    /// Replacement referral counter.
    pub referral_count: u32,
    /// Replacement discount percentage.
    pub discount_percentage: u8,
    /// Replacement redemption counter.
    pub discount_redemption_count: u32,
    /// Replacement gift state.
    pub gift_claimed: GiftStatus,
}

/// Record store port for the customer collection.
///
/// Mutations that target a single existing record return `Ok(false)` when no
/// record matched the identifier; the ledger maps that to its not-found
/// error. `create` applies the optional referrer credit and the insert within
/// one atomic unit, so a failure leaves neither write behind.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Insert a customer, crediting the referrer in the same transaction.
    async fn create(
        &self,
        new: NewCustomer,
        credit: Option<ReferrerCredit>,
    ) -> Result<Customer, CustomerStoreError>;

    /// Fetch a customer by identifier.
    async fn find_by_id(&self, id: &CustomerId)
    -> Result<Option<Customer>, CustomerStoreError>;

    /// Fetch the customer holding exactly this phone number.
    async fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>, CustomerStoreError>;

    /// Fetch the customer whose normalized name equals `name` exactly.
    async fn find_by_normalized_name(
        &self,
        name: &str,
    ) -> Result<Option<Customer>, CustomerStoreError>;

    /// Resolve a referrer query: phone OR normalized-name equality.
    async fn find_referrer(
        &self,
        phone: &str,
        normalized_name: &str,
    ) -> Result<Option<Customer>, CustomerStoreError>;

    /// Earliest-created customer whose normalized name contains `fragment`.
    async fn search_name_contains(
        &self,
        fragment: &str,
    ) -> Result<Option<Customer>, CustomerStoreError>;

    /// Overwrite the gift state of one customer.
    async fn set_gift_claimed(
        &self,
        id: &CustomerId,
        status: GiftStatus,
    ) -> Result<bool, CustomerStoreError>;

    /// Reset the discount to zero and store the new redemption count, as one
    /// update.
    async fn record_discount_redemption(
        &self,
        id: &CustomerId,
        redemption_count: u32,
    ) -> Result<bool, CustomerStoreError>;

    /// Replace the mutable fields of one customer.
    async fn update(
        &self,
        id: &CustomerId,
        update: CustomerUpdate,
    ) -> Result<bool, CustomerStoreError>;

    /// Customers with at least one credited referral, most referrals first.
    async fn list_referrers(&self) -> Result<Vec<Customer>, CustomerStoreError>;

    /// Customers whose gift is still pending.
    async fn list_gift_pending(&self) -> Result<Vec<Customer>, CustomerStoreError>;

    /// Customers sitting at the discount cap.
    async fn list_max_discount(&self) -> Result<Vec<Customer>, CustomerStoreError>;

    /// The full roster, newest registration first.
    async fn list_all(&self) -> Result<Vec<Customer>, CustomerStoreError>;
}

//! Customer ledger service.
//!
//! Implements the rules that mutate customer records: registration with
//! duplicate detection and referrer crediting, discount and gift redemption,
//! search, roster edits, and the read-through listings backing the views.
//! Each operation is a short sequence of store calls; a failed call abandons
//! the operation and surfaces a single [`Error`].

use std::sync::Arc;

use serde_json::json;

use super::customer::{
    Customer, CustomerId, DISCOUNT_CAP, GiftStatus, Phone, credited_discount,
};
use super::error::Error;
use super::normalize::{normalize_name, normalize_phone};
use super::ports::{CustomerStore, CustomerStoreError, CustomerUpdate, NewCustomer, ReferrerCredit};

/// Outcome of a successful registration.
///
/// `referrer` carries the credited customer when one was cited, letting the
/// caller decide whether to prompt for gift-eligibility confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// The newly created customer.
    pub customer: Customer,
    /// The referrer as it was before the credit, when one was cited.
    pub referrer: Option<Customer>,
}

/// Validated input for a roster edit.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEdit {
    /// Replacement name (raw; trimmed and re-normalized here).
    pub full_name: String,
    /// Replacement phone (raw; re-normalized here).
    pub phone: String,
    /// Replacement referral counter.
    pub referral_count: u32,
    /// Replacement discount percentage.
    pub discount_percentage: u8,
    /// Replacement redemption counter.
    pub discount_redemption_count: u32,
    /// Replacement gift state.
    pub gift_claimed: GiftStatus,
}

/// The customer ledger, generic over its record store only through the
/// [`CustomerStore`] trait object.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn CustomerStore>,
}

impl LedgerService {
    /// Create a ledger over the given store.
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }

    fn map_store_error(error: CustomerStoreError) -> Error {
        match error {
            CustomerStoreError::Connection { message } => {
                Error::service_unavailable(format!("customer store unavailable: {message}"))
            }
            CustomerStoreError::Query { message } => {
                Error::internal(format!("customer store error: {message}"))
            }
            CustomerStoreError::Duplicate { field } => {
                Error::duplicate(format!("a customer with this {field} already exists"))
                    .with_details(json!({ "field": field }))
            }
        }
    }

    /// Register a new customer, optionally crediting a referrer.
    ///
    /// Rejects blank names and phones, phone duplicates, and exact
    /// normalized-name duplicates. When `referrer_query` is non-empty it must
    /// resolve to an existing customer by phone or normalized-name equality;
    /// otherwise the registration fails with a not-found error and nothing is
    /// written. The referrer credit (+1 referral, +5 discount capped at
    /// [`DISCOUNT_CAP`]) and the insert are applied atomically by the store.
    pub async fn register(
        &self,
        full_name: &str,
        phone: &str,
        referrer_query: Option<&str>,
    ) -> Result<Registration, Error> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(Error::invalid_request("full name must not be empty")
                .with_details(json!({ "field": "fullName" })));
        }
        let phone = Phone::new(phone).map_err(|_| {
            Error::invalid_request("phone must contain at least one digit")
                .with_details(json!({ "field": "phone" }))
        })?;
        let normalized_name = normalize_name(full_name);

        if self
            .store
            .find_by_phone(phone.as_str())
            .await
            .map_err(Self::map_store_error)?
            .is_some()
        {
            return Err(Error::duplicate("a customer with this phone already exists")
                .with_details(json!({ "field": "phone" })));
        }
        if self
            .store
            .find_by_normalized_name(&normalized_name)
            .await
            .map_err(Self::map_store_error)?
            .is_some()
        {
            return Err(
                Error::duplicate("a customer with a similar name already exists")
                    .with_details(json!({ "field": "fullName" })),
            );
        }

        let referrer = match referrer_query.map(str::trim).filter(|q| !q.is_empty()) {
            None => None,
            Some(query) => {
                let found = self
                    .store
                    .find_referrer(&normalize_phone(query), &normalize_name(query))
                    .await
                    .map_err(Self::map_store_error)?;
                match found {
                    None => return Err(Error::not_found("referrer not found")),
                    Some(customer) => Some(customer),
                }
            }
        };

        let credit = referrer.as_ref().map(|r| ReferrerCredit {
            referrer_id: r.id,
            referral_count: r.referral_count + 1,
            discount_percentage: credited_discount(r.discount_percentage),
        });
        let new = NewCustomer {
            full_name: full_name.to_owned(),
            normalized_name,
            phone,
            gift_claimed: if referrer.is_some() {
                GiftStatus::Pending
            } else {
                GiftStatus::NotEligible
            },
        };

        let customer = self
            .store
            .create(new, credit)
            .await
            .map_err(Self::map_store_error)?;

        Ok(Registration { customer, referrer })
    }

    /// Find one customer by fuzzy name containment, falling back to an exact
    /// phone match. The earliest-created name match wins.
    pub async fn find(&self, query: &str) -> Result<Customer, Error> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::invalid_request("search query must not be empty"));
        }

        let name = normalize_name(query);
        if !name.is_empty()
            && let Some(customer) = self
                .store
                .search_name_contains(&name)
                .await
                .map_err(Self::map_store_error)?
        {
            return Ok(customer);
        }

        let phone = normalize_phone(query);
        if !phone.is_empty()
            && let Some(customer) = self
                .store
                .find_by_phone(&phone)
                .await
                .map_err(Self::map_store_error)?
        {
            return Ok(customer);
        }

        Err(Error::not_found("no customer matches the query"))
    }

    /// Redeem the accrued discount: reset the percentage to zero and count
    /// the redemption. Permitted at 0% as a counted no-op reset. Returns the
    /// new redemption count.
    pub async fn redeem_discount(&self, id: &CustomerId) -> Result<u32, Error> {
        let customer = self.fetch(id).await?;
        let new_count = customer.discount_redemption_count + 1;
        let matched = self
            .store
            .record_discount_redemption(id, new_count)
            .await
            .map_err(Self::map_store_error)?;
        if !matched {
            return Err(Self::unknown_customer(id));
        }
        Ok(new_count)
    }

    /// Mark the gift as claimed. Succeeds on an already-claimed customer.
    pub async fn redeem_gift(&self, id: &CustomerId) -> Result<(), Error> {
        self.set_gift_claimed(id, GiftStatus::Claimed).await
    }

    /// Overwrite the gift state unconditionally.
    pub async fn set_gift_claimed(&self, id: &CustomerId, status: GiftStatus) -> Result<(), Error> {
        let matched = self
            .store
            .set_gift_claimed(id, status)
            .await
            .map_err(Self::map_store_error)?;
        if !matched {
            return Err(Self::unknown_customer(id));
        }
        Ok(())
    }

    /// Replace the mutable fields of a customer from a roster edit.
    ///
    /// Name and phone are re-normalized; the discount must stay within the
    /// accrual cap.
    pub async fn update_customer(&self, id: &CustomerId, edit: RosterEdit) -> Result<(), Error> {
        let full_name = edit.full_name.trim();
        if full_name.is_empty() {
            return Err(Error::invalid_request("full name must not be empty")
                .with_details(json!({ "field": "fullName" })));
        }
        let phone = Phone::new(&edit.phone).map_err(|_| {
            Error::invalid_request("phone must contain at least one digit")
                .with_details(json!({ "field": "phone" }))
        })?;
        if edit.discount_percentage > DISCOUNT_CAP {
            return Err(Error::invalid_request(format!(
                "discount percentage must not exceed {DISCOUNT_CAP}"
            ))
            .with_details(json!({ "field": "discountPercentage" })));
        }

        let update = CustomerUpdate {
            full_name: full_name.to_owned(),
            normalized_name: normalize_name(full_name),
            phone,
            referral_count: edit.referral_count,
            discount_percentage: edit.discount_percentage,
            discount_redemption_count: edit.discount_redemption_count,
            gift_claimed: edit.gift_claimed,
        };
        let matched = self
            .store
            .update(id, update)
            .await
            .map_err(Self::map_store_error)?;
        if !matched {
            return Err(Self::unknown_customer(id));
        }
        Ok(())
    }

    /// Customers with at least one credited referral, most referrals first.
    pub async fn referrers(&self) -> Result<Vec<Customer>, Error> {
        self.store
            .list_referrers()
            .await
            .map_err(Self::map_store_error)
    }

    /// Customers whose gift is still pending.
    pub async fn gift_pending(&self) -> Result<Vec<Customer>, Error> {
        self.store
            .list_gift_pending()
            .await
            .map_err(Self::map_store_error)
    }

    /// Customers sitting at the discount cap.
    pub async fn max_discount(&self) -> Result<Vec<Customer>, Error> {
        self.store
            .list_max_discount()
            .await
            .map_err(Self::map_store_error)
    }

    /// The full roster, newest registration first.
    pub async fn roster(&self) -> Result<Vec<Customer>, Error> {
        self.store.list_all().await.map_err(Self::map_store_error)
    }

    async fn fetch(&self, id: &CustomerId) -> Result<Customer, Error> {
        self.store
            .find_by_id(id)
            .await
            .map_err(Self::map_store_error)?
            .ok_or_else(|| Self::unknown_customer(id))
    }

    fn unknown_customer(id: &CustomerId) -> Error {
        Error::not_found("customer not found").with_details(json!({ "id": id.to_string() }))
    }
}

//! Internal Diesel row structs for the customers table.
//!
//! Implementation details of the persistence layer; never exposed to the
//! domain. Counter columns are stored as signed integers (PostgreSQL has no
//! unsigned types) and cast at the adapter boundary.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::customers;

/// Row struct for reading a customer.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CustomerRow {
    pub id: Uuid,
    pub full_name: String,
    pub normalized_name: String,
    pub phone: String,
    pub referral_count: i32,
    pub discount_percentage: i16,
    pub discount_redemption_count: i32,
    pub gift_claimed: Option<bool>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for registration.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = customers)]
pub(crate) struct NewCustomerRow<'a> {
    pub id: Uuid,
    pub full_name: &'a str,
    pub normalized_name: &'a str,
    pub phone: &'a str,
    pub referral_count: i32,
    pub discount_percentage: i16,
    pub discount_redemption_count: i32,
    pub gift_claimed: Option<bool>,
    pub created_at: DateTime<Utc>,
}

/// Changeset applying a referrer credit: both counters in one update.
#[derive(Debug, Clone, Copy, AsChangeset)]
#[diesel(table_name = customers)]
pub(crate) struct ReferrerCreditChangeset {
    pub referral_count: i32,
    pub discount_percentage: i16,
}

/// Changeset for a discount redemption: reset plus count in one update.
#[derive(Debug, Clone, Copy, AsChangeset)]
#[diesel(table_name = customers)]
pub(crate) struct DiscountRedemptionChangeset {
    pub discount_percentage: i16,
    pub discount_redemption_count: i32,
}

/// Changeset overwriting the gift state.
///
/// `treat_none_as_null` matters here: `None` must write SQL NULL (not
/// eligible), not skip the column.
#[derive(Debug, Clone, Copy, AsChangeset)]
#[diesel(table_name = customers)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct GiftClaimedChangeset {
    pub gift_claimed: Option<bool>,
}

/// Changeset for a full roster edit.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = customers)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CustomerEditChangeset<'a> {
    pub full_name: &'a str,
    pub normalized_name: &'a str,
    pub phone: &'a str,
    pub referral_count: i32,
    pub discount_percentage: i16,
    pub discount_redemption_count: i32,
    pub gift_claimed: Option<bool>,
}

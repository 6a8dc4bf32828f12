//! PostgreSQL-backed [`CustomerStore`] implementation using Diesel ORM.
//!
//! Thin adapter: translates between Diesel rows and domain customers, maps
//! database failures onto [`CustomerStoreError`], and keeps the referrer
//! credit and the registration insert inside one transaction.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::customer::{Customer, CustomerId, DISCOUNT_CAP, GiftStatus, Phone};
use crate::domain::ports::{
    CustomerStore, CustomerStoreError, CustomerUpdate, NewCustomer, ReferrerCredit,
};

use super::models::{
    CustomerEditChangeset, CustomerRow, DiscountRedemptionChangeset, GiftClaimedChangeset,
    NewCustomerRow, ReferrerCreditChangeset,
};
use super::pool::{DbPool, PoolError};
use super::schema::customers;

/// Diesel-backed customer store.
#[derive(Clone)]
pub struct DieselCustomerStore {
    pool: DbPool,
}

impl DieselCustomerStore {
    /// Create a store over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CustomerStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            CustomerStoreError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> CustomerStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            // The colliding column is read off the constraint name; the
            // customers table carries unique indexes on phone and
            // normalized_name.
            let field = if info.constraint_name().is_some_and(|name| name.contains("phone")) {
                "phone"
            } else {
                "name"
            };
            CustomerStoreError::duplicate(field)
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            CustomerStoreError::connection("database connection error")
        }
        DieselError::NotFound => CustomerStoreError::query("record not found"),
        _ => CustomerStoreError::query("database error"),
    }
}

fn row_to_customer(row: CustomerRow) -> Result<Customer, CustomerStoreError> {
    let phone = Phone::new(&row.phone)
        .map_err(|err| CustomerStoreError::query(format!("stored phone is invalid: {err}")))?;

    Ok(Customer {
        id: CustomerId::from_uuid(row.id),
        full_name: row.full_name,
        normalized_name: row.normalized_name,
        phone,
        referral_count: cast_count_from_db(row.referral_count),
        discount_percentage: cast_discount_from_db(row.discount_percentage),
        discount_redemption_count: cast_count_from_db(row.discount_redemption_count),
        gift_claimed: row.gift_claimed.into(),
        created_at: row.created_at,
    })
}

fn rows_to_customers(rows: Vec<CustomerRow>) -> Result<Vec<Customer>, CustomerStoreError> {
    rows.into_iter().map(row_to_customer).collect()
}

#[expect(
    clippy::cast_sign_loss,
    reason = "counter columns are non-negative in the database"
)]
fn cast_count_from_db(count: i32) -> u32 {
    count as u32
}

#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    reason = "discount_percentage is constrained to 0..=25 in the database"
)]
fn cast_discount_from_db(discount: i16) -> u8 {
    discount as u8
}

#[expect(
    clippy::cast_possible_wrap,
    reason = "counters stay far below i32::MAX"
)]
fn cast_count_for_db(count: u32) -> i32 {
    count as i32
}

fn cast_discount_for_db(discount: u8) -> i16 {
    i16::from(discount)
}

#[async_trait]
impl CustomerStore for DieselCustomerStore {
    async fn create(
        &self,
        new: NewCustomer,
        credit: Option<ReferrerCredit>,
    ) -> Result<Customer, CustomerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewCustomerRow {
            id: Uuid::new_v4(),
            full_name: &new.full_name,
            normalized_name: &new.normalized_name,
            phone: new.phone.as_str(),
            referral_count: 0,
            discount_percentage: 0,
            discount_redemption_count: 0,
            gift_claimed: new.gift_claimed.into(),
            created_at: chrono::Utc::now(),
        };

        let row = conn
            .transaction::<CustomerRow, diesel::result::Error, _>(|conn| {
                async move {
                    if let Some(credit) = &credit {
                        diesel::update(
                            customers::table
                                .filter(customers::id.eq(credit.referrer_id.as_uuid())),
                        )
                        .set(ReferrerCreditChangeset {
                            referral_count: cast_count_for_db(credit.referral_count),
                            discount_percentage: cast_discount_for_db(credit.discount_percentage),
                        })
                        .execute(conn)
                        .await?;
                    }

                    diesel::insert_into(customers::table)
                        .values(&new_row)
                        .get_result::<CustomerRow>(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        row_to_customer(row)
    }

    async fn find_by_id(
        &self,
        id: &CustomerId,
    ) -> Result<Option<Customer>, CustomerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<CustomerRow> = customers::table
            .filter(customers::id.eq(id.as_uuid()))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_customer).transpose()
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>, CustomerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<CustomerRow> = customers::table
            .filter(customers::phone.eq(phone))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_customer).transpose()
    }

    async fn find_by_normalized_name(
        &self,
        name: &str,
    ) -> Result<Option<Customer>, CustomerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<CustomerRow> = customers::table
            .filter(customers::normalized_name.eq(name))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_customer).transpose()
    }

    async fn find_referrer(
        &self,
        phone: &str,
        normalized_name: &str,
    ) -> Result<Option<Customer>, CustomerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<CustomerRow> = customers::table
            .filter(
                customers::phone
                    .eq(phone)
                    .or(customers::normalized_name.eq(normalized_name)),
            )
            .order(customers::created_at.asc())
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_customer).transpose()
    }

    async fn search_name_contains(
        &self,
        fragment: &str,
    ) -> Result<Option<Customer>, CustomerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<CustomerRow> = customers::table
            .filter(customers::normalized_name.like(format!("%{fragment}%")))
            .order(customers::created_at.asc())
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_customer).transpose()
    }

    async fn set_gift_claimed(
        &self,
        id: &CustomerId,
        status: GiftStatus,
    ) -> Result<bool, CustomerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(customers::table.filter(customers::id.eq(id.as_uuid())))
            .set(GiftClaimedChangeset {
                gift_claimed: status.into(),
            })
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn record_discount_redemption(
        &self,
        id: &CustomerId,
        redemption_count: u32,
    ) -> Result<bool, CustomerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(customers::table.filter(customers::id.eq(id.as_uuid())))
            .set(DiscountRedemptionChangeset {
                discount_percentage: 0,
                discount_redemption_count: cast_count_for_db(redemption_count),
            })
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn update(
        &self,
        id: &CustomerId,
        update: CustomerUpdate,
    ) -> Result<bool, CustomerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(customers::table.filter(customers::id.eq(id.as_uuid())))
            .set(CustomerEditChangeset {
                full_name: &update.full_name,
                normalized_name: &update.normalized_name,
                phone: update.phone.as_str(),
                referral_count: cast_count_for_db(update.referral_count),
                discount_percentage: cast_discount_for_db(update.discount_percentage),
                discount_redemption_count: cast_count_for_db(update.discount_redemption_count),
                gift_claimed: update.gift_claimed.into(),
            })
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn list_referrers(&self) -> Result<Vec<Customer>, CustomerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CustomerRow> = customers::table
            .filter(customers::referral_count.gt(0))
            .order(customers::referral_count.desc())
            .select(CustomerRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_customers(rows)
    }

    async fn list_gift_pending(&self) -> Result<Vec<Customer>, CustomerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CustomerRow> = customers::table
            .filter(customers::gift_claimed.eq(Some(false)))
            .order(customers::created_at.desc())
            .select(CustomerRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_customers(rows)
    }

    async fn list_max_discount(&self) -> Result<Vec<Customer>, CustomerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CustomerRow> = customers::table
            .filter(customers::discount_percentage.eq(cast_discount_for_db(DISCOUNT_CAP)))
            .order(customers::created_at.desc())
            .select(CustomerRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_customers(rows)
    }

    async fn list_all(&self) -> Result<Vec<Customer>, CustomerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CustomerRow> = customers::table
            .order(customers::created_at.desc())
            .select(CustomerRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_customers(rows)
    }
}

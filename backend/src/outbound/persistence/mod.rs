//! PostgreSQL persistence adapter using Diesel ORM.
//!
//! Concrete implementation of the domain's [`CustomerStore`] port backed by
//! PostgreSQL via `diesel-async` and bb8 pooling. Row structs and schema
//! definitions stay internal; the adapter only translates between rows and
//! domain customers and maps database failures onto store errors.
//!
//! [`CustomerStore`]: crate::domain::ports::CustomerStore

mod diesel_customer_store;
mod models;
mod pool;
mod schema;

pub use diesel_customer_store::DieselCustomerStore;
pub use pool::{DbPool, PoolConfig, PoolError};

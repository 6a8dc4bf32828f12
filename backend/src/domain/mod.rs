//! Domain types and the customer ledger.
//!
//! Everything here is framework free: entities and value types
//! ([`customer`]), canonical input forms ([`normalize`]), the store port
//! ([`ports`]), the ledger rules ([`ledger`]), the export mapping
//! ([`report`]), and the transport-agnostic error payload ([`error`]).

pub mod customer;
pub mod error;
pub mod ledger;
pub mod normalize;
pub mod ports;
pub mod report;

pub use self::customer::{Customer, CustomerId, CustomerValidationError, GiftStatus, Phone};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ledger::{LedgerService, Registration, RosterEdit};
pub use self::normalize::{normalize_name, normalize_phone};

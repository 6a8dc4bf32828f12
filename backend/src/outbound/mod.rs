//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! Currently a single adapter family: [`persistence`], the Diesel-backed
//! customer store. Adapters are thin translators between domain types and
//! infrastructure representations; no business logic lives here.

pub mod persistence;

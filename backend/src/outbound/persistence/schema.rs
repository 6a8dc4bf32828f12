//! Diesel table definitions for the PostgreSQL schema.
//!
//! Must match the deployed `customers` table exactly; Diesel uses these for
//! compile-time query validation and type-safe SQL generation.

diesel::table! {
    /// Customer ledger records.
    ///
    /// One row per registered customer. Rows are inserted once and then
    /// mutated by referral credits, redemptions, and roster edits; the
    /// application never deletes them.
    customers (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Name as entered, trimmed.
        full_name -> Varchar,
        /// Canonical name form; unique, backs duplicate detection.
        normalized_name -> Varchar,
        /// Canonical phone digits; unique.
        phone -> Varchar,
        /// Times cited as a valid referrer.
        referral_count -> Int4,
        /// Accrued discount percentage, 0 to 25.
        discount_percentage -> Int2,
        /// Times the discount was redeemed.
        discount_redemption_count -> Int4,
        /// Gift state: NULL not eligible, false pending, true claimed.
        gift_claimed -> Nullable<Bool>,
        /// Registration timestamp.
        created_at -> Timestamptz,
    }
}

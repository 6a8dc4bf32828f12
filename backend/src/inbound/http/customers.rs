//! Customer ledger API handlers.
//!
//! ```text
//! POST /api/v1/customers                              register, optionally citing a referrer
//! GET  /api/v1/customers/search?q=...                 fuzzy name / exact phone lookup
//! GET  /api/v1/customers                              full roster, newest first
//! GET  /api/v1/customers/referrers                    customers with credited referrals
//! GET  /api/v1/customers/gift-pending                 customers with a pending gift
//! GET  /api/v1/customers/max-discount                 customers at the discount cap
//! GET  /api/v1/customers/report.csv                   localized CSV export
//! POST /api/v1/customers/{id}/discount-redemptions    redeem the accrued discount
//! POST /api/v1/customers/{id}/gift-redemption         claim the pending gift
//! PUT  /api/v1/customers/{id}/gift                    overwrite the gift state
//! PUT  /api/v1/customers/{id}                         roster edit
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::report;
use crate::domain::{Customer, CustomerId, Error, GiftStatus, LedgerService, RosterEdit};
use crate::inbound::http::ApiResult;

/// Registration request body.
///
/// `referrer` is free-form: it matches an existing customer by phone or by
/// normalized name.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Customer name as entered.
    #[schema(example = "José Pérez")]
    pub full_name: String,
    /// Customer phone as entered.
    #[schema(example = "+57 300 1234567")]
    pub phone: String,
    /// Optional referrer query (name or phone).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

/// Registration response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// The created customer.
    pub customer: Customer,
    /// Whether a referrer was credited; when true the caller should prompt
    /// for gift-eligibility confirmation.
    pub referrer_credited: bool,
}

/// Search query string.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Name fragment or phone number.
    pub q: String,
}

/// Discount redemption response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionResponse {
    /// Redemption count after this redemption.
    pub discount_redemption_count: u32,
}

/// Gift overwrite request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetGiftRequest {
    /// `true` marks the gift claimed, `false` marks it pending.
    pub claimed: bool,
}

/// Roster edit request body. Every field is replaced.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditCustomerRequest {
    /// Replacement name.
    pub full_name: String,
    /// Replacement phone.
    pub phone: String,
    /// Replacement referral counter.
    pub referral_count: u32,
    /// Replacement discount percentage.
    #[schema(maximum = 25)]
    pub discount_percentage: u8,
    /// Replacement redemption counter.
    pub discount_redemption_count: u32,
    /// Replacement gift state (`null` / `false` / `true`).
    #[schema(value_type = Option<bool>)]
    pub gift_claimed: GiftStatus,
}

/// Register a new customer.
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Customer registered", body = RegisterResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Referrer not found", body = Error),
        (status = 409, description = "Duplicate phone or name", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["customers"],
    operation_id = "registerCustomer"
)]
#[post("/customers")]
pub async fn register(
    ledger: web::Data<LedgerService>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let registration = ledger
        .register(&payload.full_name, &payload.phone, payload.referrer.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(RegisterResponse {
        referrer_credited: registration.referrer.is_some(),
        customer: registration.customer,
    }))
}

/// Look up one customer by name fragment or exact phone.
#[utoipa::path(
    get,
    path = "/api/v1/customers/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Best match", body = Customer),
        (status = 400, description = "Empty query", body = Error),
        (status = 404, description = "No match", body = Error)
    ),
    tags = ["customers"],
    operation_id = "searchCustomer"
)]
#[get("/customers/search")]
pub async fn search(
    ledger: web::Data<LedgerService>,
    query: web::Query<SearchQuery>,
) -> ApiResult<web::Json<Customer>> {
    let customer = ledger.find(&query.q).await?;
    Ok(web::Json(customer))
}

/// Full roster, newest registration first.
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    responses(
        (status = 200, description = "All customers", body = [Customer]),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["customers"],
    operation_id = "listCustomers"
)]
#[get("/customers")]
pub async fn list_roster(ledger: web::Data<LedgerService>) -> ApiResult<web::Json<Vec<Customer>>> {
    Ok(web::Json(ledger.roster().await?))
}

/// Customers with at least one credited referral, most referrals first.
#[utoipa::path(
    get,
    path = "/api/v1/customers/referrers",
    responses((status = 200, description = "Referring customers", body = [Customer])),
    tags = ["customers"],
    operation_id = "listReferrers"
)]
#[get("/customers/referrers")]
pub async fn list_referrers(
    ledger: web::Data<LedgerService>,
) -> ApiResult<web::Json<Vec<Customer>>> {
    Ok(web::Json(ledger.referrers().await?))
}

/// Customers whose gift is still pending.
#[utoipa::path(
    get,
    path = "/api/v1/customers/gift-pending",
    responses((status = 200, description = "Customers with a pending gift", body = [Customer])),
    tags = ["customers"],
    operation_id = "listGiftPending"
)]
#[get("/customers/gift-pending")]
pub async fn list_gift_pending(
    ledger: web::Data<LedgerService>,
) -> ApiResult<web::Json<Vec<Customer>>> {
    Ok(web::Json(ledger.gift_pending().await?))
}

/// Customers sitting at the discount cap.
#[utoipa::path(
    get,
    path = "/api/v1/customers/max-discount",
    responses((status = 200, description = "Customers at the cap", body = [Customer])),
    tags = ["customers"],
    operation_id = "listMaxDiscount"
)]
#[get("/customers/max-discount")]
pub async fn list_max_discount(
    ledger: web::Data<LedgerService>,
) -> ApiResult<web::Json<Vec<Customer>>> {
    Ok(web::Json(ledger.max_discount().await?))
}

/// Export the roster as CSV with the localized report headers.
#[utoipa::path(
    get,
    path = "/api/v1/customers/report.csv",
    responses(
        (status = 200, description = "CSV report", content_type = "text/csv"),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["customers"],
    operation_id = "exportReport"
)]
#[get("/customers/report.csv")]
pub async fn export_report(ledger: web::Data<LedgerService>) -> ApiResult<HttpResponse> {
    let customers = ledger.roster().await?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .body(report::to_csv(&customers)))
}

/// Redeem the accrued discount.
#[utoipa::path(
    post,
    path = "/api/v1/customers/{id}/discount-redemptions",
    params(("id" = Uuid, Path, description = "Customer identifier")),
    responses(
        (status = 200, description = "Discount redeemed", body = RedemptionResponse),
        (status = 404, description = "Unknown customer", body = Error)
    ),
    tags = ["customers"],
    operation_id = "redeemDiscount"
)]
#[post("/customers/{id}/discount-redemptions")]
pub async fn redeem_discount(
    ledger: web::Data<LedgerService>,
    id: web::Path<Uuid>,
) -> ApiResult<web::Json<RedemptionResponse>> {
    let id = CustomerId::from_uuid(id.into_inner());
    let discount_redemption_count = ledger.redeem_discount(&id).await?;
    Ok(web::Json(RedemptionResponse {
        discount_redemption_count,
    }))
}

/// Claim the pending gift. Succeeds on an already-claimed customer.
#[utoipa::path(
    post,
    path = "/api/v1/customers/{id}/gift-redemption",
    params(("id" = Uuid, Path, description = "Customer identifier")),
    responses(
        (status = 204, description = "Gift claimed"),
        (status = 404, description = "Unknown customer", body = Error)
    ),
    tags = ["customers"],
    operation_id = "redeemGift"
)]
#[post("/customers/{id}/gift-redemption")]
pub async fn redeem_gift(
    ledger: web::Data<LedgerService>,
    id: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let id = CustomerId::from_uuid(id.into_inner());
    ledger.redeem_gift(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Overwrite the gift state after the registration prompt.
#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}/gift",
    params(("id" = Uuid, Path, description = "Customer identifier")),
    request_body = SetGiftRequest,
    responses(
        (status = 204, description = "Gift state stored"),
        (status = 404, description = "Unknown customer", body = Error)
    ),
    tags = ["customers"],
    operation_id = "setGiftClaimed"
)]
#[put("/customers/{id}/gift")]
pub async fn set_gift_claimed(
    ledger: web::Data<LedgerService>,
    id: web::Path<Uuid>,
    payload: web::Json<SetGiftRequest>,
) -> ApiResult<HttpResponse> {
    let id = CustomerId::from_uuid(id.into_inner());
    let status = GiftStatus::from(Some(payload.claimed));
    ledger.set_gift_claimed(&id, status).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Replace the mutable fields of a customer from the roster view.
#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer identifier")),
    request_body = EditCustomerRequest,
    responses(
        (status = 204, description = "Customer updated"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown customer", body = Error)
    ),
    tags = ["customers"],
    operation_id = "editCustomer"
)]
#[put("/customers/{id}")]
pub async fn edit_customer(
    ledger: web::Data<LedgerService>,
    id: web::Path<Uuid>,
    payload: web::Json<EditCustomerRequest>,
) -> ApiResult<HttpResponse> {
    let id = CustomerId::from_uuid(id.into_inner());
    let payload = payload.into_inner();
    let edit = RosterEdit {
        full_name: payload.full_name,
        phone: payload.phone,
        referral_count: payload.referral_count,
        discount_percentage: payload.discount_percentage,
        discount_redemption_count: payload.discount_redemption_count,
        gift_claimed: payload.gift_claimed,
    };
    ledger.update_customer(&id, edit).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register every customer handler under the given scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(search)
        .service(list_referrers)
        .service(list_gift_pending)
        .service(list_max_discount)
        .service(export_report)
        .service(list_roster)
        .service(redeem_discount)
        .service(redeem_gift)
        .service(set_gift_claimed)
        .service(edit_customer);
}

//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct generating the OpenAPI specification for the
//! REST API: all customer and health endpoints plus the domain schemas they
//! reference. Served by Swagger UI in debug builds.

use utoipa::OpenApi;

use crate::domain::{Customer, CustomerId, Error, ErrorCode, Phone};
use crate::inbound::http::customers::{
    EditCustomerRequest, RedemptionResponse, RegisterRequest, RegisterResponse, SetGiftRequest,
};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::inbound::http::customers::register,
        crate::inbound::http::customers::search,
        crate::inbound::http::customers::list_roster,
        crate::inbound::http::customers::list_referrers,
        crate::inbound::http::customers::list_gift_pending,
        crate::inbound::http::customers::list_max_discount,
        crate::inbound::http::customers::export_report,
        crate::inbound::http::customers::redeem_discount,
        crate::inbound::http::customers::redeem_gift,
        crate::inbound::http::customers::set_gift_claimed,
        crate::inbound::http::customers::edit_customer,
        crate::inbound::http::health::live,
        crate::inbound::http::health::ready,
    ),
    components(schemas(
        Customer,
        CustomerId,
        Phone,
        Error,
        ErrorCode,
        RegisterRequest,
        RegisterResponse,
        RedemptionResponse,
        SetGiftRequest,
        EditCustomerRequest,
    )),
    tags(
        (name = "customers", description = "Customer ledger operations"),
        (name = "health", description = "Service probes"),
    )
)]
pub struct ApiDoc;

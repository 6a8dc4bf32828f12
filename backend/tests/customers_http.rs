//! End-to-end handler flows over an in-memory customer store.
//!
//! Drives the REST surface the way the counter application does: register,
//! credit referrals, redeem discounts and gifts, search, and export, checking
//! the ledger rules hold across operations rather than within a single call.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use actix_web::{App, test as actix_test, web};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde_json::{Value, json};
use std::sync::Arc;

use backend::domain::ports::{
    CustomerStore, CustomerStoreError, CustomerUpdate, NewCustomer, ReferrerCredit,
};
use backend::domain::{Customer, CustomerId, GiftStatus, LedgerService};
use backend::inbound::http::customers;

/// Store double backed by a vector, enforcing the same uniqueness the
/// deployed schema does and keeping creation order observable.
#[derive(Default)]
struct InMemoryCustomerStore {
    records: Mutex<Vec<Customer>>,
    clock: AtomicI64,
}

impl InMemoryCustomerStore {
    fn next_created_at(&self) -> chrono::DateTime<Utc> {
        let tick = self.clock.fetch_add(1, Ordering::SeqCst);
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(tick)
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn create(
        &self,
        new: NewCustomer,
        credit: Option<ReferrerCredit>,
    ) -> Result<Customer, CustomerStoreError> {
        let mut records = self.records.lock().expect("store poisoned");
        if records.iter().any(|c| c.phone == new.phone) {
            return Err(CustomerStoreError::duplicate("phone"));
        }
        if records.iter().any(|c| c.normalized_name == new.normalized_name) {
            return Err(CustomerStoreError::duplicate("name"));
        }
        if let Some(credit) = credit {
            let referrer = records
                .iter_mut()
                .find(|c| c.id == credit.referrer_id)
                .ok_or_else(|| CustomerStoreError::query("referrer vanished"))?;
            referrer.referral_count = credit.referral_count;
            referrer.discount_percentage = credit.discount_percentage;
        }
        let customer = Customer {
            id: CustomerId::random(),
            full_name: new.full_name,
            normalized_name: new.normalized_name,
            phone: new.phone,
            referral_count: 0,
            discount_percentage: 0,
            discount_redemption_count: 0,
            gift_claimed: new.gift_claimed,
            created_at: self.next_created_at(),
        };
        records.push(customer.clone());
        Ok(customer)
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, CustomerStoreError> {
        let records = self.records.lock().expect("store poisoned");
        Ok(records.iter().find(|c| c.id == *id).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>, CustomerStoreError> {
        let records = self.records.lock().expect("store poisoned");
        Ok(records.iter().find(|c| c.phone.as_str() == phone).cloned())
    }

    async fn find_by_normalized_name(
        &self,
        name: &str,
    ) -> Result<Option<Customer>, CustomerStoreError> {
        let records = self.records.lock().expect("store poisoned");
        Ok(records.iter().find(|c| c.normalized_name == name).cloned())
    }

    async fn find_referrer(
        &self,
        phone: &str,
        normalized_name: &str,
    ) -> Result<Option<Customer>, CustomerStoreError> {
        let records = self.records.lock().expect("store poisoned");
        Ok(records
            .iter()
            .filter(|c| c.phone.as_str() == phone || c.normalized_name == normalized_name)
            .min_by_key(|c| c.created_at)
            .cloned())
    }

    async fn search_name_contains(
        &self,
        fragment: &str,
    ) -> Result<Option<Customer>, CustomerStoreError> {
        let records = self.records.lock().expect("store poisoned");
        Ok(records
            .iter()
            .filter(|c| c.normalized_name.contains(fragment))
            .min_by_key(|c| c.created_at)
            .cloned())
    }

    async fn set_gift_claimed(
        &self,
        id: &CustomerId,
        status: GiftStatus,
    ) -> Result<bool, CustomerStoreError> {
        let mut records = self.records.lock().expect("store poisoned");
        match records.iter_mut().find(|c| c.id == *id) {
            Some(customer) => {
                customer.gift_claimed = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_discount_redemption(
        &self,
        id: &CustomerId,
        redemption_count: u32,
    ) -> Result<bool, CustomerStoreError> {
        let mut records = self.records.lock().expect("store poisoned");
        match records.iter_mut().find(|c| c.id == *id) {
            Some(customer) => {
                customer.discount_percentage = 0;
                customer.discount_redemption_count = redemption_count;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update(
        &self,
        id: &CustomerId,
        update: CustomerUpdate,
    ) -> Result<bool, CustomerStoreError> {
        let mut records = self.records.lock().expect("store poisoned");
        match records.iter_mut().find(|c| c.id == *id) {
            Some(customer) => {
                customer.full_name = update.full_name;
                customer.normalized_name = update.normalized_name;
                customer.phone = update.phone;
                customer.referral_count = update.referral_count;
                customer.discount_percentage = update.discount_percentage;
                customer.discount_redemption_count = update.discount_redemption_count;
                customer.gift_claimed = update.gift_claimed;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_referrers(&self) -> Result<Vec<Customer>, CustomerStoreError> {
        let records = self.records.lock().expect("store poisoned");
        let mut listed: Vec<Customer> = records
            .iter()
            .filter(|c| c.referral_count > 0)
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.referral_count.cmp(&a.referral_count));
        Ok(listed)
    }

    async fn list_gift_pending(&self) -> Result<Vec<Customer>, CustomerStoreError> {
        let records = self.records.lock().expect("store poisoned");
        Ok(records
            .iter()
            .filter(|c| c.gift_claimed == GiftStatus::Pending)
            .cloned()
            .collect())
    }

    async fn list_max_discount(&self) -> Result<Vec<Customer>, CustomerStoreError> {
        let records = self.records.lock().expect("store poisoned");
        Ok(records
            .iter()
            .filter(|c| c.discount_percentage == 25)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Customer>, CustomerStoreError> {
        let records = self.records.lock().expect("store poisoned");
        let mut listed: Vec<Customer> = records.iter().cloned().collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }
}

fn test_app() -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let ledger = LedgerService::new(Arc::new(InMemoryCustomerStore::default()));
    App::new()
        .app_data(web::Data::new(ledger))
        .service(web::scope("/api/v1").configure(customers::configure))
}

async fn register(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    body: Value,
) -> (actix_web::http::StatusCode, Value) {
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/customers")
        .set_json(body)
        .to_request();
    let response = actix_test::call_service(app, request).await;
    let status = response.status();
    let body: Value = actix_test::read_body_json(response).await;
    (status, body)
}

async fn get_json(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    uri: &str,
) -> Value {
    let response =
        actix_test::call_service(app, actix_test::TestRequest::get().uri(uri).to_request()).await;
    assert!(response.status().is_success(), "GET {uri} failed");
    actix_test::read_body_json(response).await
}

#[actix_web::test]
async fn referral_credit_accrues_and_caps() {
    let app = actix_test::init_service(test_app()).await;

    let (status, _) = register(
        &app,
        json!({ "fullName": "Ana Gómez", "phone": "311 000 0000" }),
    )
    .await;
    assert_eq!(status, actix_web::http::StatusCode::CREATED);

    // Five referrals reach the cap; the sixth must not exceed it.
    for i in 0..6 {
        let (status, body) = register(
            &app,
            json!({
                "fullName": format!("Cliente Referido {i}"),
                "phone": format!("30012345{i:02}"),
                "referrer": "ana gomez"
            }),
        )
        .await;
        assert_eq!(status, actix_web::http::StatusCode::CREATED);
        assert_eq!(body["referrerCredited"], true);
        assert_eq!(body["customer"]["giftClaimed"], false);
    }

    let referrers = get_json(&app, "/api/v1/customers/referrers").await;
    let referrers = referrers.as_array().expect("array");
    assert_eq!(referrers.len(), 1);
    assert_eq!(referrers[0]["fullName"], "Ana Gómez");
    assert_eq!(referrers[0]["referralCount"], 6);
    assert_eq!(referrers[0]["discountPercentage"], 25);

    let capped = get_json(&app, "/api/v1/customers/max-discount").await;
    assert_eq!(capped.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn duplicates_are_rejected_without_side_effects() {
    let app = actix_test::init_service(test_app()).await;

    let (status, _) = register(
        &app,
        json!({ "fullName": "José Pérez", "phone": "3001234567" }),
    )
    .await;
    assert_eq!(status, actix_web::http::StatusCode::CREATED);

    // Same phone under a country prefix.
    let (status, body) = register(
        &app,
        json!({ "fullName": "Otro Nombre", "phone": "+57 300 1234567" }),
    )
    .await;
    assert_eq!(status, actix_web::http::StatusCode::CONFLICT);
    assert_eq!(body["code"], "duplicate");

    // Same name up to case and accents.
    let (status, _) = register(
        &app,
        json!({ "fullName": "JOSE   perez", "phone": "3009999999" }),
    )
    .await;
    assert_eq!(status, actix_web::http::StatusCode::CONFLICT);

    let roster = get_json(&app, "/api/v1/customers").await;
    assert_eq!(roster.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn unknown_referrer_aborts_registration() {
    let app = actix_test::init_service(test_app()).await;

    let (status, _) = register(
        &app,
        json!({
            "fullName": "Nuevo Cliente",
            "phone": "3001234567",
            "referrer": "nadie conocido"
        }),
    )
    .await;
    assert_eq!(status, actix_web::http::StatusCode::NOT_FOUND);

    let roster = get_json(&app, "/api/v1/customers").await;
    assert_eq!(roster.as_array().map(Vec::len), Some(0));
}

#[actix_web::test]
async fn discount_redemption_resets_and_counts() {
    let app = actix_test::init_service(test_app()).await;

    let (_, body) = register(
        &app,
        json!({ "fullName": "Ana Gómez", "phone": "3110000000" }),
    )
    .await;
    let id = body["customer"]["id"].as_str().expect("id").to_owned();

    // Push the discount to 18% through a roster edit, as the counter staff
    // would correct it.
    let request = actix_test::TestRequest::put()
        .uri(&format!("/api/v1/customers/{id}"))
        .set_json(json!({
            "fullName": "Ana Gómez",
            "phone": "3110000000",
            "referralCount": 2,
            "discountPercentage": 18,
            "discountRedemptionCount": 0,
            "giftClaimed": null
        }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::NO_CONTENT);

    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/customers/{id}/discount-redemptions"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert!(response.status().is_success());
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["discountRedemptionCount"], 1);

    let found = get_json(&app, "/api/v1/customers/search?q=ana").await;
    assert_eq!(found["discountPercentage"], 0);
    assert_eq!(found["discountRedemptionCount"], 1);

    // Redeeming again at 0% is a counted no-op reset.
    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/customers/{id}/discount-redemptions"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["discountRedemptionCount"], 2);
}

#[actix_web::test]
async fn gift_lifecycle_from_pending_to_claimed() {
    let app = actix_test::init_service(test_app()).await;

    register(
        &app,
        json!({ "fullName": "Ana Gómez", "phone": "3110000000" }),
    )
    .await;
    let (_, body) = register(
        &app,
        json!({
            "fullName": "Beto Díaz",
            "phone": "3001234567",
            "referrer": "3110000000"
        }),
    )
    .await;
    let id = body["customer"]["id"].as_str().expect("id").to_owned();
    assert_eq!(body["customer"]["giftClaimed"], false);

    let pending = get_json(&app, "/api/v1/customers/gift-pending").await;
    assert_eq!(pending.as_array().map(Vec::len), Some(1));

    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/customers/{id}/gift-redemption"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::NO_CONTENT);

    let pending = get_json(&app, "/api/v1/customers/gift-pending").await;
    assert_eq!(pending.as_array().map(Vec::len), Some(0));

    // Claiming again still succeeds.
    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/customers/{id}/gift-redemption"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn search_falls_back_to_exact_phone() {
    let app = actix_test::init_service(test_app()).await;

    register(
        &app,
        json!({ "fullName": "Ana Gómez", "phone": "3001234567" }),
    )
    .await;
    register(
        &app,
        json!({ "fullName": "Beto Díaz", "phone": "3110000000" }),
    )
    .await;

    let found = get_json(&app, "/api/v1/customers/search?q=3001234567").await;
    assert_eq!(found["fullName"], "Ana Gómez");

    // Country-prefixed queries normalize to the stored digits.
    let found = get_json(&app, "/api/v1/customers/search?q=%2B57%203001234567").await;
    assert_eq!(found["fullName"], "Ana Gómez");
}

#[actix_web::test]
async fn earliest_created_name_match_wins() {
    let app = actix_test::init_service(test_app()).await;

    register(
        &app,
        json!({ "fullName": "Ana Pérez", "phone": "3001111111" }),
    )
    .await;
    register(
        &app,
        json!({ "fullName": "José Pérez", "phone": "3002222222" }),
    )
    .await;

    let found = get_json(&app, "/api/v1/customers/search?q=perez").await;
    assert_eq!(found["fullName"], "Ana Pérez");
}

#[actix_web::test]
async fn report_exports_localized_csv() {
    let app = actix_test::init_service(test_app()).await;

    register(
        &app,
        json!({ "fullName": "Ana Gómez", "phone": "3110000000" }),
    )
    .await;
    register(
        &app,
        json!({
            "fullName": "Beto Díaz",
            "phone": "3001234567",
            "referrer": "Ana Gómez"
        }),
    )
    .await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/customers/report.csv")
            .to_request(),
    )
    .await;
    assert!(response.status().is_success());
    let body = actix_test::read_body(response).await;
    let text = String::from_utf8(body.to_vec()).expect("utf-8 body");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some(
            "Nombre,Teléfono,Número de referidos,Descuento acumulado (%),\
             Regalo reclamado,Veces que ha cobrado descuento"
        )
    );
    // Roster is newest first: Beto (pending gift), then Ana (one referral).
    assert_eq!(lines.next(), Some("Beto Díaz,3001234567,0,0,Pendiente,0"));
    assert_eq!(lines.next(), Some("Ana Gómez,3110000000,1,5,Reclamado,0"));
}

//! Contract tests for the payments service.
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/api/pagos` | `discover_*` |
//! | GET    | `/api/pagos/planes` | `list_plans_*` |
//! | GET    | `/api/pagos/planes/{codigo}` | `get_plan_*` |
//! | POST   | `/api/pagos/inscripciones` | `create_inscription_*` |
//! | GET    | `/api/pagos/inscripciones/{id}/cuotas` | `installments_for_*` |
//! | POST   | `/api/pagos/intenciones` | `create_payment_intent_*` |
//! | POST   | `/api/mercadopago/checkout-pro/preferences` | `checkout_preference_*` |

use chrono::NaiveDate;
use cas_client::installments::{self, PaymentSummary};
use cas_client::models::Linked;
use cas_client::models::payments::{
    CheckoutItem, CheckoutPreferenceRequest, InscriptionRequest, InstallmentStatus, Month,
    PaymentIntentRequest, PaymentIntentStatus, PaymentMethod,
};
use cas_client::services::payments::PaymentsService;
use cas_client::{ApiError, CasClient, ClientConfig};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> CasClient {
    let config = ClientConfig::new(server.uri().parse().unwrap()).with_token("test-token");
    CasClient::new(&config).unwrap()
}

fn plan_json(code: &str, active: bool) -> Value {
    json!({
        "codigo": code,
        "nombre": "Plan anual 2025",
        "anio": 2025,
        "montoTotal": 120000.0,
        "minCuotas": 1,
        "maxCuotas": 10,
        "mesInicio": "MARCH",
        "mesFin": "DECEMBER",
        "activo": active,
        "_links": {"self": {"href": format!("/api/pagos/planes/{code}")}}
    })
}

fn installments_json() -> Value {
    json!([
        {"id": 1, "secuencia": 1, "fechaVencimiento": "2024-12-10", "monto": 20000.0, "estado": "PAGADA"},
        {"id": 2, "secuencia": 2, "fechaVencimiento": "2025-01-10", "monto": 20000.0, "estado": "VENCIDA"},
        {"id": 3, "secuencia": 3, "fechaVencimiento": "2025-02-10", "monto": 20000.0, "estado": "PENDIENTE"},
        {"id": 4, "secuencia": 4, "fechaVencimiento": "2025-03-10", "monto": 20000.0, "estado": "PENDIENTE"}
    ])
}

// ── GET /api/pagos ───────────────────────────────────────────────────

#[tokio::test]
async fn discover_returns_payment_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pagos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_links": {"planes": {"href": "/api/pagos/planes"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let root = test_client(&server).payments().discover().await.unwrap();
    assert_eq!(root.data.link_href("planes").as_deref(), Some("/api/pagos/planes"));
}

// ── GET /api/pagos/planes ────────────────────────────────────────────

#[tokio::test]
async fn list_plans_returns_every_plan() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pagos/planes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [plan_json("ANUAL-2025", true), plan_json("ANUAL-2024", false)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let collection = test_client(&server)
        .payments()
        .list_plans()
        .await
        .unwrap()
        .into_data();
    let plans = PaymentsService::extract_plans(&collection);
    assert_eq!(plans.len(), 2);
    assert!(plans[0].active);
    assert!(!plans[1].active);
    assert_eq!(plans[0].start_month, Month::March);
    assert!(plans[0].is_consistent());
    assert_eq!(plans[0].default_installments(), 6);
}

#[tokio::test]
async fn extract_plans_falls_back_to_embedded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pagos/planes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"planPagoModelList": [plan_json("ANUAL-2025", true)]}
        })))
        .mount(&server)
        .await;

    let collection = test_client(&server)
        .payments()
        .list_plans()
        .await
        .unwrap()
        .into_data();
    assert_eq!(PaymentsService::extract_plans(&collection).len(), 1);
}

#[tokio::test]
async fn get_plan_encodes_the_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pagos/planes/PLAN%20A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(plan_json("PLAN A", true)))
        .expect(1)
        .mount(&server)
        .await;

    let plan = test_client(&server)
        .payments()
        .get_plan("PLAN A")
        .await
        .unwrap()
        .into_data();
    assert_eq!(plan.code, "PLAN A");
}

// ── POST /api/pagos/inscripciones ────────────────────────────────────

#[tokio::test]
async fn create_inscription_returns_created_installments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pagos/inscripciones"))
        .and(body_json(json!({
            "idUsuario": "uid-123",
            "codigoPlan": "ANUAL-2025",
            "mesInicio": "MARCH",
            "cuotasDeseadas": 4
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "idInscripcion": 12,
            "cuotas": installments_json()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = InscriptionRequest {
        user_id: "uid-123".into(),
        plan_code: "ANUAL-2025".into(),
        start_month: Month::March,
        desired_installments: Some(4),
    };
    let response = test_client(&server)
        .payments()
        .create_inscription(&request)
        .await
        .unwrap()
        .into_data();
    assert_eq!(response.inscription_id, 12);
    assert_eq!(response.installments.len(), 4);
}

#[tokio::test]
async fn create_inscription_surfaces_validation_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pagos/inscripciones"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Cantidad de cuotas fuera de rango"
        })))
        .mount(&server)
        .await;

    let request = InscriptionRequest {
        user_id: "uid-123".into(),
        plan_code: "ANUAL-2025".into(),
        start_month: Month::March,
        desired_installments: Some(40),
    };
    let err = test_client(&server)
        .payments()
        .create_inscription(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 400, .. }));
    assert_eq!(err.user_message(), "Cantidad de cuotas fuera de rango");
}

// ── GET /api/pagos/inscripciones/{id}/cuotas ─────────────────────────

#[tokio::test]
async fn installments_for_feeds_the_aggregations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pagos/inscripciones/12/cuotas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": installments_json()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let collection = test_client(&server)
        .payments()
        .installments_for(12)
        .await
        .unwrap()
        .into_data();
    let list = PaymentsService::extract_installments(&collection);
    assert_eq!(list.len(), 4);
    assert_eq!(list[1].status, InstallmentStatus::Overdue);

    assert_eq!(installments::paid_amount(&list), 20000.0);
    assert_eq!(installments::pending_amount(&list), 60000.0);
    assert_eq!(
        installments::next_due_installment(&list).map(|i| i.due_date),
        NaiveDate::from_ymd_opt(2025, 2, 10)
    );

    let summary = PaymentSummary::from_installments(&list);
    assert_eq!(summary.progress_percent, 25);
    assert!(summary.has_overdue());
}

// ── POST /api/pagos/intenciones ──────────────────────────────────────

#[tokio::test]
async fn create_payment_intent_returns_redirect_for_mercadopago() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pagos/intenciones"))
        .and(body_json(json!({
            "idInscripcion": 12,
            "idsCuotas": [3, 4],
            "metodo": "MERCADOPAGO"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 55,
            "idInscripcion": 12,
            "estado": "PENDIENTE",
            "urlRedireccion": "https://www.mercadopago.com.ar/checkout/v1/redirect?pref_id=abc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = PaymentIntentRequest {
        inscription_id: 12,
        installment_ids: vec![3, 4],
        method: PaymentMethod::MercadoPago,
    };
    let intent = test_client(&server)
        .payments()
        .create_payment_intent(&request)
        .await
        .unwrap()
        .into_data();
    assert_eq!(intent.status, PaymentIntentStatus::Pending);
    assert!(intent.redirect_url.unwrap().contains("pref_id=abc"));
}

#[tokio::test]
async fn cash_payment_intent_has_no_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pagos/intenciones"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 56,
            "idInscripcion": 12,
            "estado": "PENDIENTE"
        })))
        .mount(&server)
        .await;

    let request = PaymentIntentRequest {
        inscription_id: 12,
        installment_ids: vec![3],
        method: PaymentMethod::Cash,
    };
    let intent = test_client(&server)
        .payments()
        .create_payment_intent(&request)
        .await
        .unwrap()
        .into_data();
    assert!(intent.redirect_url.is_none());
}

// ── POST /api/mercadopago/checkout-pro/preferences ───────────────────

#[tokio::test]
async fn checkout_preference_round_trips_camel_case() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/mercadopago/checkout-pro/preferences"))
        .and(body_json(json!({
            "items": [{"title": "Cuota 3", "quantity": 1, "unitPrice": 20000.0}],
            "successUrl": "https://cas.example.org/pagos/exito"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "preferenceId": "pref-1",
            "initPoint": "https://www.mercadopago.com.ar/checkout/v1/redirect?pref_id=pref-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = CheckoutPreferenceRequest {
        items: vec![CheckoutItem {
            title: "Cuota 3".into(),
            quantity: 1,
            unit_price: 20000.0,
        }],
        success_url: Some("https://cas.example.org/pagos/exito".into()),
        failure_url: None,
        pending_url: None,
    };
    let preference = test_client(&server)
        .payments()
        .create_checkout_preference(&request)
        .await
        .unwrap()
        .into_data();
    assert_eq!(preference.preference_id, "pref-1");
}

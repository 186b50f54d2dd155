use axum::{Json, Router, http::StatusCode, routing::post};
use digito_store::{
    config::GatewayConfig,
    gateway::{GatewayError, PaymentGateway, PaymentRequest, ZarinpalGateway},
};
use serde_json::{Value, json};
use uuid::Uuid;

/// Serves `router` on an ephemeral port and returns its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock gateway");
    let addr = listener.local_addr().expect("mock address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock gateway");
    });
    format!("http://{addr}")
}

fn gateway(base: &str, merchant_id: Option<&str>) -> ZarinpalGateway {
    ZarinpalGateway::new(&GatewayConfig {
        merchant_id: merchant_id.map(str::to_string),
        api_base: base.to_string(),
        start_pay_base: "https://pay.example".to_string(),
        timeout_secs: 5,
    })
    .expect("gateway client")
}

fn request() -> PaymentRequest {
    PaymentRequest {
        order_id: Uuid::new_v4(),
        amount: 150_000,
        description: "پرداخت سفارش 0000000001".to_string(),
        callback_url: "http://localhost:3000/api/payments/callback".to_string(),
    }
}

#[tokio::test]
async fn request_success_builds_start_pay_url() {
    let router = Router::new().route(
        "/payment/request.json",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["merchant_id"], "merchant-1");
            assert_eq!(body["amount"], 150_000);
            Json(json!({ "data": { "code": 100, "authority": "A0000000000000000000000000000012345" }, "errors": [] }))
        }),
    );
    let base = serve(router).await;

    let redirect = gateway(&base, Some("merchant-1"))
        .request_payment(&request())
        .await
        .expect("payment redirect");
    assert_eq!(redirect.authority, "A0000000000000000000000000000012345");
    assert_eq!(
        redirect.payment_url,
        "https://pay.example/StartPay/A0000000000000000000000000000012345"
    );
}

#[tokio::test]
async fn request_rejection_carries_gateway_message() {
    let router = Router::new().route(
        "/payment/request.json",
        post(|| async {
            Json(json!({ "data": [], "errors": { "code": -9, "message": "The input params invalid" } }))
        }),
    );
    let base = serve(router).await;

    let err = gateway(&base, Some("merchant-1"))
        .request_payment(&request())
        .await
        .expect_err("rejected request");
    match err {
        GatewayError::Rejected { code, message } => {
            assert_eq!(code, Some(-9));
            assert_eq!(message, "The input params invalid");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_200_is_a_connectivity_failure() {
    let router = Router::new().route(
        "/payment/request.json",
        post(|| async { StatusCode::BAD_GATEWAY }),
    );
    let base = serve(router).await;

    let err = gateway(&base, Some("merchant-1"))
        .request_payment(&request())
        .await
        .expect_err("bad gateway");
    assert!(matches!(err, GatewayError::Connectivity(_)));
    assert_eq!(err.user_message(), "could not reach payment gateway");
}

#[tokio::test]
async fn missing_merchant_id_fails_without_calling_out() {
    let err = gateway("http://127.0.0.1:9", None)
        .request_payment(&request())
        .await
        .expect_err("not configured");
    assert!(matches!(err, GatewayError::NotConfigured));
}

#[tokio::test]
async fn verify_accepts_100_and_101() {
    let router = Router::new().route(
        "/payment/verify.json",
        post(|Json(body): Json<Value>| async move {
            let code = if body["authority"] == "fresh" { 100 } else { 101 };
            Json(json!({ "data": { "code": code, "ref_id": 201 }, "errors": [] }))
        }),
    );
    let base = serve(router).await;
    let client = gateway(&base, Some("merchant-1"));

    let fresh = client.verify_payment("fresh", 150_000).await.expect("verified");
    assert_eq!(fresh.ref_id, Some(201));
    assert!(!fresh.already_verified);

    let repeat = client.verify_payment("again", 150_000).await.expect("verified");
    assert!(repeat.already_verified);
}

#[tokio::test]
async fn verify_failure_code_is_rejected() {
    let router = Router::new().route(
        "/payment/verify.json",
        post(|| async {
            Json(json!({ "data": [], "errors": { "code": -51, "message": "Session is not valid" } }))
        }),
    );
    let base = serve(router).await;

    let err = gateway(&base, Some("merchant-1"))
        .verify_payment("A1", 150_000)
        .await
        .expect_err("failed verification");
    assert_eq!(err.user_message(), "Session is not valid");
}

use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::screening::evaluation::ScoringConfig;
use crate::screening::history::RetentionPolicy;
use crate::screening::router::{screening_router, statistics_handler};
use crate::screening::service::ScreeningService;

fn service() -> Arc<ScreeningService> {
    Arc::new(ScreeningService::new(
        ScoringConfig::default(),
        RetentionPolicy::unbounded(),
    )
    .expect("default config is valid"))
}

fn json_request(uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(payload).expect("serialize payload"),
        ))
        .expect("request")
}

#[tokio::test]
async fn post_certificate_returns_score_and_decision() {
    let service = service();
    let router = screening_router(service.clone());
    let mut payload = serde_json::to_value(clean_submission()).expect("serialize submission");
    payload["student_wallet_address"] = json!("0x0000000000000000000000000000000000000000");

    let response = router
        .oneshot(json_request("/api/v1/screening/certificates", &payload))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["score"]["certificate_id"], json!("cert-clean"));
    assert_eq!(body["score"]["risk_score"], json!(25));
    assert_eq!(body["score"]["risk_level"], json!("low"));
    assert_eq!(body["score"]["flags"], json!(["suspicious_wallet"]));
    assert_eq!(body["score"]["details"][0]["type"], json!("wallet_analysis"));
    assert_eq!(body["decision"]["action"], json!("proceed"));
    assert_eq!(service.history_len(), 1);
}

#[tokio::test]
async fn post_certificate_without_id_gets_one_assigned() {
    let router = screening_router(service());
    let mut payload = serde_json::to_value(clean_submission()).expect("serialize submission");
    payload
        .as_object_mut()
        .expect("object payload")
        .remove("certificate_id");

    let response = router
        .oneshot(json_request("/api/v1/screening/certificates", &payload))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let id = body["score"]["certificate_id"]
        .as_str()
        .expect("assigned id");
    assert!(id.starts_with("cert-"));
}

#[tokio::test]
async fn post_certificate_missing_fields_is_unprocessable() {
    let service = service();
    let router = screening_router(service.clone());

    let response = router
        .oneshot(json_request(
            "/api/v1/screening/certificates",
            &json!({ "student_name": "Priya Sharma" }),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(service.history_len(), 0);
}

#[tokio::test]
async fn statistics_route_reports_running_totals() {
    let service = service();
    service.screen_at(&clean_submission(), now());
    let router = screening_router(service);

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/screening/statistics")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["total_certificates_analyzed"], json!(1));
    assert_eq!(body["history_size"], json!(1));
    assert_eq!(body["tier_counts"]["low"], json!(1));
    assert_eq!(body["tier_counts"]["critical"], json!(0));
}

#[tokio::test]
async fn statistics_handler_on_fresh_service_is_all_zero() {
    let response = statistics_handler(State(service())).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["total_certificates_analyzed"], json!(0));
    assert_eq!(body["fraud_detection_rate"], json!(0.0));
    assert!(body.get("last_analysis").is_none());
}

#[tokio::test]
async fn batch_route_screens_rows_and_reports_rejections() {
    let service = service();
    let router = screening_router(service.clone());
    let csv = "studentName,email,walletAddress,course,cgpa,grade,issueDate,institutionName\n\
        Priya Sharma,priya.sharma@iitd.ac.in,0x8ba1f109551bD432803012645Ac136ddd64DBA72,B.Tech,8.7,A,2024-06-12,\n\
        ,missing.name@iitd.ac.in,0x71C7656EC7ab88b098defB751B7401B5f6d8976F,B.Tech,,,2024-06-12,\n";

    let response = router
        .oneshot(json_request(
            "/api/v1/screening/batch",
            &json!({ "csv": csv, "default_institution": "Indian Institute of Technology Delhi" }),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["screened"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["rejected"][0]["row"], json!(2));
    assert_eq!(body["warnings"], json!([]));
    assert_eq!(service.history_len(), 1);
}

#[tokio::test]
async fn batch_route_rejects_malformed_csv() {
    let router = screening_router(service());
    let csv = "studentName,email,walletAddress,course,issueDate\n\
        Priya Sharma,priya.sharma@iitd.ac.in\n";

    let response = router
        .oneshot(json_request("/api/v1/screening/batch", &json!({ "csv": csv })))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("invalid certificate batch CSV"));
}

//! Public routes exercised through the full middleware stack.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;

use nearby_integration_tests::{
    TEST_CLIENT_IP, json_body, send, test_app, test_app_with, test_config,
};

fn places_request(path: &str, body: &serde_json::Value) -> Request<Body> {
    Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", TEST_CLIENT_IP)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_is_ok() {
    let response = send(test_app(), Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_fails_without_database() {
    let response = send(
        test_app(),
        Request::get("/health/ready").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_responses_carry_security_headers_and_request_id() {
    let response = send(
        test_app(),
        Request::get("/health")
            .header("x-request-id", "req-123")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    let headers = response.headers();
    assert_eq!(headers["x-request-id"], "req-123");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(
        headers["content-security-policy"]
            .to_str()
            .unwrap()
            .contains("https://maps.googleapis.com")
    );
}

#[tokio::test]
async fn test_search_rejects_half_a_coordinate_pair() {
    let response = send(
        test_app(),
        Request::get("/api/listings?lat=45.5").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_rejects_out_of_range_coordinates() {
    let response = send(
        test_app(),
        Request::get("/api/listings?lat=91&lng=0").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_places_autocomplete_requires_input() {
    let response = send(
        test_app(),
        places_request("/api/places/autocomplete", &json!({ "input": "   " })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], "input is required");
}

#[tokio::test]
async fn test_places_text_search_without_key_is_server_error() {
    let response = send(
        test_app(),
        places_request("/api/places/textsearch", &json!({ "input": "coffee" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body["error"], "Places API not configured");
}

#[tokio::test]
async fn test_places_details_rejects_unsafe_place_id() {
    let response = send(
        test_app(),
        places_request("/api/places/details", &json!({ "placeId": "../admin" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_maps_config_without_key_is_server_error() {
    let response = send(
        test_app(),
        Request::get("/api/maps/config").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_maps_config_returns_browser_key() {
    let mut config = test_config();
    config.google.maps_api_key = Some("browser-key".to_string());

    let response = send(
        test_app_with(config),
        Request::get("/api/maps/config").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body, json!({ "apiKey": "browser-key" }));
}

#[tokio::test]
async fn test_check_env_reports_booleans_only() {
    let response = send(
        test_app(),
        Request::get("/api/auth/check-env").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let entries = body.as_object().unwrap();
    assert!(entries.contains_key("DATABASE_URL"));
    assert!(entries.contains_key("GOOGLE_PLACES_API_KEY"));
    assert!(entries.values().all(serde_json::Value::is_boolean));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = send(
        test_app(),
        Request::get("/api/nothing-here").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

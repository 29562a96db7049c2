//! Admin API access control without a signed-in session.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};

use nearby_integration_tests::{send, test_app};

async fn status_for(method: Method, uri: &str, body: &str) -> StatusCode {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(test_app(), request).await.status()
}

#[tokio::test]
async fn test_admin_listing_routes_require_sign_in() {
    let cases = [
        (Method::GET, "/api/admin/listings", ""),
        (
            Method::POST,
            "/api/admin/listings",
            r#"{"businessName":"Rosie's Diner"}"#,
        ),
        (Method::GET, "/api/admin/listings/7", ""),
        (Method::PUT, "/api/admin/listings/7", r#"{"featured":true}"#),
        (Method::DELETE, "/api/admin/listings/7", ""),
        (Method::POST, "/api/admin/listings/7/publish", ""),
        (Method::POST, "/api/admin/listings/7/unpublish", ""),
        (Method::POST, "/api/admin/listings/7/feature", r#"{"featured":true}"#),
        (Method::DELETE, "/api/admin/listings/7/images/3", ""),
    ];

    for (method, uri, body) in cases {
        let status = status_for(method.clone(), uri, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[tokio::test]
async fn test_admin_image_upload_requires_sign_in() {
    let request = Request::post("/api/admin/listings/7/images")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
        .body(Body::from("--X--\r\n"))
        .unwrap();
    assert_eq!(send(test_app(), request).await.status(), StatusCode::UNAUTHORIZED);
}

//! Session and sign-in routes.
//!
//! Most tests never reach the session store. The allow-list rejection test
//! runs the full sign-in round trip against a database and a local provider.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;

use nearby_integration_tests::{
    TEST_CLIENT_IP, app_with_provider, database_pool, json_body, send, session_cookie,
    spawn_oauth_provider, test_app, text_body,
};

fn auth_request(uri: &str) -> Request<Body> {
    Request::get(uri)
        .header("x-forwarded-for", TEST_CLIENT_IP)
        .body(Body::empty())
        .unwrap()
}

fn location(response: &axum::http::Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn test_session_reports_signed_out() {
    let response = send(
        test_app(),
        Request::get("/api/session").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["signed_in"], json!(false));
    assert_eq!(body["is_admin"], json!(false));
    assert_eq!(body["capabilities"], json!([]));
    assert!(body["email"].is_null());
}

#[tokio::test]
async fn test_denied_page_is_forbidden() {
    let response = send(
        test_app(),
        Request::get("/auth/denied")
            .header("x-forwarded-for", TEST_CLIENT_IP)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let html = text_body(response).await;
    assert!(html.contains("Access denied"));
}

#[tokio::test]
async fn test_signout_requires_post() {
    let response = send(
        test_app(),
        Request::get("/auth/signout")
            .header("x-forwarded-for", TEST_CLIENT_IP)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_auth_routes_are_rate_limited_per_client() {
    let app = test_app();
    let mut statuses = Vec::new();
    for _ in 0..8 {
        let response = send(
            app.clone(),
            Request::get("/auth/denied")
                .header("x-forwarded-for", "198.51.100.20")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        statuses.push(response.status());
    }

    assert_eq!(statuses[0], StatusCode::FORBIDDEN);
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_callback_without_stored_state_is_denied() {
    let response = send(
        test_app(),
        auth_request("/auth/callback?code=abc&state=forged"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/denied");
    assert!(session_cookie(&response).is_none());
}

#[tokio::test]
async fn test_callback_with_provider_error_is_denied() {
    let response = send(
        test_app(),
        auth_request("/auth/callback?error=access_denied"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/denied");
}

#[tokio::test]
#[ignore = "needs database"]
async fn test_callback_rejects_email_outside_allow_list() {
    const STRANGER: &str = "stranger@elsewhere.test";

    let pool = database_pool().await;
    sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(STRANGER)
        .execute(&pool)
        .await
        .unwrap();

    let provider = spawn_oauth_provider(STRANGER).await;
    let app = app_with_provider(pool.clone(), &provider);

    // Sign-in stores state in a fresh session
    let signin = send(app.clone(), auth_request("/auth/signin")).await;
    assert_eq!(signin.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&signin).unwrap();
    let session_id = cookie.trim_start_matches("nearby_session=").to_string();

    let consent = url::Url::parse(location(&signin)).unwrap();
    assert!(consent.as_str().starts_with(&format!("{provider}/auth?")));
    let state = consent
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap();

    let callback = send(
        app,
        Request::get(format!("/auth/callback?code=stub-code&state={state}"))
            .header("x-forwarded-for", TEST_CLIENT_IP)
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(callback.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&callback), "/auth/denied");

    // Any session cookie left on the response only clears the old one
    if let Some(cleared) = session_cookie(&callback) {
        assert_eq!(cleared, "nearby_session=");
    }

    let (sessions,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM tower_sessions.session WHERE id = $1")
            .bind(&session_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(sessions, 0);

    let (users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(STRANGER)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 0);
}

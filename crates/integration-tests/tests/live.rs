//! Tests against a running site with a migrated database.
//!
//! Start the site (`cargo run -p nearby-site`), then run with `--ignored`.

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode, redirect::Policy};

use nearby_integration_tests::live_base_url;

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
#[ignore = "requires a running site and database"]
async fn test_live_readiness() {
    let response = client()
        .get(format!("{}/health/ready", live_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running site and database"]
async fn test_live_search_returns_count() {
    let response = client()
        .get(format!("{}/api/listings?industry=food", live_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    let listings = body["listings"].as_array().unwrap();
    assert_eq!(usize::try_from(body["count"].as_u64().unwrap()).unwrap(), listings.len());
}

#[tokio::test]
#[ignore = "requires a running site and database"]
async fn test_live_unknown_listing_is_not_found() {
    let response = client()
        .get(format!("{}/api/listings/no-such-listing-999999", live_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running site, database and Google OAuth client"]
async fn test_live_signin_redirects_to_google() {
    let response = client()
        .get(format!("{}/auth/signin", live_base_url()))
        .header("x-forwarded-for", "203.0.113.50")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.starts_with("https://accounts.google.com/"));
    assert!(location.contains("state="));
}

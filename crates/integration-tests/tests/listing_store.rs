//! Listing repository behavior against a real database.
//!
//! Run with `DATABASE_URL=... cargo test -p nearby-integration-tests -- --ignored`.

#![allow(clippy::unwrap_used)]

use nearby_core::{Email, ListingId};
use nearby_site::db::{ListingImageRepository, ListingRepository, NewListing, RepositoryError};
use nearby_site::models::Listing;
use sqlx::PgPool;

use nearby_integration_tests::{TEST_ADMIN_EMAIL, database_pool};

async fn create_listing(pool: &PgPool, name: &str) -> Listing {
    ListingRepository::new(pool)
        .create(&NewListing {
            business_name: name.to_string(),
            address: "1 Main St, Vancouver".to_string(),
            coordinates: None,
            industry: Some("food".to_string()),
            category: None,
            created_by: Email::parse(TEST_ADMIN_EMAIL).unwrap(),
        })
        .await
        .unwrap()
}

async fn image_count(pool: &PgPool, listing_id: ListingId) -> i64 {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM listing_images WHERE listing_id = $1")
            .bind(listing_id)
            .fetch_one(pool)
            .await
            .unwrap();
    count
}

#[tokio::test]
#[ignore = "needs database"]
async fn test_delete_removes_images_then_listing() {
    let pool = database_pool().await;
    let images = ListingImageRepository::new(&pool);

    let doomed = create_listing(&pool, "Harbour Bakery").await;
    let neighbour = create_listing(&pool, "Harbour Books").await;
    for n in 0..2 {
        images
            .insert(doomed.id, &format!("https://cdn.test/{n}.jpg"), Some("listings/x.jpg"))
            .await
            .unwrap();
    }
    images
        .insert(neighbour.id, "https://cdn.test/books.jpg", None)
        .await
        .unwrap();

    // No cascade in the schema: this only succeeds if images go first
    let removed = ListingRepository::new(&pool).delete(doomed.id).await.unwrap();

    assert_eq!(removed.len(), 2);
    assert_eq!(image_count(&pool, doomed.id).await, 0);
    assert!(ListingRepository::new(&pool).get(doomed.id).await.unwrap().is_none());
    assert_eq!(image_count(&pool, neighbour.id).await, 1);

    ListingRepository::new(&pool).delete(neighbour.id).await.unwrap();
}

#[tokio::test]
#[ignore = "needs database"]
async fn test_delete_missing_listing_changes_nothing() {
    let pool = database_pool().await;

    let kept = create_listing(&pool, "Corner Florist").await;
    ListingImageRepository::new(&pool)
        .insert(kept.id, "https://cdn.test/flowers.jpg", None)
        .await
        .unwrap();

    let err = ListingRepository::new(&pool)
        .delete(ListingId::new(i32::MAX))
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::NotFound));
    assert!(ListingRepository::new(&pool).get(kept.id).await.unwrap().is_some());
    assert_eq!(image_count(&pool, kept.id).await, 1);

    ListingRepository::new(&pool).delete(kept.id).await.unwrap();
}

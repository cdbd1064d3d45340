mod common;

use common::{OWNER_ID, PROFILE_ID, TestApp};
use reqwest::StatusCode;
use serde_json::json;
use share_service::services::{GrantStore, token};

#[tokio::test]
async fn views_run_out_exactly_at_the_limit() {
    let app = TestApp::spawn().await;

    let issued = app
        .issue_share(
            OWNER_ID,
            json!({
                "profile_id": PROFILE_ID,
                "allowed_scopes": ["vitals"],
                "expires_in_hours": 24,
                "max_views": 2
            }),
        )
        .await;

    assert_eq!(StatusCode::OK, app.access(&issued.token).await.status());
    assert_eq!(StatusCode::OK, app.access(&issued.token).await.status());
    assert_eq!(
        StatusCode::NOT_FOUND,
        app.access(&issued.token).await.status()
    );

    let stored = app
        .grants
        .find_by_token_hash(&token::hash_token(&issued.token))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.view_count, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_readers_cannot_exceed_the_limit() {
    let app = TestApp::spawn().await;

    const LIMIT: i64 = 3;
    const ATTEMPTS: usize = 10;

    let issued = app
        .issue_share(
            OWNER_ID,
            json!({
                "profile_id": PROFILE_ID,
                "allowed_scopes": ["vitals"],
                "expires_in_hours": 24,
                "max_views": LIMIT
            }),
        )
        .await;

    let mut handles = Vec::with_capacity(ATTEMPTS);
    for _ in 0..ATTEMPTS {
        let client = app.client.clone();
        let url = format!("{}/share/{}", app.address, issued.token);
        handles.push(tokio::spawn(async move {
            client
                .get(url)
                .header("User-Agent", "integration-test")
                .send()
                .await
                .expect("request failed")
                .status()
        }));
    }

    let mut granted = 0;
    let mut denied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::OK => granted += 1,
            StatusCode::NOT_FOUND => denied += 1,
            other => panic!("unexpected status: {}", other),
        }
    }

    assert_eq!(granted, LIMIT as usize);
    assert_eq!(denied, ATTEMPTS - LIMIT as usize);

    // The stored counter never overshoots, no matter how the race went.
    let stored = app
        .grants
        .find_by_token_hash(&token::hash_token(&issued.token))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.view_count, LIMIT);

    // Exactly one audit event per granted view.
    assert_eq!(app.grants.stored_events().len(), LIMIT as usize);
}

#[tokio::test]
async fn unlimited_grants_keep_serving() {
    let app = TestApp::spawn().await;

    let issued = app
        .issue_share(
            OWNER_ID,
            json!({
                "profile_id": PROFILE_ID,
                "allowed_scopes": ["vitals"],
                "expires_in_hours": 24
            }),
        )
        .await;

    for _ in 0..5 {
        assert_eq!(StatusCode::OK, app.access(&issued.token).await.status());
    }

    let stored = app
        .grants
        .find_by_token_hash(&token::hash_token(&issued.token))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.view_count, 5);
    assert_eq!(stored.max_views, None);
}

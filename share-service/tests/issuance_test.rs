mod common;

use common::{OTHER_OWNER_ID, OWNER_ID, PROFILE_ID, TestApp};
use reqwest::StatusCode;
use serde_json::json;
use share_service::services::token;

#[tokio::test]
async fn issuing_a_share_returns_token_url_and_expiry() {
    let app = TestApp::spawn().await;

    let issued = app
        .issue_share(
            OWNER_ID,
            json!({
                "profile_id": PROFILE_ID,
                "allowed_scopes": ["vitals", "medications"],
                "expires_in_hours": 24,
                "max_views": 5
            }),
        )
        .await;

    assert_eq!(issued.token.len(), 64);
    assert!(issued.token.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(issued.share_url.ends_with(&issued.token));
    assert!(issued.expires_at > chrono::Utc::now());
}

#[tokio::test]
async fn raw_token_is_never_persisted() {
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

    use share_service::services::GrantStore;
    let stored = app
        .grants
        .find_by_token_hash(&token::hash_token(&issued.token))
        .await
        .unwrap()
        .expect("grant should be stored under its token hash");

    assert_eq!(stored.token_hash, token::hash_token(&issued.token));
    assert_ne!(stored.token_hash, issued.token);
    assert_eq!(stored.view_count, 0);
    assert!(stored.is_active);
}

#[tokio::test]
async fn empty_scopes_are_rejected_before_anything_is_persisted() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/shares", app.address))
        .header("X-User-ID", OWNER_ID)
        .json(&json!({
            "profile_id": PROFILE_ID,
            "allowed_scopes": [],
            "expires_in_hours": 24
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, response.status());

    use share_service::services::GrantStore;
    let grants = app.grants.find_by_owner(OWNER_ID, None).await.unwrap();
    assert!(grants.is_empty(), "no grant may be persisted");
}

#[tokio::test]
async fn non_positive_and_oversized_ttls_are_rejected() {
    let app = TestApp::spawn().await;

    let zero_ttl = app
        .client
        .post(format!("{}/shares", app.address))
        .header("X-User-ID", OWNER_ID)
        .json(&json!({
            "profile_id": PROFILE_ID,
            "allowed_scopes": ["vitals"],
            "expires_in_hours": 0
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, zero_ttl.status());

    // Policy bound is 90 days; a year is out.
    let oversized = app
        .client
        .post(format!("{}/shares", app.address))
        .header("X-User-ID", OWNER_ID)
        .json(&json!({
            "profile_id": PROFILE_ID,
            "allowed_scopes": ["vitals"],
            "expires_in_hours": 24 * 365
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::BAD_REQUEST, oversized.status());
}

#[tokio::test]
async fn issuing_for_a_profile_you_do_not_own_is_forbidden() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/shares", app.address))
        .header("X-User-ID", OTHER_OWNER_ID)
        .json(&json!({
            "profile_id": PROFILE_ID,
            "allowed_scopes": ["vitals"],
            "expires_in_hours": 24
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::FORBIDDEN, response.status());
}

#[tokio::test]
async fn issuing_for_an_unknown_profile_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/shares", app.address))
        .header("X-User-ID", OWNER_ID)
        .json(&json!({
            "profile_id": "profile-missing",
            "allowed_scopes": ["vitals"],
            "expires_in_hours": 24
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::NOT_FOUND, response.status());
}

#[tokio::test]
async fn resource_ids_must_belong_to_the_shared_profile() {
    let app = TestApp::spawn().await;

    // doc-other belongs to a different profile.
    let response = app
        .client
        .post(format!("{}/shares", app.address))
        .header("X-User-ID", OWNER_ID)
        .json(&json!({
            "profile_id": PROFILE_ID,
            "allowed_scopes": ["documents"],
            "resource_ids": ["doc-a", "doc-other"],
            "expires_in_hours": 24
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::BAD_REQUEST, response.status());

    use share_service::services::GrantStore;
    let grants = app.grants.find_by_owner(OWNER_ID, None).await.unwrap();
    assert!(grants.is_empty());
}

#[tokio::test]
async fn resource_ids_require_an_id_addressable_scope() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/shares", app.address))
        .header("X-User-ID", OWNER_ID)
        .json(&json!({
            "profile_id": PROFILE_ID,
            "allowed_scopes": ["vitals"],
            "resource_ids": ["doc-a"],
            "expires_in_hours": 24
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::BAD_REQUEST, response.status());
}

#[tokio::test]
async fn issuance_requires_an_authenticated_owner() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/shares", app.address))
        .json(&json!({
            "profile_id": PROFILE_ID,
            "allowed_scopes": ["vitals"],
            "expires_in_hours": 24
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(StatusCode::UNAUTHORIZED, response.status());
}

#[tokio::test]
async fn duplicate_scopes_collapse_into_one() {
    let app = TestApp::spawn().await;

    app.issue_share(
        OWNER_ID,
        json!({
            "profile_id": PROFILE_ID,
            "allowed_scopes": ["vitals", "vitals", "medications"],
            "expires_in_hours": 24
        }),
    )
    .await;

    use share_service::services::GrantStore;
    let grants = app.grants.find_by_owner(OWNER_ID, None).await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].allowed_scopes.len(), 2);
}

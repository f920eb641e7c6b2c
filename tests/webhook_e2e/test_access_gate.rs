//! E2E tests: repository read endpoints behind the access gate.

use pr_roast_lib::db::collaborators::CollaboratorRecord;
use pr_roast_lib::entity::account;
use sea_orm::{ActiveModelTrait, Set};

use super::test_helpers::*;

/// The owner sees a repository even with no collaborator rows.
#[actix_rt::test]
async fn test_owner_has_access() {
    let ctx = TestContext::new().await;
    seed_repository(&ctx.pool, 42, "acme", 9001, 555).await;
    ctx.pool.insert_review(42, 7, "Spicy.").await.unwrap();
    let owner = seed_account(&ctx.pool, "owner@example.com", Some((9001, 555))).await;
    let app = create_test_app(&ctx).await;

    let cookie = ctx.session_cookie(&owner);
    let (status, body) = get_json(&app, "/api/v1/repositories/42", Some(cookie)).await;

    assert_eq!(status, 200, "unexpected body: {}", body);
    assert_eq!(body["repository"]["id"], 42);
    assert_eq!(body["collaborators"].as_array().unwrap().len(), 0);
    assert_eq!(body["reviews"][0]["content"], "Spicy.");
}

/// An account with no relation to the repository is forbidden.
#[actix_rt::test]
async fn test_unrelated_account_forbidden() {
    let ctx = TestContext::new().await;
    seed_repository(&ctx.pool, 42, "acme", 9001, 555).await;
    let stranger = seed_account(&ctx.pool, "stranger@example.com", Some((31337, 888))).await;
    let app = create_test_app(&ctx).await;

    for uri in [
        "/api/v1/repositories/42",
        "/api/v1/repositories/42/collaborators",
        "/api/v1/repositories/42/reviews",
    ] {
        let (status, _) = get_json(&app, uri, Some(ctx.session_cookie(&stranger))).await;
        assert_eq!(status, 403, "{} should be forbidden", uri);
    }
}

/// A linked collaborator may read the repository.
#[actix_rt::test]
async fn test_linked_collaborator_has_access() {
    let ctx = TestContext::new().await;
    seed_repository(&ctx.pool, 42, "acme", 9001, 555).await;
    let member = seed_account(&ctx.pool, "member@example.com", None).await;
    ctx.pool
        .upsert_collaborator(&CollaboratorRecord {
            repository_id: 42,
            github_user_id: 5,
            github_login: "octocat".to_string(),
            role: "write".to_string(),
            account_id: Some(member.id),
        })
        .await
        .unwrap();
    let app = create_test_app(&ctx).await;

    let (status, body) = get_json(
        &app,
        "/api/v1/repositories/42/collaborators",
        Some(ctx.session_cookie(&member)),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["collaborators"][0]["github_login"], "octocat");
    assert_eq!(body["collaborators"][0]["is_registered_user"], true);

    let (status, body) = get_json(&app, "/api/v1/account/repos", Some(ctx.session_cookie(&member))).await;
    assert_eq!(status, 200);
    assert_eq!(body["owned"].as_array().unwrap().len(), 0);
    assert_eq!(body["collaborating"][0]["id"], 42);
}

/// An unlinked collaborator row does not grant access.
#[actix_rt::test]
async fn test_unlinked_collaborator_forbidden() {
    let ctx = TestContext::new().await;
    seed_repository(&ctx.pool, 42, "acme", 9001, 555).await;
    let member = seed_account(&ctx.pool, "member@example.com", None).await;
    ctx.pool
        .upsert_collaborator(&CollaboratorRecord {
            repository_id: 42,
            github_user_id: 5,
            github_login: "octocat".to_string(),
            role: "write".to_string(),
            account_id: None,
        })
        .await
        .unwrap();
    let app = create_test_app(&ctx).await;

    let (status, _) =
        get_json(&app, "/api/v1/repositories/42", Some(ctx.session_cookie(&member))).await;
    assert_eq!(status, 403);
}

#[actix_rt::test]
async fn test_unknown_and_disabled_repository_not_found() {
    let ctx = TestContext::new().await;
    seed_repository(&ctx.pool, 42, "acme", 9001, 555).await;
    ctx.pool.set_repository_enabled(42, false).await.unwrap();
    let owner = seed_account(&ctx.pool, "owner@example.com", Some((9001, 555))).await;
    let app = create_test_app(&ctx).await;

    let (status, _) =
        get_json(&app, "/api/v1/repositories/999", Some(ctx.session_cookie(&owner))).await;
    assert_eq!(status, 404);

    let (status, _) =
        get_json(&app, "/api/v1/repositories/42", Some(ctx.session_cookie(&owner))).await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_missing_session_unauthorized() {
    let ctx = TestContext::new().await;
    seed_repository(&ctx.pool, 42, "acme", 9001, 555).await;
    let app = create_test_app(&ctx).await;

    let (status, _) = get_json(&app, "/api/v1/repositories/42", None).await;
    assert_eq!(status, 401);

    let forged = actix_web::cookie::Cookie::new("auth", "not-a-jwt");
    let (status, _) = get_json(&app, "/api/v1/repositories/42", Some(forged)).await;
    assert_eq!(status, 401);
}

/// A disabled account loses access even with a valid session.
#[actix_rt::test]
async fn test_disabled_account_unauthorized() {
    let ctx = TestContext::new().await;
    seed_repository(&ctx.pool, 42, "acme", 9001, 555).await;
    let owner = seed_account(&ctx.pool, "owner@example.com", Some((9001, 555))).await;
    let cookie = ctx.session_cookie(&owner);

    let mut active: account::ActiveModel = owner.into();
    active.enabled = Set(false);
    active.update(ctx.pool.connection()).await.unwrap();
    let app = create_test_app(&ctx).await;

    let (status, _) = get_json(&app, "/api/v1/repositories/42", Some(cookie)).await;
    assert_eq!(status, 401);
}

//! E2E tests: repository and member events.

use pr_roast_lib::db::collaborators::CollaboratorRecord;
use serde_json::json;

use super::test_helpers::*;

async fn seed_collaborator(ctx: &TestContext, repository_id: i64, github_user_id: i64, login: &str) {
    ctx.pool
        .upsert_collaborator(&CollaboratorRecord {
            repository_id,
            github_user_id,
            github_login: login.to_string(),
            role: "write".to_string(),
            account_id: None,
        })
        .await
        .expect("Failed to seed collaborator");
}

/// Deleting a repository removes it with all its reviews and collaborators.
#[actix_rt::test]
async fn test_repository_deleted_cascades() {
    let ctx = TestContext::new().await;
    seed_repository(&ctx.pool, 100, "acme", 9001, 555).await;
    seed_repository(&ctx.pool, 101, "acme", 9001, 555).await;
    for number in 1..=3 {
        ctx.pool
            .insert_review(100, number, "Needs more cowbell.")
            .await
            .unwrap();
    }
    ctx.pool.insert_review(101, 1, "Fine.").await.unwrap();
    seed_collaborator(&ctx, 100, 5, "octocat").await;
    seed_collaborator(&ctx, 101, 5, "octocat").await;
    let app = create_test_app(&ctx).await;

    let payload = repository_payload("deleted", 100, "repo-100", "acme", 9001, 555);
    let (status, _) = send_webhook(&app, "repository", &payload).await;
    assert_eq!(status, 200);

    assert!(ctx.pool.find_repository(100).await.unwrap().is_none());
    assert!(ctx.pool.list_reviews(100).await.unwrap().is_empty());
    assert!(ctx.pool.list_collaborators(100).await.unwrap().is_empty());

    // The sibling repository is untouched
    assert_eq!(ctx.pool.list_reviews(101).await.unwrap().len(), 1);
    assert_eq!(ctx.pool.list_collaborators(101).await.unwrap().len(), 1);
}

/// Created inserts once; a redelivery is a no-op.
#[actix_rt::test]
async fn test_repository_created_inserts_once() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;

    let payload = repository_payload("created", 300, "fresh", "acme", 9001, 555);
    for _ in 0..2 {
        let (status, _) = send_webhook(&app, "repository", &payload).await;
        assert_eq!(status, 200);
    }

    assert_eq!(count_repositories(&ctx.pool).await, 1);
    let repo = ctx.pool.find_repository(300).await.unwrap().unwrap();
    assert_eq!(repo.name, "fresh");
    assert_eq!(repo.installation_id, Some(555));
    assert!(repo.enabled);
}

#[actix_rt::test]
async fn test_repository_renamed_and_transferred() {
    let ctx = TestContext::new().await;
    seed_repository(&ctx.pool, 100, "acme", 9001, 555).await;
    let app = create_test_app(&ctx).await;

    let renamed = repository_payload("renamed", 100, "widgets-v2", "acme", 9001, 555);
    let (status, _) = send_webhook(&app, "repository", &renamed).await;
    assert_eq!(status, 200);
    assert_eq!(ctx.pool.find_repository(100).await.unwrap().unwrap().name, "widgets-v2");

    let transferred = repository_payload("transferred", 100, "widgets-v2", "globex", 31337, 555);
    let (status, _) = send_webhook(&app, "repository", &transferred).await;
    assert_eq!(status, 200);
    let repo = ctx.pool.find_repository(100).await.unwrap().unwrap();
    assert_eq!(repo.owner, "globex");
    assert_eq!(repo.owner_id, 31337);
}

/// member.removed deletes exactly one collaborator row.
#[actix_rt::test]
async fn test_member_removed_deletes_only_that_row() {
    let ctx = TestContext::new().await;
    seed_repository(&ctx.pool, 5, "acme", 9001, 555).await;
    seed_repository(&ctx.pool, 6, "acme", 9001, 555).await;
    seed_collaborator(&ctx, 5, 999, "leaver").await;
    seed_collaborator(&ctx, 5, 1000, "stayer").await;
    seed_collaborator(&ctx, 6, 999, "leaver").await;
    let app = create_test_app(&ctx).await;

    let payload = member_payload("removed", 5, 999, "leaver", None);
    let (status, _) = send_webhook(&app, "member", &payload).await;
    assert_eq!(status, 200);

    assert!(ctx.pool.find_collaborator(5, 999).await.unwrap().is_none());
    assert!(ctx.pool.find_collaborator(5, 1000).await.unwrap().is_some());
    assert!(ctx.pool.find_collaborator(6, 999).await.unwrap().is_some());
    assert_eq!(count_collaborators(&ctx.pool).await, 2);
}

/// member.added links a registered account and records the role.
#[actix_rt::test]
async fn test_member_added_links_account() {
    let ctx = TestContext::new().await;
    seed_repository(&ctx.pool, 5, "acme", 9001, 555).await;
    let account = seed_account(&ctx.pool, "newbie@example.com", Some((1234, 777))).await;
    let app = create_test_app(&ctx).await;

    let changes = json!({ "permission": { "to": "triage" } });
    let payload = member_payload("added", 5, 1234, "newbie", Some(changes));
    let (status, _) = send_webhook(&app, "member", &payload).await;
    assert_eq!(status, 200);

    let row = ctx.pool.find_collaborator(5, 1234).await.unwrap().unwrap();
    assert_eq!(row.role, "triage");
    assert_eq!(row.account_id, Some(account.id));
    assert!(row.is_registered_user);
}

/// member.added without a role falls back to read access.
#[actix_rt::test]
async fn test_member_added_default_role() {
    let ctx = TestContext::new().await;
    seed_repository(&ctx.pool, 5, "acme", 9001, 555).await;
    let app = create_test_app(&ctx).await;

    let payload = member_payload("added", 5, 1234, "newbie", None);
    let (status, _) = send_webhook(&app, "member", &payload).await;
    assert_eq!(status, 200);

    let row = ctx.pool.find_collaborator(5, 1234).await.unwrap().unwrap();
    assert_eq!(row.role, "read");
    assert_eq!(row.account_id, None);
}

/// member.added for a repository the App never imported is skipped.
#[actix_rt::test]
async fn test_member_added_unknown_repository_skipped() {
    let ctx = TestContext::new().await;
    let app = create_test_app(&ctx).await;

    let payload = member_payload("added", 404, 1234, "newbie", None);
    let (status, _) = send_webhook(&app, "member", &payload).await;
    assert_eq!(status, 200);
    assert_eq!(count_collaborators(&ctx.pool).await, 0);
}

#[actix_rt::test]
async fn test_member_edited_changes_role() {
    let ctx = TestContext::new().await;
    seed_repository(&ctx.pool, 5, "acme", 9001, 555).await;
    seed_collaborator(&ctx, 5, 999, "octocat").await;
    let app = create_test_app(&ctx).await;

    let changes = json!({ "permission": { "from": "write", "to": "admin" } });
    let payload = member_payload("edited", 5, 999, "octocat", Some(changes));
    let (status, _) = send_webhook(&app, "member", &payload).await;
    assert_eq!(status, 200);

    let row = ctx.pool.find_collaborator(5, 999).await.unwrap().unwrap();
    assert_eq!(row.role, "admin");
}

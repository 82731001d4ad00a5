mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use portfolio_cms::models::{PostStatus, Role};
use serde_json::json;

fn new_post(slug: &str) -> serde_json::Value {
    json!({
        "title": "Hello world",
        "slug": slug,
        "content": "First post body",
        "tags": ["rust", "axum"],
        "status": "published"
    })
}

// --- Posts ---

#[tokio::test]
async fn test_author_creates_post() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;

    let res = app
        .call(Method::POST, "/api/posts", new_post("hello-world"), Some(&app.cookie_for(&author)))
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json["slug"], "hello-world");
    assert_eq!(res.json["authorId"], author.id.to_string());
    assert_eq!(res.json["viewCount"], 0);
    assert_eq!(res.json["tags"], json!(["rust", "axum"]));
}

#[tokio::test]
async fn test_duplicate_slug_is_400_without_new_row() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;
    let cookie = app.cookie_for(&author);

    let first = app.call(Method::POST, "/api/posts", new_post("same-slug"), Some(&cookie)).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app.call(Method::POST, "/api/posts", new_post("same-slug"), Some(&cookie)).await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert!(!second.error().is_empty());
    assert_eq!(app.repo.posts().iter().filter(|p| p.slug == "same-slug").count(), 1);
}

#[tokio::test]
async fn test_malformed_slug_is_400() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;

    let res = app
        .call(Method::POST, "/api/posts", new_post("Not A Slug"), Some(&app.cookie_for(&author)))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(app.repo.posts().is_empty());
}

#[tokio::test]
async fn test_reader_cannot_create_post() {
    let app = TestApp::new();
    let reader = app.user(Role::Reader, "reader@example.com").await;

    let res = app
        .call(Method::POST, "/api/posts", new_post("nope"), Some(&app.cookie_for(&reader)))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert!(app.repo.posts().is_empty());
}

#[tokio::test]
async fn test_unknown_category_is_400() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;
    let mut body = new_post("with-category");
    body["categoryId"] = json!(uuid::Uuid::new_v4());

    let res = app.call(Method::POST, "/api/posts", body, Some(&app.cookie_for(&author))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_published_listing_hides_drafts_and_paginates() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;
    for i in 0..3 {
        app.post(author.id, &format!("live-{i}"), PostStatus::Published);
    }
    app.post(author.id, "hidden", PostStatus::Draft);

    let res = app.get("/api/posts/published?page=1&limit=2&status=draft", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["items"].as_array().unwrap().len(), 2);
    assert_eq!(res.json["pagination"]["page"], 1);
    assert_eq!(res.json["pagination"]["limit"], 2);
    assert_eq!(res.json["pagination"]["total"], 3);
    assert_eq!(res.json["pagination"]["totalPages"], 2);
    assert!(
        res.json["items"]
            .as_array()
            .unwrap()
            .iter()
            .all(|p| p["status"] == "published")
    );
}

#[tokio::test]
async fn test_admin_listing_filters_by_status_and_search() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;
    app.post(author.id, "rust-tips", PostStatus::Draft);
    app.post(author.id, "cooking", PostStatus::Draft);
    app.post(author.id, "rust-live", PostStatus::Published);
    let cookie = app.cookie_for(&author);

    let drafts = app.get("/api/posts?status=draft", Some(&cookie)).await;
    assert_eq!(drafts.json["pagination"]["total"], 2);

    let rust = app.get("/api/posts?search=RUST", Some(&cookie)).await;
    assert_eq!(rust.json["pagination"]["total"], 2);

    let clamped = app.get("/api/posts?limit=1000&page=0", Some(&cookie)).await;
    assert_eq!(clamped.json["pagination"]["limit"], 100);
    assert_eq!(clamped.json["pagination"]["page"], 1);
}

#[tokio::test]
async fn test_huge_page_number_returns_empty_page() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;
    app.post(author.id, "only-post", PostStatus::Published);

    let public = app
        .get("/api/posts/published?page=9223372036854775807&limit=100", None)
        .await;
    assert_eq!(public.status, StatusCode::OK);
    assert!(public.json["items"].as_array().unwrap().is_empty());
    assert_eq!(public.json["pagination"]["total"], 1);

    let admin = app.user(Role::Admin, "admin@example.com").await;
    let users = app
        .get("/api/users?page=9223372036854775807&limit=100", Some(&app.cookie_for(&admin)))
        .await;
    assert_eq!(users.status, StatusCode::OK);
    assert!(users.json["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_slug_lookup_counts_views_and_hides_drafts() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;
    app.post(author.id, "public-post", PostStatus::Published);
    app.post(author.id, "draft-post", PostStatus::Draft);

    let first = app.get("/api/posts/slug/public-post", None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.json["viewCount"], 1);

    let second = app.get("/api/posts/slug/public-post", None).await;
    assert_eq!(second.json["viewCount"], 2);

    let draft = app.get("/api/posts/slug/draft-post", None).await;
    assert_eq!(draft.status, StatusCode::NOT_FOUND);

    let missing = app.get("/api/posts/slug/missing", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_owner_or_admin_can_modify_post() {
    let app = TestApp::new();
    let owner = app.user(Role::Author, "owner@example.com").await;
    let other = app.user(Role::Author, "other@example.com").await;
    let admin = app.user(Role::Admin, "admin@example.com").await;
    let post = app.post(owner.id, "owned", PostStatus::Draft);
    let uri = format!("/api/posts/{}", post.id);

    let denied = app
        .call(Method::PATCH, &uri, json!({ "title": "Hijacked" }), Some(&app.cookie_for(&other)))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let by_owner = app
        .call(Method::PATCH, &uri, json!({ "title": "Edited" }), Some(&app.cookie_for(&owner)))
        .await;
    assert_eq!(by_owner.status, StatusCode::OK);
    assert_eq!(by_owner.json["title"], "Edited");
    assert_eq!(by_owner.json["slug"], "owned");

    let by_admin = app
        .call(Method::PATCH, &uri, json!({ "status": "published" }), Some(&app.cookie_for(&admin)))
        .await;
    assert_eq!(by_admin.status, StatusCode::OK);
    assert_eq!(by_admin.json["status"], "published");

    let delete_denied = app
        .send(common::json_request(Method::DELETE, &uri, None, Some(&app.cookie_for(&other))))
        .await;
    assert_eq!(delete_denied.status, StatusCode::FORBIDDEN);

    let deleted = app
        .send(common::json_request(Method::DELETE, &uri, None, Some(&app.cookie_for(&owner))))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(app.repo.posts().is_empty());
}

#[tokio::test]
async fn test_patch_to_taken_slug_is_400() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;
    app.post(author.id, "taken", PostStatus::Draft);
    let post = app.post(author.id, "mine", PostStatus::Draft);

    let res = app
        .call(
            Method::PATCH,
            &format!("/api/posts/{}", post.id),
            json!({ "slug": "taken" }),
            Some(&app.cookie_for(&author)),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    // Keeping its own slug is not a conflict.
    let same = app
        .call(
            Method::PATCH,
            &format!("/api/posts/{}", post.id),
            json!({ "slug": "mine" }),
            Some(&app.cookie_for(&author)),
        )
        .await;
    assert_eq!(same.status, StatusCode::OK);
}

#[tokio::test]
async fn test_put_replaces_post() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;
    let post = app.post(author.id, "before", PostStatus::Draft);

    let res = app
        .call(
            Method::PUT,
            &format!("/api/posts/{}", post.id),
            json!({ "title": "After", "slug": "after", "content": "New body" }),
            Some(&app.cookie_for(&author)),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["slug"], "after");
    assert_eq!(res.json["status"], "draft");
    assert_eq!(res.json["tags"], json!([]));
}

#[tokio::test]
async fn test_get_missing_post_is_404() {
    let app = TestApp::new();
    let admin = app.user(Role::Admin, "admin@example.com").await;
    let res = app
        .get(&format!("/api/posts/{}", uuid::Uuid::new_v4()), Some(&app.cookie_for(&admin)))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

// --- Categories ---

#[tokio::test]
async fn test_category_create_requires_session() {
    let app = TestApp::new();
    let res = app
        .call(Method::POST, "/api/categories", json!({ "name": "Rust", "slug": "rust" }), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_category_create_and_duplicate_slug() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;
    let cookie = app.cookie_for(&author);

    let created = app
        .call(Method::POST, "/api/categories", json!({ "name": "Rust", "slug": "rust" }), Some(&cookie))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json["postCount"], 0);

    let duplicate = app
        .call(Method::POST, "/api/categories", json!({ "name": "Rust 2", "slug": "rust" }), Some(&cookie))
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_category_listing_is_public_with_counts() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;
    let category = app.category("travel");
    let post = app.post(author.id, "trip", PostStatus::Published);
    app.call(
        Method::PATCH,
        &format!("/api/posts/{}", post.id),
        json!({ "categoryId": category.id }),
        Some(&app.cookie_for(&author)),
    )
    .await;

    let res = app.get("/api/categories", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json[0]["slug"], "travel");
    assert_eq!(res.json[0]["postCount"], 1);

    let single = app.get(&format!("/api/categories/{}", category.id), None).await;
    assert_eq!(single.status, StatusCode::OK);
}

#[tokio::test]
async fn test_category_delete_detaches_posts() {
    let app = TestApp::new();
    let admin = app.user(Role::Admin, "admin@example.com").await;
    let cookie = app.cookie_for(&admin);
    let category = app.category("news");
    let post = app.post(admin.id, "headline", PostStatus::Published);
    app.call(
        Method::PATCH,
        &format!("/api/posts/{}", post.id),
        json!({ "categoryId": category.id }),
        Some(&cookie),
    )
    .await;

    let res = app
        .send(common::json_request(
            Method::DELETE,
            &format!("/api/categories/{}", category.id),
            None,
            Some(&cookie),
        ))
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let remaining = app.repo.posts();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].category_id, None);

    let fetched = app.get(&format!("/api/posts/{}", post.id), Some(&cookie)).await;
    assert_eq!(fetched.json["categoryId"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_category_delete_needs_admin() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;
    let category = app.category("misc");

    let res = app
        .send(common::json_request(
            Method::DELETE,
            &format!("/api/categories/{}", category.id),
            None,
            Some(&app.cookie_for(&author)),
        ))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

// --- Comments ---

#[tokio::test]
async fn test_comment_flow() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;
    let reader = app.user(Role::Reader, "reader@example.com").await;
    let stranger = app.user(Role::Reader, "stranger@example.com").await;
    let post = app.post(author.id, "discussed", PostStatus::Published);

    let anonymous = app
        .call(Method::POST, "/api/comments", json!({ "postId": post.id, "content": "Hi" }), None)
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let created = app
        .call(
            Method::POST,
            "/api/comments",
            json!({ "postId": post.id, "content": "Great post" }),
            Some(&app.cookie_for(&reader)),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json["authorName"], reader.name);
    let comment_id = created.json["id"].as_str().unwrap().to_string();

    let listed = app.get(&format!("/api/comments?postId={}", post.id), None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.json.as_array().unwrap().len(), 1);

    let uri = format!("/api/comments/{}", comment_id);
    let denied = app
        .send(common::json_request(Method::DELETE, &uri, None, Some(&app.cookie_for(&stranger))))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let deleted = app
        .send(common::json_request(Method::DELETE, &uri, None, Some(&app.cookie_for(&reader))))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_comment_on_missing_post_is_404() {
    let app = TestApp::new();
    let reader = app.user(Role::Reader, "reader@example.com").await;
    let res = app
        .call(
            Method::POST,
            "/api/comments",
            json!({ "postId": uuid::Uuid::new_v4(), "content": "Hello?" }),
            Some(&app.cookie_for(&reader)),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_draft_comments_stay_private() {
    let app = TestApp::new();
    let author = app.user(Role::Author, "author@example.com").await;
    let reader = app.user(Role::Reader, "reader@example.com").await;
    let draft = app.post(author.id, "unreleased", PostStatus::Draft);

    let listed = app.get(&format!("/api/comments?postId={}", draft.id), None).await;
    assert_eq!(listed.status, StatusCode::NOT_FOUND);

    let body = json!({ "postId": draft.id, "content": "First!" });
    let stranger = app
        .call(Method::POST, "/api/comments", body.clone(), Some(&app.cookie_for(&reader)))
        .await;
    assert_eq!(stranger.status, StatusCode::NOT_FOUND);

    let owner = app
        .call(Method::POST, "/api/comments", body, Some(&app.cookie_for(&author)))
        .await;
    assert_eq!(owner.status, StatusCode::CREATED);
}

// --- Contact ---

#[tokio::test]
async fn test_contact_is_public_and_validated() {
    let app = TestApp::new();

    let ok = app
        .call(
            Method::POST,
            "/api/contact",
            json!({ "name": "Visitor", "email": "visitor@example.com", "message": "Hello" }),
            None,
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.json["message"].is_string());

    let bad = app
        .call(
            Method::POST,
            "/api/contact",
            json!({ "name": "Visitor", "email": "not-an-email", "message": "Hello" }),
            None,
        )
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

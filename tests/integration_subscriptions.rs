mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::TestApp;
use lectern_models::CourseId;
use serde_json::json;

#[tokio::test]
async fn test_toggle_twice_restores_state() {
    let app = TestApp::new();
    let alice = app.create_user().await;
    let course = app.create_course(&alice, "Subscribable").await;
    let course_id: CourseId = course.parse().unwrap();

    let (status, body) = app
        .post("/subscription/create/", &alice, json!({ "course": course }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Added");
    assert_eq!(body["subscribed"], true);
    assert_eq!(app.store.subscription_rows(alice.id, course_id).await, 1);

    let (_, body) = app.get(&format!("/course/{course}/"), &alice).await;
    assert_eq!(body["is_subscribed"], true);

    let (status, body) = app
        .post("/subscription/create/", &alice, json!({ "course": course }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Removed");
    assert_eq!(body["subscribed"], false);
    assert_eq!(app.store.subscription_rows(alice.id, course_id).await, 0);

    let (_, body) = app.get(&format!("/course/{course}/"), &alice).await;
    assert_eq!(body["is_subscribed"], false);
}

#[tokio::test]
async fn test_toggle_unknown_course_is_not_found() {
    let app = TestApp::new();
    let alice = app.create_user().await;

    let (status, body) = app
        .post(
            "/subscription/create/",
            &alice,
            json!({ "course": uuid::Uuid::new_v4() }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Course not found");
    assert_eq!(app.store.subscription_count().await, 0);
}

#[tokio::test]
async fn test_toggle_any_existing_course() {
    let app = TestApp::new();
    let alice = app.create_user().await;
    let bob = app.create_user().await;
    let course = app.create_course(&alice, "Public updates").await;

    let (status, body) = app
        .post("/subscription/create/", &bob, json!({ "course": course }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Added");

    // Alice's own state is untouched.
    let (_, body) = app.get(&format!("/course/{course}/"), &alice).await;
    assert_eq!(body["is_subscribed"], false);
}

#[tokio::test]
async fn test_toggle_requires_token() {
    let app = TestApp::new();
    let (status, _) = app
        .request(
            "POST",
            "/subscription/create/",
            None,
            Some(json!({ "course": uuid::Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_toggle_rejects_malformed_body() {
    let app = TestApp::new();
    let alice = app.create_user().await;

    let (status, body) = app
        .post("/subscription/create/", &alice, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "course is required");

    let (status, _) = app
        .post("/subscription/create/", &alice, json!({ "course": "not-a-uuid" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_toggles_keep_parity() {
    for n in [2usize, 3, 8, 11] {
        let app = Arc::new(TestApp::new());
        let owner = app.create_user().await;
        let subscriber = Arc::new(app.create_user().await);
        let course = app.create_course(&owner, "Contended").await;
        let course_id: CourseId = course.parse().unwrap();

        let handles: Vec<_> = (0..n)
            .map(|_| {
                let app = app.clone();
                let subscriber = subscriber.clone();
                let course = course.clone();
                tokio::spawn(async move {
                    app.post(
                        "/subscription/create/",
                        &subscriber,
                        json!({ "course": course }),
                    )
                    .await
                })
            })
            .collect();

        let mut added = 0i64;
        let mut removed = 0i64;
        for handle in handles {
            let (status, body) = handle.await.unwrap();
            assert_eq!(status, StatusCode::OK);
            match body["message"].as_str().unwrap() {
                "Added" => added += 1,
                "Removed" => removed += 1,
                other => panic!("unexpected outcome {other}"),
            }
        }

        let rows = app.store.subscription_rows(subscriber.id, course_id).await;
        assert!(rows <= 1, "n={n}: {rows} rows");
        assert_eq!(rows, n % 2, "n={n}");
        assert_eq!(added - removed, rows as i64, "n={n}");
    }
}

mod common;

use axum::http::StatusCode;
use common::{TestApp, ids, sorted};
use serde_json::json;

#[tokio::test]
async fn test_create_lesson_owner_is_actor() {
    let app = TestApp::new();
    let alice = app.create_user().await;
    let bob = app.create_user().await;
    let course = app.create_course(&alice, "Course").await;

    let (status, body) = app
        .post(
            "/lessons/create/",
            &alice,
            json!({
                "title": "Lifetimes",
                "course_id": course,
                "owner_id": bob.id.to_string(),
                "video_url": "https://www.youtube.com/watch?v=abc"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["owner_id"], alice.id.to_string());
    assert_eq!(body["course_id"], course);
    assert_eq!(body["video_url"], "https://www.youtube.com/watch?v=abc");
}

#[tokio::test]
async fn test_create_lesson_unknown_course() {
    let app = TestApp::new();
    let alice = app.create_user().await;

    let (status, body) = app
        .post(
            "/lessons/create/",
            &alice,
            json!({ "title": "Orphan", "course_id": uuid::Uuid::new_v4() }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Course not found");
}

#[tokio::test]
async fn test_create_lesson_in_another_users_course() {
    let app = TestApp::new();
    let alice = app.create_user().await;
    let bob = app.create_user().await;
    let course = app.create_course(&alice, "Open course").await;

    let (status, body) = app
        .post(
            "/lessons/create/",
            &bob,
            json!({ "title": "Guest lesson", "course_id": course }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["owner_id"], bob.id.to_string());
}

#[tokio::test]
async fn test_moderator_cannot_create_lesson() {
    let app = TestApp::new();
    let alice = app.create_user().await;
    let moderator = app.create_moderator().await;
    let course = app.create_course(&alice, "Course").await;

    let (status, body) = app
        .post(
            "/lessons/create/",
            &moderator,
            json!({ "title": "Nope", "course_id": course }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You do not have permission to create this lesson");
}

#[tokio::test]
async fn test_create_lesson_rejects_non_youtube_video() {
    let app = TestApp::new();
    let alice = app.create_user().await;
    let course = app.create_course(&alice, "Course").await;

    let (status, body) = app
        .post(
            "/lessons/create/",
            &alice,
            json!({
                "title": "Elsewhere",
                "course_id": course,
                "video_url": "https://vimeo.com/42"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("Only youtube.com video links are allowed")
    );
}

#[tokio::test]
async fn test_list_lessons_scoped_to_owner() {
    let app = TestApp::new();
    let alice = app.create_user().await;
    let bob = app.create_user().await;
    let course = app.create_course(&alice, "Shared").await;

    let a1 = app.create_lesson(&alice, &course, "A1").await;
    let b1 = app.create_lesson(&bob, &course, "B1").await;
    let b2 = app.create_lesson(&bob, &course, "B2").await;

    let (status, body) = app.get("/lessons/", &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![a1.clone()]);

    let (_, body) = app.get("/lessons/", &bob).await;
    assert_eq!(ids(&body), sorted(vec![b1.clone(), b2.clone()]));

    let moderator = app.create_moderator().await;
    let (_, body) = app.get("/lessons/", &moderator).await;
    assert_eq!(ids(&body), sorted(vec![a1, b1, b2]));
    assert_eq!(body["meta"]["total"], 3);
}

#[tokio::test]
async fn test_other_user_cannot_touch_lesson() {
    let app = TestApp::new();
    let alice = app.create_user().await;
    let bob = app.create_user().await;
    let course = app.create_course(&alice, "Course").await;
    let lesson = app.create_lesson(&alice, &course, "Mine").await;

    let (status, _) = app.get(&format!("/lessons/{lesson}/"), &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .put(
            &format!("/lessons/{lesson}/update/"),
            &bob,
            json!({ "title": "Stolen" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .delete(&format!("/lessons/{lesson}/delete/"), &bob)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get(&format!("/lessons/{lesson}/"), &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Mine");
}

#[tokio::test]
async fn test_owner_updates_and_deletes_lesson() {
    let app = TestApp::new();
    let alice = app.create_user().await;
    let course = app.create_course(&alice, "Course").await;
    let lesson = app.create_lesson(&alice, &course, "Draft").await;

    let (status, body) = app
        .patch(
            &format!("/lessons/{lesson}/update/"),
            &alice,
            json!({ "title": "Final" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Final");
    assert_eq!(body["course_id"], course);

    let (status, _) = app
        .delete(&format!("/lessons/{lesson}/delete/"), &alice)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/lessons/{lesson}/"), &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_moderator_reviews_but_cannot_delete_lesson() {
    let app = TestApp::new();
    let alice = app.create_user().await;
    let moderator = app.create_moderator().await;
    let course = app.create_course(&alice, "Course").await;
    let lesson = app.create_lesson(&alice, &course, "Review me").await;

    let (status, _) = app.get(&format!("/lessons/{lesson}/"), &moderator).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .put(
            &format!("/lessons/{lesson}/update/"),
            &moderator,
            json!({ "description": "Checked" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Checked");
    assert_eq!(body["owner_id"], alice.id.to_string());

    let (status, _) = app
        .delete(&format!("/lessons/{lesson}/delete/"), &moderator)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_lesson_cannot_move_into_foreign_course() {
    let app = TestApp::new();
    let alice = app.create_user().await;
    let bob = app.create_user().await;
    let alice_course = app.create_course(&alice, "Alice").await;
    let alice_second = app.create_course(&alice, "Alice second").await;
    let bob_course = app.create_course(&bob, "Bob").await;
    let lesson = app.create_lesson(&alice, &alice_course, "Movable").await;
    let uri = format!("/lessons/{lesson}/update/");

    let (status, body) = app
        .patch(&uri, &alice, json!({ "course_id": bob_course }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Course not found");

    let (status, body) = app
        .patch(&uri, &alice, json!({ "course_id": alice_second }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course_id"], alice_second);
}

#[tokio::test]
async fn test_deleting_course_removes_its_lessons() {
    let app = TestApp::new();
    let alice = app.create_user().await;
    let course = app.create_course(&alice, "Doomed").await;
    let lesson = app.create_lesson(&alice, &course, "Gone soon").await;

    let (status, _) = app.delete(&format!("/course/{course}/"), &alice).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/lessons/{lesson}/"), &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lessons_require_token() {
    let app = TestApp::new();
    let (status, _) = app.request("GET", "/lessons/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

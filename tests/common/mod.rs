use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc};
use tower::ServiceExt;
use uuid::Uuid;

use lectern::notifications::CourseUpdateNotifier;
use lectern::router::init_router;
use lectern::state::AppState;
use lectern::store::{MemoryStore, NewUser, UserRepository};
use lectern_auth::create_access_token;
use lectern_config::{CorsConfig, JwtConfig};
use lectern_models::{Course, UserId};

#[allow(dead_code)]
pub struct TestUser {
    pub id: UserId,
    pub email: String,
    pub token: String,
}

/// Hands every updated course to the test through a channel.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<Course>,
}

#[async_trait]
impl CourseUpdateNotifier for RecordingNotifier {
    async fn course_updated(&self, course: Course) {
        let _ = self.tx.send(course);
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub jwt_config: JwtConfig,
    notifications: Mutex<mpsc::UnboundedReceiver<Course>>,
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret-at-least-32-chars".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 7200,
    }
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

#[allow(dead_code)]
impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let jwt_config = test_jwt_config();
        let (tx, rx) = mpsc::unbounded_channel();

        let state = AppState::in_memory(store.clone(), jwt_config.clone(), CorsConfig::default())
            .with_notifier(Arc::new(RecordingNotifier { tx }));

        Self {
            router: init_router(state),
            store,
            jwt_config,
            notifications: Mutex::new(rx),
        }
    }

    /// Inserts a user directly into the store and signs an access token.
    ///
    /// The stored hash is not a real bcrypt hash, so these users cannot log
    /// in through `/users/login/`.
    pub async fn create_user(&self) -> TestUser {
        let email = generate_unique_email();
        let user = self
            .store
            .insert_user(NewUser {
                email: email.clone(),
                password_hash: "not-a-real-hash".to_string(),
                phone: None,
                city: None,
            })
            .await
            .unwrap()
            .unwrap();

        let token = create_access_token(user.id.into_inner(), &email, &self.jwt_config).unwrap();

        TestUser {
            id: user.id,
            email,
            token,
        }
    }

    pub async fn create_moderator(&self) -> TestUser {
        let user = self.create_user().await;
        self.store.set_moderator(user.id, true).await;
        user
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, body)
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request("GET", uri, Some(&user.token), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(&user.token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, Some(&user.token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request("PATCH", uri, Some(&user.token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request("DELETE", uri, Some(&user.token), None).await
    }

    /// Creates a course as `owner` and returns its id.
    pub async fn create_course(&self, owner: &TestUser, title: &str) -> String {
        let (status, body) = self
            .post("/course/", owner, json!({ "title": title, "price": 100 }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create course failed: {body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Creates a lesson in `course_id` as `owner` and returns its id.
    pub async fn create_lesson(&self, owner: &TestUser, course_id: &str, title: &str) -> String {
        let (status, body) = self
            .post(
                "/lessons/create/",
                owner,
                json!({ "title": title, "course_id": course_id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create lesson failed: {body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Waits for the next course update notification.
    pub async fn next_notification(&self) -> Option<Course> {
        let mut rx = self.notifications.lock().await;
        tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .ok()
            .flatten()
    }

    pub async fn no_pending_notification(&self) -> bool {
        let mut rx = self.notifications.lock().await;
        tokio::time::timeout(std::time::Duration::from_millis(100), rx.recv())
            .await
            .is_err()
    }
}

#[allow(dead_code)]
pub fn ids(body: &Value) -> Vec<String> {
    let mut ids: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}

#[allow(dead_code)]
pub fn sorted(mut ids: Vec<String>) -> Vec<String> {
    ids.sort();
    ids
}

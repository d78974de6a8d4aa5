/// HTTP-level tests: drive the full router (identity middleware, login gate,
/// handlers, error mapping) against an in-memory database.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use scribe_api::auth::{AppState, AppStateInner};
use scribe_api::images::ImageStore;
use scribe_db::Database;

const SECRET: &str = "test-secret";

struct TestApp {
    router: Router,
    state: AppState,
    _media: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let media = tempfile::tempdir().unwrap();
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: SECRET.into(),
            images: ImageStore::new(media.path().to_path_buf()).await.unwrap(),
            page_size: 10,
        });

        Self {
            router: scribe_api::router(state.clone()),
            state,
            _media: media,
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn get_json(&self, uri: &str, token: Option<&str>) -> Value {
        let response = self.send("GET", uri, token, None).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
        json_body(response).await
    }

    async fn register(&self, username: &str) -> String {
        let response = self
            .send(
                "POST",
                "/auth/register/",
                None,
                Some(json!({ "username": username, "password": "password123" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await["token"].as_str().unwrap().to_string()
    }

    /// Publish a post and return its id (the newest post on the index).
    async fn publish(&self, token: &str, text: &str) -> i64 {
        let response = self
            .send("POST", "/new/", Some(token), Some(json!({ "text": text })))
            .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/");

        let index = self.get_json("/", None).await;
        index["posts"][0]["id"].as_i64().unwrap()
    }
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn texts(feed: &Value) -> Vec<String> {
    feed["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["text"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn new_post_requires_login() {
    let app = TestApp::new().await;

    let response = app.send("GET", "/new/", None, None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/auth/login/?next=/new/");

    let token = app.register("sarah").await;
    let response = app.send("GET", "/new/", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn published_post_is_visible_everywhere() {
    let app = TestApp::new().await;
    let token = app.register("sarah").await;
    let post_id = app.publish(&token, "Test post text").await;

    assert_eq!(texts(&app.get_json("/", None).await), vec!["Test post text"]);
    assert_eq!(texts(&app.get_json("/sarah/", None).await), vec!["Test post text"]);

    let detail = app.get_json(&format!("/sarah/{}/", post_id), None).await;
    assert_eq!(detail["post"]["text"], "Test post text");
    assert_eq!(detail["post"]["author_username"], "sarah");
}

#[tokio::test]
async fn only_authenticated_users_can_comment() {
    let app = TestApp::new().await;
    let token = app.register("sarah").await;
    let post_id = app.publish(&token, "hello").await;
    let comment_uri = format!("/sarah/{}/comment/", post_id);

    let response = app
        .send("POST", &comment_uri, Some(&token), Some(json!({ "text": "Authorized comment" })))
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("/sarah/{}/", post_id));

    let response = app
        .send("POST", &comment_uri, None, Some(json!({ "text": "Anonymous comment" })))
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("/auth/login/?next={}", comment_uri));

    let detail = app.get_json(&format!("/sarah/{}/", post_id), None).await;
    let comments: Vec<&str> = detail["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["text"].as_str().unwrap())
        .collect();
    assert_eq!(comments, vec!["Authorized comment"]);
    assert_eq!(detail["post"]["comment_count"], 1);
}

#[tokio::test]
async fn follow_feed_only_shows_followed_authors() {
    let app = TestApp::new().await;
    let sarah = app.register("sarah").await;
    let john = app.register("john").await;
    let terminator = app.register("terminator").await;
    app.publish(&sarah, "Test post text").await;

    let response = app.send("POST", "/sarah/follow/", Some(&john), None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/sarah/");

    let feed = app.get_json("/follow/", Some(&john)).await;
    assert_eq!(texts(&feed), vec!["Test post text"]);

    let feed = app.get_json("/follow/", Some(&terminator)).await;
    assert!(texts(&feed).is_empty());
    assert_eq!(feed["page"]["total_pages"], 0);

    let response = app.send("GET", "/follow/", None, None).await;
    assert_eq!(location(&response), "/auth/login/?next=/follow/");
}

#[tokio::test]
async fn follow_and_unfollow_update_counts() {
    let app = TestApp::new().await;
    let sarah = app.register("sarah").await;
    app.register("john").await;

    app.send("POST", "/john/follow/", Some(&sarah), None).await;
    app.send("POST", "/john/follow/", Some(&sarah), None).await;
    let profile = app.get_json("/john/", Some(&sarah)).await;
    assert_eq!(profile["profile"]["followers"], 1);
    assert_eq!(profile["profile"]["following"], true);

    app.send("POST", "/john/unfollow/", Some(&sarah), None).await;
    app.send("POST", "/john/unfollow/", Some(&sarah), None).await;
    let profile = app.get_json("/john/", Some(&sarah)).await;
    assert_eq!(profile["profile"]["followers"], 0);
    assert_eq!(profile["profile"]["following"], false);

    // Anonymous viewers get counts but no following flag
    let profile = app.get_json("/john/", None).await;
    assert!(profile["profile"].get("following").is_none());
}

#[tokio::test]
async fn unknown_pages_are_404() {
    let app = TestApp::new().await;
    let token = app.register("sarah").await;
    let post_id = app.publish(&token, "hello").await;

    for uri in [
        "/abrakadabra/".to_string(),
        "/group/abrakadabra/".to_string(),
        format!("/sarah/{}/", post_id + 1),
        "/media/posts/not-a-file".to_string(),
    ] {
        let response = app.send("GET", &uri, None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {}", uri);
    }
}

#[tokio::test]
async fn only_the_author_can_edit() {
    let app = TestApp::new().await;
    let sarah = app.register("sarah").await;
    let john = app.register("john").await;
    let post_id = app.publish(&sarah, "original").await;
    let edit_uri = format!("/sarah/{}/edit/", post_id);
    let post_uri = format!("/sarah/{}/", post_id);

    let response = app
        .send("POST", &edit_uri, Some(&john), Some(json!({ "text": "hijacked" })))
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), post_uri);
    assert_eq!(app.get_json(&post_uri, None).await["post"]["text"], "original");

    let response = app
        .send("POST", &edit_uri, Some(&sarah), Some(json!({ "text": "New post text (edited)" })))
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), post_uri);

    assert_eq!(texts(&app.get_json("/", None).await), vec!["New post text (edited)"]);
    assert_eq!(
        app.get_json(&post_uri, None).await["post"]["text"],
        "New post text (edited)"
    );
}

#[tokio::test]
async fn edited_image_is_served() {
    let app = TestApp::new().await;
    let sarah = app.register("sarah").await;
    let post_id = app.publish(&sarah, "with image").await;
    let image = b"\x89PNG\r\n\x1a\nnot really a png";

    let response = app
        .send(
            "POST",
            &format!("/sarah/{}/edit/", post_id),
            Some(&sarah),
            Some(json!({ "text": "fred", "image": B64.encode(image) })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let detail = app.get_json(&format!("/sarah/{}/", post_id), None).await;
    let reference = detail["post"]["image"].as_str().unwrap().to_string();
    assert!(reference.starts_with("posts/"));

    // Every listing carries the image too
    for uri in ["/", "/sarah/"] {
        assert_eq!(app.get_json(uri, None).await["posts"][0]["image"], reference.as_str());
    }

    let response = app.send("GET", &format!("/media/{}", reference), None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], &image[..]);
}

#[tokio::test]
async fn bad_post_input_is_400() {
    let app = TestApp::new().await;
    let sarah = app.register("sarah").await;

    let response = app
        .send("POST", "/new/", Some(&sarah), Some(json!({ "text": "   " })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send("POST", "/new/", Some(&sarah), Some(json!({ "text": "hi", "image": "%%%" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send("POST", "/new/", Some(&sarah), Some(json!({ "text": "hi", "group": "nope" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn group_feed_and_form_choices() {
    let app = TestApp::new().await;
    app.state.db.create_group("Skynet", "skynet", "Machines").unwrap();
    let sarah = app.register("sarah").await;

    let form = app.get_json("/new/", Some(&sarah)).await;
    assert_eq!(form["groups"][0]["slug"], "skynet");

    let response = app
        .send("POST", "/new/", Some(&sarah), Some(json!({ "text": "in group", "group": "skynet" })))
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    app.publish(&sarah, "outside").await;

    let feed = app.get_json("/group/skynet/", None).await;
    assert_eq!(feed["group"]["title"], "Skynet");
    assert_eq!(texts(&feed), vec!["in group"]);
}

#[tokio::test]
async fn page_parameter_is_clamped() {
    let app = TestApp::new().await;
    let sarah = app.register("sarah").await;
    for i in 0..25 {
        app.publish(&sarah, &format!("post {}", i)).await;
    }

    let first = app.get_json("/?page=abc", None).await;
    assert_eq!(first["page"]["number"], 1);
    assert_eq!(texts(&first)[0], "post 24");

    let last = app.get_json("/?page=99", None).await;
    assert_eq!(last["page"]["number"], 3);
    assert_eq!(texts(&last).len(), 5);
    assert_eq!(last["page"]["has_next"], false);
}

#[tokio::test]
async fn bad_credentials_are_401_not_a_redirect() {
    let app = TestApp::new().await;
    app.register("sarah").await;

    let response = app
        .send(
            "POST",
            "/auth/login/",
            None,
            Some(json!({ "username": "sarah", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(
            "POST",
            "/auth/login/",
            None,
            Some(json!({ "username": "sarah", "password": "password123" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn reserved_usernames_are_refused() {
    let app = TestApp::new().await;
    let response = app
        .send(
            "POST",
            "/auth/register/",
            None,
            Some(json!({ "username": "follow", "password": "password123" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

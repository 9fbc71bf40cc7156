use std::sync::Arc;

use serde_json::{json, Value};
use warp::http::StatusCode;

use course_admin::environment::{Config, Environment};
use course_admin::identity::{IdentityConfig, DEFAULT_DISPLAY_NAME_HEADER, DEFAULT_EMAIL_HEADER};
use course_admin::repository::Repository;
use course_admin::routes;
use course_admin::store::memory::MemoryStore;
use course_admin::store::{Collection, Document};

const ADMIN: &str = "admin@example.com";

fn make_environment(store: Arc<MemoryStore>) -> Environment {
    let logger = Arc::new(log::discard_logger());
    let repository = Arc::new(Repository::new(store, logger.clone()));
    let identity = Arc::new(IdentityConfig::new(
        DEFAULT_EMAIL_HEADER,
        DEFAULT_DISPLAY_NAME_HEADER,
        IdentityConfig::parse_allowed(ADMIN),
    ));

    Environment::new(logger, repository, identity, Config::new("api"))
}

fn seed_course(store: &MemoryStore, id: &str, title: &str) {
    let fields = json!({ "titleAr": title, "titleEn": "", "descriptionAr": "", "instructor": "", "imageUrl": "" });

    store.seed(
        Collection::Courses,
        Document::new(id, fields.as_object().expect("course fields").clone()),
    );
}

fn signed_in(method: &str, path: &str) -> warp::test::RequestBuilder {
    warp::test::request()
        .method(method)
        .path(path)
        .header("x-forwarded-email", ADMIN)
        .header("x-forwarded-user", "Admin")
}

fn body_of<B: AsRef<[u8]>>(response: &warp::http::Response<B>) -> Value {
    serde_json::from_slice(response.body().as_ref()).expect("parse reply body")
}

fn orders(videos: &Value) -> Vec<i64> {
    videos
        .as_array()
        .expect("videos array")
        .iter()
        .map(|v| v["order"].as_i64().expect("video order"))
        .collect()
}

#[tokio::test]
async fn requests_without_identity_are_unauthenticated() {
    let api = routes::make_api(make_environment(Arc::new(MemoryStore::new())));

    let response = warp::test::request()
        .method("GET")
        .path("/api/courses")
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_of(&response)["operation"], "identity");
}

#[tokio::test]
async fn users_outside_the_allow_list_are_forbidden() {
    let store = Arc::new(MemoryStore::new());
    let api = routes::make_api(make_environment(store.clone()));

    let response = warp::test::request()
        .method("GET")
        .path("/api/courses")
        .header("x-forwarded-email", "guest@example.com")
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn me_reports_the_proxy_identity() {
    let api = routes::make_api(make_environment(Arc::new(MemoryStore::new())));

    let response = signed_in("GET", "/api/me").reply(&api).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("server-timing"));

    let body = body_of(&response);
    assert_eq!(body["email"], ADMIN);
    assert_eq!(body["display_name"], "Admin");
}

#[tokio::test]
async fn new_videos_are_appended_in_order() {
    let store = Arc::new(MemoryStore::new());
    seed_course(&store, "c1", "دورة");
    let api = routes::make_api(make_environment(store.clone()));

    let mut last = Value::Null;

    for (n, title) in ["أ", "ب", "ج"].iter().enumerate() {
        let response = signed_in("POST", "/api/videos?course=c1")
            .json(&json!({ "course_id": "c1", "title": { "ar": title }, "youtube_id": "https://youtu.be/dQw4w9WgXcQ" }))
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::CREATED, "video #{}", n + 1);
        last = body_of(&response);
    }

    assert_eq!(last["video"]["order"], 3);
    assert_eq!(last["video"]["youtube_id"], "dQw4w9WgXcQ");
    assert_eq!(orders(&last["videos"]), vec![1, 2, 3]);

    let response = signed_in("GET", "/api/courses/c1").reply(&api).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(orders(&body_of(&response)["videos"]), vec![1, 2, 3]);
}

#[tokio::test]
async fn deleting_a_video_leaves_a_gap() {
    let store = Arc::new(MemoryStore::new());
    seed_course(&store, "c1", "دورة");
    let api = routes::make_api(make_environment(store.clone()));

    let mut ids = vec![];

    for title in &["أ", "ب", "ج"] {
        let response = signed_in("POST", "/api/videos?course=c1")
            .json(&json!({ "course_id": "c1", "title": { "ar": title } }))
            .reply(&api)
            .await;

        let body = body_of(&response);
        ids.push(body["video"]["id"].as_str().expect("video id").to_owned());
    }

    let response = signed_in("DELETE", &format!("/api/videos/{}?course=c1", ids[1]))
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(orders(&body_of(&response)["videos"]), vec![1, 3]);

    let response = signed_in("POST", "/api/videos?course=c1")
        .json(&json!({ "course_id": "c1", "title": { "ar": "د" } }))
        .reply(&api)
        .await;

    assert_eq!(body_of(&response)["video"]["order"], 4);
}

#[tokio::test]
async fn blank_titles_are_rejected_with_the_field() {
    let store = Arc::new(MemoryStore::new());
    let api = routes::make_api(make_environment(store.clone()));

    let response = signed_in("POST", "/api/courses")
        .json(&json!({ "title": { "ar": "   ", "en": "Course" } }))
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_of(&response);
    assert_eq!(body["operation"], "create_course");
    assert_eq!(body["field"], "title");
    assert!(body["message"]["ar"].is_string());
    assert!(body["message"]["en"].is_string());
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn unknown_courses_are_not_found() {
    let api = routes::make_api(make_environment(Arc::new(MemoryStore::new())));

    let response = signed_in("GET", "/api/courses/missing").reply(&api).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_of(&response)["id"], "missing");

    let response = signed_in("PUT", "/api/courses/missing")
        .json(&json!({ "title": { "ar": "دورة" } }))
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn creating_a_course_returns_the_refreshed_list() {
    let store = Arc::new(MemoryStore::new());
    seed_course(&store, "c1", "الأولى");
    let api = routes::make_api(make_environment(store.clone()));

    let response = signed_in("POST", "/api/courses")
        .json(&json!({ "title": { "ar": "الثانية", "en": "Second" }, "instructor": " Someone " }))
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_of(&response);
    assert_eq!(body["course"]["title"]["en"], "Second");
    assert_eq!(body["course"]["instructor"], "Someone");
    assert_eq!(body["courses"].as_array().expect("courses").len(), 2);
}

#[tokio::test]
async fn quizzes_are_filtered_by_course() {
    let store = Arc::new(MemoryStore::new());
    seed_course(&store, "c1", "الأولى");
    seed_course(&store, "c2", "الثانية");
    let api = routes::make_api(make_environment(store.clone()));

    for course in &["c1", "c2", "c1"] {
        let response = signed_in("POST", "/api/quizzes")
            .json(&json!({ "course_id": course, "title": { "ar": "اختبار" }, "questions": [{ "q": "?" }] }))
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = signed_in("GET", "/api/quizzes?course=c1").reply(&api).await;
    let quizzes = body_of(&response)["quizzes"].clone();
    let quizzes = quizzes.as_array().expect("quizzes");

    assert_eq!(quizzes.len(), 2);
    assert!(quizzes.iter().all(|q| q["course_id"] == "c1"));

    let response = signed_in("GET", "/api/quizzes").reply(&api).await;
    assert_eq!(body_of(&response)["quizzes"].as_array().expect("quizzes").len(), 3);
}

#[tokio::test]
async fn store_failures_are_reported_generically() {
    let store = Arc::new(MemoryStore::new());
    store.set_offline(true);
    let api = routes::make_api(make_environment(store));

    let response = signed_in("GET", "/api/videos").reply(&api).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_of(&response);
    assert_eq!(body["operation"], "videos");
    assert!(!body.to_string().contains("offline"));
}

#[tokio::test]
async fn identity_is_checked_before_the_body_is_read() {
    let store = Arc::new(MemoryStore::new());
    let api = routes::make_api(make_environment(store.clone()));

    let response = warp::test::request()
        .method("POST")
        .path("/api/videos")
        .json(&json!({ "bogus": 1 }))
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_of(&response)["operation"], "identity");

    let response = warp::test::request()
        .method("POST")
        .path("/api/videos")
        .header("x-forwarded-email", "guest@example.com")
        .json(&json!({ "bogus": 1 }))
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(store.calls(), 0);
}

fn assert_malformed(response: &warp::http::Response<impl AsRef<[u8]>>) {
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_of(response);
    assert_eq!(body["operation"], "request");
    assert_eq!(body["message"]["en"], "Please check the required fields");
    assert!(body["message"]["ar"].is_string());
}

#[tokio::test]
async fn unreadable_forms_get_a_localized_reply() {
    let store = Arc::new(MemoryStore::new());
    let api = routes::make_api(make_environment(store.clone()));

    let response = signed_in("POST", "/api/videos")
        .json(&json!({ "course_id": "c1", "title": { "ar": "أ" }, "bogus": 1 }))
        .reply(&api)
        .await;
    assert_malformed(&response);

    let response = signed_in("POST", "/api/videos")
        .json(&json!({ "course_id": "c1", "title": { "ar": "أ" }, "order": "abc" }))
        .reply(&api)
        .await;
    assert_malformed(&response);

    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn unreadable_queries_get_a_localized_reply() {
    let api = routes::make_api(make_environment(Arc::new(MemoryStore::new())));

    let response = signed_in("GET", "/api/videos?course=c1&course=c2")
        .reply(&api)
        .await;

    assert_malformed(&response);
}

#[tokio::test]
async fn oversized_forms_get_a_localized_reply() {
    let store = Arc::new(MemoryStore::new());
    let api = routes::make_api(make_environment(store.clone()));

    let response = signed_in("POST", "/api/courses")
        .json(&json!({ "title": { "ar": "أ".repeat(40 * 1024) } }))
        .reply(&api)
        .await;

    assert_malformed(&response);
    assert_eq!(store.calls(), 0);
}

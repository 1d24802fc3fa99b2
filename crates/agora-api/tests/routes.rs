use std::sync::Arc;

use agora_api::auth::{AppState, AppStateInner};
use agora_core::{Forum, SystemClock};
use agora_db::Database;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn app() -> Router {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let state: AppState = Arc::new(AppStateInner {
        forum: Forum::new(db, Arc::new(SystemClock)),
    });
    agora_api::router(state)
}

fn form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut req = Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    req.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut req = Request::get(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    req.body(Body::empty()).unwrap()
}

/// `session_id=<token>` taken from a Set-Cookie header.
fn session_pair(res: &Response) -> String {
    let set_cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn json(res: Response) -> serde_json::Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn register_sets_an_http_only_session_cookie() {
    let app = app();
    let res = app
        .oneshot(form("/register", "email=a%40x.com&username=alice&password=secret1", None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[header::LOCATION], "/");
    let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("session_id="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Expires="));
}

#[tokio::test]
async fn validation_errors_come_back_per_field() {
    let app = app();
    let res = app
        .oneshot(form("/register", "email=bad&username=al&password=123", None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json(res).await;
    assert!(body["fields"]["email"].is_string());
    assert!(body["fields"]["username"].is_string());
    assert!(body["fields"]["password"].is_string());
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let app = app();
    let body = "email=a%40x.com&username=alice&password=secret1";
    let res = app.clone().oneshot(form("/register", body, None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let res = app.oneshot(form("/register", body, None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn bad_login_is_unauthorized_or_not_found() {
    let app = app();
    app.clone()
        .oneshot(form("/register", "email=a%40x.com&username=alice&password=secret1", None))
        .await
        .unwrap();

    let res = app
        .clone()
        .oneshot(form("/login", "email=a%40x.com&password=nope123", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .oneshot(form("/login", "email=z%40x.com&password=secret1", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn posting_requires_a_session() {
    let app = app();
    let res = app
        .oneshot(form("/posts", "title=Hi&content=Body&categories=1", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_react_and_filter_flow() {
    let app = app();

    let res = app
        .clone()
        .oneshot(form("/register", "email=a%40x.com&username=alice&password=secret1", None))
        .await
        .unwrap();
    let alice = session_pair(&res);

    let res = app
        .clone()
        .oneshot(form(
            "/posts",
            "title=Hello&content=First+post&categories=1&categories=3",
            Some(&alice),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let location = res.headers()[header::LOCATION].to_str().unwrap().to_string();
    let post_id = location.trim_start_matches("/posts/").to_string();

    let res = app
        .clone()
        .oneshot(form("/register", "email=b%40x.com&username=bob&password=secret2", None))
        .await
        .unwrap();
    let bob = session_pair(&res);

    let res = app
        .clone()
        .oneshot(form("/reactions", &format!("type=post&id={post_id}&action=like"), Some(&bob)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(res).await;
    assert_eq!(body["state"], "liked");
    assert_eq!(body["likes"], 1);
    assert_eq!(body["dislikes"], 0);

    let res = app.clone().oneshot(get("/?liked=1", Some(&bob))).await.unwrap();
    let body = json(res).await;
    assert_eq!(body["user"]["username"], "bob");
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["posts"][0]["categories"].as_array().unwrap().len(), 2);

    let res = app.clone().oneshot(get("/?category=2", None)).await.unwrap();
    assert!(json(res).await["posts"].as_array().unwrap().is_empty());

    let res = app
        .clone()
        .oneshot(form("/reactions", &format!("type=post&id={post_id}&action=like"), Some(&bob)))
        .await
        .unwrap();
    let body = json(res).await;
    assert_eq!(body["state"], "none");
    assert_eq!(body["likes"], 0);

    let res = app.oneshot(get(&location, None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json(res).await["post"]["title"], "Hello");
}

#[tokio::test]
async fn reaction_input_is_checked() {
    let app = app();
    let res = app
        .clone()
        .oneshot(form("/reactions", "type=post&id=1&action=like", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .clone()
        .oneshot(form("/register", "email=a%40x.com&username=alice&password=secret1", None))
        .await
        .unwrap();
    let alice = session_pair(&res);

    let res = app
        .clone()
        .oneshot(form("/reactions", "type=users&id=1&action=like", Some(&alice)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .clone()
        .oneshot(form("/reactions", "type=post&id=1&action=love", Some(&alice)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    for body in ["type=post&id=1", "id=1&action=like", "type=post&id=x&action=like", "type=post&action=like"] {
        let res = app
            .clone()
            .oneshot(form("/reactions", body, Some(&alice)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert!(json(res).await["error"].is_string());
    }
}

#[tokio::test]
async fn liked_filter_without_session_is_unauthorized() {
    let app = app();
    let res = app.oneshot(get("/?liked=1", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_the_cookie_and_the_session() {
    let app = app();
    let res = app
        .clone()
        .oneshot(form("/register", "email=a%40x.com&username=alice&password=secret1", None))
        .await
        .unwrap();
    let alice = session_pair(&res);

    let res = app.clone().oneshot(form("/logout", "", Some(&alice))).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(res.headers()[header::SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));

    let res = app.clone().oneshot(get("/", Some(&alice))).await.unwrap();
    assert!(json(res).await["user"].is_null());

    // logging out again is harmless
    let res = app.oneshot(form("/logout", "", Some(&alice))).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}

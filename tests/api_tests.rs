use feedline::api;
use feedline::application_impl::JwtConfig;
use feedline::infra_memory::ManualClock;
use feedline::server::{Repos, Server};
use serde_json::{Value, json};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use warp::Filter;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;

fn jwt_config() -> JwtConfig {
    JwtConfig {
        issuer: "feedline".into(),
        audience: "feedline-web".into(),
        access_ttl: Duration::from_secs(15 * 60),
        refresh_ttl: Duration::from_secs(7 * 24 * 60 * 60),
        access_secret: b"test-access-secret".to_vec(),
        refresh_secret: b"test-refresh-secret".to_vec(),
    }
}

fn app() -> (
    Arc<ManualClock>,
    impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone + 'static,
) {
    let clock = Arc::new(ManualClock::starting_now());
    let server = Server::assemble(Repos::in_memory(), jwt_config(), clock.clone(), false);
    (clock, api::routes(Arc::new(server)))
}

fn body(resp: &warp::http::Response<Bytes>) -> Value {
    serde_json::from_slice(resp.body()).unwrap()
}

fn message(resp: &warp::http::Response<Bytes>) -> String {
    body(resp)["message"].as_str().unwrap().to_string()
}

async fn post_json<F>(filter: &F, path: &str, bearer: Option<&str>, payload: Value) -> warp::http::Response<Bytes>
where
    F: Filter + 'static,
    F::Extract: warp::Reply + Send,
{
    let mut req = warp::test::request().method("POST").path(path).json(&payload);
    if let Some(token) = bearer {
        req = req.header("authorization", format!("Bearer {token}"));
    }
    req.reply(filter).await
}

async fn call<F>(filter: &F, method: &str, path: &str, bearer: &str) -> warp::http::Response<Bytes>
where
    F: Filter + 'static,
    F::Extract: warp::Reply + Send,
{
    warp::test::request()
        .method(method)
        .path(path)
        .header("authorization", format!("Bearer {bearer}"))
        .reply(filter)
        .await
}

/// Registers `username` and logs in, returning (user id, access token, refresh cookie pair).
async fn sign_up<F>(filter: &F, username: &str) -> (i64, String, String)
where
    F: Filter + 'static,
    F::Extract: warp::Reply + Send,
{
    let creds = json!({ "username": username, "password": "pw1" });
    let registered = post_json(filter, "/api/register", None, creds.clone()).await;
    assert_eq!(registered.status(), StatusCode::CREATED);
    let id = body(&registered)["id"].as_i64().unwrap();

    let login = post_json(filter, "/api/login", None, creds).await;
    assert_eq!(login.status(), StatusCode::OK);
    let token = body(&login)["token"].as_str().unwrap().to_string();
    let cookie = login.headers()["set-cookie"].to_str().unwrap();
    let pair = cookie.split(';').next().unwrap().to_string();
    (id, token, pair)
}

#[tokio::test]
async fn access_token_expires_after_fifteen_minutes() {
    let (clock, filter) = app();
    let (_, token, _) = sign_up(&filter, "user1").await;

    let created = post_json(&filter, "/api/posts", Some(&token), json!({ "content": "hello" })).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(body(&created)["content"], "hello");

    clock.advance(chrono::Duration::minutes(16));

    let rejected = post_json(&filter, "/api/posts", Some(&token), json!({ "content": "late" })).await;
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(&rejected), "Token is not valid, authorization denied");
}

#[tokio::test]
async fn login_sets_a_locked_down_refresh_cookie() {
    let (_, filter) = app();
    let creds = json!({ "username": "user1", "password": "pw1" });
    post_json(&filter, "/api/register", None, creds.clone()).await;

    let login = post_json(&filter, "/api/login", None, creds).await;
    let cookie = login.headers()["set-cookie"].to_str().unwrap();
    assert!(cookie.starts_with("refreshToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=604800"));

    // the refresh token never appears in the body
    assert_eq!(body(&login).as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn register_and_login_failures() {
    let (_, filter) = app();

    let missing = post_json(&filter, "/api/register", None, json!({ "username": "user1" })).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(&missing), "Username and password are required");

    let oversized = json!({ "username": "u".repeat(65), "password": "pw1" });
    let too_long = post_json(&filter, "/api/register", None, oversized).await;
    assert_eq!(too_long.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(&too_long), "Username must not exceed 64 characters");

    let creds = json!({ "username": "user1", "password": "pw1" });
    post_json(&filter, "/api/register", None, creds.clone()).await;
    let duplicate = post_json(&filter, "/api/register", None, creds).await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    assert_eq!(message(&duplicate), "Username already exists");

    for payload in [
        json!({ "username": "user1", "password": "wrong" }),
        json!({ "username": "nobody", "password": "pw1" }),
    ] {
        let denied = post_json(&filter, "/api/login", None, payload).await;
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(message(&denied), "Invalid username or password");
        assert!(denied.headers().get("set-cookie").is_none());
    }
}

#[tokio::test]
async fn refresh_issues_a_working_access_token() {
    let (clock, filter) = app();
    let (_, _, cookie) = sign_up(&filter, "user1").await;

    clock.advance(chrono::Duration::minutes(16));

    let refreshed = warp::test::request()
        .method("POST")
        .path("/api/refresh")
        .header("cookie", &cookie)
        .reply(&filter)
        .await;
    assert_eq!(refreshed.status(), StatusCode::OK);
    let token = body(&refreshed)["token"].as_str().unwrap().to_string();

    let feed = call(&filter, "GET", "/api/feed", &token).await;
    assert_eq!(feed.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_rejections() {
    let (clock, filter) = app();
    let (_, access, cookie) = sign_up(&filter, "user1").await;

    let missing = warp::test::request().method("POST").path("/api/refresh").reply(&filter).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(&missing), "No refresh token provided");

    // an access token is not accepted in place of a refresh token
    let swapped = warp::test::request()
        .method("POST")
        .path("/api/refresh")
        .header("cookie", format!("refreshToken={access}"))
        .reply(&filter)
        .await;
    assert_eq!(swapped.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(&swapped), "Invalid or expired refresh token");

    clock.advance(chrono::Duration::days(8));
    let expired = warp::test::request()
        .method("POST")
        .path("/api/refresh")
        .header("cookie", &cookie)
        .reply(&filter)
        .await;
    assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let (_, filter) = app();

    let missing = warp::test::request().method("GET").path("/api/feed").reply(&filter).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(&missing), "No token provided, authorization denied");

    let garbage = call(&filter, "GET", "/api/users", "not-a-jwt").await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(&garbage), "Token is not valid, authorization denied");
}

#[tokio::test]
async fn post_content_is_validated() {
    let (_, filter) = app();
    let (_, token, _) = sign_up(&filter, "user1").await;

    let empty = post_json(&filter, "/api/posts", Some(&token), json!({ "content": "" })).await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(&empty), "Content cannot be empty");

    let long = post_json(&filter, "/api/posts", Some(&token), json!({ "content": "x".repeat(201) })).await;
    assert_eq!(long.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let exact = post_json(&filter, "/api/posts", Some(&token), json!({ "content": "é".repeat(200) })).await;
    assert_eq!(exact.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn follow_edge_cases() {
    let (_, filter) = app();
    let (me, token, _) = sign_up(&filter, "user1").await;
    let (other, _, _) = sign_up(&filter, "user2").await;

    let own = call(&filter, "POST", &format!("/api/follow/{me}"), &token).await;
    assert_eq!(own.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(&own), "You cannot follow yourself");

    let ghost = call(&filter, "POST", "/api/follow/9999", &token).await;
    assert_eq!(ghost.status(), StatusCode::NOT_FOUND);
    assert_eq!(message(&ghost), "User to follow not found");

    let first = call(&filter, "POST", &format!("/api/follow/{other}"), &token).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(message(&first), "You are now following user user2");

    let second = call(&filter, "POST", &format!("/api/follow/{other}"), &token).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let following = call(&filter, "GET", "/api/following", &token).await;
    assert_eq!(body(&following), json!([other]));

    let unfollowed = call(&filter, "DELETE", &format!("/api/follow/{other}"), &token).await;
    assert_eq!(unfollowed.status(), StatusCode::OK);
    assert_eq!(message(&unfollowed), format!("You have unfollowed user {other}"));

    let again = call(&filter, "DELETE", &format!("/api/follow/{other}"), &token).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
    assert_eq!(message(&again), "You are not following this user");
}

#[tokio::test]
async fn feed_shows_followed_posts_newest_first() {
    let (clock, filter) = app();
    let (_, alice, _) = sign_up(&filter, "alice").await;
    let (bob_id, bob, _) = sign_up(&filter, "bob").await;
    let (carol_id, carol, _) = sign_up(&filter, "carol").await;
    let (_, dave, _) = sign_up(&filter, "dave").await;

    post_json(&filter, "/api/posts", Some(&bob), json!({ "content": "bob 1" })).await;
    clock.advance(chrono::Duration::seconds(1));
    post_json(&filter, "/api/posts", Some(&carol), json!({ "content": "carol 1" })).await;
    clock.advance(chrono::Duration::seconds(1));
    post_json(&filter, "/api/posts", Some(&dave), json!({ "content": "dave 1" })).await;
    post_json(&filter, "/api/posts", Some(&alice), json!({ "content": "alice 1" })).await;

    call(&filter, "POST", &format!("/api/follow/{bob_id}"), &alice).await;
    call(&filter, "POST", &format!("/api/follow/{carol_id}"), &alice).await;

    let feed = call(&filter, "GET", "/api/feed?page=1&limit=10", &alice).await;
    let feed = body(&feed);
    assert_eq!(feed["page"], 1);
    let contents: Vec<_> = feed["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["content"].as_str().unwrap().to_string())
        .collect();
    // own posts and posts by people not followed stay out
    assert_eq!(contents, vec!["carol 1", "bob 1"]);

    let second_page = call(&filter, "GET", "/api/feed?page=2&limit=1", &alice).await;
    let posts = body(&second_page)["posts"].clone();
    assert_eq!(posts[0]["content"], "bob 1");
    assert_eq!(posts[0]["userid"], bob_id);
    assert!(posts[0]["createdat"].is_string());

    // junk paging falls back to defaults
    let lenient = call(&filter, "GET", "/api/feed?page=abc&limit=-3", &alice).await;
    assert_eq!(lenient.status(), StatusCode::OK);
    assert_eq!(body(&lenient)["page"], 1);
}

#[tokio::test]
async fn users_lists_everyone_but_the_caller() {
    let (_, filter) = app();
    let (_, token, _) = sign_up(&filter, "user1").await;
    let (other, _, _) = sign_up(&filter, "user2").await;

    let users = call(&filter, "GET", "/api/users", &token).await;
    assert_eq!(body(&users), json!([{ "id": other, "username": "user2" }]));
}

#[tokio::test]
async fn unknown_routes_and_bad_bodies_render_messages() {
    let (_, filter) = app();

    let unknown = warp::test::request().method("GET").path("/api/nope").reply(&filter).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert!(body(&unknown)["message"].is_string());

    let bad = warp::test::request()
        .method("POST")
        .path("/api/login")
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&filter)
        .await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    assert!(body(&bad)["message"].is_string());
}

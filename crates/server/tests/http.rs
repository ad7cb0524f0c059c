use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use server::ServerState;
use tower::ServiceExt;

async fn test_router(page_size: u64) -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = engine::Engine::builder().database(db).build().await.unwrap();
    server::router(ServerState::new(engine, Some(page_size)))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Registers a user and logs them in, returning `(id, token)`.
async fn sign_up(app: &Router, username: &str) -> (i64, String) {
    let credentials = json!({"username": username, "password": "pa55word"});
    let (status, user) = send(
        app,
        "POST",
        "/accounts/register",
        None,
        Some(credentials.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["username"], username);

    let (status, token) = send(app, "POST", "/accounts/login", None, Some(credentials)).await;
    assert_eq!(status, StatusCode::OK);
    (
        user["id"].as_i64().unwrap(),
        token["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = test_router(100).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/budget/categories/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Token");

    let (status, _) = send(&app, "GET", "/budget/categories/", Some("nope"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/budget/categories/")
                .header(header::AUTHORIZATION, "Basic YWxpY2U6cHc=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_and_login_errors_are_field_maps() {
    let app = test_router(100).await;
    sign_up(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/accounts/register",
        None,
        Some(json!({"username": "alice", "password": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"username": ["A user with that username already exists."]})
    );

    let (status, body) = send(
        &app,
        "POST",
        "/accounts/login",
        None,
        Some(json!({"username": "alice", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"non_field_errors": ["Unable to log in with provided credentials."]})
    );

    let (status, body) = send(&app, "POST", "/accounts/login", None, Some(json!("nope"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = test_router(100).await;
    let (_, token) = sign_up(&app, "alice").await;

    let (status, again) = send(
        &app,
        "POST",
        "/accounts/login",
        None,
        Some(json!({"username": "alice", "password": "pa55word"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["token"], token.as_str());

    let (status, body) = send(&app, "POST", "/accounts/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["detail"].is_string());

    let (status, _) = send(&app, "GET", "/budget/categories/", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn category_and_budget_walkthrough() {
    let app = test_router(100).await;
    let (user1, token1) = sign_up(&app, "user1").await;
    let (user2, token2) = sign_up(&app, "user2").await;

    let (status, category) = send(
        &app,
        "POST",
        "/budget/categories/",
        Some(&token1),
        Some(json!({"name": "category_1", "owner": user2})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(category["owner"], user1);
    assert_eq!(category["users"], json!([]));
    let category_1 = category["id"].as_i64().unwrap();

    let (status, entry) = send(
        &app,
        "POST",
        &format!("/budget/budgets/{category_1}"),
        Some(&token1),
        Some(json!({"type": "IN", "amount": 100, "user": user2})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        entry,
        json!({"user": user1, "type": "IN", "amount": "100.00", "category": category_1})
    );

    let (_, category) = send(
        &app,
        "POST",
        "/budget/categories/",
        Some(&token1),
        Some(json!({"name": "category_2"})),
    )
    .await;
    let category_2 = category["id"].as_i64().unwrap();

    let (status, listing) = send(&app, "GET", "/budget/categories/", Some(&token1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], 2);
    assert_eq!(listing["next"], Value::Null);
    assert_eq!(listing["previous"], Value::Null);
    assert_eq!(
        listing["results"],
        json!([
            {"id": category_1, "name": "category_1", "owner": user1, "users": []},
            {"id": category_2, "name": "category_2", "owner": user1, "users": []},
        ])
    );

    // Not shared yet: user2 sees nothing.
    let (status, _) = send(
        &app,
        "GET",
        &format!("/budget/budgets/{category_1}"),
        Some(&token2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, shared) = send(
        &app,
        "GET",
        &format!("/budget/categories/{category_1}/add_user/{user2}"),
        Some(&token1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        shared,
        json!({"id": category_1, "name": "category_1", "users": [user2]})
    );

    let (_, entries1) = send(
        &app,
        "GET",
        &format!("/budget/budgets/{category_1}"),
        Some(&token1),
        None,
    )
    .await;
    let (status, entries2) = send(
        &app,
        "GET",
        &format!("/budget/budgets/{category_1}"),
        Some(&token2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries1, entries2);
    assert_eq!(entries2.as_array().unwrap().len(), 1);

    // A category owned by user2 alone stays hidden from user1.
    let (_, category) = send(
        &app,
        "POST",
        "/budget/categories/",
        Some(&token2),
        Some(json!({"name": "private"})),
    )
    .await;
    let private = category["id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        "GET",
        &format!("/budget/budgets/{private}"),
        Some(&token1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        "GET",
        &format!("/budget/budgets/{private}"),
        Some(&token2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Membership does not grant category management.
    let (status, _) = send(
        &app,
        "GET",
        &format!("/budget/categories/{category_1}"),
        Some(&token2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn add_user_is_idempotent_and_rejects_self() {
    let app = test_router(100).await;
    let (_, token1) = sign_up(&app, "user1").await;
    let (user2, _) = sign_up(&app, "user2").await;
    let (_, category) = send(
        &app,
        "POST",
        "/budget/categories/",
        Some(&token1),
        Some(json!({"name": "home"})),
    )
    .await;
    let id = category["id"].as_i64().unwrap();
    let owner = category["owner"].as_i64().unwrap();

    for _ in 0..2 {
        let (status, shared) = send(
            &app,
            "GET",
            &format!("/budget/categories/{id}/add_user/{user2}"),
            Some(&token1),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(shared["users"], json!([user2]));
    }

    let (status, body) = send(
        &app,
        "GET",
        &format!("/budget/categories/{id}/add_user/{owner}"),
        Some(&token1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn rename_and_validation_errors() {
    let app = test_router(100).await;
    let (_, token) = sign_up(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/budget/categories/",
        Some(&token),
        Some(json!({"name": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"name": ["This field may not be blank."]}));

    let (_, category) = send(
        &app,
        "POST",
        "/budget/categories/",
        Some(&token),
        Some(json!({"name": "food"})),
    )
    .await;
    let id = category["id"].as_i64().unwrap();

    for (method, name) in [("PUT", "groceries"), ("PATCH", "market")] {
        let (status, renamed) = send(
            &app,
            method,
            &format!("/budget/categories/{id}"),
            Some(&token),
            Some(json!({"name": name})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(renamed["name"], name);
    }

    let (status, body) = send(
        &app,
        "POST",
        &format!("/budget/budgets/{id}"),
        Some(&token),
        Some(json!({"type": "OUT", "amount": "-3"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "amount": ["Ensure this value is greater than or equal to 0."],
            "type": ["\"OUT\" is not a valid choice."],
        })
    );

    let (status, body) = send(
        &app,
        "POST",
        &format!("/budget/budgets/{id}"),
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "amount": ["This field is required."],
            "type": ["This field is required."],
        })
    );
}

#[tokio::test]
async fn categories_are_paginated() {
    let app = test_router(2).await;
    let (_, token) = sign_up(&app, "alice").await;
    for name in ["a", "b", "c"] {
        send(
            &app,
            "POST",
            "/budget/categories/",
            Some(&token),
            Some(json!({"name": name})),
        )
        .await;
    }

    let (_, first) = send(&app, "GET", "/budget/categories/", Some(&token), None).await;
    assert_eq!(first["count"], 3);
    assert_eq!(first["next"], "/budget/categories/?page=2");
    assert_eq!(first["previous"], Value::Null);
    assert_eq!(first["results"].as_array().unwrap().len(), 2);

    let (_, second) = send(
        &app,
        "GET",
        "/budget/categories/?page=2",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(second["next"], Value::Null);
    assert_eq!(second["previous"], "/budget/categories/");
    assert_eq!(second["results"][0]["name"], "c");

    let (status, _) = send(
        &app,
        "GET",
        "/budget/categories/?page=9",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn summary_reports_totals_and_balance() {
    let app = test_router(100).await;
    let (_, token) = sign_up(&app, "alice").await;
    let (_, category) = send(
        &app,
        "POST",
        "/budget/categories/",
        Some(&token),
        Some(json!({"name": "month"})),
    )
    .await;
    let id = category["id"].as_i64().unwrap();

    for (kind, amount) in [("IN", json!("1500")), ("EX", json!(1600.25))] {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/budget/budgets/{id}"),
            Some(&token),
            Some(json!({"type": kind, "amount": amount})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, summary) = send(
        &app,
        "GET",
        &format!("/budget/budgets/{id}/summary"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        summary,
        json!({"category": id, "income": "1500.00", "expense": "1600.25", "balance": "-100.25"})
    );
}

#[tokio::test]
async fn lists_are_not_coerced_into_scalars() {
    let app = test_router(100).await;
    let (_, token) = sign_up(&app, "alice").await;
    let (_, category) = send(
        &app,
        "POST",
        "/budget/categories/",
        Some(&token),
        Some(json!({"name": "groceries"})),
    )
    .await;
    let id = category["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/budget/budgets/{id}"),
        Some(&token),
        Some(json!({"type": ["IN"], "amount": [100]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, entries) = send(
        &app,
        "GET",
        &format!("/budget/budgets/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries, json!([]));

    let (status, _) = send(
        &app,
        "POST",
        "/budget/categories/",
        Some(&token),
        Some(json!({"name": ["groceries"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

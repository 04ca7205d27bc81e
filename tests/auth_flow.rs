mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn duplicate_email_registration_conflicts() -> Result<()> {
    let app = common::spawn_app().await?;

    let (status, _) = app
        .register("Ada Lovelace", "ada@example.com", "password123", None)
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .register("Ada Again", "ada@example.com", "different456", None)
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // the first account is untouched
    let token = app.login("ada@example.com", "password123").await?;
    let (status, me) = app.request("GET", "/users/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["full_name"], "Ada Lovelace");

    Ok(())
}

#[tokio::test]
async fn login_failures_are_indistinguishable() -> Result<()> {
    let app = common::spawn_app().await?;
    app.register("Known User", "known@example.com", "password123", None)
        .await?;

    let (wrong_pass_status, wrong_pass_body) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "known@example.com", "password": "wrongpassword"})),
        )
        .await?;
    let (no_user_status, no_user_body) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "nobody@example.com", "password": "password123"})),
        )
        .await?;

    assert_eq!(wrong_pass_status, StatusCode::UNAUTHORIZED);
    assert_eq!(no_user_status, StatusCode::UNAUTHORIZED);
    // account enumeration guard: the two failures share one body
    assert_eq!(wrong_pass_body, no_user_body);

    Ok(())
}

#[tokio::test]
async fn register_requires_all_fields() -> Result<()> {
    let app = common::spawn_app().await?;

    let (status, body) = app
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({"full_name": "No Password", "email": "nopass@example.com"})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    // empty strings count as missing
    let (status, _) = app.register("", "empty@example.com", "password123", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn register_rejects_unknown_role() -> Result<()> {
    let app = common::spawn_app().await?;

    let (status, body) = app
        .register("Weird Role", "weird@example.com", "password123", Some("superuser"))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid role");

    Ok(())
}

#[tokio::test]
async fn register_returns_message_without_token() -> Result<()> {
    let app = common::spawn_app().await?;

    let (status, body) = app
        .register("Fresh User", "fresh@example.com", "password123", None)
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "created");
    assert!(body.get("access_token").is_none());

    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() -> Result<()> {
    let app = common::spawn_app().await?;

    let (status, _) = app.request("GET", "/projects", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request("GET", "/projects", Some("not-a-jwt"), None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // health stays open
    let (status, body) = app.request("GET", "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    Ok(())
}

#[tokio::test]
async fn login_reports_public_safe_user_view() -> Result<()> {
    let app = common::spawn_app().await?;
    app.register("Grace Hopper", "grace@example.com", "password123", Some("admin"))
        .await?;

    let (status, body) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "grace@example.com", "password": "password123"})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["full_name"], "Grace Hopper");
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("email").is_none());

    Ok(())
}

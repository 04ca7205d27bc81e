//! Shared setup for integration tests: a throwaway SQLite database, the real
//! router, and small request helpers.

use anyhow::Context;
use axum::body::{self, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub struct TestApp {
    pub app: Router,
    _dir: TempDir,
}

pub async fn spawn_app() -> anyhow::Result<TestApp> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    std::env::set_var("JWT_SECRET", "test-secret");
    let app = taskboard::create_app(pool).await?;

    Ok(TestApp { app, _dir: dir })
}

impl TestApp {
    /// Sends one request through the router and returns status plus parsed
    /// JSON body (Null for empty bodies).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.app.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), 1_048_576).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?
        };

        Ok((status, value))
    }

    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let mut payload = json!({
            "full_name": full_name,
            "email": email,
            "password": password,
        });
        if let Some(role) = role {
            payload["role"] = json!(role);
        }
        self.request("POST", "/auth/register", None, Some(payload)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<String> {
        let (status, body) = self
            .request(
                "POST",
                "/auth/login",
                None,
                Some(json!({"email": email, "password": password})),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {status} - {body}");

        body["access_token"]
            .as_str()
            .map(str::to_string)
            .context("missing access_token")
    }

    /// Register-then-login shortcut for tests that just need a signed caller.
    pub async fn signup(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> anyhow::Result<String> {
        let (status, body) = self.register(full_name, email, password, role).await?;
        anyhow::ensure!(
            status == StatusCode::CREATED,
            "register failed: {status} - {body}"
        );
        self.login(email, password).await
    }

    /// Resolves the caller's own user id via `/users/me`.
    pub async fn user_id(&self, token: &str) -> anyhow::Result<String> {
        let (status, body) = self.request("GET", "/users/me", Some(token), None).await?;
        anyhow::ensure!(status == StatusCode::OK, "me failed: {status} - {body}");
        body["id"].as_str().map(str::to_string).context("missing id")
    }
}

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::{Days, Utc};
use serde_json::json;
use uuid::Uuid;

async fn create_project(app: &common::TestApp, token: &str) -> Result<String> {
    let (status, project) = app
        .request("POST", "/projects", Some(token), Some(json!({"title": "Metrics"})))
        .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "project create failed: {status}");
    Ok(project["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn metrics_counts_overdue_and_status_breakdown() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.signup("Owner", "owner@example.com", "password123", None).await?;
    let project_id = create_project(&app, &token).await?;

    let today = Utc::now().date_naive();
    let yesterday = (today - Days::new(1)).to_string();
    let tomorrow = (today + Days::new(1)).to_string();

    for (status, deadline) in [
        ("Done", yesterday.as_str()),
        ("To Do", yesterday.as_str()),
        ("In Progress", tomorrow.as_str()),
    ] {
        let (code, _) = app
            .request(
                "POST",
                "/tasks",
                Some(&token),
                Some(json!({
                    "title": format!("{status} task"),
                    "project_id": project_id,
                    "status": status,
                    "deadline": deadline,
                })),
            )
            .await?;
        assert_eq!(code, StatusCode::CREATED);
    }

    let (status, metrics) = app
        .request("GET", "/projects/metrics", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["total_tasks"], 3);
    // a Done task past its deadline is not overdue
    assert_eq!(metrics["overdue"], 1);
    assert_eq!(metrics["by_status"]["To Do"], 1);
    assert_eq!(metrics["by_status"]["In Progress"], 1);
    assert_eq!(metrics["by_status"]["Done"], 1);

    Ok(())
}

#[tokio::test]
async fn task_create_requires_title_and_existing_project() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.signup("Owner", "owner@example.com", "password123", None).await?;
    let project_id = create_project(&app, &token).await?;

    let (status, body) = app
        .request("POST", "/tasks", Some(&token), Some(json!({"title": "floating"})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    let (status, _) = app
        .request("POST", "/tasks", Some(&token), Some(json!({"project_id": project_id})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({"title": "orphan", "project_id": Uuid::new_v4()})),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn invalid_status_is_rejected() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.signup("Owner", "owner@example.com", "password123", None).await?;
    let project_id = create_project(&app, &token).await?;

    let (status, body) = app
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({"title": "bad", "project_id": project_id, "status": "Blocked"})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid status");

    let (_, task) = app
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({"title": "good", "project_id": project_id})),
        )
        .await?;
    let task_id = task["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .request(
            "PUT",
            &format!("/tasks/{task_id}"),
            Some(&token),
            Some(json!({"status": "Blocked"})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn task_update_applies_only_supplied_fields() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.signup("Owner", "owner@example.com", "password123", None).await?;
    let assignee_id = app.user_id(&token).await?;
    let project_id = create_project(&app, &token).await?;

    let (status, task) = app
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({"title": "Checklist", "project_id": project_id})),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["status"], "To Do");
    assert!(task["deadline"].is_null());
    let task_id = task["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .request(
            "PUT",
            &format!("/tasks/{task_id}"),
            Some(&token),
            Some(json!({
                "status": "In Progress",
                "deadline": "2030-01-01",
                "assignee_id": assignee_id,
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Checklist");
    assert_eq!(updated["status"], "In Progress");
    assert_eq!(updated["deadline"], "2030-01-01");
    assert_eq!(updated["assignee_id"], assignee_id.as_str());

    Ok(())
}

#[tokio::test]
async fn deleting_tasks_is_never_silent() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.signup("Owner", "owner@example.com", "password123", None).await?;
    let project_id = create_project(&app, &token).await?;

    let (_, task) = app
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({"title": "Short lived", "project_id": project_id})),
        )
        .await?;
    let task_id = task["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .request("DELETE", &format!("/tasks/{task_id}"), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .request("DELETE", &format!("/tasks/{task_id}"), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(
            "PUT",
            &format!("/tasks/{task_id}"),
            Some(&token),
            Some(json!({"title": "ghost"})),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn listing_tasks_for_unknown_project_is_empty() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.signup("Owner", "owner@example.com", "password123", None).await?;

    let (status, tasks) = app
        .request("GET", &format!("/tasks/project/{}", Uuid::new_v4()), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().map(Vec::len), Some(0));

    Ok(())
}

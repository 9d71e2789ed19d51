use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::*;
use platform_publisher::api::create_router;
use platform_publisher::*;
use serde_json::{json, Value};
use tempfile::TempDir;

mod common;

fn setup(dir: &TempDir, driver: &MemoryDriver) -> TestServer {
    let publisher = PlatformPublisher::with_driver(&config(dir), Arc::new(driver.clone()));
    TestServer::new(create_router(publisher)).expect("Failed to create test server")
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let dir = TempDir::new().unwrap();
        let server = setup(&dir, &MemoryDriver::new());

        let response = server.get("/health").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }
}

mod platforms {
    use super::*;

    #[tokio::test]
    async fn lists_builtin_platforms_sorted() {
        let dir = TempDir::new().unwrap();
        let server = setup(&dir, &MemoryDriver::new());

        let response = server.get("/platforms").await;

        response.assert_status_ok();
        let platforms: Vec<PlatformStatus> = response.json();
        let ids: Vec<&str> = platforms.iter().map(|p| p.target.as_str()).collect();
        assert_eq!(ids, vec!["csdn", "jianshu", "juejin", "weibo", "zhihu"]);
        assert!(platforms.iter().all(|p| !p.logged_in));
    }

    #[tokio::test]
    async fn unknown_platform_is_not_found() {
        let dir = TempDir::new().unwrap();
        let server = setup(&dir, &MemoryDriver::new());

        let response = server.get("/platform/unknown/status").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "UnsupportedTargetError");
    }

    #[tokio::test]
    async fn initialize_opens_one_session() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        let server = setup(&dir, &driver);

        server.post("/platform/csdn/initialize").await.assert_status_ok();
        server.post("/platform/csdn/initialize").await.assert_status_ok();

        assert_eq!(driver.sessions_opened(), 1);
        let status: PlatformStatus = server.get("/platform/csdn/status").await.json();
        assert_eq!(status.state, StrategyState::Ready);
    }

    #[tokio::test]
    async fn initialize_failure_is_server_error() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        driver.fail_sessions(true);
        let server = setup(&dir, &driver);

        let response = server.post("/platform/zhihu/initialize").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["error"], "InitializationError");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn confirmed_login_shows_in_status() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        let server = setup(&dir, &driver);

        let response = server.post("/platform/juejin/login").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["loginUrl"], "https://juejin.cn/login");

        driver.complete_login(logged_in(".juejin.cn"));
        server.post("/platform/juejin/confirm-login").await.assert_status_ok();

        let status: PlatformStatus = server.get("/platform/juejin/status").await.json();
        assert!(status.logged_in);
        assert!(dir.path().join("juejin_state.json").exists());
    }

    #[tokio::test]
    async fn confirm_without_session_conflicts() {
        let dir = TempDir::new().unwrap();
        let server = setup(&dir, &MemoryDriver::new());

        let response = server.post("/platform/zhihu/confirm-login").await;

        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"], "InvalidStateError");
    }

    #[tokio::test]
    async fn confirm_without_cookies_fails() {
        let dir = TempDir::new().unwrap();
        let server = setup(&dir, &MemoryDriver::new());

        server.post("/platform/jianshu/login").await.assert_status_ok();
        let response = server.post("/platform/jianshu/confirm-login").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["error"], "SessionError");
        assert!(!dir.path().join("jianshu_state.json").exists());
    }
}

mod publish {
    use super::*;

    #[tokio::test]
    async fn empty_content_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        let server = setup(&dir, &driver);

        let response = server
            .post("/platform/csdn/publish")
            .json(&json!({ "content": "  ", "title": "标题" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "ValidationError");
        assert_eq!(driver.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn single_target_returns_article_url() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        csdn_page(&driver);
        let server = setup(&dir, &driver);

        let response = server
            .post("/platform/csdn/publish")
            .json(&json!({
                "content": "# Rust 异步编程\n\n正文内容",
                "title": "Rust 异步编程",
                "options": { "tags": ["rust"] }
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["url"], CSDN_ARTICLE);
    }

    #[tokio::test]
    async fn step_failure_is_a_result_not_an_error() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        broken_weibo_page(&driver);
        let server = setup(&dir, &driver);

        let response = server
            .post("/platform/weibo/publish")
            .json(&json!({ "content": "今天天气不错" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "发布按钮点击失败");
    }
}

mod batch_publish {
    use super::*;

    #[tokio::test]
    async fn mixed_outcomes_are_counted_per_target() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        csdn_page(&driver);
        broken_weibo_page(&driver);
        let server = setup(&dir, &driver);

        let response = server
            .post("/batch-publish")
            .json(&json!({
                "content": "# 标题\n\n正文",
                "title": "标题",
                "targets": ["csdn", "weibo"]
            }))
            .await;

        response.assert_status_ok();
        let result: Value = response.json();
        assert_eq!(result["successCount"], 1);
        assert_eq!(result["failureCount"], 1);
        assert_eq!(result["results"]["csdn"]["success"], true);
        assert_eq!(result["results"]["weibo"]["message"], "发布按钮点击失败");
    }

    #[tokio::test]
    async fn simulated_targets_are_not_reported_as_published() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        driver.fail_sessions(true);
        let config = PublisherConfig {
            simulation: Some(SimulationConfig { enabled: true }),
            ..config(&dir)
        };
        let publisher = PlatformPublisher::with_driver(&config, Arc::new(driver.clone()));
        let server = TestServer::new(create_router(publisher)).expect("Failed to create test server");

        let response = server
            .post("/batch-publish")
            .json(&json!({ "content": "正文", "title": "标题", "targets": ["zhihu"] }))
            .await;

        response.assert_status_ok();
        let result: Value = response.json();
        assert_eq!(result["results"]["zhihu"]["success"], false);
        assert_eq!(result["results"]["zhihu"]["simulated"], true);
        assert_eq!(result["successCount"], 0);
        assert_eq!(result["failureCount"], 0);
        assert_eq!(result["simulatedCount"], 1);
    }

    #[tokio::test]
    async fn unknown_target_is_reported_in_results() {
        let dir = TempDir::new().unwrap();
        let server = setup(&dir, &MemoryDriver::new());

        let response = server
            .post("/batch-publish")
            .json(&json!({ "content": "正文", "targets": ["unknown"] }))
            .await;

        response.assert_status_ok();
        let result: Value = response.json();
        assert_eq!(result["results"]["unknown"]["message"], "UnsupportedTargetError");
        assert_eq!(result["failureCount"], 1);
    }

    #[tokio::test]
    async fn empty_targets_are_rejected() {
        let dir = TempDir::new().unwrap();
        let server = setup(&dir, &MemoryDriver::new());

        let response = server
            .post("/batch-publish")
            .json(&json!({ "content": "正文", "targets": [] }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "至少需要指定一个发布平台");
    }
}

mod batch_tasks {
    use super::*;

    #[tokio::test]
    async fn background_task_progress_can_be_polled() {
        let dir = TempDir::new().unwrap();
        let driver = MemoryDriver::new();
        csdn_page(&driver);
        let server = setup(&dir, &driver);

        let response = server
            .post("/batch-tasks")
            .json(&json!({ "content": "正文", "title": "标题", "targets": ["csdn", "unknown"] }))
            .await;
        response.assert_status(StatusCode::ACCEPTED);
        let task_id = response.json::<Value>()["taskId"]
            .as_str()
            .unwrap()
            .to_string();

        let mut progress = Value::Null;
        for _ in 0..200 {
            progress = server.get(&format!("/batch-tasks/{}", task_id)).await.json();
            if progress["finished"] == true {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(progress["finished"], true);
        assert_eq!(progress["total"], 2);
        assert_eq!(progress["succeeded"], 1);
        assert_eq!(progress["failed"], 1);
        assert_eq!(progress["pending"], json!([]));
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let dir = TempDir::new().unwrap();
        let server = setup(&dir, &MemoryDriver::new());

        let response = server
            .get(&format!("/batch-tasks/{}", uuid::Uuid::new_v4()))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"], "TaskNotFoundError");
    }
}

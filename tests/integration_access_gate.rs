mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::{body_json, request, set_cookies, setup_test_app};

#[tokio::test]
async fn test_auth_routes_bypass_gate() {
    let app = setup_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(request("POST", "/api/auth/login", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.sessions.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_scans_without_session_is_401() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(request("GET", "/api/scans", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Authentication required" })
    );
}

#[tokio::test]
async fn test_scans_with_session_reaches_handler() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(request("GET", "/api/scans", Some("student-1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "cookie": "session=student-1" })
    );
}

#[tokio::test]
async fn test_non_admin_analytics_is_403() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(request("GET", "/api/analytics", Some("teacher-1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Admin access required" })
    );
}

#[tokio::test]
async fn test_admin_analytics_is_allowed() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(request("GET", "/api/analytics", Some("admin-1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_teacher_post_quizzes_is_allowed() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(request("POST", "/api/quizzes", Some("teacher-1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_student_post_quizzes_is_403() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(request("POST", "/api/quizzes", Some("student-1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Teacher or admin access required" })
    );
}

#[tokio::test]
async fn test_teacher_get_quizzes_skips_role_check() {
    let app = setup_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(request("GET", "/api/quizzes", Some("teacher-1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.directory.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_quiz_submit_requires_session() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(request("POST", "/api/quizzes/42/submit", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refreshed_cookie_is_kept_on_authorization_denial() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(request("GET", "/api/analytics", Some("student-1!")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("session=student-1-rotated"));
    assert!(cookies[0].contains("HttpOnly"));
    assert!(cookies[0].contains("Max-Age=3600"));
}

#[tokio::test]
async fn test_refreshed_cookie_reaches_handler_and_client() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(request("GET", "/api/progress", Some("student-1!")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("session=student-1-rotated"));
    assert_eq!(
        body_json(response).await,
        json!({ "cookie": "session=student-1-rotated" })
    );
}

#[tokio::test]
async fn test_unknown_api_path_is_404() {
    let app = setup_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(request("GET", "/api/unknown", Some("student-1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({ "error": "Not found" }));
    assert_eq!(app.sessions.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_directory_outage_fails_closed() {
    use async_trait::async_trait;
    use scanlearn_auth::{DirectoryError, Role, UserDirectory};

    struct Down;

    #[async_trait]
    impl UserDirectory for Down {
        async fn lookup_role(&self, _: &str) -> Result<Option<Role>, DirectoryError> {
            Err(DirectoryError::Backend("connection reset".to_string()))
        }
    }

    let router = common::app_with(Arc::new(common::StubSessions::default()), Arc::new(Down));

    let response = router
        .oneshot(request("GET", "/api/analytics", Some("admin-1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Admin access required" })
    );
}

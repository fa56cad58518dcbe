use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, header};
use axum::response::Response;
use axum::routing::any;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{Value, json};

use scanlearn::router::init_router;
use scanlearn::state::AppState;
use scanlearn_auth::{
    CookieAttributes, CookieDirective, DirectoryError, InMemoryUserDirectory, PolicyTable,
    RequestCookies, Role, Session, SessionError, SessionProvider, SessionResolution,
    UserDirectory,
};
use scanlearn_config::GateConfig;

pub const SESSION_COOKIE: &str = "session";

/// Reads the user id straight from the `session` cookie.
///
/// A trailing `!` asks for a rotated token, returned as `<user>-rotated`.
#[derive(Default)]
pub struct StubSessions {
    pub calls: AtomicUsize,
}

#[async_trait]
impl SessionProvider for StubSessions {
    async fn resolve(&self, cookies: &RequestCookies) -> Result<SessionResolution, SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let Some(raw) = cookies.get(SESSION_COOKIE) else {
            return Ok(SessionResolution::anonymous());
        };
        let Some(user_id) = raw.strip_suffix('!') else {
            let user_id = raw.strip_suffix("-rotated").unwrap_or(raw);
            return Ok(SessionResolution::active(Session {
                user_id: user_id.to_string(),
                access_token: raw.clone(),
            }));
        };

        let rotated = format!("{user_id}-rotated");
        Ok(SessionResolution::active(Session {
            user_id: user_id.to_string(),
            access_token: rotated.clone(),
        })
        .with_cookie(CookieDirective::set(
            SESSION_COOKIE,
            rotated,
            CookieAttributes {
                max_age: Some(3600),
                ..CookieAttributes::default()
            },
        )))
    }
}

#[derive(Default)]
pub struct CountingDirectory {
    pub inner: InMemoryUserDirectory,
    pub calls: AtomicUsize,
}

#[async_trait]
impl UserDirectory for CountingDirectory {
    async fn lookup_role(&self, user_id: &str) -> Result<Option<Role>, DirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup_role(user_id).await
    }
}

pub struct TestApp {
    pub router: Router,
    pub sessions: Arc<StubSessions>,
    pub directory: Arc<CountingDirectory>,
}

pub async fn seeded_directory() -> Arc<CountingDirectory> {
    let directory = Arc::new(CountingDirectory::default());
    directory.inner.insert("admin-1", Role::Admin).await;
    directory.inner.insert("teacher-1", Role::Teacher).await;
    directory.inner.insert("student-1", Role::Student).await;
    directory
}

/// Echoes the `Cookie` header the handler received.
async fn echo(headers: HeaderMap) -> Json<Value> {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "cookie": cookie }))
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/scans", any(echo))
        .route("/progress", any(echo))
        .route("/analytics", any(echo))
        .route("/quizzes", any(echo))
        .route("/quizzes/{id}/submit", any(echo))
        .route("/textbooks", any(echo))
        .route("/auth/login", any(echo))
}

pub fn app_with(
    sessions: Arc<dyn SessionProvider>,
    directory: Arc<dyn UserDirectory>,
) -> Router {
    let state = AppState::with_collaborators(
        PolicyTable::builtin(),
        sessions,
        directory,
        &GateConfig::default(),
    )
    .unwrap();
    init_router(state, api_routes())
}

pub async fn setup_test_app() -> TestApp {
    let sessions = Arc::new(StubSessions::default());
    let directory = seeded_directory().await;

    TestApp {
        router: app_with(sessions.clone(), directory.clone()),
        sessions,
        directory,
    }
}

pub fn request(method: &str, uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(session) = session {
        builder = builder.header(header::COOKIE, format!("{SESSION_COOKIE}={session}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

//! HTTP front end: routes, shared state and response mapping.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use time::{Duration, OffsetDateTime, UtcOffset};
use todo_reminder_app::page::{
    MSG_CANNOT_GET, MSG_CANNOT_UPDATE, MSG_EMPTY_CONTENT, MSG_NOT_FOUND,
};
use todo_reminder_app::{
    AppConfig, FlashMessenger, PageData, ReminderService, TaskService, TaskServiceError, TaskStore,
};
use todo_reminder_mail::MailTransport;
use todo_reminder_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::cookies::CookieState;
use crate::form::{TaskAction, TaskForm};

/// Store handle shared by every request.
pub type SharedStore = Arc<SqliteStore>;
/// Mail transport shared by every request.
pub type SharedTransport = Arc<dyn MailTransport + Send + Sync>;

struct Shared<S> {
    tasks: TaskService<S>,
    reminder: ReminderService<S, SharedTransport>,
    offset: UtcOffset,
    flash_ttl: Duration,
}

/// Services handed to the request handlers.
pub struct AppState<S = SharedStore> {
    inner: Arc<Shared<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> AppState<S>
where
    S: TaskStore + Clone + Send + Sync + 'static,
{
    /// Wire the services over a shared store and transport.
    pub fn new(store: S, transport: SharedTransport, config: &AppConfig) -> Result<Self> {
        let tasks = TaskService::new(store);
        let reminder = ReminderService::new(
            tasks.clone(),
            transport,
            config.mail.clone(),
            config.reminder_config()?,
        );
        Ok(Self {
            inner: Arc::new(Shared {
                tasks,
                reminder,
                offset: config.offset()?,
                flash_ttl: config.flash_ttl(),
            }),
        })
    }
}

impl<S> AppState<S>
where
    S: Send + Sync + 'static,
{
    /// Run `job` on the blocking pool with access to the services.
    async fn blocking<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&Shared<S>) -> T + Send + 'static,
        T: Send + 'static,
    {
        let shared = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || job(&shared))
            .await
            .context("blocking task panicked")
    }
}

/// Routes: `GET /`, `POST /`, `POST /notify`.
pub fn router<S>(state: AppState<S>) -> Router
where
    S: TaskStore + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(index::<S>).post(submit::<S>))
        .route("/notify", post(notify::<S>))
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve<S>(listener: TcpListener, state: AppState<S>) -> Result<()>
where
    S: TaskStore + Send + Sync + 'static,
{
    let addr = listener.local_addr()?;
    info!("todo-reminder listening on http://{addr}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
}

fn page(status: StatusCode, data: PageData) -> Response {
    (status, Json(data)).into_response()
}

fn internal_error(err: &anyhow::Error, message: &str) -> Response {
    error!(error = %err, "request failed");
    page(StatusCode::INTERNAL_SERVER_ERROR, PageData::errors([message]))
}

async fn index<S>(State(state): State<AppState<S>>, headers: HeaderMap) -> Response
where
    S: TaskStore + Send + Sync + 'static,
{
    let mut cookies = CookieState::from_headers(&headers);
    let message = FlashMessenger::new(&mut cookies).read_and_clear();

    let mut response = match state.blocking(|shared| shared.tasks.list_all()).await {
        Ok(Ok(tasks)) => page(StatusCode::OK, PageData::listing(tasks, message)),
        Ok(Err(err)) => {
            error!(error = %err, "failed to list todos");
            page(StatusCode::BAD_REQUEST, PageData::errors([MSG_CANNOT_GET]))
        }
        Err(err) => internal_error(&err, MSG_CANNOT_GET),
    };
    cookies.apply(&mut response);
    response
}

async fn submit<S>(
    State(state): State<AppState<S>>,
    form: Result<Form<TaskForm>, FormRejection>,
) -> Response
where
    S: TaskStore + Send + Sync + 'static,
{
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable task form");
            return page(StatusCode::BAD_REQUEST, PageData::errors([rejection.body_text()]));
        }
    };
    let action = match form.bind(state.inner.offset) {
        Ok(action) => action,
        Err(errors) => {
            warn!(?errors, "rejected task form");
            return page(StatusCode::BAD_REQUEST, PageData::errors(errors));
        }
    };

    match state.blocking(move |shared| apply(&shared.tasks, action)).await {
        Ok(Ok(())) => (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response(),
        Ok(Err(err)) => {
            let message = match &err {
                TaskServiceError::EmptyContent => MSG_EMPTY_CONTENT,
                TaskServiceError::NotFound(_) => MSG_NOT_FOUND,
                TaskServiceError::Store(_) => MSG_CANNOT_UPDATE,
            };
            if matches!(err, TaskServiceError::Store(_)) {
                error!(error = %err, "failed to update todo");
            } else {
                warn!(error = %err, "rejected todo change");
            }
            page(StatusCode::BAD_REQUEST, PageData::errors([message]))
        }
        Err(err) => internal_error(&err, MSG_CANNOT_UPDATE),
    }
}

fn apply<S: TaskStore>(tasks: &TaskService<S>, action: TaskAction) -> Result<(), TaskServiceError> {
    match action {
        TaskAction::Create { content, until } => tasks.create(content, until).map(drop),
        TaskAction::SetDone { id, done } => tasks.update_done(id, done).map(drop),
        TaskAction::Delete(id) => tasks.soft_delete(id),
    }
}

async fn notify<S>(State(state): State<AppState<S>>, headers: HeaderMap) -> Response
where
    S: TaskStore + Send + Sync + 'static,
{
    let now = OffsetDateTime::now_utc();
    match state.blocking(move |shared| shared.reminder.notify(now)).await {
        Ok(Ok(report)) => {
            let mut cookies = CookieState::from_headers(&headers);
            FlashMessenger::new(&mut cookies).set(report.outcome.message(), state.inner.flash_ttl);
            let mut response = Redirect::to("/").into_response();
            cookies.apply(&mut response);
            response
        }
        // Already logged by the reminder service.
        Ok(Err(_)) => page(StatusCode::INTERNAL_SERVER_ERROR, PageData::errors([MSG_CANNOT_GET])),
        Err(err) => internal_error(&err, MSG_CANNOT_GET),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{HeaderValue, Request};
    use serde_json::Value;
    use std::sync::Mutex;
    use todo_reminder_core::id::TaskId;
    use todo_reminder_core::{NewTask, Task};
    use todo_reminder_mail::{MailConfig, MailError, OutgoingMail};
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutgoingMail>>,
        fail: bool,
    }

    impl MailTransport for RecordingTransport {
        fn send(&self, mail: &OutgoingMail) -> todo_reminder_mail::Result<()> {
            if self.fail {
                return Err(MailError::Config("connection refused".into()));
            }
            self.sent.lock().expect("lock").push(mail.clone());
            Ok(())
        }
    }

    struct Harness {
        app: Router,
        store: SharedStore,
        transport: Arc<RecordingTransport>,
    }

    /// Store whose every call fails, either with an error or a panic.
    #[derive(Clone, Copy)]
    enum BrokenStore {
        Erroring,
        Panicking,
    }

    impl BrokenStore {
        fn fail<T>(self) -> anyhow::Result<T> {
            match self {
                Self::Erroring => Err(anyhow::anyhow!("database is locked")),
                Self::Panicking => panic!("connection poisoned"),
            }
        }
    }

    impl TaskStore for BrokenStore {
        type Error = anyhow::Error;

        fn insert(&self, _: NewTask, _: OffsetDateTime) -> anyhow::Result<Task> {
            self.fail()
        }

        fn find(&self, _: TaskId, _: bool) -> anyhow::Result<Option<Task>> {
            self.fail()
        }

        fn list_active(&self) -> anyhow::Result<Vec<Task>> {
            self.fail()
        }

        fn list_reminder_candidates(&self, _: Option<OffsetDateTime>) -> anyhow::Result<Vec<Task>> {
            self.fail()
        }

        fn set_done(&self, _: TaskId, _: bool, _: OffsetDateTime) -> anyhow::Result<Option<Task>> {
            self.fail()
        }

        fn mark_deleted(&self, _: TaskId, _: OffsetDateTime) -> anyhow::Result<bool> {
            self.fail()
        }
    }

    fn config() -> AppConfig {
        AppConfig {
            deadline_offset: "+09:00".into(),
            mail: MailConfig {
                from: Some("bot@example.com".into()),
                to: Some("me@example.com".into()),
                server: Some("127.0.0.1:2525".into()),
                ..MailConfig::default()
            },
            ..AppConfig::default()
        }
    }

    fn harness(fail: bool) -> Harness {
        let store = Arc::new(SqliteStore::open_in_memory().expect("open store"));
        let transport = Arc::new(RecordingTransport {
            fail,
            ..RecordingTransport::default()
        });
        let shared: SharedTransport = transport.clone();
        let state = AppState::new(Arc::clone(&store), shared, &config()).expect("state");
        Harness {
            app: router(state),
            store,
            transport,
        }
    }

    fn broken_app(store: BrokenStore) -> (Router, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let shared: SharedTransport = transport.clone();
        let state = AppState::new(store, shared, &config()).expect("state");
        (router(state), transport)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, headers, body)
    }

    fn get_index(cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::get("/");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).expect("request")
    }

    fn post_form(body: &str) -> Request<Body> {
        Request::post("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_owned()))
            .expect("request")
    }

    fn post_notify() -> Request<Body> {
        Request::post("/notify").body(Body::empty()).expect("request")
    }

    fn flash_cookie(headers: &HeaderMap) -> String {
        let value = headers
            .get(header::SET_COOKIE)
            .map(HeaderValue::to_str)
            .expect("set-cookie")
            .expect("ascii");
        value.split(';').next().expect("pair").to_owned()
    }

    #[tokio::test]
    async fn empty_index_lists_nothing() {
        let h = harness(false);
        let (status, headers, body) = send(&h.app, get_index(None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get(header::SET_COOKIE).is_none());
        assert_eq!(body["tasks"], Value::Array(Vec::new()));
        assert_eq!(body["errors"], Value::Array(Vec::new()));
        assert_eq!(body["messages"], Value::Array(Vec::new()));
    }

    #[tokio::test]
    async fn create_complete_and_delete_through_form() {
        let h = harness(false);

        let (status, headers, _) = send(&h.app, post_form("content=buy+milk&until=2024-05-01T09%3A30")).await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers.get(header::LOCATION).map(HeaderValue::as_bytes), Some(&b"/"[..]));

        let (_, _, body) = send(&h.app, get_index(None)).await;
        let task = &body["tasks"][0];
        assert_eq!(task["content"], "buy milk");
        assert_eq!(task["done"], false);
        assert_eq!(task["until"], "2024-05-01T00:30:00Z");
        let id = task["id"].as_i64().expect("id");

        let (status, _, _) = send(&h.app, post_form(&format!("id={id}&done=on"))).await;
        assert_eq!(status, StatusCode::FOUND);
        let (_, _, body) = send(&h.app, get_index(None)).await;
        assert_eq!(body["tasks"][0]["done"], true);
        assert!(body["tasks"][0]["updated_at"].is_string());

        let (status, _, _) = send(&h.app, post_form(&format!("id={id}&delete=Delete"))).await;
        assert_eq!(status, StatusCode::FOUND);
        let (_, _, body) = send(&h.app, get_index(None)).await;
        assert_eq!(body["tasks"], Value::Array(Vec::new()));

        let audit = h.store.find(TaskId(id), true).expect("find");
        assert!(audit.is_some_and(|task| task.is_deleted()));
    }

    #[tokio::test]
    async fn invalid_form_input_is_rejected() {
        let h = harness(false);

        let (status, _, body) = send(&h.app, post_form("content=")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0], MSG_EMPTY_CONTENT);

        let (status, _, body) = send(&h.app, post_form("content=x&until=next+week")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"][0].as_str().is_some_and(|e| e.contains("failed to decode time")));

        let (status, _, body) = send(&h.app, post_form("id=404&done=true")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0], MSG_NOT_FOUND);

        assert!(h.store.list_active().expect("list").is_empty());
    }

    #[tokio::test]
    async fn notify_flashes_outcome_once() {
        let h = harness(false);

        let (status, headers, _) = send(&h.app, post_notify()).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(h.transport.sent.lock().expect("lock").is_empty());
        let cookie = flash_cookie(&headers);

        let (status, headers, body) = send(&h.app, get_index(Some(&cookie))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"][0], "Not found incomplete todos to notify");
        assert_eq!(flash_cookie(&headers), "message=");

        let (_, _, body) = send(&h.app, get_index(None)).await;
        assert_eq!(body["messages"], Value::Array(Vec::new()));
    }

    #[tokio::test]
    async fn notify_mails_overdue_digest() {
        let h = harness(false);
        send(&h.app, post_form("content=pay+rent&until=2024-05-01T09%3A30")).await;
        send(&h.app, post_form("content=undated")).await;

        let (status, headers, _) = send(&h.app, post_notify()).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(flash_cookie(&headers).starts_with("message=Notified"));

        let sent = h.transport.sent.lock().expect("lock").clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "This is your todo list\n\n2024-05-01 09:30 pay rent\n");
    }

    #[tokio::test]
    async fn notify_failure_keeps_tasks() {
        let h = harness(true);
        send(&h.app, post_form("content=renew+license&until=2024-05-01T09%3A30")).await;

        let (status, headers, _) = send(&h.app, post_notify()).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(flash_cookie(&headers).starts_with("message=Failed"));

        let (_, _, body) = send(&h.app, get_index(None)).await;
        assert_eq!(body["tasks"][0]["content"], "renew license");
    }

    #[tokio::test]
    async fn unreadable_store_renders_cannot_get_on_index() {
        let (app, _) = broken_app(BrokenStore::Erroring);
        let (status, _, body) = send(&app, get_index(None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"], serde_json::json!([MSG_CANNOT_GET]));
        assert_eq!(body["tasks"], Value::Array(Vec::new()));
    }

    #[tokio::test]
    async fn unreadable_store_fails_notify_without_mail() {
        let (app, transport) = broken_app(BrokenStore::Erroring);
        let (status, headers, body) = send(&app, post_notify()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errors"], serde_json::json!([MSG_CANNOT_GET]));
        assert!(headers.get(header::SET_COOKIE).is_none());
        assert!(transport.sent.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn store_write_failure_renders_cannot_update() {
        let (app, _) = broken_app(BrokenStore::Erroring);
        let (status, _, body) = send(&app, post_form("content=buy+milk")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"], serde_json::json!([MSG_CANNOT_UPDATE]));
    }

    #[tokio::test]
    async fn panicking_store_maps_to_route_specific_500() {
        let (app, _) = broken_app(BrokenStore::Panicking);

        let (status, _, body) = send(&app, get_index(None)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errors"], serde_json::json!([MSG_CANNOT_GET]));

        let (status, _, body) = send(&app, post_notify()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errors"], serde_json::json!([MSG_CANNOT_GET]));

        let (status, _, body) = send(&app, post_form("content=buy+milk")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errors"], serde_json::json!([MSG_CANNOT_UPDATE]));
    }
}

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode, Uri},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{
    domain::{CompanyId, EntityKind, ProfileId, Uid, UserProfile, UserRecord},
    protocol::{ListFilters, ListResponse, LookupItem, SaveUserRequest},
};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

use crate::{api::DashboardApi, error::ClientError, ClientResult, Session};

pub(crate) fn sample_session() -> Session {
    Session {
        token: "test-token".to_string(),
        profile: UserProfile {
            id: ProfileId::new("op-1"),
            company_id: CompanyId::new("7"),
            role: Some("Super Admin".to_string()),
        },
    }
}

pub(crate) fn record_json(uid: &str, nik: &str, full_name: &str) -> Value {
    json!({
        "uid": uid,
        "nik": nik,
        "email": format!("{uid}@example.co.id"),
        "fullName": full_name,
        "role": "Admin",
        "state": "Offline",
        "status": "Active"
    })
}

pub(crate) fn record(uid: &str, nik: &str, full_name: &str) -> UserRecord {
    serde_json::from_value(record_json(uid, nik, full_name)).expect("record")
}

pub(crate) fn list_body(records: Vec<Value>) -> Value {
    let total = records.len();
    json!({
        "data": records,
        "total": total,
        "params": {},
        "allData": records,
    })
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
pub(crate) struct MockBackend {
    routes: Arc<Mutex<HashMap<(Method, String), (StatusCode, Value)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub async fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.routes
            .lock()
            .await
            .insert((method, path.to_string()), (status, body));
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|req| req.path == path)
            .cloned()
            .collect()
    }
}

async fn handle_any(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let body = (!body.is_empty())
        .then(|| serde_json::from_slice::<Value>(&body).ok())
        .flatten();
    backend.requests.lock().await.push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    let routes = backend.routes.lock().await;
    match routes.get(&(method, uri.path().to_string())) {
        Some((status, body)) => (*status, Json(body.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "no route"})),
        ),
    }
}

pub(crate) async fn spawn_mock_backend() -> (String, MockBackend) {
    let backend = MockBackend::default();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .fallback(handle_any)
        .with_state(backend.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), backend)
}

/// One queued answer for [`ScriptedApi::list_users`]. With a gate, the call
/// parks until the test releases it.
pub(crate) struct ScriptedList {
    pub gate: Option<oneshot::Receiver<()>>,
    pub result: Result<ListResponse, u16>,
}

impl ScriptedList {
    pub fn ok(records: Vec<UserRecord>) -> Self {
        let total = records.len() as u64;
        Self {
            gate: None,
            result: Ok(ListResponse {
                all_data: records.clone(),
                data: records,
                total,
                params: json!({}),
            }),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            gate: None,
            result: Err(status),
        }
    }

    pub fn gated(mut self) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        self.gate = Some(rx);
        (self, tx)
    }
}

fn http_error(path: &str, status: u16) -> ClientError {
    ClientError::Http {
        path: path.to_string(),
        status,
        message: "scripted failure".to_string(),
    }
}

#[derive(Default)]
pub(crate) struct ScriptedApi {
    pub lists: Mutex<VecDeque<ScriptedList>>,
    pub list_calls: Mutex<Vec<(EntityKind, ListFilters)>>,
    pub delete_calls: Mutex<Vec<(EntityKind, Uid)>>,
    pub create_calls: Mutex<Vec<(EntityKind, SaveUserRequest)>>,
    pub delete_status: Option<u16>,
}

impl ScriptedApi {
    pub fn with_lists(lists: Vec<ScriptedList>) -> Self {
        Self {
            lists: Mutex::new(lists.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl DashboardApi for ScriptedApi {
    async fn list_users(
        &self,
        _session: &Session,
        kind: EntityKind,
        filters: &ListFilters,
    ) -> ClientResult<ListResponse> {
        let next = self
            .lists
            .lock()
            .await
            .pop_front()
            .expect("unexpected list call");
        self.list_calls.lock().await.push((kind, filters.clone()));
        if let Some(gate) = next.gate {
            let _ = gate.await;
        }
        next.result.map_err(|status| http_error(kind.list_path(), status))
    }

    async fn create_user(
        &self,
        _session: &Session,
        kind: EntityKind,
        request: &SaveUserRequest,
    ) -> ClientResult<()> {
        self.create_calls.lock().await.push((kind, request.clone()));
        Ok(())
    }

    async fn update_user(
        &self,
        _session: &Session,
        _kind: EntityKind,
        _request: &SaveUserRequest,
    ) -> ClientResult<()> {
        Ok(())
    }

    async fn delete_user(
        &self,
        _session: &Session,
        kind: EntityKind,
        uid: &Uid,
    ) -> ClientResult<()> {
        self.delete_calls.lock().await.push((kind, uid.clone()));
        match self.delete_status {
            Some(status) => Err(http_error(kind.delete_path(), status)),
            None => Ok(()),
        }
    }

    async fn find_user(&self, _session: &Session, uid: &Uid) -> ClientResult<UserRecord> {
        Ok(record(uid.as_str(), "3201", "Scripted"))
    }

    async fn roles(&self, _session: &Session) -> ClientResult<Vec<LookupItem>> {
        Ok(Vec::new())
    }

    async fn roles_excluding(
        &self,
        _session: &Session,
        _role_name: &str,
    ) -> ClientResult<Vec<LookupItem>> {
        Ok(Vec::new())
    }

    async fn states(&self, _session: &Session) -> ClientResult<Vec<LookupItem>> {
        Ok(Vec::new())
    }

    async fn statuses(&self, _session: &Session) -> ClientResult<Vec<LookupItem>> {
        Ok(Vec::new())
    }

    async fn companies(
        &self,
        _session: &Session,
        _company_id: &CompanyId,
    ) -> ClientResult<Vec<LookupItem>> {
        Ok(Vec::new())
    }
}

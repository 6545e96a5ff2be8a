use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use harmony::sync::ChannelMessage;
use harmony::{
    HostedConnector, MemoryStore, ModulesConfig, NoopView, Orchestrator, RemoteConnector,
    RemoteError, RemoteStore, SyncStatus,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

const KEY: &str = "anon-test-key";
const TABLE: &str = "harmony_data";
const CHANNEL: &str = "harmony-all-changes";

struct Backend {
    rows: Mutex<BTreeMap<String, Value>>,
    prefer: Mutex<Vec<String>>,
    joins: Mutex<Vec<ChannelMessage>>,
    leaves: AtomicUsize,
    join_status: Mutex<String>,
    changes: broadcast::Sender<()>,
}

impl Backend {
    fn new() -> Arc<Self> {
        let (changes, _) = broadcast::channel(64);
        Arc::new(Self {
            rows: Mutex::new(BTreeMap::new()),
            prefer: Mutex::new(Vec::new()),
            joins: Mutex::new(Vec::new()),
            leaves: AtomicUsize::new(0),
            join_status: Mutex::new("ok".to_string()),
            changes,
        })
    }

    fn row(&self, key: &str) -> Option<Value> {
        self.rows.lock().unwrap().get(key).cloned()
    }
}

fn authorize(headers: &HeaderMap) -> Result<(), StatusCode> {
    let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());
    let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
    let expected = format!("Bearer {}", KEY);
    if apikey == Some(KEY) && bearer == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn select_rows(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    authorize(&headers)?;
    if query.get("select").map(String::as_str) != Some("*") {
        return Err(StatusCode::BAD_REQUEST);
    }
    let rows = backend.rows.lock().unwrap();
    Ok(Json(
        rows.iter()
            .map(|(key, content)| {
                json!({"key": key, "content": content, "updated_at": "2026-01-30T10:00:00+00:00"})
            })
            .collect(),
    ))
}

async fn upsert_rows(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(rows): Json<Vec<Value>>,
) -> StatusCode {
    if authorize(&headers).is_err() {
        return StatusCode::UNAUTHORIZED;
    }
    if query.get("on_conflict").map(String::as_str) != Some("key") {
        return StatusCode::BAD_REQUEST;
    }
    if let Some(prefer) = headers.get("prefer").and_then(|v| v.to_str().ok()) {
        backend.prefer.lock().unwrap().push(prefer.to_string());
    }
    for row in rows {
        let Some(key) = row["key"].as_str() else {
            return StatusCode::BAD_REQUEST;
        };
        backend
            .rows
            .lock()
            .unwrap()
            .insert(key.to_string(), row["content"].clone());
    }
    let _ = backend.changes.send(());
    StatusCode::CREATED
}

async fn realtime(
    State(backend): State<Arc<Backend>>,
    Query(query): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    if query.get("apikey").map(String::as_str) != Some(KEY) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    ws.on_upgrade(move |socket| serve_socket(socket, backend))
}

async fn serve_socket(mut socket: WebSocket, backend: Arc<Backend>) {
    let mut changes = backend.changes.subscribe();
    let mut joined: Option<String> = None;

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let Some(Ok(message)) = incoming else { break };
                let Message::Text(text) = message else { continue };
                let Ok(frame) = ChannelMessage::decode(text.as_str()) else { continue };

                let status = match frame.event.as_str() {
                    "phx_join" => {
                        backend.joins.lock().unwrap().push(frame.clone());
                        let status = backend.join_status.lock().unwrap().clone();
                        if status == "ok" {
                            joined = Some(frame.topic.clone());
                        }
                        status
                    }
                    "phx_leave" => {
                        backend.leaves.fetch_add(1, Ordering::SeqCst);
                        joined = None;
                        "ok".to_string()
                    }
                    _ => "ok".to_string(),
                };
                let reply = ChannelMessage::reply(&frame.topic, frame.msg_ref.clone(), &status);
                if socket.send(Message::Text(reply.encode().unwrap().into())).await.is_err() {
                    break;
                }
            }
            changed = changes.recv() => {
                if let Err(broadcast::error::RecvError::Closed) = changed {
                    break;
                }
                if let Some(topic) = &joined {
                    let change = ChannelMessage::change(topic);
                    if socket.send(Message::Text(change.encode().unwrap().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

async fn spawn_backend() -> (String, Arc<Backend>) {
    let backend = Backend::new();
    let app = Router::new()
        .route("/rest/v1/harmony_data", get(select_rows).post(upsert_rows))
        .route("/realtime/v1/websocket", get(realtime))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), backend)
}

fn connect(url: &str, key: &str) -> Arc<dyn RemoteStore> {
    HostedConnector::new(TABLE, "public", CHANNEL)
        .connect(url, key)
        .unwrap()
}

async fn within<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}

#[tokio::test]
async fn test_push_then_pull_round_trips_rows() {
    let (url, backend) = spawn_backend().await;
    let client = connect(&url, KEY);

    client.push("memo", &json!("first")).await.unwrap();
    client.push("memo", &json!("second")).await.unwrap();
    client.push("todos", &json!({"husband": []})).await.unwrap();

    let rows = client.pull_all().await.unwrap();
    assert_eq!(rows.len(), 2);
    let memo = rows.iter().find(|r| r.key == "memo").unwrap();
    assert_eq!(memo.content, json!("second"));
    assert!(memo.updated_at.is_some());

    assert_eq!(
        backend.prefer.lock().unwrap()[0],
        "resolution=merge-duplicates,return=minimal"
    );
}

#[tokio::test]
async fn test_wrong_key_is_rejected() {
    let (url, _backend) = spawn_backend().await;
    let client = connect(&url, "not-the-key");

    match client.pull_all().await {
        Err(RemoteError::Status(401, _)) => {}
        other => panic!("expected 401, got {:?}", other.map(|rows| rows.len())),
    }
    assert!(client.push("memo", &json!("x")).await.is_err());
}

#[tokio::test]
async fn test_subscription_signals_changes_and_leaves_on_close() {
    let (url, backend) = spawn_backend().await;
    let client = connect(&url, KEY);
    let (notify, mut changes) = mpsc::unbounded_channel();

    let subscription = within(client.subscribe(notify)).await.unwrap();
    {
        let joins = backend.joins.lock().unwrap();
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].topic, format!("realtime:{}", CHANNEL));
        assert_eq!(joins[0].payload["access_token"], KEY);
        assert_eq!(
            joins[0].payload["config"]["postgres_changes"][0]["table"],
            TABLE
        );
    }

    client.push("memo", &json!("changed")).await.unwrap();
    assert_eq!(within(changes.recv()).await, Some(()));

    subscription.close();
    within(async {
        while backend.leaves.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert_eq!(within(changes.recv()).await, None);
}

#[tokio::test]
async fn test_refused_join_is_handshake_error() {
    let (url, backend) = spawn_backend().await;
    *backend.join_status.lock().unwrap() = "error".to_string();
    let client = connect(&url, KEY);
    let (notify, _changes) = mpsc::unbounded_channel();

    let err = within(client.subscribe(notify)).await.unwrap_err();
    assert!(matches!(err, RemoteError::HandshakeError(_)), "{}", err);
}

#[tokio::test]
async fn test_orchestrator_syncs_through_hosted_backend() {
    let (url, backend) = spawn_backend().await;
    backend
        .rows
        .lock()
        .unwrap()
        .insert("memo".to_string(), json!("already there"));

    let mut orchestrator = Orchestrator::new(
        Arc::new(MemoryStore::new()),
        Arc::new(HostedConnector::new(TABLE, "public", CHANNEL)),
        Arc::new(NoopView),
        ModulesConfig::default(),
    );
    let status = within(orchestrator.reconfigure(&url, KEY)).await.unwrap();
    assert_eq!(status, SyncStatus::Online);
    assert_eq!(orchestrator.state().memo(), "already there");

    orchestrator.add_todo(harmony::Person::Shared, "Book flights").unwrap();
    orchestrator.flush().await;
    let todos = backend.row("todos").unwrap();
    assert_eq!(todos["shared"].as_array().unwrap().len(), 3);

    let peer = connect(&url, KEY);
    peer.push("memo", &json!("from the other phone")).await.unwrap();

    within(async {
        while orchestrator.state().memo() != "from the other phone" {
            assert!(orchestrator.next_remote_change().await);
            orchestrator.handle_remote_change().await.unwrap();
        }
    })
    .await;
    assert_eq!(orchestrator.status(), SyncStatus::Online);

    within(orchestrator.shutdown()).await;
    within(async {
        while backend.leaves.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
}

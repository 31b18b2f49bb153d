use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Credentials the session route accepts.
pub const VALID_EMAIL: &str = "e@x.com";
pub const VALID_PASSWORD: &str = "p";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contact {
    pub id: u64,
    pub name: String,
    pub group: String,
}

pub struct AppState {
    contacts: RwLock<HashMap<u64, Contact>>,
    next_id: AtomicU64,
}

type SharedState = Arc<AppState>;

type ApiError = (StatusCode, Json<Value>);

pub fn app() -> Router {
    let state: SharedState = Arc::new(AppState {
        contacts: RwLock::new(HashMap::new()),
        next_id: AtomicU64::new(1),
    });
    Router::new()
        .route("/api/contacts", get(list_contacts).post(create_contact))
        .route(
            "/api/contacts/{id}",
            get(get_contact).post(update_contact).delete(delete_contact),
        )
        .route("/api/session", post(login))
        .route("/api/avatar", post(upload_avatar))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

/// List contacts, newest id last, wrapped as `{"result": [...]}`. Requires
/// the `app_name` query parameter; `group` narrows the listing.
async fn list_contacts(
    State(state): State<SharedState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    if !query.contains_key("app_name") {
        return Err(error(StatusCode::BAD_REQUEST, "missing app_name"));
    }
    let contacts = state.contacts.read().await;
    let mut listed: Vec<Contact> = contacts
        .values()
        .filter(|contact| query.get("group").is_none_or(|g| &contact.group == g))
        .cloned()
        .collect();
    listed.sort_by_key(|contact| contact.id);
    Ok(Json(json!({ "result": listed })))
}

async fn create_contact(
    State(state): State<SharedState>,
    Json(input): Json<Value>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    let input = input
        .as_object()
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "body must be a JSON object"))?;
    if !input.contains_key("app_name") {
        return Err(error(StatusCode::BAD_REQUEST, "missing app_name"));
    }
    let name = input
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "missing name"))?;
    let group = input.get("group").and_then(Value::as_str).unwrap_or("other");

    let id = state.next_id.fetch_add(1, Ordering::Relaxed);
    let contact = Contact {
        id,
        name: name.to_string(),
        group: group.to_string(),
    };
    state.contacts.write().await.insert(id, contact.clone());
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn get_contact(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<Contact>, ApiError> {
    state
        .contacts
        .read()
        .await
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "contact not found"))
}

/// Update via POST to the record, applying only the fields present in the
/// body.
async fn update_contact(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(input): Json<Value>,
) -> Result<Json<Contact>, ApiError> {
    let mut contacts = state.contacts.write().await;
    let contact = contacts
        .get_mut(&id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "contact not found"))?;
    if let Some(name) = input.get("name").and_then(Value::as_str) {
        contact.name = name.to_string();
    }
    if let Some(group) = input.get("group").and_then(Value::as_str) {
        contact.group = group.to_string();
    }
    Ok(Json(contact.clone()))
}

/// Delete a contact, answering with the removed record.
async fn delete_contact(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<Contact>, ApiError> {
    state
        .contacts
        .write()
        .await
        .remove(&id)
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "contact not found"))
}

/// HTTP Basic login. Answers `{"token": ..., "email": ...}` for the one
/// accepted credential pair.
async fn login(headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "missing Authorization header"))?;
    let encoded = authorization
        .strip_prefix("Basic ")
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "expected Basic authorization"))?;
    let decoded = STANDARD
        .decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "malformed Basic credentials"))?;
    let (email, password) = decoded
        .split_once(':')
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "malformed Basic credentials"))?;

    if email != VALID_EMAIL || password != VALID_PASSWORD {
        return Err(error(StatusCode::UNAUTHORIZED, "invalid credentials"));
    }
    Ok(Json(json!({ "token": Uuid::new_v4(), "email": email })))
}

/// Accept a multipart upload and answer with a receipt for the first file
/// part.
async fn upload_avatar(mut multipart: Multipart) -> Result<Json<Value>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error(StatusCode::BAD_REQUEST, &e.to_string()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| error(StatusCode::BAD_REQUEST, &e.to_string()))?;
        return Ok(Json(json!({
            "file_name": file_name,
            "content_type": content_type,
            "size_bytes": bytes.len(),
        })));
    }
    Err(error(StatusCode::BAD_REQUEST, "no file part in upload"))
}

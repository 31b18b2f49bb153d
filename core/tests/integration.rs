//! Full lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every client
//! operation over real HTTP through the bundled ureq transport: list,
//! create, fetch, update, delete, Basic login, multipart upload, the error
//! paths for 404 and shape mismatches, and background dispatch. DTOs are
//! defined independently from the mock-server crate so these tests catch
//! schema drift.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use rest_core::{
    CallbackScheduler, ClientError, HttpMethod, LoadingIndicator, Params, Resource, RestClient,
    UploadFile,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, PartialEq)]
struct Contact {
    id: u64,
    name: String,
    group: String,
}

impl Resource for Contact {
    fn base_path() -> &'static str {
        "/api/contacts"
    }

    fn default_params() -> Params {
        params(json!({"app_name": "contacts-demo"}))
    }
}

#[derive(Debug, Deserialize)]
struct Session {
    token: String,
    email: String,
}

impl Resource for Session {
    fn base_path() -> &'static str {
        "/api/session"
    }
}

#[derive(Debug, Deserialize)]
struct AvatarReceipt {
    file_name: String,
    content_type: String,
    size_bytes: u64,
}

impl Resource for AvatarReceipt {
    fn base_path() -> &'static str {
        "/api/avatar"
    }
}

fn params(value: serde_json::Value) -> Params {
    value.as_object().cloned().unwrap()
}

/// Start the mock server on a random port and return its base URL.
fn spawn_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn client(base_url: &str) -> RestClient {
    RestClient::builder(base_url)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

#[test]
fn contact_lifecycle() {
    let base = spawn_server();
    let client = client(&base);

    // Step 1: list — empty; app_name rides in from Contact's defaults.
    let contacts: Vec<Contact> = client.fetch_many("", Params::new(), false).unwrap();
    assert!(contacts.is_empty(), "expected empty list");

    // Step 2: create via POST to the collection.
    let created: Contact = client
        .update_one("", params(json!({"name": "Ada", "group": "work"})), false)
        .unwrap();
    assert_eq!(created.name, "Ada");
    assert_eq!(created.group, "work");
    let id = created.id;

    // Step 3: fetch the created record.
    let fetched: Contact = client
        .fetch_one(&format!("/{id}"), Params::new(), false)
        .unwrap();
    assert_eq!(fetched, created);

    // Step 4: partial update via POST to the record.
    let updated: Contact = client
        .update_one(&format!("/{id}"), params(json!({"name": "Ada L."})), false)
        .unwrap();
    assert_eq!(updated.name, "Ada L.");
    assert_eq!(updated.group, "work");

    // Step 5: a second contact, then narrow the listing by group.
    let _: Contact = client
        .update_one("", params(json!({"name": "Bob", "group": "friends"})), false)
        .unwrap();
    let work: Vec<Contact> = client
        .fetch_many("", params(json!({"group": "work"})), false)
        .unwrap();
    assert_eq!(work.len(), 1);
    assert_eq!(work[0].name, "Ada L.");

    // Step 6: delete answers with the removed record.
    let deleted: Contact = client
        .delete_one(&format!("/{id}"), Params::new(), false)
        .unwrap();
    assert_eq!(deleted.id, id);

    // Step 7: fetching it again is an HTTP error, not a panic.
    let err = client
        .fetch_one::<Contact>(&format!("/{id}"), Params::new(), false)
        .unwrap_err();
    assert!(matches!(err, ClientError::HttpStatus { status: 404, .. }));

    // Step 8: only Bob remains.
    let remaining: Vec<Contact> = client.fetch_many("", Params::new(), false).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Bob");
}

#[test]
fn basic_login_round_trip() {
    let base = spawn_server();
    let client = client(&base);

    let session: Session = client
        .login_basic("", "e@x.com", "p", Params::new(), false)
        .unwrap();
    assert_eq!(session.email, "e@x.com");
    assert!(!session.token.is_empty());

    let err = client
        .login_basic::<Session>("", "e@x.com", "wrong", Params::new(), false)
        .unwrap_err();
    assert!(matches!(err, ClientError::HttpStatus { status: 401, .. }));
}

#[test]
fn avatar_upload_round_trip() {
    let base = spawn_server();
    let client = client(&base);

    let file = UploadFile {
        field: "avatar".to_string(),
        file_name: "me.png".to_string(),
        content_type: "image/png".to_string(),
        bytes: vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a],
    };
    let receipt: AvatarReceipt = client
        .upload("", params(json!({"caption": "hello"})), &[file], false)
        .unwrap();
    assert_eq!(receipt.file_name, "me.png");
    assert_eq!(receipt.content_type, "image/png");
    assert_eq!(receipt.size_bytes, 6);
}

#[test]
fn server_enforces_the_app_name_default() {
    let base = spawn_server();
    let client = client(&base);

    // Without the resource defaults the server rejects the listing.
    let err = client
        .raw_request(HttpMethod::Get, "/api/contacts", Params::new(), false, &[])
        .unwrap_err();
    match err {
        ClientError::HttpStatus { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("app_name"));
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[test]
fn list_shape_mismatch_is_a_decode_error() {
    let base = spawn_server();
    let client = client(&base);

    // The collection endpoint answers with a result envelope, not a single
    // contact.
    let err = client
        .fetch_one::<Contact>("", Params::new(), false)
        .unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[derive(Default)]
struct CountingIndicator {
    shown: AtomicUsize,
    hidden: AtomicUsize,
}

impl LoadingIndicator for CountingIndicator {
    fn show(&self) {
        self.shown.fetch_add(1, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.hidden.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn background_fetch_delivers_one_completion_over_real_http() {
    let base = spawn_server();
    let indicator = Arc::new(CountingIndicator::default());
    let scheduled = Arc::new(AtomicUsize::new(0));
    let scheduler: CallbackScheduler = {
        let scheduled = scheduled.clone();
        Arc::new(move |job| {
            scheduled.fetch_add(1, Ordering::SeqCst);
            job();
        })
    };
    let client = RestClient::builder(&base)
        .timeout(Duration::from_secs(5))
        .loading_indicator(indicator.clone())
        .callback_scheduler(scheduler)
        .build()
        .unwrap();

    let (tx, rx) = mpsc::channel::<Result<Vec<Contact>, ClientError>>();
    client.fetch_many_background("".to_string(), Params::new(), true, move |outcome| {
        tx.send(outcome).unwrap();
    });

    let contacts = rx.recv_timeout(Duration::from_secs(10)).unwrap().unwrap();
    assert!(contacts.is_empty());
    assert!(
        rx.recv_timeout(Duration::from_millis(200)).is_err(),
        "completion must fire exactly once"
    );
    assert_eq!(scheduled.load(Ordering::SeqCst), 1);
    assert_eq!(indicator.shown.load(Ordering::SeqCst), 1);
    assert_eq!(indicator.hidden.load(Ordering::SeqCst), 1);
}

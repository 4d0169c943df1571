use super::*;
use std::{
    fs,
    io::Read,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Multipart, State},
    http::{StatusCode, Uri},
    routing::post,
    Router,
};
use flate2::read::ZlibDecoder;
use notify_debouncer_mini::notify;
use shared::domain::{Severity, XmlFileKind};
use tokio::net::TcpListener;

const RESULT_LIST: &str =
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?><ResultList iofVersion=\"3.0\"></ResultList>";

fn temp_dir(label: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("uploader_core_{label}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    dir
}

struct FixedFolderPicker(Option<PathBuf>);

#[async_trait]
impl FolderPicker for FixedFolderPicker {
    async fn pick_folder(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

#[derive(Default)]
struct RecordingUploader {
    calls: std::sync::Mutex<Vec<(XmlFileKind, PathBuf, String)>>,
    reject_with: Option<String>,
}

#[async_trait]
impl ResultsUploader for RecordingUploader {
    async fn upload(
        &self,
        kind: XmlFileKind,
        path: &Path,
        api_key: &str,
    ) -> Result<(), UploadError> {
        self.calls
            .lock()
            .expect("calls")
            .push((kind, path.to_path_buf(), api_key.to_string()));
        match &self.reject_with {
            Some(body) => Err(UploadError::Rejected {
                status: reqwest::StatusCode::UNAUTHORIZED,
                body: body.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn host_with(picker: Option<PathBuf>) -> Arc<UploaderHost> {
    UploaderHost::with_uploader(
        &Settings::default(),
        Arc::new(FixedFolderPicker(picker)),
        Arc::new(RecordingUploader::default()),
    )
    .expect("host")
}

#[tokio::test]
async fn watch_without_folder_reports_no_folder_selected() {
    let host = host_with(None);
    let err = host.watch().await.expect_err("must fail");
    assert_eq!(err.to_string(), "No folder selected");
}

#[tokio::test]
async fn set_api_key_stores_and_clears_credential() {
    let host = host_with(None);
    host.set_api_key("ABC123").await.expect("set");
    assert_eq!(host.api_key().await.as_deref(), Some("ABC123"));

    host.set_api_key("").await.expect("clear");
    assert_eq!(host.api_key().await, None);
}

#[tokio::test]
async fn pick_folder_remembers_chosen_folder() {
    let dir = temp_dir("pick");
    let host = host_with(Some(dir.clone()));

    let picked = host.pick_folder().await.expect("pick");
    assert_eq!(picked, Some(dir.display().to_string()));
    assert_eq!(host.folder().await, Some(dir));
}

#[tokio::test]
async fn cancelled_pick_keeps_previous_folder() {
    let dir = temp_dir("cancel");
    let host = host_with(None);
    host.set_folder(dir.clone()).await;

    assert_eq!(host.pick_folder().await.expect("pick"), None);
    assert_eq!(host.folder().await, Some(dir));
}

#[tokio::test]
async fn watch_and_unwatch_existing_folder() {
    let dir = temp_dir("watch");
    let host = host_with(None);
    host.set_folder(dir.clone()).await;

    host.watch().await.expect("watch");
    assert_eq!(host.watched_path().await, Some(dir));

    host.unwatch().await.expect("unwatch");
    assert_eq!(host.watched_path().await, None);
    // Unwatching twice is harmless.
    host.unwatch().await.expect("second unwatch");
}

#[tokio::test]
async fn stalled_watch_setup_yields_to_caller_deadline() {
    let dir = temp_dir("stalled");
    let host = host_with(None);
    host.set_folder(dir.clone()).await;

    let busy = host.watcher.lock().await;
    let attempt = tokio::time::timeout(Duration::from_millis(50), host.watch()).await;
    assert!(attempt.is_err(), "watch must not hold the caller past its deadline");
    drop(busy);

    // The abandoned setup still completes on its blocking thread.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while host.watched_path().await.is_none() {
        assert!(tokio::time::Instant::now() < deadline, "watch never completed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(host.watched_path().await, Some(dir));
    host.unwatch().await.expect("unwatch");
}

#[tokio::test]
async fn watch_missing_folder_fails_and_leaves_watcher_idle() {
    let host = host_with(None);
    host.set_folder(std::env::temp_dir().join("uploader_core_missing_folder/nope"))
        .await;

    assert!(host.watch().await.is_err());
    assert_eq!(host.watched_path().await, None);
}

#[tokio::test]
async fn recognized_file_is_uploaded_and_reported_as_success() {
    let dir = temp_dir("upload_ok");
    let path = dir.join("results.xml");
    fs::write(&path, RESULT_LIST).expect("write");
    let uploader = RecordingUploader::default();

    let entry = upload_changed_file(&path, Some("ABC123".into()), &uploader).await;

    assert_eq!(
        entry,
        LogEntry::success("ResultList uploaded", path.display().to_string())
    );
    let calls = uploader.calls.lock().expect("calls");
    assert_eq!(
        *calls,
        vec![(XmlFileKind::ResultList, path.clone(), "ABC123".to_string())]
    );
}

#[tokio::test]
async fn upload_failures_become_error_entries() {
    let dir = temp_dir("upload_err");
    let results = dir.join("results.xml");
    fs::write(&results, RESULT_LIST).expect("write");
    let entries = dir.join("entries.xml");
    fs::write(&entries, "<EntryList/>").expect("write");

    let uploader = RecordingUploader::default();
    let missing_key = upload_changed_file(&results, None, &uploader).await;
    assert_eq!(missing_key.severity, Severity::Error);
    assert_eq!(missing_key.event, "API key is not set");

    let unrecognized = upload_changed_file(&entries, Some("k".into()), &uploader).await;
    assert_eq!(unrecognized.event, "Unrecognized file type");
    assert!(uploader.calls.lock().expect("calls").is_empty());

    let rejecting = RecordingUploader {
        reject_with: Some("invalid api key".into()),
        ..RecordingUploader::default()
    };
    let rejected = upload_changed_file(&results, Some("k".into()), &rejecting).await;
    assert_eq!(
        rejected,
        LogEntry::error_for("invalid api key", results.display().to_string())
    );
}

#[tokio::test]
async fn watcher_errors_on_xml_paths_are_reported() {
    let lock = RwLock::new(Some("k".to_string()));
    let uploader = RecordingUploader::default();

    let err = notify::Error::generic("watch overflow").add_path(PathBuf::from("/exports/a.xml"));
    let entries = process_batch(Err(err), &lock, &uploader).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Error);
    assert_eq!(entries[0].filename.as_deref(), Some("/exports/a.xml"));

    let unrelated = notify::Error::generic("boom").add_path(PathBuf::from("/exports/a.csv"));
    assert!(process_batch(Err(unrelated), &lock, &uploader).await.is_empty());
}

#[derive(Debug)]
struct ReceivedUpload {
    path: String,
    api_key: String,
    file: Vec<u8>,
}

#[derive(Clone)]
struct ServerState {
    tx: mpsc::UnboundedSender<ReceivedUpload>,
    status: StatusCode,
    body: String,
}

async fn handle_upload(
    State(state): State<ServerState>,
    uri: Uri,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    let mut api_key = String::new();
    let mut file = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap_or_default();
        match name.as_str() {
            "apiKey" => api_key = String::from_utf8_lossy(&bytes).into_owned(),
            "file" => file = bytes.to_vec(),
            _ => {}
        }
    }
    let _ = state.tx.send(ReceivedUpload {
        path: uri.path().to_string(),
        api_key,
        file,
    });
    (state.status, state.body.clone())
}

async fn spawn_results_server(
    status: StatusCode,
    body: &str,
) -> Result<(String, mpsc::UnboundedReceiver<ReceivedUpload>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = mpsc::unbounded_channel();
    let state = ServerState {
        tx,
        status,
        body: body.to_string(),
    };
    let app = Router::new()
        .route("/results", post(handle_upload))
        .route("/start-lists", post(handle_upload))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/"), rx))
}

#[tokio::test]
async fn http_uploader_posts_compressed_document_with_api_key() {
    let (server_url, mut received) = spawn_results_server(StatusCode::OK, "")
        .await
        .expect("spawn server");
    let dir = temp_dir("http_ok");
    let path = dir.join("start.xml");
    let body = "<StartList><ClassStart/></StartList>";
    fs::write(&path, body).expect("write");

    let uploader = HttpResultsUploader::new(server_url);
    uploader
        .upload(XmlFileKind::StartList, &path, "ABC123")
        .await
        .expect("upload");

    let upload = received.recv().await.expect("request");
    assert_eq!(upload.path, "/start-lists");
    assert_eq!(upload.api_key, "ABC123");
    let mut inflated = String::new();
    ZlibDecoder::new(upload.file.as_slice())
        .read_to_string(&mut inflated)
        .expect("inflate");
    assert_eq!(inflated, body);
}

#[tokio::test]
async fn http_uploader_surfaces_rejection_body() {
    let (server_url, _received) =
        spawn_results_server(StatusCode::UNPROCESSABLE_ENTITY, "Event not found")
            .await
            .expect("spawn server");
    let dir = temp_dir("http_reject");
    let path = dir.join("results.xml");
    fs::write(&path, RESULT_LIST).expect("write");

    let err = HttpResultsUploader::new(server_url)
        .upload(XmlFileKind::ResultList, &path, "ABC123")
        .await
        .expect_err("must fail");
    match &err {
        UploadError::Rejected { status, body } => {
            assert_eq!(*status, reqwest::StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body, "Event not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "Event not found");
}

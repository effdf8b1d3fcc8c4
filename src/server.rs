//! Local HTTP API in front of the intake and collection engine.
//!
//! Every request resolves the dated root once, at the start of the
//! request, and hands it to the engine. Engine calls are blocking
//! filesystem work and run on the blocking thread pool.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/upload` | Multipart `file` field with a CSV client table |
//! | `POST` | `/search-docs` | Sweep all client folders against a source directory |
//! | `POST` | `/manual-search` | Collect for one client folder from a source directory |
//! | `GET`  | `/get-empty-folders` | Sorted list of empty client folders |
//! | `GET`  | `/download-zip` | Zip of the dated root |
//! | `GET`  | `/download-summary` | CSV summary of every client folder |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "search directory is not valid: /nope" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::archive;
use crate::collector::{ClientSummary, Collector};
use crate::config::Config;
use crate::dated_root::DatedRoot;
use crate::error::KycError;
use crate::intake::{self, TableFormat};
use crate::inventory;
use crate::report;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    /// Serve a fixed day instead of the current local date.
    pinned_date: Option<NaiveDate>,
}

impl AppState {
    pub fn new(config: Config, pinned_date: Option<NaiveDate>) -> Self {
        Self {
            config: Arc::new(config),
            pinned_date,
        }
    }

    fn root(&self) -> DatedRoot {
        DatedRoot::resolve(&self.config.workspace, self.pinned_date)
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/upload", post(handle_upload))
        .route("/search-docs", post(handle_search_docs))
        .route("/manual-search", post(handle_manual_search))
        .route("/get-empty-folders", get(handle_empty_folders))
        .route("/download-zip", get(handle_download_zip))
        .route("/download-summary", get(handle_download_summary))
        .layer(cors)
        .with_state(state)
}

/// Bind to `[server].bind` and serve until the process is terminated.
pub async fn run_server(config: &Config, pinned_date: Option<NaiveDate>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(AppState::new(config.clone(), pinned_date));

    println!("KYC intake server listening on http://{}", bind_addr);
    info!(
        "Client folders live under {}",
        config.workspace.base_dir.display()
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<KycError> for AppError {
    fn from(err: KycError) -> Self {
        if err.is_input_error() {
            bad_request(err.to_string())
        } else if err.is_not_found() {
            not_found(err.to_string())
        } else {
            internal(err.to_string())
        }
    }
}

/// Run blocking engine work off the async runtime.
async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| internal(format!("worker failed: {}", e)))?
        .map_err(AppError::from)
}

fn attachment(bytes: Vec<u8>, content_type: &'static str, filename: &str) -> Response {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /upload ============

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    folders_created: usize,
    folders_existing: usize,
    rows_skipped: usize,
    folders_failed: usize,
}

/// Handler for `POST /upload`.
///
/// Expects a multipart form with a `file` field holding a header-less
/// CSV or Excel table of `identifier,name` rows.
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut table = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("malformed upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(bad_request("No file selected for uploading."));
        }
        let format = TableFormat::from_file_name(&file_name).ok_or_else(|| {
            bad_request(format!(
                "Invalid file type. Please upload a client table ({}).",
                TableFormat::ACCEPTED
            ))
        })?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("malformed upload: {}", e)))?;
        table = Some((format, bytes.to_vec()));
        break;
    }
    let (format, table) = table.ok_or_else(|| bad_request("No file part in the request."))?;

    let root = state.root();
    let root_display = root.path().display().to_string();
    let report = blocking(move || intake::run_intake(&root, format, &table)).await?;

    Ok(Json(UploadResponse {
        message: format!(
            "{} client folders prepared/verified in '{}'.",
            report.created, root_display
        ),
        folders_created: report.created,
        folders_existing: report.existing,
        rows_skipped: report.skipped,
        folders_failed: report.failed,
    }))
}

// ============ POST /search-docs ============

#[derive(Deserialize)]
struct SearchDocsRequest {
    directory: Option<String>,
    #[serde(default)]
    disable_exclusions: bool,
}

#[derive(Serialize)]
struct SearchDocsResponse {
    message: String,
    folders_processed: usize,
    folders_skipped: usize,
    files_copied: u64,
    total_size_kb: f64,
    total_size: String,
    empty_folders: Vec<String>,
    client_summary: Vec<ClientSummary>,
}

/// Handler for `POST /search-docs`: full sweep of today's client folders.
async fn handle_search_docs(
    State(state): State<AppState>,
    Json(req): Json<SearchDocsRequest>,
) -> Result<Json<SearchDocsResponse>, AppError> {
    let directory = req
        .directory
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| bad_request("No directory provided for searching."))?;

    let root = state.root();
    let config = state.config.clone();
    let exclusions = if req.disable_exclusions {
        Some(false)
    } else {
        None
    };

    let (report, empty_folders) = blocking(move || {
        let collector = Collector::from_config(&config, exclusions)?;
        let report = collector.collect_all(&root, &PathBuf::from(directory))?;
        Ok((report, inventory::empty_folders(&root)))
    })
    .await?;

    let total_size_kb = report.total_size_kb();
    Ok(Json(SearchDocsResponse {
        message: format!(
            "Document organization completed. Processed {} client folders.",
            report.folders_processed
        ),
        folders_processed: report.folders_processed,
        folders_skipped: report.folders_skipped,
        files_copied: report.files_copied,
        total_size_kb,
        total_size: format!("{} KB", total_size_kb),
        empty_folders,
        client_summary: report.clients,
    }))
}

// ============ POST /manual-search ============

#[derive(Deserialize)]
struct ManualSearchRequest {
    search_path: Option<String>,
    folder: Option<String>,
}

#[derive(Serialize)]
struct ManualSearchResponse {
    message: String,
    files_copied: u64,
    updated_empty_folders: Vec<String>,
}

/// Handler for `POST /manual-search`: retry collection for one client
/// folder against a different source directory.
async fn handle_manual_search(
    State(state): State<AppState>,
    Json(req): Json<ManualSearchRequest>,
) -> Result<Json<ManualSearchResponse>, AppError> {
    let (search_path, folder) = match (req.search_path, req.folder) {
        (Some(path), Some(folder)) if !path.trim().is_empty() && !folder.trim().is_empty() => {
            (path, folder)
        }
        _ => {
            return Err(bad_request(
                "Invalid request parameters: 'search_path' and 'folder' are required.",
            ))
        }
    };

    let root = state.root();
    let config = state.config.clone();
    let target = folder.clone();
    let (outcome, updated_empty_folders) = blocking(move || {
        let collector = Collector::from_config(&config, None)?;
        let outcome = collector.collect_single(&root, &PathBuf::from(search_path), &target)?;
        Ok((outcome, inventory::empty_folders(&root)))
    })
    .await?;

    Ok(Json(ManualSearchResponse {
        message: format!(
            "Manual search for '{}' completed. Copied {} new file(s).",
            folder, outcome.files_copied
        ),
        files_copied: outcome.files_copied,
        updated_empty_folders,
    }))
}

// ============ GET /get-empty-folders ============

async fn handle_empty_folders(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let root = state.root();
    let folders = blocking(move || Ok(inventory::empty_folders(&root))).await?;
    Ok(Json(folders))
}

// ============ GET /download-zip ============

/// Handler for `GET /download-zip`. The archive is also left at
/// `{base_dir}/{archive_name}`.
async fn handle_download_zip(State(state): State<AppState>) -> Result<Response, AppError> {
    let root = state.root();
    let dest = state.config.archive_path();
    let name = state.config.workspace.archive_name.clone();

    let bytes = blocking(move || {
        archive::export_archive(&root, &dest)?;
        std::fs::read(&dest).map_err(|e| KycError::io(&dest, e))
    })
    .await?;

    Ok(attachment(bytes, "application/zip", &name))
}

// ============ GET /download-summary ============

/// Handler for `GET /download-summary`. The report is also left at
/// `{base_dir}/{summary_name}`.
async fn handle_download_summary(State(state): State<AppState>) -> Result<Response, AppError> {
    let root = state.root();
    let dest = state.config.summary_path();
    let name = state.config.workspace.summary_name.clone();

    let bytes = blocking(move || {
        report::export_summary(&root, &dest)?;
        std::fs::read(&dest).map_err(|e| KycError::io(&dest, e))
    })
    .await?;

    Ok(attachment(bytes, "text/csv", &name))
}

//! Upload endpoint: accept a transcript dump, answer with the generated workbook.

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::metrics;
use crate::report::{ReportGenerator, ReportOutcome};
use crate::Error;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Chat Report</title></head>
<body>
<h1>Chat support report</h1>
<form action="/upload" method="post" enctype="multipart/form-data">
  <input type="file" name="file" accept=".csv,text/csv">
  <button type="submit">Generate report</button>
</form>
</body>
</html>
"#;

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    upload_path: PathBuf,
    generator: ReportGenerator,
    /// Held across save + generate; the upload path is a single shared file.
    generation: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            upload_path: config.upload_path(),
            generator: ReportGenerator::from_config(config),
            generation: Arc::new(Mutex::new(())),
        }
    }
}

/// Error returned to HTTP clients.
#[derive(Debug)]
pub struct ApiError(Error);

impl<E> From<E> for ApiError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::NoUpload | Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            err if err.is_input_error() => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "Upload failed");
        } else {
            warn!(error = %self.0, "Upload rejected");
        }
        (status, self.0.to_string()).into_response()
    }
}

/// Build the router with all routes and middleware.
pub fn build_router(config: &Config) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes()))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(config))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Pull the `file` field out of the form. A missing field or a blank file
/// name means nothing was uploaded.
async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidArgument(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        if field.file_name().map_or(true, str::is_empty) {
            return Err(Error::NoUpload.into());
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidArgument(e.body_text()))?;
        return Ok(data.to_vec());
    }
    Err(Error::NoUpload.into())
}

async fn upload(State(state): State<AppState>, multipart: Multipart) -> Result<Response, ApiError> {
    let data = read_upload(multipart).await?;

    let _guard = state.generation.lock().await;
    if let Some(parent) = state.upload_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&state.upload_path, &data).await?;
    info!(path = %state.upload_path.display(), bytes = data.len(), "📥 Upload saved");

    let outcome = run_generation(&state).await?;
    let body = tokio::fs::read(&outcome.path).await.map_err(|e| {
        warn!(path = %outcome.path.display(), error = %e, "Report vanished before send");
        Error::ReportNotFound
    })?;

    let disposition = format!("attachment; filename=\"{}\"", outcome.file_name()?);
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(body),
    )
        .into_response())
}

async fn run_generation(state: &AppState) -> Result<ReportOutcome, ApiError> {
    let generator = state.generator.clone();
    let input = state.upload_path.clone();

    metrics::record_report_start("upload");
    let start = Instant::now();
    let result = tokio::task::spawn_blocking(move || generator.generate(&input))
        .await
        .map_err(task_failed)
        .and_then(|r| r);
    metrics::record_report_result("upload", start.elapsed(), result.is_ok());

    Ok(result?)
}

/// A generation task that panicked or was cancelled is a server fault.
fn task_failed(err: tokio::task::JoinError) -> Error {
    Error::Internal(format!("report task failed: {}", err))
}

/// Start the HTTP server.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let router = build_router(config);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "🚀 Upload server started");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Upload server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "chatreportboundary";
    const DUMP: &str = "ClosedBy,ChatStartTime,ChatEndTime,AgentFirstResponseTime,CSATScore\n\
        System,2024-03-01 08:00:00,2024-03-01 08:02:00,,\n\
        agentA,2024-03-01 09:00:00,2024-03-01 09:10:00,60,5\n";

    fn test_config() -> (TempDir, Config) {
        let tmp = TempDir::new().unwrap();
        let config = Config::rooted_at(tmp.path());
        (tmp, config)
    }

    fn multipart_body(field: &str, file_name: &str, content: &str) -> String {
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        )
    }

    fn upload_request(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&bytes).to_string()
    }

    #[tokio::test]
    async fn index_serves_upload_form() {
        let (_tmp, config) = test_config();
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();

        let resp = build_router(&config).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("name=\"file\""));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (_tmp, config) = test_config();
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let resp = build_router(&config).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("\"ok\""));
    }

    #[tokio::test]
    async fn upload_without_file_field_is_bad_request() {
        let (_tmp, config) = test_config();
        let body = multipart_body("other", "dump.csv", DUMP);

        let resp = build_router(&config)
            .oneshot(upload_request(body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(resp).await, "No file uploaded!");
        assert!(!config.reports_dir.exists());
    }

    #[tokio::test]
    async fn upload_with_blank_file_name_is_bad_request() {
        let (_tmp, config) = test_config();
        let body = multipart_body("file", "", "");

        let resp = build_router(&config)
            .oneshot(upload_request(body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upload_returns_report_attachment() {
        let (_tmp, config) = test_config();
        let body = multipart_body("file", "dump.csv", DUMP);

        let resp = build_router(&config)
            .oneshot(upload_request(body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"report_"));
        assert!(disposition.ends_with(".xlsx\""));

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        // XLSX is a zip container.
        assert_eq!(&bytes[..2], b"PK");

        assert_eq!(std::fs::read_to_string(config.upload_path()).unwrap(), DUMP);
        assert_eq!(std::fs::read_dir(&config.reports_dir).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn upload_with_missing_column_is_unprocessable() {
        let (_tmp, config) = test_config();
        let body = multipart_body("file", "dump.csv", "ClosedBy,CSATScore\nagentA,5\n");

        let resp = build_router(&config)
            .oneshot(upload_request(body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(resp).await.contains("Missing required column"));
    }

    #[test]
    fn api_error_status_mapping() {
        let status = |err: Error| ApiError(err).into_response().status();

        assert_eq!(status(Error::NoUpload), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(Error::MissingColumn("ClosedBy".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status(Error::ReportNotFound), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status(Error::SpreadsheetError("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(Error::Internal("report task failed".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn panicked_generation_is_server_error() {
        let join_err = tokio::task::spawn_blocking(|| {
            panic!("generator blew up");
        })
        .await
        .unwrap_err();
        let err = task_failed(join_err);
        assert!(matches!(err, Error::Internal(_)));

        let resp = ApiError::from(err).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

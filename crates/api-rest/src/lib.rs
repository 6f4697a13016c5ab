//! # API REST
//!
//! REST API implementation for fEMR encounter reports.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (status codes, content headers, CORS)
//!
//! Report generation is synchronous, so handlers run it on tokio's blocking pool under the
//! configured fetch timeout.
//!
//! Uses `api-shared` for common types and utilities.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{EncounterFieldsRes, HealthRes, HealthService, ReportQuery};
use femr_core::{
    config::{fetch_timeout_from_env_value, resolve_data_dir},
    CoreConfig, EncounterId, PageLayout, ReportError, ReportFormat, ReportResult, ReportService,
};

/// Default listen address of the REST server.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Header telling clients whether a report was cut short by a rendering failure.
pub const REPORT_COMPLETE_HEADER: &str = "x-report-complete";

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub report_service: Arc<ReportService>,
}

impl AppState {
    pub fn new(report_service: ReportService) -> Self {
        Self {
            report_service: Arc::new(report_service),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, encounter_report, encounter_fields),
    components(schemas(HealthRes, EncounterFieldsRes))
)]
pub struct ApiDoc;

/// Builds the REST router, including Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/encounters/:id/report", get(encounter_report))
        .route("/encounters/:id/fields", get(encounter_fields))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolves the core configuration from the process environment.
///
/// Called once at startup by the server binaries.
///
/// # Environment Variables
/// - `FEMR_DATA_DIR`: encounter data directory (default: `encounter_data`)
/// - `FEMR_FETCH_TIMEOUT_SECS`: report generation timeout in seconds (default: 10)
///
/// # Errors
/// Returns an error if the data directory does not exist or the timeout is not a positive whole
/// number of seconds.
pub fn core_config_from_env() -> anyhow::Result<CoreConfig> {
    let data_dir = resolve_data_dir(std::env::var("FEMR_DATA_DIR").ok().map(PathBuf::from))?;
    let fetch_timeout =
        fetch_timeout_from_env_value(std::env::var("FEMR_FETCH_TIMEOUT_SECS").ok())?;
    Ok(CoreConfig::new(data_dir, fetch_timeout, PageLayout::a4())?)
}

/// Maps a core error to the response returned to clients.
pub fn error_status(err: &ReportError) -> (StatusCode, &'static str) {
    match err {
        ReportError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Bad request"),
        ReportError::Fetch { .. } => (StatusCode::BAD_GATEWAY, "Failed to fetch encounter data"),
        ReportError::MalformedObservation { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Malformed encounter data")
        }
        ReportError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    }
}

fn parse_encounter_id(id: &str) -> Result<EncounterId, (StatusCode, &'static str)> {
    id.parse::<EncounterId>().map_err(|e| {
        tracing::warn!("Invalid encounter id {:?}: {}", id, e);
        (StatusCode::BAD_REQUEST, "Invalid encounter id")
    })
}

/// Runs `work` on the blocking pool, giving up after `timeout`.
async fn run_blocking<T, F>(timeout: Duration, work: F) -> Result<T, (StatusCode, &'static str)>
where
    F: FnOnce() -> ReportResult<T> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(work);
    match tokio::time::timeout(timeout, task).await {
        Err(_) => {
            tracing::error!("Report generation timed out after {:?}", timeout);
            Err((StatusCode::GATEWAY_TIMEOUT, "Timed out fetching encounter data"))
        }
        Ok(Err(e)) => {
            tracing::error!("Report task failed: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
        Ok(Ok(Err(e))) => {
            tracing::error!("Report error: {}", e);
            Err(error_status(&e))
        }
        Ok(Ok(Ok(value))) => Ok(value),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// This endpoint is used for monitoring and load balancer health checks.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/encounters/{id}/report",
    params(
        ("id" = u32, Path, description = "Encounter id"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "Encounter report, PDF by default or plain text"),
        (status = 400, description = "Invalid encounter id or report format"),
        (status = 502, description = "Encounter data could not be fetched"),
        (status = 504, description = "Fetching encounter data timed out"),
        (status = 500, description = "Internal server error")
    )
)]
/// Generate the report of one encounter
///
/// The document is served inline so browsers display it directly. If rendering fails part way,
/// whatever was produced is still returned and the `x-report-complete` header is `false`.
async fn encounter_report(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, (StatusCode, &'static str)> {
    let encounter_id = parse_encounter_id(&id)?;
    let format = match query.format.as_deref() {
        None => ReportFormat::default(),
        Some(format) => format.parse::<ReportFormat>().map_err(|e| {
            tracing::warn!("{}", e);
            (StatusCode::BAD_REQUEST, "Unknown report format")
        })?,
    };

    let service = state.report_service.clone();
    let timeout = service.config().fetch_timeout();
    let rendered = run_blocking(timeout, move || service.generate(encounter_id, format)).await?;

    let extension = match format {
        ReportFormat::Pdf => "pdf",
        ReportFormat::Text => "txt",
    };
    let disposition = format!("inline; filename=\"encounter-{encounter_id}.{extension}\"");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, rendered.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (
                HeaderName::from_static(REPORT_COMPLETE_HEADER),
                rendered.complete.to_string(),
            ),
        ],
        rendered.bytes,
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/encounters/{id}/fields",
    params(("id" = u32, Path, description = "Encounter id")),
    responses(
        (status = 200, description = "Custom categories and chief complaints", body = EncounterFieldsRes),
        (status = 400, description = "Invalid encounter id"),
        (status = 502, description = "Encounter data could not be fetched"),
        (status = 504, description = "Fetching encounter data timed out"),
        (status = 500, description = "Internal server error")
    )
)]
/// List the custom tab-field categories and chief complaints of one encounter
async fn encounter_fields(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<EncounterFieldsRes>, (StatusCode, &'static str)> {
    let encounter_id = parse_encounter_id(&id)?;

    let service = state.report_service.clone();
    let timeout = service.config().fetch_timeout();
    let fields = run_blocking(timeout, move || service.fields(encounter_id)).await?;

    Ok(Json(EncounterFieldsRes {
        encounter_id: encounter_id.get(),
        custom_categories: fields.custom_categories,
        complaint_scopes: fields.complaint_scopes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::fs;
    use tower::ServiceExt;

    const TAB_FIELDS: &str = "\
- category: assessment
  value: stable
  recorded_at: 2024-03-01T09:00:00Z
- category: assessment
  value: improved
  recorded_at: 2024-03-01T10:00:00Z
- category: allergies
  value: penicillin
  recorded_at: 2024-03-01T09:00:00Z
- category: onset
  chief_complaint: Headache
  value: 2 days
  recorded_at: 2024-03-01T09:00:00Z
";

    fn app(files: &[(&str, &str)]) -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().expect("tempdir");
        let encounter_dir = dir.path().join("encounters").join("5");
        fs::create_dir_all(&encounter_dir).expect("encounter dir");
        for (name, contents) in files {
            fs::write(encounter_dir.join(name), contents).expect("write fixture");
        }

        let cfg = CoreConfig::new(
            dir.path().to_path_buf(),
            Duration::from_secs(5),
            PageLayout::a4(),
        )
        .expect("config");
        let service = ReportService::with_yaml_store(Arc::new(cfg));
        (dir, router(AppState::new(service)))
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (_dir, app) = app(&[]);
        let response = get(app, "/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: HealthRes = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(body.ok);
    }

    #[tokio::test]
    async fn report_defaults_to_inline_pdf() {
        let (_dir, app) = app(&[("tab_fields.yaml", TAB_FIELDS)]);
        let response = get(app, "/encounters/5/report").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "inline; filename=\"encounter-5.pdf\""
        );
        assert_eq!(response.headers()[REPORT_COMPLETE_HEADER], "true");
        assert!(body_bytes(response).await.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn text_report_shows_most_recent_values() {
        let (_dir, app) = app(&[("tab_fields.yaml", TAB_FIELDS)]);
        let response = get(app, "/encounters/5/report?format=text").await;

        assert_eq!(response.status(), StatusCode::OK);
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(text.contains("Assessment: improved"));
        assert!(text.contains("allergies: penicillin"));
        assert!(text.contains("Chief Complaint: Headache"));
    }

    #[tokio::test]
    async fn unknown_encounter_renders_placeholders() {
        let (_dir, app) = app(&[]);
        let response = get(app, "/encounters/99/report?format=text").await;

        assert_eq!(response.status(), StatusCode::OK);
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(text.contains("Patient ID: N/A"));
    }

    #[tokio::test]
    async fn invalid_ids_are_bad_requests() {
        for uri in ["/encounters/abc/report", "/encounters/0/report", "/encounters/-4/fields"] {
            let (_dir, app) = app(&[]);
            let response = get(app, uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn unknown_format_is_a_bad_request() {
        let (_dir, app) = app(&[]);
        let response = get(app, "/encounters/5/report?format=docx").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unreadable_encounter_data_is_a_bad_gateway() {
        let (_dir, app) = app(&[("vitals.yaml", "- name: pulse\n  shoe_size: 9\n")]);
        let response = get(app, "/encounters/5/report").await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn missing_category_is_an_internal_error() {
        let (_dir, app) = app(&[(
            "tab_fields.yaml",
            "- value: orphan\n  recorded_at: 2024-03-01T09:00:00Z\n",
        )]);
        let response = get(app, "/encounters/5/report").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn fields_lists_custom_categories_and_complaints() {
        let (_dir, app) = app(&[("tab_fields.yaml", TAB_FIELDS)]);
        let response = get(app, "/encounters/5/fields").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: EncounterFieldsRes =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body.encounter_id, 5);
        assert_eq!(body.custom_categories, vec!["allergies".to_string()]);
        assert_eq!(body.complaint_scopes, vec!["Headache".to_string()]);
    }

    #[tokio::test]
    async fn slow_generation_times_out() {
        let result: Result<(), _> = run_blocking(Duration::from_millis(10), || {
            std::thread::sleep(Duration::from_millis(300));
            Ok(())
        })
        .await;

        assert_eq!(result.unwrap_err().0, StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn errors_map_to_status_codes() {
        let id = EncounterId::new(1).unwrap();
        let fetch = ReportError::Fetch {
            facet: "vitals",
            encounter_id: id,
            message: "down".into(),
        };

        assert_eq!(error_status(&fetch).0, StatusCode::BAD_GATEWAY);
        assert_eq!(
            error_status(&ReportError::InvalidInput("x".into())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&ReportError::Render("x".into())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

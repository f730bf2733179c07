//! API request handlers for the Certificate Service

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use certificate_common::Error;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    batch::{self, ROSTER_TEMPLATE_CSV},
    models::{
        CertificateLinks, CertificateResponse, CertificateView, CertificatesListResponse,
        ClassResponse, ClassesListResponse, CreateClassRequest, IssueCertificateRequest,
        IssueCertificateResponse, ValidationResponse,
    },
    service::{CertificateService, ValidationOutcome},
};

/// Host used in links when a request carries no `Host` header
const DEFAULT_HOST: &str = "localhost:8080";

/// Shared application state
pub struct AppState {
    pub service: CertificateService,

    /// Fixed public base URL; derived from each request when unset
    pub public_base_url: Option<String>,

    /// Largest accepted request body
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        service: CertificateService,
        public_base_url: Option<String>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            service,
            public_base_url,
            max_upload_bytes,
        }
    }

    /// Base URL for links handed back to this request's caller
    pub fn base_url(&self, headers: &HeaderMap) -> String {
        if let Some(url) = &self.public_base_url {
            return url.clone();
        }

        let proto = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http");
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_HOST);

        format!("{}://{}", proto, host)
    }
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::ClassNotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) | Error::InvalidRoster(_) => StatusCode::BAD_REQUEST,
            Error::NoCertificates { failed: 0 } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", err);
        }

        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "certificate-service"
    }))
}

/// Browsers ask for this on every page; there is no icon
pub async fn favicon_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Issue a single certificate
pub async fn issue_certificate_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<IssueCertificateRequest>,
) -> Result<(StatusCode, Json<IssueCertificateResponse>), ApiError> {
    info!("Issuing certificate for: {}", payload.participant_name);

    let base_url = state.base_url(&headers);
    let class = state
        .service
        .resolve_class(payload.class_id.as_deref())
        .await?;

    let issued = state
        .service
        .issue(&payload.participant_name, class.as_ref(), &base_url)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueCertificateResponse::new(&issued, &base_url)),
    ))
}

/// List all certificates
pub async fn list_certificates_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CertificatesListResponse>, ApiError> {
    let certificates: Vec<CertificateView> = state
        .service
        .list_certificates()
        .await?
        .iter()
        .map(CertificateView::from)
        .collect();
    let total = certificates.len();

    Ok(Json(CertificatesListResponse {
        certificates,
        total,
    }))
}

/// Get a certificate record by code
pub async fn get_certificate_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<Json<CertificateResponse>, ApiError> {
    let certificate = state
        .service
        .find(&code)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Certificate not found: {}", code)))?;

    let base_url = state.base_url(&headers);
    Ok(Json(CertificateResponse {
        links: CertificateLinks::new(certificate.base_url_or(&base_url), &certificate.code),
        certificate: CertificateView::from(&certificate),
    }))
}

/// Validate a code and report the record behind it
pub async fn validate_certificate_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<Json<ValidationResponse>, ApiError> {
    let base_url = state.base_url(&headers);

    match state.service.validate(&code, &base_url).await? {
        ValidationOutcome::NotFound => Err(ApiError::not_found(format!(
            "Certificate not found: {}",
            code
        ))),
        ValidationOutcome::Valid { record, image } => Ok(Json(ValidationResponse {
            valid: true,
            links: CertificateLinks::new(record.base_url_or(&base_url), &record.code),
            certificate: CertificateView::from(&record),
            render_error: image.err(),
        })),
    }
}

/// Certificate image, shown inline
pub async fn certificate_image_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    let (_, png) = render_stored(&state, &headers, &code).await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// Certificate image as a file download
pub async fn certificate_download_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    let (participant_name, png) = render_stored(&state, &headers, &code).await?;
    let file_name = batch::certificate_file_name(&participant_name);

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (header::CONTENT_DISPOSITION, attachment(&file_name)),
        ],
        png,
    )
        .into_response())
}

async fn render_stored(
    state: &AppState,
    headers: &HeaderMap,
    code: &str,
) -> Result<(String, Vec<u8>), ApiError> {
    let record = state
        .service
        .find(code)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Certificate not found: {}", code)))?;

    let png = state
        .service
        .render(&record, &state.base_url(headers))
        .await?;

    Ok((record.participant_name, png))
}

/// `Content-Disposition` with an ASCII fallback and the UTF-8 name
fn attachment(file_name: &str) -> HeaderValue {
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' { c } else { '_' })
        .collect();

    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(file_name)
    );

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Issue certificates for every name in an uploaded CSV roster.
///
/// Multipart fields: `file` (the roster, required) and `class_id` (optional).
/// Responds with the zip archive and per-run counts in headers.
pub async fn batch_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut roster_bytes = None;
    let mut class_id = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => roster_bytes = Some(field.bytes().await?),
            Some("class_id") => class_id = Some(field.text().await?),
            other => warn!("Ignoring unexpected multipart field: {:?}", other),
        }
    }

    let roster_bytes =
        roster_bytes.ok_or_else(|| ApiError::bad_request("Missing roster file field 'file'"))?;

    let roster = batch::parse_roster(&roster_bytes)?;
    let class = state.service.resolve_class(class_id.as_deref()).await?;

    info!(
        "Batch upload with {} names ({} blank rows)",
        roster.entries.len(),
        roster.skipped_blank
    );

    let report = state
        .service
        .issue_batch(&roster, class.as_ref(), &state.base_url(&headers))
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static("attachment; filename=\"certificates.zip\""),
            ),
            (
                HeaderName::from_static("x-certificates-generated"),
                HeaderValue::from(report.generated()),
            ),
            (
                HeaderName::from_static("x-certificates-failed"),
                HeaderValue::from(report.failures.len()),
            ),
            (
                HeaderName::from_static("x-rows-skipped"),
                HeaderValue::from(report.skipped_blank),
            ),
        ],
        report.archive,
    )
        .into_response())
}

/// Sample roster CSV
pub async fn roster_template_handler() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"roster_template.csv\"",
            ),
        ],
        ROSTER_TEMPLATE_CSV,
    )
}

/// Create a class
pub async fn create_class_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateClassRequest>,
) -> Result<(StatusCode, Json<ClassResponse>), ApiError> {
    info!("Creating class: {}", payload.name);

    let class = state.service.create_class(payload.into()).await?;

    Ok((StatusCode::CREATED, Json(ClassResponse { class })))
}

/// List all classes
pub async fn list_classes_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClassesListResponse>, ApiError> {
    let classes = state.service.list_classes().await?;
    let total = classes.len();

    Ok(Json(ClassesListResponse { classes, total }))
}

/// Get a class by id
pub async fn get_class_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ClassResponse>, ApiError> {
    match state.service.get_class(&id).await? {
        Some(class) => Ok(Json(ClassResponse { class })),
        None => Err(ApiError::not_found(format!("Class not found: {}", id))),
    }
}

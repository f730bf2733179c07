//! Certificate Service
//!
//! Issues training certificates, keeps a record of every code it hands out,
//! and lets anyone holding a certificate confirm it is genuine.
//!
//! ## Endpoints
//!
//! - `POST /api/certificates` - Issue one certificate
//! - `GET /api/certificates` - List issued certificates
//! - `GET /api/certificates/{code}` - Get a certificate record
//! - `GET /api/validate/{code}` - Validate a code (JSON)
//! - `POST /api/batch` - Issue certificates for a CSV roster, returns a zip
//! - `GET /api/batch/template` - Download a sample roster
//! - `POST /api/classes`, `GET /api/classes`, `GET /api/classes/{id}` - Classes
//! - `GET /validate?code=` - Validation page (the QR target)
//! - `GET /certificates/{code}/image` - Certificate PNG
//! - `GET /certificates/{code}/download` - Certificate PNG as attachment
//! - `GET /health` - Health check

pub mod batch;
pub mod config;
pub mod dates;
pub mod handlers;
pub mod models;
pub mod pages;
pub mod service;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::{Config, StoreBackend};
pub use dates::IssueDates;
pub use handlers::{ApiError, AppState};
pub use service::{CertificateService, IssuedCertificate, NewClass, ValidationOutcome};
pub use storage::{DocumentStore, MemoryStore, RedisStore, Storage};

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    let shared_state = Arc::new(state);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_handler))
        .route("/favicon.ico", get(handlers::favicon_handler))
        // Issuance and lookup
        .route(
            "/api/certificates",
            post(handlers::issue_certificate_handler).get(handlers::list_certificates_handler),
        )
        .route(
            "/api/certificates/{code}",
            get(handlers::get_certificate_handler),
        )
        .route(
            "/api/validate/{code}",
            get(handlers::validate_certificate_handler),
        )
        // Batch issuance
        .route("/api/batch", post(handlers::batch_handler))
        .route(
            "/api/batch/template",
            get(handlers::roster_template_handler),
        )
        // Classes
        .route(
            "/api/classes",
            post(handlers::create_class_handler).get(handlers::list_classes_handler),
        )
        .route("/api/classes/{id}", get(handlers::get_class_handler))
        // Public pages
        .route(
            "/validate",
            get(pages::validate_page_handler).post(pages::validate_form_handler),
        )
        .route(
            "/certificates/{code}/image",
            get(handlers::certificate_image_handler),
        )
        .route(
            "/certificates/{code}/download",
            get(handlers::certificate_download_handler),
        )
        .with_state(shared_state)
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

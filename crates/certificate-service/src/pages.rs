//! Human-facing validation pages
//!
//! `/validate?code=<code>` is the address encoded in every certificate's QR,
//! so this is what a phone camera lands on.

use askama::Template;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use certificate_common::CertificateRecord;
use std::sync::Arc;
use tracing::error;

use crate::{
    handlers::{ApiError, AppState},
    models::{CertificateLinks, ValidateForm, ValidateQuery},
    service::ValidationOutcome,
};

#[derive(Template)]
#[template(path = "validate_form.html")]
struct ValidateFormPage;

#[derive(Template)]
#[template(path = "validate_not_found.html")]
struct NotFoundPage {
    code: String,
}

#[derive(Template)]
#[template(path = "validate_result.html")]
struct ValidPage {
    certificate: CertificateRecord,

    /// `None` when the image could not be rendered
    image_base64: Option<String>,
    download_url: String,
    share_url: String,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorPage {
    message: String,
}

fn render_page<T: Template>(status: StatusCode, page: T) -> Response {
    match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("Failed to render page: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Validation form, or the result for `?code=`
pub async fn validate_page_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ValidateQuery>,
) -> Response {
    let code = query.code.unwrap_or_default().trim().to_string();
    if code.is_empty() {
        return render_page(StatusCode::OK, ValidateFormPage);
    }

    let base_url = state.base_url(&headers);
    match state.service.validate(&code, &base_url).await {
        Ok(ValidationOutcome::NotFound) => render_page(StatusCode::NOT_FOUND, NotFoundPage { code }),
        Ok(ValidationOutcome::Valid { record, image }) => {
            let links = CertificateLinks::new(record.base_url_or(&base_url), &record.code);
            let page = ValidPage {
                image_base64: image.ok().map(|png| STANDARD.encode(png)),
                download_url: links.download_url,
                share_url: links.share_url,
                certificate: record,
            };
            render_page(StatusCode::OK, page)
        }
        Err(e) => {
            let err = ApiError::from(e);
            render_page(err.status, ErrorPage { message: err.message })
        }
    }
}

/// Form submission; redirects to the shareable `?code=` address
pub async fn validate_form_handler(Form(form): Form<ValidateForm>) -> Redirect {
    let code = form.code.trim();
    if code.is_empty() {
        return Redirect::to("/validate");
    }

    Redirect::to(&format!("/validate?code={}", urlencoding::encode(code)))
}

//! Request and response bodies for the HTTP API

use base64::{engine::general_purpose::STANDARD, Engine as _};
use certificate_common::{
    linkedin_share_url, normalize_base_url, validation_url, CertificateRecord, ClassRecord,
};
use serde::{Deserialize, Serialize};

use crate::service::{IssuedCertificate, NewClass};

/// Request to issue a single certificate
#[derive(Debug, Deserialize)]
pub struct IssueCertificateRequest {
    pub participant_name: String,

    #[serde(default)]
    pub class_id: Option<String>,
}

/// A certificate as the API returns it. Optional descriptive fields that were
/// never set read "not informed".
#[derive(Debug, Clone, Serialize)]
pub struct CertificateView {
    pub code: String,
    pub participant_name: String,
    pub issue_date: String,
    pub class_name: String,
    pub event_date: String,
    pub training_name: String,
    pub hours_duration: String,
}

impl From<&CertificateRecord> for CertificateView {
    fn from(record: &CertificateRecord) -> Self {
        Self {
            code: record.code.clone(),
            participant_name: record.participant_name.clone(),
            issue_date: record.issue_date.clone(),
            class_name: record.class_name_or_default().to_string(),
            event_date: record.event_date_or_default().to_string(),
            training_name: record.training_name_or_default().to_string(),
            hours_duration: record.hours_duration_or_default().to_string(),
        }
    }
}

/// Links to a certificate's public pages
#[derive(Debug, Serialize)]
pub struct CertificateLinks {
    pub validation_url: String,
    pub image_url: String,
    pub download_url: String,
    pub share_url: String,
}

impl CertificateLinks {
    pub fn new(base_url: &str, code: &str) -> Self {
        let base = normalize_base_url(base_url);
        let validation = validation_url(base_url, code);

        Self {
            share_url: linkedin_share_url(&validation),
            image_url: format!("{}certificates/{}/image", base, code),
            download_url: format!("{}certificates/{}/download", base, code),
            validation_url: validation,
        }
    }
}

/// Response from single issuance
#[derive(Debug, Serialize)]
pub struct IssueCertificateResponse {
    pub certificate: CertificateView,

    #[serde(flatten)]
    pub links: CertificateLinks,

    /// PNG encoded as standard base64, for inline display
    pub image_base64: String,
}

impl IssueCertificateResponse {
    pub fn new(issued: &IssuedCertificate, base_url: &str) -> Self {
        let record = &issued.record;
        Self {
            links: CertificateLinks::new(record.base_url_or(base_url), &record.code),
            certificate: CertificateView::from(record),
            image_base64: STANDARD.encode(&issued.png),
        }
    }
}

/// Certificate record with its links
#[derive(Debug, Serialize)]
pub struct CertificateResponse {
    pub certificate: CertificateView,

    #[serde(flatten)]
    pub links: CertificateLinks,
}

/// Response from the JSON validation lookup
#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub certificate: CertificateView,

    #[serde(flatten)]
    pub links: CertificateLinks,

    /// Set when the record exists but its image could not be produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_error: Option<String>,
}

/// List of certificates
#[derive(Debug, Serialize)]
pub struct CertificatesListResponse {
    pub certificates: Vec<CertificateView>,
    pub total: usize,
}

/// Request to create a class
#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    pub name: String,
    pub event_date: String,

    #[serde(default)]
    pub client_name: Option<String>,

    #[serde(default)]
    pub training_name: Option<String>,

    #[serde(default)]
    pub hours_duration: Option<String>,
}

impl From<CreateClassRequest> for NewClass {
    fn from(request: CreateClassRequest) -> Self {
        NewClass {
            name: request.name,
            event_date: request.event_date,
            client_name: request.client_name,
            training_name: request.training_name,
            hours_duration: request.hours_duration,
        }
    }
}

/// Class info response
#[derive(Debug, Serialize)]
pub struct ClassResponse {
    pub class: ClassRecord,
}

/// List of classes
#[derive(Debug, Serialize)]
pub struct ClassesListResponse {
    pub classes: Vec<ClassRecord>,
    pub total: usize,
}

/// Query string of the validation page
#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    #[serde(default)]
    pub code: Option<String>,
}

/// Form body of the validation page
#[derive(Debug, Deserialize)]
pub struct ValidateForm {
    #[serde(default)]
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use certificate_common::NOT_INFORMED;

    #[test]
    fn test_links_share_one_base() {
        let links = CertificateLinks::new("https://certs.example.com/", "abc123");

        assert_eq!(
            links.validation_url,
            "https://certs.example.com/validate?code=abc123"
        );
        assert_eq!(
            links.image_url,
            "https://certs.example.com/certificates/abc123/image"
        );
        assert_eq!(
            links.download_url,
            "https://certs.example.com/certificates/abc123/download"
        );
        assert!(links
            .share_url
            .ends_with("https%3A%2F%2Fcerts.example.com%2Fvalidate%3Fcode%3Dabc123"));
    }

    #[test]
    fn test_issue_response_shape() {
        let issued = IssuedCertificate {
            record: CertificateRecord::new(
                "abc123".to_string(),
                "Ana Silva".to_string(),
                "10 de março de 2025".to_string(),
                None,
            ),
            png: vec![1, 2, 3],
        };

        let json = serde_json::to_value(IssueCertificateResponse::new(
            &issued,
            "http://localhost:8080",
        ))
        .unwrap();

        assert_eq!(json["certificate"]["code"], "abc123");
        assert_eq!(json["image_base64"], "AQID");
        assert_eq!(
            json["validation_url"],
            "http://localhost:8080/validate?code=abc123"
        );
        assert_eq!(json["certificate"]["class_name"], NOT_INFORMED);
        assert_eq!(json["certificate"]["hours_duration"], NOT_INFORMED);
        assert!(json["certificate"].get("validation_base_url").is_none());
    }

    #[test]
    fn test_view_keeps_informed_fields() {
        let mut record = CertificateRecord::new(
            "abc123".to_string(),
            "Ana Silva".to_string(),
            "today".to_string(),
            None,
        );
        record.training_name = Some("NR-35".to_string());

        let view = CertificateView::from(&record);
        assert_eq!(view.training_name, "NR-35");
        assert_eq!(view.event_date, NOT_INFORMED);
    }
}

//! Issuance, lookup and validation of certificates

use certificate_common::{
    generate_code, normalize_base_url, CertificateRecord, ClassRecord, Error, Result,
};
use certificate_renderer::{CertificateRenderer, CertificateRequest};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::dates::IssueDates;
use crate::storage::Storage;

/// A freshly issued certificate with its rendered PNG
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub record: CertificateRecord,
    pub png: Vec<u8>,
}

/// Result of looking up a code
#[derive(Debug)]
pub enum ValidationOutcome {
    /// No record under this code
    NotFound,

    /// The record exists. The image is rendered separately and may have
    /// failed without affecting the record.
    Valid {
        record: CertificateRecord,
        image: std::result::Result<Vec<u8>, String>,
    },
}

/// Fields for a new class
#[derive(Debug, Clone)]
pub struct NewClass {
    pub name: String,
    pub event_date: String,
    pub client_name: Option<String>,
    pub training_name: Option<String>,
    pub hours_duration: Option<String>,
}

/// Certificate workflows over a shared renderer and store
#[derive(Clone)]
pub struct CertificateService {
    renderer: Arc<CertificateRenderer>,
    storage: Storage,
    dates: IssueDates,
}

impl CertificateService {
    pub fn new(renderer: Arc<CertificateRenderer>, storage: Storage, dates: IssueDates) -> Self {
        Self {
            renderer,
            storage,
            dates,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn dates(&self) -> &IssueDates {
        &self.dates
    }

    /// Fail with [`Error::MissingAsset`] when the template or signature did
    /// not load, so callers can stop before doing any work
    pub fn ensure_assets(&self) -> Result<()> {
        let assets = self.renderer.assets();
        assets.template()?;
        assets.signature()?;
        Ok(())
    }

    /// Issue a certificate: new code, render, then persist.
    ///
    /// Nothing is stored when rendering fails.
    pub async fn issue(
        &self,
        participant_name: &str,
        class: Option<&ClassRecord>,
        base_url: &str,
    ) -> Result<IssuedCertificate> {
        let participant_name = participant_name.trim();
        if participant_name.is_empty() {
            return Err(Error::InvalidInput(
                "participant name cannot be empty".to_string(),
            ));
        }

        let mut record = CertificateRecord::new(
            generate_code(),
            participant_name.to_string(),
            self.dates.today(),
            class,
        );
        record.validation_base_url = Some(normalize_base_url(base_url));

        let png = self.render(&record, base_url).await?;
        self.storage.put_certificate(&record).await?;

        info!(
            "Issued certificate {} for {}",
            record.code, record.participant_name
        );

        Ok(IssuedCertificate { record, png })
    }

    /// Render a stored record as PNG on the blocking pool. `base_url` only
    /// applies to records that carry no issuance base URL.
    pub async fn render(&self, record: &CertificateRecord, base_url: &str) -> Result<Vec<u8>> {
        let renderer = Arc::clone(&self.renderer);
        let record = record.clone();
        let base_url = base_url.to_string();

        tokio::task::spawn_blocking(move || {
            renderer.render_png(&CertificateRequest::from_record(&record, &base_url))
        })
        .await
        .map_err(|e| Error::Other(anyhow::Error::new(e).context("render task failed")))?
    }

    pub async fn find(&self, code: &str) -> Result<Option<CertificateRecord>> {
        self.storage.get_certificate(code.trim()).await
    }

    /// Look up a code and re-render its certificate
    pub async fn validate(&self, code: &str, base_url: &str) -> Result<ValidationOutcome> {
        let code = code.trim();
        debug!("Validating certificate code {}", code);

        let Some(record) = self.storage.get_certificate(code).await? else {
            info!("Certificate code {} not found", code);
            return Ok(ValidationOutcome::NotFound);
        };

        let image = match self.render(&record, base_url).await {
            Ok(png) => Ok(png),
            Err(e) => {
                warn!("Failed to render certificate {}: {}", code, e);
                Err(e.to_string())
            }
        };

        info!(
            "Certificate {} is valid for {}",
            record.code, record.participant_name
        );

        Ok(ValidationOutcome::Valid { record, image })
    }

    /// All certificates ordered by participant name
    pub async fn list_certificates(&self) -> Result<Vec<CertificateRecord>> {
        let mut records = self.storage.list_certificates().await?;
        records.sort_by(|a, b| {
            a.participant_name
                .cmp(&b.participant_name)
                .then_with(|| a.code.cmp(&b.code))
        });
        Ok(records)
    }

    /// Resolve an optional class id; an unknown id is an error
    pub async fn resolve_class(&self, class_id: Option<&str>) -> Result<Option<ClassRecord>> {
        let Some(id) = class_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        match self.storage.get_class(id).await? {
            Some(class) => Ok(Some(class)),
            None => Err(Error::ClassNotFound(id.to_string())),
        }
    }

    pub async fn create_class(&self, new_class: NewClass) -> Result<ClassRecord> {
        let name = new_class.name.trim();
        let event_date = new_class.event_date.trim();
        if name.is_empty() || event_date.is_empty() {
            return Err(Error::InvalidInput(
                "class name and event date are required".to_string(),
            ));
        }

        let class = ClassRecord {
            id: generate_code(),
            name: name.to_string(),
            event_date: event_date.to_string(),
            client_name: non_blank(new_class.client_name),
            training_name: non_blank(new_class.training_name),
            hours_duration: non_blank(new_class.hours_duration),
        };

        self.storage.put_class(&class).await?;
        info!("Created class {} ({})", class.name, class.id);

        Ok(class)
    }

    pub async fn get_class(&self, id: &str) -> Result<Option<ClassRecord>> {
        self.storage.get_class(id.trim()).await
    }

    /// All classes ordered by name
    pub async fn list_classes(&self) -> Result<Vec<ClassRecord>> {
        let mut classes = self.storage.list_classes().await?;
        classes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(classes)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

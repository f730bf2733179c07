//! Persisted record types

use serde::{Deserialize, Serialize};

/// Placeholder shown for optional descriptive fields that were never set
pub const NOT_INFORMED: &str = "not informed";

/// A certificate as stored under its code.
///
/// The rendered image is never stored; it is rebuilt from this record on
/// every lookup, so the fields here are everything the renderer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Lookup key and the value encoded in the QR link
    pub code: String,

    pub participant_name: String,

    /// Formatted at issuance, never rewritten
    pub issue_date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_duration: Option<String>,

    /// Base URL the QR link was issued under. Re-renders reuse it so the
    /// image does not depend on which host serves the lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_base_url: Option<String>,
}

impl CertificateRecord {
    /// Create a record, copying descriptive fields from the class if one is given
    pub fn new(
        code: String,
        participant_name: String,
        issue_date: String,
        class: Option<&ClassRecord>,
    ) -> Self {
        Self {
            code,
            participant_name,
            issue_date,
            class_name: class.map(|c| c.name.clone()),
            event_date: class.map(|c| c.event_date.clone()),
            training_name: class.and_then(|c| c.training_name.clone()),
            hours_duration: class.and_then(|c| c.hours_duration.clone()),
            validation_base_url: None,
        }
    }

    /// Stored issuance base URL, or `fallback` for records issued without one
    pub fn base_url_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.validation_base_url.as_deref().unwrap_or(fallback)
    }

    /// Metadata lines to draw on the certificate, `None` when there are none
    pub fn class_metadata(&self) -> Option<ClassMetadata> {
        let metadata = ClassMetadata {
            class_name: non_blank(&self.class_name),
            event_date: non_blank(&self.event_date),
            training_name: non_blank(&self.training_name),
            hours_duration: non_blank(&self.hours_duration),
        };

        if metadata.is_empty() {
            None
        } else {
            Some(metadata)
        }
    }

    pub fn class_name_or_default(&self) -> &str {
        or_not_informed(&self.class_name)
    }

    pub fn event_date_or_default(&self) -> &str {
        or_not_informed(&self.event_date)
    }

    pub fn training_name_or_default(&self) -> &str {
        or_not_informed(&self.training_name)
    }

    pub fn hours_duration_or_default(&self) -> &str {
        or_not_informed(&self.hours_duration)
    }
}

/// A class (training cohort) participants can be issued certificates under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: String,

    pub name: String,

    pub event_date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_duration: Option<String>,
}

/// Optional descriptive lines drawn under the participant name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMetadata {
    pub class_name: Option<String>,
    pub event_date: Option<String>,
    pub training_name: Option<String>,
    pub hours_duration: Option<String>,
}

impl ClassMetadata {
    pub fn is_empty(&self) -> bool {
        self.class_name.is_none()
            && self.event_date.is_none()
            && self.training_name.is_none()
            && self.hours_duration.is_none()
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn or_not_informed(value: &Option<String>) -> &str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => NOT_INFORMED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_class() -> ClassRecord {
        ClassRecord {
            id: "class-1".to_string(),
            name: "NR-35 Turma A".to_string(),
            event_date: "2025-03-10".to_string(),
            client_name: Some("Acme".to_string()),
            training_name: Some("Work at height".to_string()),
            hours_duration: None,
        }
    }

    #[test]
    fn test_record_without_class_has_no_metadata() {
        let record = CertificateRecord::new(
            "abc".to_string(),
            "Ana Silva".to_string(),
            "10 de março de 2025".to_string(),
            None,
        );

        assert!(record.class_metadata().is_none());
        assert_eq!(record.class_name_or_default(), NOT_INFORMED);
        assert_eq!(record.hours_duration_or_default(), NOT_INFORMED);
    }

    #[test]
    fn test_record_copies_class_fields() {
        let class = sample_class();
        let record = CertificateRecord::new(
            "abc".to_string(),
            "Ana Silva".to_string(),
            "10 de março de 2025".to_string(),
            Some(&class),
        );

        let metadata = record.class_metadata().expect("metadata expected");
        assert_eq!(metadata.class_name.as_deref(), Some("NR-35 Turma A"));
        assert_eq!(metadata.event_date.as_deref(), Some("2025-03-10"));
        assert_eq!(metadata.training_name.as_deref(), Some("Work at height"));
        assert!(metadata.hours_duration.is_none());
        assert_eq!(record.hours_duration_or_default(), NOT_INFORMED);
    }

    #[test]
    fn test_blank_fields_are_treated_as_absent() {
        let mut record = CertificateRecord::new(
            "abc".to_string(),
            "Ana Silva".to_string(),
            "today".to_string(),
            None,
        );
        record.class_name = Some("   ".to_string());

        assert!(record.class_metadata().is_none());
        assert_eq!(record.class_name_or_default(), NOT_INFORMED);
    }

    #[test]
    fn test_missing_optional_fields_deserialize() {
        let json = r#"{"code":"abc","participant_name":"Ana","issue_date":"today"}"#;
        let record: CertificateRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.participant_name, "Ana");
        assert!(record.event_date.is_none());
        assert!(!serde_json::to_string(&record).unwrap().contains("event_date"));
        assert_eq!(record.base_url_or("http://fallback"), "http://fallback");
    }

    #[test]
    fn test_stored_base_url_wins() {
        let mut record = CertificateRecord::new(
            "abc".to_string(),
            "Ana Silva".to_string(),
            "today".to_string(),
            None,
        );
        record.validation_base_url = Some("https://certs.example.com/".to_string());

        assert_eq!(
            record.base_url_or("http://evil.example"),
            "https://certs.example.com/"
        );
    }
}

//! Batch issuance from a CSV roster
//!
//! Every run stages its images in a private temporary directory and zips
//! them from there, so concurrent runs never see each other's files.

use certificate_common::{ClassRecord, Error, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info, warn};
use zip::write::SimpleFileOptions;

use crate::service::CertificateService;

/// Required roster column
pub const NAME_COLUMN: &str = "name";

/// Sample roster offered for download
pub const ROSTER_TEMPLATE_CSV: &str = "name\nBruno Gurgel\nMaria Silva\nJoão Souza\n";

/// One participant from the roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// Line number in the uploaded file
    pub line: u64,
    pub name: String,
}

/// A parsed roster
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub entries: Vec<RosterEntry>,

    /// Rows whose name was empty after trimming
    pub skipped_blank: usize,
}

/// A row that produced no certificate
#[derive(Debug, Clone)]
pub struct RowFailure {
    pub line: u64,
    pub participant_name: String,
    pub reason: String,
}

/// Outcome of a batch run
#[derive(Debug)]
pub struct BatchReport {
    /// Zip of every generated image
    pub archive: Vec<u8>,

    /// Codes of the certificates in the archive, in roster order
    pub codes: Vec<String>,

    pub failures: Vec<RowFailure>,

    pub skipped_blank: usize,
}

impl BatchReport {
    pub fn generated(&self) -> usize {
        self.codes.len()
    }
}

/// Parse a roster. The whole roster is rejected when the header has no
/// `name` column; blank names are counted and skipped.
pub fn parse_roster(data: &[u8]) -> Result<Roster> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| Error::InvalidRoster(format!("unreadable header row: {e}")))?;

    let name_index = headers
        .iter()
        .position(|h| h.trim() == NAME_COLUMN)
        .ok_or_else(|| {
            Error::InvalidRoster(format!("missing required '{}' column", NAME_COLUMN))
        })?;

    let mut roster = Roster::default();
    for result in reader.records() {
        let record = result.map_err(|e| Error::InvalidRoster(e.to_string()))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let name = record.get(name_index).unwrap_or_default().trim();
        if name.is_empty() {
            roster.skipped_blank += 1;
            continue;
        }

        roster.entries.push(RosterEntry {
            line,
            name: name.to_string(),
        });
    }

    Ok(roster)
}

/// `<name with underscores>_certificate.png`
pub fn certificate_file_name(participant_name: &str) -> String {
    format!("{}_certificate.png", participant_name.replace(' ', "_"))
}

/// File name that does not collide with one already in the archive
fn unique_file_name(participant_name: &str, taken: &mut HashSet<String>) -> String {
    let base = participant_name.replace(' ', "_");
    let mut candidate = certificate_file_name(participant_name);
    let mut suffix = 2;

    while taken.contains(&candidate) {
        candidate = format!("{}_certificate_{}.png", base, suffix);
        suffix += 1;
    }

    taken.insert(candidate.clone());
    candidate
}

impl CertificateService {
    /// Issue one certificate per roster entry and zip the images.
    ///
    /// Missing template or signature fails the whole run up front. After
    /// that, a row that fails to render or persist is logged and skipped.
    /// When no row succeeds the run fails with [`Error::NoCertificates`].
    pub async fn issue_batch(
        &self,
        roster: &Roster,
        class: Option<&ClassRecord>,
        base_url: &str,
    ) -> Result<BatchReport> {
        self.ensure_assets()?;

        let staging = tempfile::Builder::new().prefix("certificates-").tempdir()?;
        info!(
            "Starting batch of {} participants in {}",
            roster.entries.len(),
            staging.path().display()
        );

        let mut staged: Vec<(String, PathBuf)> = Vec::new();
        let mut taken = HashSet::new();
        let mut codes = Vec::new();
        let mut failures = Vec::new();

        for entry in &roster.entries {
            match self.issue(&entry.name, class, base_url).await {
                Ok(issued) => {
                    let file_name = unique_file_name(&entry.name, &mut taken);
                    let path = staging.path().join(&file_name);
                    tokio::fs::write(&path, &issued.png).await?;

                    codes.push(issued.record.code);
                    staged.push((file_name, path));
                }
                Err(e) => {
                    warn!(
                        "Skipping roster line {} ({}): {}",
                        entry.line, entry.name, e
                    );
                    failures.push(RowFailure {
                        line: entry.line,
                        participant_name: entry.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if staged.is_empty() {
            error!(
                "Batch produced no certificates ({} failures, {} blank rows)",
                failures.len(),
                roster.skipped_blank
            );
            return Err(Error::NoCertificates {
                failed: failures.len(),
            });
        }

        let archive = tokio::task::spawn_blocking(move || zip_files(&staged))
            .await
            .map_err(|e| Error::Other(anyhow::Error::new(e).context("archive task failed")))??;

        info!(
            "Batch finished: {} generated, {} failed, {} blank rows skipped",
            codes.len(),
            failures.len(),
            roster.skipped_blank
        );

        // `staging` is removed when it drops here
        Ok(BatchReport {
            archive,
            codes,
            failures,
            skipped_blank: roster.skipped_blank,
        })
    }
}

/// Zip staged files flat, under their given names
fn zip_files(files: &[(String, PathBuf)]) -> Result<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, path) in files {
        let bytes = std::fs::read(path)?;
        zip.start_file(name.as_str(), options)
            .map_err(|e| Error::Archive(e.to_string()))?;
        zip.write_all(&bytes)?;
    }

    let cursor = zip.finish().map_err(|e| Error::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}

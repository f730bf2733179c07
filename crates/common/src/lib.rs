pub mod code;
pub mod error;
pub mod models;
pub mod url;

pub use code::{generate_code, CODE_LENGTH};
pub use error::{Error, Result};
pub use models::{CertificateRecord, ClassMetadata, ClassRecord, NOT_INFORMED};
pub use url::{linkedin_share_url, normalize_base_url, validation_url};

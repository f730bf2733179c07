//! Certificate Renderer
//!
//! Composites a participant's name, issue date, signature, short code,
//! optional class details and a validation QR code onto a fixed template.
//! All positions come from a [`Layout`]; the font is resolved once into an
//! [`ActiveFont`].

pub mod assets;
pub mod fonts;
pub mod layout;
pub mod qr;
pub mod renderer;

pub use assets::{Asset, AssetPaths, CertificateAssets};
pub use fonts::{ActiveFont, FontSource};
pub use layout::{FontTier, ImageSlot, Layout, MetadataLayout, NameLayout, QrLayout, TextLayout};
pub use qr::{encode_qr, encode_validation_qr};
pub use renderer::{encode_png, CertificateRenderer, CertificateRequest};

//! Template and signature assets
//!
//! Assets are read once per process. A missing image does not stop the
//! process from starting; every render that needs it fails instead.

use crate::fonts::ActiveFont;
use certificate_common::{Error, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Filesystem locations of the rendering assets
#[derive(Debug, Clone)]
pub struct AssetPaths {
    pub template: PathBuf,
    pub signature: PathBuf,
    pub font: PathBuf,
    pub fallback_font: PathBuf,
}

/// An image asset that either loaded or records why it did not
#[derive(Debug, Clone)]
pub enum Asset {
    Loaded(RgbaImage),
    Missing { path: PathBuf, reason: String },
}

impl Asset {
    /// Read an image from disk, converting it to RGBA
    pub fn load(path: &Path) -> Self {
        match image::open(path) {
            Ok(img) => {
                info!(
                    "Loaded asset {} ({}x{})",
                    path.display(),
                    img.width(),
                    img.height()
                );
                Asset::Loaded(img.to_rgba8())
            }
            Err(e) => {
                error!("Failed to load asset {}: {}", path.display(), e);
                Asset::Missing {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Asset::Loaded(_))
    }

    fn require(&self, asset: &'static str) -> Result<&RgbaImage> {
        match self {
            Asset::Loaded(img) => Ok(img),
            Asset::Missing { path, reason } => Err(Error::MissingAsset {
                asset,
                path: path.display().to_string(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Read-only inputs shared by every render
#[derive(Debug, Clone)]
pub struct CertificateAssets {
    template: Asset,
    signature: Asset,
    font: ActiveFont,
}

impl CertificateAssets {
    /// Load all assets from disk, resolving the font fallback chain
    pub fn load(paths: &AssetPaths) -> Result<Self> {
        let font = ActiveFont::resolve(&paths.font, &paths.fallback_font)?;

        Ok(Self {
            template: Asset::load(&paths.template),
            signature: Asset::load(&paths.signature),
            font,
        })
    }

    /// Build assets from images already in memory
    pub fn from_images(template: RgbaImage, signature: RgbaImage, font: ActiveFont) -> Self {
        Self {
            template: Asset::Loaded(template),
            signature: Asset::Loaded(signature),
            font,
        }
    }

    pub fn new(template: Asset, signature: Asset, font: ActiveFont) -> Self {
        Self {
            template,
            signature,
            font,
        }
    }

    pub fn template(&self) -> Result<&RgbaImage> {
        self.template.require("template")
    }

    pub fn signature(&self) -> Result<&RgbaImage> {
        self.signature.require("signature")
    }

    pub fn font(&self) -> &ActiveFont {
        &self.font
    }

    /// True when every image asset loaded
    pub fn is_complete(&self) -> bool {
        self.template.is_loaded() && self.signature.is_loaded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_missing_files_are_reported_per_asset() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("template.png");
        RgbaImage::from_pixel(20, 10, Rgba([255, 255, 255, 255]))
            .save(&template_path)
            .unwrap();

        let assets = CertificateAssets::load(&AssetPaths {
            template: template_path,
            signature: dir.path().join("missing-signature.png"),
            font: dir.path().join("missing.ttf"),
            fallback_font: dir.path().join("missing-too.ttf"),
        })
        .unwrap();

        assert_eq!(assets.template().unwrap().dimensions(), (20, 10));
        assert!(!assets.is_complete());
        match assets.signature() {
            Err(Error::MissingAsset { asset, .. }) => assert_eq!(asset, "signature"),
            other => panic!("expected missing signature, got {:?}", other),
        }
    }
}

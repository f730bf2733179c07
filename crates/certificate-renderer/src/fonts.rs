//! Font resolution
//!
//! The font is resolved once at startup and handed to the renderer, so draw
//! calls never touch the filesystem.

use ab_glyph::FontArc;
use certificate_common::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Compiled-in last resort, used when neither configured font can be read
static BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

/// Where the active font came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    Primary(PathBuf),
    Fallback(PathBuf),
    Bundled,
}

/// The single font used for every text element
#[derive(Clone)]
pub struct ActiveFont {
    font: FontArc,
    source: FontSource,
}

impl fmt::Debug for ActiveFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveFont")
            .field("source", &self.source)
            .finish()
    }
}

impl ActiveFont {
    /// Try the primary font, then the system fallback, then the bundled font
    pub fn resolve(primary: &Path, fallback: &Path) -> Result<Self> {
        match load_font_file(primary) {
            Ok(font) => {
                info!("Using font {}", primary.display());
                return Ok(Self {
                    font,
                    source: FontSource::Primary(primary.to_path_buf()),
                });
            }
            Err(reason) => warn!("Primary font {} unavailable: {}", primary.display(), reason),
        }

        match load_font_file(fallback) {
            Ok(font) => {
                info!("Using fallback font {}", fallback.display());
                return Ok(Self {
                    font,
                    source: FontSource::Fallback(fallback.to_path_buf()),
                });
            }
            Err(reason) => warn!("Fallback font {} unavailable: {}", fallback.display(), reason),
        }

        info!("Using bundled font");
        Self::bundled()
    }

    /// The font compiled into this crate
    pub fn bundled() -> Result<Self> {
        let font = FontArc::try_from_slice(BUNDLED_FONT).map_err(|e| Error::MissingAsset {
            asset: "font",
            path: "<bundled>".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            font,
            source: FontSource::Bundled,
        })
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    pub fn source(&self) -> &FontSource {
        &self.source
    }
}

fn load_font_file(path: &Path) -> std::result::Result<FontArc, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    FontArc::try_from_vec(bytes).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled_font_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/fonts/DejaVuSans-Bold.ttf")
    }

    #[test]
    fn test_primary_font_wins() {
        let path = bundled_font_path();
        let font = ActiveFont::resolve(&path, Path::new("/nonexistent/fallback.ttf")).unwrap();

        assert_eq!(font.source(), &FontSource::Primary(path));
    }

    #[test]
    fn test_falls_back_to_second_path() {
        let path = bundled_font_path();
        let font = ActiveFont::resolve(Path::new("/nonexistent/Arial.ttf"), &path).unwrap();

        assert_eq!(font.source(), &FontSource::Fallback(path));
    }

    #[test]
    fn test_falls_back_to_bundled_font() {
        let font = ActiveFont::resolve(
            Path::new("/nonexistent/Arial.ttf"),
            Path::new("/nonexistent/DejaVuSans-Bold.ttf"),
        )
        .unwrap();

        assert_eq!(font.source(), &FontSource::Bundled);
    }

    #[test]
    fn test_unparseable_font_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("broken.ttf");
        std::fs::write(&bogus, b"not a font").unwrap();

        let font = ActiveFont::resolve(&bogus, &bundled_font_path()).unwrap();
        assert!(matches!(font.source(), FontSource::Fallback(_)));
    }
}

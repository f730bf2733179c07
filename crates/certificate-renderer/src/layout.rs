//! Certificate layout configuration
//!
//! Every pixel position the renderer uses lives here, so recalibrating for a
//! new template is a matter of editing a JSON file rather than code.

use certificate_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Positions and sizes of every element drawn on the template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub name: NameLayout,
    pub issue_date: TextLayout,
    pub signature: ImageSlot,
    pub code: TextLayout,
    pub metadata: MetadataLayout,
    pub qr: QrLayout,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            name: NameLayout::default(),
            issue_date: TextLayout {
                x: 600,
                y: 1100,
                font_size: 40.0,
            },
            signature: ImageSlot {
                x: 1500,
                y: 1050,
                width: 300,
                height: 100,
            },
            code: TextLayout {
                x: 50,
                y: 1400,
                font_size: 10.0,
            },
            metadata: MetadataLayout::default(),
            qr: QrLayout {
                size: 150,
                margin: 50,
            },
        }
    }
}

/// Participant name placement.
///
/// The name is measured and centred on `center_x`. That anchor sits to the
/// right of the page centre to line up with the template's name rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameLayout {
    pub center_x: i32,
    pub y: i32,

    /// Checked in order; the first tier whose `max_chars` fits wins
    pub font_tiers: Vec<FontTier>,

    /// Size for names longer than every tier
    pub overflow_font_size: f32,
}

impl Default for NameLayout {
    fn default() -> Self {
        Self {
            center_x: 1250,
            y: 700,
            font_tiers: vec![
                FontTier {
                    max_chars: 12,
                    size: 70.0,
                },
                FontTier {
                    max_chars: 20,
                    size: 60.0,
                },
                FontTier {
                    max_chars: 30,
                    size: 50.0,
                },
            ],
            overflow_font_size: 40.0,
        }
    }
}

impl NameLayout {
    /// Font size for a name, stepping down as the name gets longer
    pub fn font_size_for(&self, name: &str) -> f32 {
        let len = name.chars().count();

        self.font_tiers
            .iter()
            .find(|tier| len <= tier.max_chars)
            .map(|tier| tier.size)
            .unwrap_or(self.overflow_font_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontTier {
    pub max_chars: usize,
    pub size: f32,
}

/// Left-aligned text at a fixed position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextLayout {
    pub x: i32,
    pub y: i32,
    pub font_size: f32,
}

/// Target rectangle an image is resized into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSlot {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Optional class lines. Each field owns a fixed line so a missing field
/// never shifts the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataLayout {
    pub x: i32,
    pub y: i32,
    pub line_height: i32,
    pub font_size: f32,
    pub class_name_label: String,
    pub event_date_label: String,
    pub training_name_label: String,
    pub hours_duration_label: String,
    pub hours_duration_suffix: String,
}

impl Default for MetadataLayout {
    fn default() -> Self {
        Self {
            x: 600,
            y: 820,
            line_height: 45,
            font_size: 32.0,
            class_name_label: "Turma: ".to_string(),
            event_date_label: "Data do evento: ".to_string(),
            training_name_label: "Treinamento: ".to_string(),
            hours_duration_label: "Carga horária: ".to_string(),
            hours_duration_suffix: "h".to_string(),
        }
    }
}

/// QR code square, anchored to the bottom-right corner of the template
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QrLayout {
    pub size: u32,
    pub margin: u32,
}

impl Layout {
    /// Parse a layout from JSON. Missing sections fall back to the defaults.
    pub fn parse_str(json_str: &str) -> Result<Self> {
        let layout: Layout = serde_json::from_str(json_str)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Parse a layout from a JSON file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json_str = std::fs::read_to_string(path.as_ref())?;
        Self::parse_str(&json_str)
    }

    /// Check the layout is usable.
    ///
    /// Font tiers must have strictly increasing `max_chars` and every size
    /// must be positive.
    pub fn validate(&self) -> Result<()> {
        let mut previous: Option<usize> = None;
        for tier in &self.name.font_tiers {
            if let Some(prev) = previous {
                if tier.max_chars <= prev {
                    return Err(Error::Layout(format!(
                        "font tier max_chars must increase, got {} after {}",
                        tier.max_chars, prev
                    )));
                }
            }
            if tier.size <= 0.0 {
                return Err(Error::Layout(format!(
                    "font tier for {} chars has non-positive size",
                    tier.max_chars
                )));
            }
            previous = Some(tier.max_chars);
        }

        let sizes = [
            ("name overflow", self.name.overflow_font_size),
            ("issue date", self.issue_date.font_size),
            ("code", self.code.font_size),
            ("metadata", self.metadata.font_size),
        ];
        for (element, size) in sizes {
            if size <= 0.0 {
                return Err(Error::Layout(format!("{} font size must be positive", element)));
            }
        }

        if self.signature.width == 0 || self.signature.height == 0 {
            return Err(Error::Layout("signature size must be non-zero".to_string()));
        }

        if self.qr.size == 0 {
            return Err(Error::Layout("QR size must be non-zero".to_string()));
        }

        Ok(())
    }
}

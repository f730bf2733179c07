//! Certificate compositing

use crate::assets::CertificateAssets;
use crate::layout::{Layout, TextLayout};
use crate::qr::encode_validation_qr;
use ab_glyph::{FontArc, PxScale};
use certificate_common::{CertificateRecord, ClassMetadata, Error, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageEncoder, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::debug;

const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Everything that varies between two certificates
#[derive(Debug, Clone)]
pub struct CertificateRequest<'a> {
    pub participant_name: &'a str,
    pub issue_date: &'a str,
    pub code: &'a str,
    pub validation_base_url: &'a str,
    pub class: Option<ClassMetadata>,
}

impl<'a> CertificateRequest<'a> {
    /// Request that reproduces a stored certificate. The record's own base URL
    /// takes precedence over `validation_base_url`.
    pub fn from_record(record: &'a CertificateRecord, validation_base_url: &'a str) -> Self {
        Self {
            participant_name: &record.participant_name,
            issue_date: &record.issue_date,
            code: &record.code,
            validation_base_url: record.base_url_or(validation_base_url),
            class: record.class_metadata(),
        }
    }
}

/// Draws certificates onto the template.
///
/// Output depends only on the request, the assets and the layout, so a stored
/// record always renders to the same pixels.
pub struct CertificateRenderer {
    assets: CertificateAssets,
    layout: Layout,
}

impl CertificateRenderer {
    pub fn new(assets: CertificateAssets, layout: Layout) -> Result<Self> {
        layout.validate()?;
        Ok(Self { assets, layout })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn assets(&self) -> &CertificateAssets {
        &self.assets
    }

    /// Render a certificate as an RGBA image
    pub fn render(&self, request: &CertificateRequest<'_>) -> Result<RgbaImage> {
        let template = self.assets.template()?;
        let signature = self.assets.signature()?;
        let font = self.assets.font().font();

        let mut canvas = template.clone();

        // Name, centred on the calibrated anchor
        let name_layout = &self.layout.name;
        let name_scale = PxScale::from(name_layout.font_size_for(request.participant_name));
        let (name_width, _) = text_size(name_scale, font, request.participant_name);
        let name_x = name_layout.center_x - (name_width / 2) as i32;
        draw_text_mut(
            &mut canvas,
            INK,
            name_x,
            name_layout.y,
            name_scale,
            font,
            request.participant_name,
        );

        draw_text(&mut canvas, font, &self.layout.issue_date, request.issue_date);

        let slot = &self.layout.signature;
        let signature = imageops::resize(signature, slot.width, slot.height, FilterType::Lanczos3);
        imageops::overlay(&mut canvas, &signature, slot.x, slot.y);

        draw_text(
            &mut canvas,
            font,
            &self.layout.code,
            &format!("ID: {}", request.code),
        );

        if let Some(class) = &request.class {
            self.draw_metadata(&mut canvas, font, class);
        }

        let qr = encode_validation_qr(request.validation_base_url, request.code)?;
        let qr_layout = &self.layout.qr;
        let qr = imageops::resize(
            &DynamicImage::ImageLuma8(qr).to_rgba8(),
            qr_layout.size,
            qr_layout.size,
            FilterType::Nearest,
        );
        let qr_x = canvas.width().saturating_sub(qr_layout.size + qr_layout.margin);
        let qr_y = canvas.height().saturating_sub(qr_layout.size + qr_layout.margin);
        imageops::replace(&mut canvas, &qr, qr_x as i64, qr_y as i64);

        debug!(
            "Rendered certificate {} ({}x{})",
            request.code,
            canvas.width(),
            canvas.height()
        );

        Ok(canvas)
    }

    /// Render a certificate and encode it as PNG
    pub fn render_png(&self, request: &CertificateRequest<'_>) -> Result<Vec<u8>> {
        let canvas = self.render(request)?;
        encode_png(&canvas)
    }

    fn draw_metadata(&self, canvas: &mut RgbaImage, font: &FontArc, class: &ClassMetadata) {
        let layout = &self.layout.metadata;
        let hours = class
            .hours_duration
            .as_ref()
            .map(|h| format!("{}{}", h, layout.hours_duration_suffix));

        let lines = [
            (&layout.class_name_label, class.class_name.as_ref()),
            (&layout.event_date_label, class.event_date.as_ref()),
            (&layout.training_name_label, class.training_name.as_ref()),
            (&layout.hours_duration_label, hours.as_ref()),
        ];

        for (slot, (label, value)) in lines.into_iter().enumerate() {
            let Some(value) = value else {
                continue;
            };

            let line = TextLayout {
                x: layout.x,
                y: layout.y + layout.line_height * slot as i32,
                font_size: layout.font_size,
            };
            draw_text(canvas, font, &line, &format!("{}{}", label, value));
        }
    }
}

fn draw_text(canvas: &mut RgbaImage, font: &FontArc, layout: &TextLayout, text: &str) {
    draw_text_mut(
        canvas,
        INK,
        layout.x,
        layout.y,
        PxScale::from(layout.font_size),
        font,
        text,
    );
}

/// Encode an RGBA image as PNG bytes
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut png_bytes: Vec<u8> = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| Error::Image(format!("failed to encode certificate PNG: {e}")))?;

    Ok(png_bytes)
}

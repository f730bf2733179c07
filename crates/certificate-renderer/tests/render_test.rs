//! End-to-end rendering from assets on disk

use certificate_common::ClassMetadata;
use certificate_renderer::{
    AssetPaths, CertificateAssets, CertificateRenderer, CertificateRequest, FontSource, Layout,
};
use image::{imageops, GenericImageView, Rgba, RgbaImage};
use std::path::Path;

const CODE: &str = "0123456789abcdef";
const BASE_URL: &str = "http://localhost:8080/";

fn write_assets(dir: &Path) -> AssetPaths {
    let template = dir.join("template.png");
    let signature = dir.join("signature.png");

    RgbaImage::from_pixel(2000, 1414, Rgba([255, 255, 255, 255]))
        .save(&template)
        .unwrap();
    RgbaImage::from_pixel(120, 40, Rgba([20, 20, 120, 255]))
        .save(&signature)
        .unwrap();

    AssetPaths {
        template,
        signature,
        font: dir.join("missing-primary.ttf"),
        fallback_font: dir.join("missing-fallback.ttf"),
    }
}

fn request(class: Option<ClassMetadata>) -> CertificateRequest<'static> {
    CertificateRequest {
        participant_name: "Maria Silva",
        issue_date: "10 de março de 2025",
        code: CODE,
        validation_base_url: BASE_URL,
        class,
    }
}

#[test]
fn test_render_from_disk_assets() {
    let dir = tempfile::tempdir().unwrap();
    let assets = CertificateAssets::load(&write_assets(dir.path())).unwrap();

    assert!(assets.is_complete());
    assert_eq!(assets.font().source(), &FontSource::Bundled);

    let renderer = CertificateRenderer::new(assets, Layout::default()).unwrap();
    let class = ClassMetadata {
        class_name: Some("Turma A".to_string()),
        event_date: Some("10/03/2025".to_string()),
        training_name: Some("NR-35".to_string()),
        hours_duration: Some("8".to_string()),
    };

    let png = renderer.render_png(&request(Some(class))).unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!(decoded.dimensions(), (2000, 1414));
}

#[test]
fn test_embedded_qr_points_at_validation_page() {
    let dir = tempfile::tempdir().unwrap();
    let assets = CertificateAssets::load(&write_assets(dir.path())).unwrap();
    let renderer = CertificateRenderer::new(assets, Layout::default()).unwrap();

    let img = renderer.render(&request(None)).unwrap();

    // QR block plus the blank margin around it
    let qr = renderer.layout().qr;
    let side = qr.size + qr.margin;
    let corner = imageops::crop_imm(
        &img,
        img.width() - side - 20,
        img.height() - side - 20,
        side + 20,
        side + 20,
    )
    .to_image();
    let gray = image::DynamicImage::ImageRgba8(corner).to_luma8();

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        gray.width() as usize,
        gray.height() as usize,
        |x, y| gray.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1);

    let (_meta, content) = grids[0].decode().unwrap();
    assert_eq!(content, format!("http://localhost:8080/validate?code={CODE}"));
}

#[test]
fn test_missing_template_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = write_assets(dir.path());
    paths.template = dir.path().join("no-template.png");

    let assets = CertificateAssets::load(&paths).unwrap();
    assert!(!assets.is_complete());

    let renderer = CertificateRenderer::new(assets, Layout::default()).unwrap();
    let err = renderer.render(&request(None)).unwrap_err();
    assert!(err.to_string().contains("template"));
}

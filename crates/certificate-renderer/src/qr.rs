//! QR code encoding for validation links

use certificate_common::{validation_url, Error, Result};
use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};

/// Pixels per QR module before the image is scaled onto the certificate
pub const QR_MODULE_PIXELS: u32 = 10;

/// Light modules around the symbol
pub const QR_BORDER_MODULES: u32 = 2;

pub const QR_EC_LEVEL: EcLevel = EcLevel::M;

/// Encode the validation link for `code` as a QR image
pub fn encode_validation_qr(base_url: &str, code: &str) -> Result<GrayImage> {
    encode_qr(&validation_url(base_url, code))
}

/// Encode arbitrary text as a black-on-white QR image.
///
/// The symbol version grows to fit the data. The image is square with side
/// `(modules + 2 * border) * QR_MODULE_PIXELS`.
pub fn encode_qr(data: &str) -> Result<GrayImage> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), QR_EC_LEVEL)
        .map_err(|e| Error::QrEncoding(format!("failed to create QR code: {e}")))?;

    let modules = code.to_colors();
    let module_count = code.width() as u32;
    let side = (module_count + 2 * QR_BORDER_MODULES) * QR_MODULE_PIXELS;

    let mut img = GrayImage::from_pixel(side, side, Luma([255u8]));

    for (i, color) in modules.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }

        let x = (i as u32 % module_count + QR_BORDER_MODULES) * QR_MODULE_PIXELS;
        let y = (i as u32 / module_count + QR_BORDER_MODULES) * QR_MODULE_PIXELS;

        for dy in 0..QR_MODULE_PIXELS {
            for dx in 0..QR_MODULE_PIXELS {
                img.put_pixel(x + dx, y + dy, Luma([0u8]));
            }
        }
    }

    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(img: &GrayImage) -> String {
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            img.width() as usize,
            img.height() as usize,
            |x, y| img.get_pixel(x as u32, y as u32)[0],
        );
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1, "expected exactly one QR symbol");

        let (_meta, content) = grids[0].decode().expect("QR symbol should decode");
        content
    }

    #[test]
    fn test_round_trip_without_trailing_slash() {
        let img = encode_validation_qr("https://certs.example.com", "0123456789abcdef").unwrap();

        assert_eq!(
            decode(&img),
            "https://certs.example.com/validate?code=0123456789abcdef"
        );
    }

    #[test]
    fn test_round_trip_with_trailing_slash() {
        let img = encode_validation_qr("http://localhost:8080/", "fedcba9876543210").unwrap();

        assert_eq!(
            decode(&img),
            "http://localhost:8080/validate?code=fedcba9876543210"
        );
    }

    #[test]
    fn test_image_is_square_with_border() {
        let img = encode_qr("hello").unwrap();

        assert_eq!(img.width(), img.height());
        assert_eq!(img.width() % QR_MODULE_PIXELS, 0);
        // Border is light
        assert_eq!(img.get_pixel(0, 0)[0], 255);
        // Top-left finder pattern starts right after the border
        let offset = QR_BORDER_MODULES * QR_MODULE_PIXELS;
        assert_eq!(img.get_pixel(offset, offset)[0], 0);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = encode_qr("https://certs.example.com/validate?code=abc").unwrap();
        let b = encode_qr("https://certs.example.com/validate?code=abc").unwrap();

        assert_eq!(a.as_raw(), b.as_raw());
    }
}

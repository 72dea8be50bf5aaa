//! QR encoding of retrieval URLs.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use thiserror::Error;
use url::Url;

/// Smallest rendered edge in pixels.
const MIN_EDGE_PX: u32 = 240;

/// Encoding errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Input is not an absolute http(s) URL.
    #[error("invalid retrieval URL '{url}': {reason}")]
    InvalidUrl {
        /// Offending input.
        url: String,
        /// What is wrong with it.
        reason: String,
    },

    /// QR symbol or PNG could not be produced.
    #[error("failed to render QR code: {0}")]
    Render(String),
}

/// PNG image of a QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeImage {
    png: Vec<u8>,
}

impl CodeImage {
    /// MIME type of the payload.
    pub const MIME_TYPE: &'static str = "image/png";

    /// Raw PNG bytes.
    #[must_use]
    pub fn as_png(&self) -> &[u8] {
        &self.png
    }

    /// `data:image/png;base64,...` form for JSON transport.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", Self::MIME_TYPE, STANDARD.encode(&self.png))
    }
}

/// Encodes retrieval URLs as QR code images. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrievalCodec;

impl RetrievalCodec {
    /// Render `url` as a QR code.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidUrl`] unless `url` is an absolute http(s) URL
    /// with a host, and [`CodecError::Render`] if it does not fit in a QR symbol.
    pub fn encode(&self, url: &str) -> Result<CodeImage, CodecError> {
        validate(url)?;

        let code = QrCode::new(url.as_bytes()).map_err(|e| CodecError::Render(e.to_string()))?;
        let pixels = code
            .render::<Luma<u8>>()
            .min_dimensions(MIN_EDGE_PX, MIN_EDGE_PX)
            .build();

        let mut png = Vec::new();
        DynamicImage::ImageLuma8(pixels)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| CodecError::Render(e.to_string()))?;

        Ok(CodeImage { png })
    }
}

fn validate(raw: &str) -> Result<(), CodecError> {
    let invalid = |reason: &str| CodecError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host().is_none() {
        return Err(invalid("missing host"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn decode(image: &CodeImage) -> String {
        let gray = image::load_from_memory(image.as_png())
            .expect("png should load")
            .to_luma8();
        let (width, height) = gray.dimensions();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            width as usize,
            height as usize,
            |x, y| gray.get_pixel(x as u32, y as u32).0[0],
        );
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1, "expected exactly one QR code");
        let (_, content) = grids[0].decode().expect("qr should decode");
        content
    }

    #[rstest]
    #[case("http://localhost:5000/download/1700000000000-a.pdf")]
    #[case("https://files.example.com/docdrop/download/1700000000000-my_report_2024.pdf")]
    fn test_encode_decodes_to_same_url(#[case] url: &str) {
        let image = RetrievalCodec.encode(url).expect("should encode");
        assert_eq!(decode(&image), url);
    }

    #[test]
    fn test_png_and_data_uri() {
        let image = RetrievalCodec
            .encode("http://localhost:5000/download/1-a.pdf")
            .expect("should encode");
        assert!(image.as_png().starts_with(b"\x89PNG\r\n\x1a\n"));

        let uri = image.to_data_uri();
        let payload = uri
            .strip_prefix("data:image/png;base64,")
            .expect("data uri prefix");
        assert_eq!(STANDARD.decode(payload).expect("base64"), image.as_png());
    }

    #[test]
    fn test_rendered_size_at_least_minimum() {
        let image = RetrievalCodec
            .encode("http://localhost:5000/download/1-a.pdf")
            .expect("should encode");
        let decoded = image::load_from_memory(image.as_png()).expect("png should load");
        assert!(decoded.width() >= MIN_EDGE_PX);
        assert!(decoded.height() >= MIN_EDGE_PX);
    }

    #[rstest]
    #[case("")]
    #[case("/download/1-a.pdf")]
    #[case("localhost:5000/download/1-a.pdf")]
    #[case("ftp://example.com/download/1-a.pdf")]
    #[case("data:text/plain,hello")]
    fn test_invalid_url_rejected(#[case] url: &str) {
        assert!(matches!(
            RetrievalCodec.encode(url),
            Err(CodecError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_oversized_url_fails_to_render() {
        let url = format!("https://example.com/download/{}", "a".repeat(5000));
        assert!(matches!(
            RetrievalCodec.encode(&url),
            Err(CodecError::Render(_))
        ));
    }
}

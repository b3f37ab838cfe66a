//! Inserted image payloads: header sniffing and `data:` URLs.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::ImageReader;

use crate::{CanvasError, CanvasResult};

/// Basic facts about an encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// MIME type of the encoding.
    pub mime: &'static str,
}

/// Read format and dimensions without decoding pixel data.
///
/// # Errors
///
/// Returns [`CanvasError::Image`] if the format is unknown or the header is
/// unreadable.
pub fn read_info(bytes: &[u8]) -> CanvasResult<ImageInfo> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CanvasError::Image(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| CanvasError::Image("unrecognized image format".to_string()))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| CanvasError::Image(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(CanvasError::Image("image has no pixels".to_string()));
    }
    Ok(ImageInfo {
        width,
        height,
        mime: format.to_mime_type(),
    })
}

/// Encode bytes as a base64 `data:` URL.
#[must_use]
pub fn to_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Decode a base64 `data:` URL back into bytes and its MIME type.
///
/// # Errors
///
/// Returns [`CanvasError::Image`] if the URL is not a base64 data URL.
pub fn from_data_url(url: &str) -> CanvasResult<(Vec<u8>, String)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| CanvasError::Image("image source is not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CanvasError::Image("data URL has no payload".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| CanvasError::Image("data URL is not base64 encoded".to_string()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| CanvasError::Image(e.to_string()))?;
    Ok((bytes, mime.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x1 RGBA PNG.
    fn tiny_png() -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image::RgbaImage::from_pixel(2, 1, image::Rgba([255, 0, 0, 255]))
            .write_to(&mut buf, image::ImageFormat::Png)
            .expect("encode png");
        buf.into_inner()
    }

    #[test]
    fn test_read_info_png() {
        let info = read_info(&tiny_png()).expect("read info");
        assert_eq!((info.width, info.height), (2, 1));
        assert_eq!(info.mime, "image/png");
    }

    #[test]
    fn test_read_info_rejects_garbage() {
        assert!(read_info(b"definitely not an image").is_err());
    }

    #[test]
    fn test_data_url_round_trip() {
        let bytes = tiny_png();
        let url = to_data_url(&bytes, "image/png");
        assert!(url.starts_with("data:image/png;base64,"));
        let (decoded, mime) = from_data_url(&url).expect("decode");
        assert_eq!(decoded, bytes);
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn test_plain_url_rejected() {
        assert!(from_data_url("https://example.com/a.png").is_err());
        assert!(from_data_url("data:text/plain,hello").is_err());
    }
}

use image::DynamicImage;
use mime_guess::{Mime, mime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageGateError {
    #[error("not an image: {0}")]
    NotAnImage(String),

    #[error("corrupt image: {0}")]
    Corrupt(String),
}

/// An upload that passed the gate: a known image media type and a pixel grid.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    image: DynamicImage,
    media_type: Mime,
}

impl DecodedImage {
    #[must_use]
    pub const fn new(image: DynamicImage, media_type: Mime) -> Self {
        Self { image, media_type }
    }

    #[must_use]
    pub const fn image(&self) -> &DynamicImage {
        &self.image
    }

    #[must_use]
    pub const fn media_type(&self) -> &Mime {
        &self.media_type
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// Validates uploads before anything expensive sees them.
///
/// The media type comes from the file extension only; the bytes are never
/// sniffed for it. Decoding is what proves the bytes are an image.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageGate;

impl ImageGate {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    pub fn validate(&self, filename: &str, bytes: &[u8]) -> Result<DecodedImage, ImageGateError> {
        let media_type = Self::media_type(filename)?;

        let image = image::load_from_memory(bytes)
            .map_err(|e| ImageGateError::Corrupt(format!("{filename}: {e}")))?;

        Ok(DecodedImage::new(image, media_type))
    }

    pub fn media_type(filename: &str) -> Result<Mime, ImageGateError> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(ImageGateError::NotAnImage("<unnamed>".to_string()));
        }

        mime_guess::from_path(filename)
            .first()
            .filter(|m| m.type_() == mime::IMAGE)
            .ok_or_else(|| ImageGateError::NotAnImage(filename.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(4, 3, Rgb([200, 10, 10]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn accepts_decodable_image() {
        let decoded = ImageGate::new().validate("shoe.png", &png_bytes()).unwrap();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.media_type().essence_str(), "image/png");
    }

    #[test]
    fn media_type_comes_from_extension_not_content() {
        // PNG bytes under a .jpg name are still accepted; the extension decides the type.
        let decoded = ImageGate::new().validate("shoe.JPG", &png_bytes()).unwrap();
        assert_eq!(decoded.media_type().essence_str(), "image/jpeg");
    }

    #[test]
    fn rejects_non_image_extensions() {
        let gate = ImageGate::new();
        for name in ["doc.pdf", "notes.txt", "archive", ""] {
            assert!(
                matches!(gate.validate(name, &png_bytes()), Err(ImageGateError::NotAnImage(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_undecodable_bytes() {
        let result = ImageGate::new().validate("shoe.jpg", b"just some text, not pixels");
        assert!(matches!(result, Err(ImageGateError::Corrupt(_))));
    }
}

use image::{codecs::jpeg::JpegEncoder, ExtendedColorType, RgbImage};

use super::draw::annotate;
use crate::application::ports::ImagingPort;
use crate::domain::{
    errors::{DomainError, DomainResult},
    violation::Annotation,
};

/// Decodes uploads with format sniffing and answers with annotated JPEG.
pub struct JpegImaging {
    quality: u8,
}

impl JpegImaging {
    pub fn new(quality: u8) -> Self {
        Self { quality: quality.clamp(1, 100) }
    }
}

impl Default for JpegImaging {
    fn default() -> Self {
        Self::new(90)
    }
}

impl ImagingPort for JpegImaging {
    fn decode(&self, bytes: &[u8]) -> DomainResult<RgbImage> {
        if bytes.is_empty() {
            return Err(DomainError::InvalidInput("Empty image".into()));
        }
        let img = image::load_from_memory(bytes)
            .map_err(|e| DomainError::InvalidInput(format!("Image decode failed: {e}")))?;
        if img.width() == 0 || img.height() == 0 {
            return Err(DomainError::InvalidInput("Invalid image".into()));
        }
        Ok(img.to_rgb8())
    }

    fn render_jpeg(&self, mut image: RgbImage, annotations: &[Annotation]) -> DomainResult<Vec<u8>> {
        annotate(&mut image, annotations);

        let mut jpeg = Vec::new();
        let mut enc = JpegEncoder::new_with_quality(&mut jpeg, self.quality);
        enc.encode(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgb8)
            .map_err(|e| DomainError::OperationFailed(format!("JPEG encode failed: {e}")))?;
        Ok(jpeg)
    }
}

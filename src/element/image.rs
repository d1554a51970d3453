use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use egui::ColorImage;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};

use crate::error::TextureGenerationError;

/// Encoded image payload of an image or watermark element.
///
/// The bytes are shared, so history snapshots and duplicates never copy the payload.
/// Drafts carry them as base64.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ImageBytes(Arc<[u8]>);

impl std::fmt::Debug for ImageBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ImageBytes({} bytes)", self.0.len())
    }
}

impl ImageBytes {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sniff the encoding from the magic bytes.
    pub fn kind(&self) -> Option<ImageKind> {
        match image::guess_format(&self.0).ok()? {
            image::ImageFormat::Png => Some(ImageKind::Png),
            image::ImageFormat::Jpeg => Some(ImageKind::Jpg),
            _ => None,
        }
    }

    /// Decode into an RGBA image for texture upload.
    pub fn decode(&self) -> Result<ColorImage, TextureGenerationError> {
        let decoded = image::load_from_memory(&self.0)
            .map_err(|err| TextureGenerationError::Decode(err.to_string()))?;
        let rgba = decoded.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        if size[0] == 0 || size[1] == 0 {
            return Err(TextureGenerationError::InvalidDimensions);
        }
        Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
    }
}

impl Serialize for ImageBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for ImageBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = STANDARD.decode(text.as_bytes()).map_err(D::Error::custom)?;
        Ok(Self::new(bytes))
    }
}

/// Encodings the PDF backends can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    #[default]
    Png,
    Jpg,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn test_kind_sniffing() {
        assert_eq!(ImageBytes::new(PNG_MAGIC.to_vec()).kind(), Some(ImageKind::Png));
        assert_eq!(ImageBytes::new(vec![0xff, 0xd8, 0xff, 0xe0]).kind(), Some(ImageKind::Jpg));
        assert_eq!(ImageBytes::new(vec![1, 2, 3]).kind(), None);
    }

    #[test]
    fn test_base64_json() {
        let bytes = ImageBytes::new(vec![0u8, 1, 2, 250]);
        let json = serde_json::to_string(&bytes).unwrap();
        assert_eq!(json, "\"AAEC+g==\"");
        let back: ImageBytes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bytes);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(ImageBytes::new(vec![1, 2, 3]).decode().is_err());
    }
}

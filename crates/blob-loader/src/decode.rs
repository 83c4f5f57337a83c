//! Decode capability: turning raw bytes into a usable value

use crate::error::DecodeError;
use serde::Serialize;

/// Validates raw bytes and converts them into `Output`
pub trait Decoder: Send + Sync {
    type Output: Send;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Output, DecodeError>;
}

/// Hands bytes through unchanged, only rejecting empty payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughDecoder;

impl Decoder for PassthroughDecoder {
    type Output = Vec<u8>;

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::new("empty payload"));
        }
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
        }
    }

    /// Map a format detected by the `image` crate onto the formats we serve
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(ImageFormat::Png),
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::Gif => Some(ImageFormat::Gif),
            image::ImageFormat::WebP => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Gif => image::ImageFormat::Gif,
            ImageFormat::Webp => image::ImageFormat::WebP,
        }
    }
}

/// Image bytes that decoded cleanly, kept in their original encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Accepts PNG, JPEG, GIF or WebP payloads that decode in full
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl Decoder for ImageDecoder {
    type Output = DecodedImage;

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
        use image::GenericImageView;

        let detected = image::guess_format(bytes)
            .map_err(|e| DecodeError::new(format!("unrecognized image format: {}", e)))?;
        let format = ImageFormat::from_image_format(detected).ok_or_else(|| {
            DecodeError::new(format!("unsupported image format: {:?}", detected))
        })?;

        let img = image::load_from_memory_with_format(bytes, format.to_image_format())
            .map_err(|e| DecodeError::new(format!("failed to decode image: {}", e)))?;
        let (width, height) = img.dimensions();

        Ok(DecodedImage {
            format,
            width,
            height,
            bytes: bytes.to_vec(),
        })
    }
}

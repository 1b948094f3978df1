//! Analysis input: an image, a free-text description, or both.

use base64::{engine::general_purpose, Engine};

/// MIME type used when the image carries no usable data-URI header
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Base64 image ready to be attached as inline content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub mime_type: String,
    /// Base64 payload without any data-URI header
    pub data: String,
}

impl ImageInput {
    /// Build from a base64 string, optionally prefixed with a data-URI header.
    ///
    /// Everything up to and including the first `,` is dropped. A header of
    /// the form `data:image/<type>;base64` keeps its MIME type.
    pub fn from_base64(encoded: &str) -> Self {
        match encoded.split_once(',') {
            Some((header, data)) => Self {
                mime_type: mime_from_header(header)
                    .unwrap_or(DEFAULT_IMAGE_MIME)
                    .to_string(),
                data: data.to_string(),
            },
            None => Self {
                mime_type: DEFAULT_IMAGE_MIME.to_string(),
                data: encoded.to_string(),
            },
        }
    }

    /// Build from raw image bytes
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.trim().is_empty()
    }
}

fn mime_from_header(header: &str) -> Option<&str> {
    let mime = header.strip_prefix("data:")?.split(';').next()?.trim();
    mime.starts_with("image/").then_some(mime)
}

/// What the caller wants analysed.
///
/// Both fields may be `None` here; the request builder rejects that case
/// before anything is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisInput {
    pub image: Option<ImageInput>,
    pub text: Option<String>,
}

impl AnalysisInput {
    /// Image-only input
    pub fn image(image: ImageInput) -> Self {
        Self {
            image: Some(image),
            text: None,
        }
    }

    /// Text-only input
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            image: None,
            text: Some(text.into()),
        }
    }

    /// Image plus a text query
    pub fn both(image: ImageInput, text: impl Into<String>) -> Self {
        Self {
            image: Some(image),
            text: Some(text.into()),
        }
    }

    /// Input from the caller-facing optional strings
    pub fn from_parts(image_base64: Option<&str>, text_query: Option<&str>) -> Self {
        Self {
            image: image_base64.map(ImageInput::from_base64),
            text: text_query.map(str::to_string),
        }
    }

    /// The image, unless absent or empty
    pub fn usable_image(&self) -> Option<&ImageInput> {
        self.image.as_ref().filter(|image| !image.is_empty())
    }

    /// The text query, unless absent or blank
    pub fn usable_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.usable_image().is_none() && self.usable_text().is_none()
    }
}

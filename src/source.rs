use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Image types accepted as conversion sources.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MimeType {
    /// `image/png`
    Png,
    /// `image/jpeg`
    Jpeg,
}

impl MimeType {
    /// Returns the MIME type string, e.g. `image/png`.
    pub fn as_str(self) -> &'static str {
        match self {
            MimeType::Png => "image/png",
            MimeType::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        out.write_str(self.as_str())
    }
}

impl FromStr for MimeType {
    type Err = Error;

    fn from_str(input: &str) -> Result<MimeType> {
        match input.trim().to_ascii_lowercase().as_str() {
            "image/png" | "png" => Ok(MimeType::Png),
            "image/jpeg" | "image/jpg" | "jpeg" | "jpg" => Ok(MimeType::Jpeg),
            other => invalid_image!("unsupported image type: {}", other),
        }
    }
}

/// An uploaded image waiting to be converted.  The bytes are never changed
/// once accepted.
#[derive(Clone, Debug)]
pub struct SourceImage {
    bytes: Vec<u8>,
    mime: MimeType,
}

impl SourceImage {
    /// Accepts `bytes` as a source image of the given type, rejecting empty
    /// input and input longer than `max_bytes`.
    pub fn new(bytes: Vec<u8>,
               mime: MimeType,
               max_bytes: usize)
               -> Result<SourceImage> {
        if bytes.is_empty() {
            invalid_image!("source image is empty");
        }
        if bytes.len() > max_bytes {
            invalid_image!("source image is {} bytes (limit is {})",
                           bytes.len(),
                           max_bytes);
        }
        Ok(SourceImage { bytes, mime })
    }

    /// Returns the raw encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the declared type of the bytes.
    pub fn mime(&self) -> MimeType {
        self.mime
    }
}

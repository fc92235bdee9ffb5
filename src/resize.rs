use crate::error::Result;
use crate::source::SourceImage;

/// A square PNG produced by one resize call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RenderedBitmap {
    /// Width and height of the image, in pixels.
    pub edge: u32,
    /// The encoded PNG file.
    pub png: Vec<u8>,
}

impl RenderedBitmap {
    /// Pairs PNG data with the edge length it was rendered at.
    pub fn new(edge: u32, png: Vec<u8>) -> RenderedBitmap {
        RenderedBitmap { edge, png }
    }
}

/// Something that can scale a source image into a square, transparent-padded
/// PNG of a given edge length.
///
/// Implementations must be safe to call from many threads at once on the same
/// source.  An unreadable source should fail with
/// [`Error::InvalidImage`](crate::Error::InvalidImage); a failure that might
/// go away if retried should use [`Error::Resize`](crate::Error::Resize).
pub trait Resizer: Send + Sync {
    /// Renders `source` into an `edge` by `edge` PNG, scaling it to fit and
    /// leaving any uncovered area fully transparent.
    fn resize(&self, source: &SourceImage, edge: u32) -> Result<RenderedBitmap>;
}

#[cfg(feature = "resize")]
pub use self::contain::ContainResizer;

#[cfg(feature = "resize")]
mod contain {
    use image::imageops::{self, FilterType};
    use image::{DynamicImage, ImageError, ImageFormat, RgbaImage};
    use std::io::Cursor;

    use super::{RenderedBitmap, Resizer};
    use crate::error::{Error, Result};
    use crate::source::{MimeType, SourceImage};

    /// A [`Resizer`] backed by the `image` crate: Lanczos scaling that keeps
    /// the aspect ratio, centered on a transparent square canvas.
    #[derive(Clone, Copy, Debug)]
    pub struct ContainResizer {
        filter: FilterType,
    }

    impl ContainResizer {
        /// Creates a resizer using Lanczos3 filtering.
        pub fn new() -> ContainResizer {
            ContainResizer { filter: FilterType::Lanczos3 }
        }

        /// Creates a resizer using the given filter.
        pub fn with_filter(filter: FilterType) -> ContainResizer {
            ContainResizer { filter }
        }

        fn decode(&self, source: &SourceImage) -> Result<DynamicImage> {
            let format = match source.mime() {
                MimeType::Png => ImageFormat::Png,
                MimeType::Jpeg => ImageFormat::Jpeg,
            };
            image::load_from_memory_with_format(source.bytes(), format)
                .map_err(|err| {
                    Error::InvalidImage(format!("cannot decode {}: {}",
                                                source.mime(),
                                                err))
                })
        }
    }

    impl Default for ContainResizer {
        fn default() -> ContainResizer {
            ContainResizer::new()
        }
    }

    impl Resizer for ContainResizer {
        fn resize(&self,
                  source: &SourceImage,
                  edge: u32)
                  -> Result<RenderedBitmap> {
            let image = self.decode(source)?;
            let scaled = image.resize(edge, edge, self.filter).to_rgba8();
            let mut canvas = RgbaImage::new(edge, edge);
            let x = (edge - scaled.width().min(edge)) / 2;
            let y = (edge - scaled.height().min(edge)) / 2;
            imageops::overlay(&mut canvas, &scaled, i64::from(x), i64::from(y));
            let mut png = Vec::new();
            DynamicImage::ImageRgba8(canvas)
                .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
                .map_err(|err| match err {
                    ImageError::IoError(err) => Error::Resize(err.to_string()),
                    other => Error::InvalidImage(other.to_string()),
                })?;
            Ok(RenderedBitmap::new(edge, png))
        }
    }

}

//! Library for turning one raster image into a Windows ICO file and a macOS
//! ICNS file, and for keeping the results around for a short while.
//!
//! The pipeline renders the source at every size in two fixed tables (see
//! [`ICO_SIZES`] and [`IconType::ALL`]), packs the PNGs into an [`IconDir`]
//! and an [`IconFamily`], and hands both files to an [`ArtifactStore`] that
//! serves them by id until the retention window runs out.
//!
//! See https://en.wikipedia.org/wiki/Apple_Icon_Image_format and
//! https://en.wikipedia.org/wiki/ICO_(file_format) for more information
//! about the two file formats.
//!
//! # Example
//!
//! ```no_run
//! use icondrop::{ArtifactKind, Config, IconService, MimeType};
//!
//! let service = IconService::from_config(&Config::default()).unwrap();
//! let upload = std::fs::read("logo.png").unwrap();
//! let id = service.convert_and_store(upload, MimeType::Png).unwrap();
//! let icns = service.fetch_artifact(id.as_str(), ArtifactKind::Icns).unwrap();
//! ```

#![warn(missing_docs)]

#[macro_use]
mod error;

mod config;
mod convert;
mod element;
mod family;
mod ico;
mod icontype;
mod pngio;
mod resize;
mod service;
mod source;
mod store;

pub use self::config::Config;
pub use self::convert::{CancelFlag, Converter, IconSet};
pub use self::element::IconElement;
pub use self::error::{Error, Result};
pub use self::family::IconFamily;
pub use self::ico::{IconDir, IconDirEntry};
pub use self::icontype::{IconType, OSType, ICO_SIZES};
pub use self::pngio::png_dimensions;
#[cfg(feature = "resize")]
pub use self::resize::ContainResizer;
pub use self::resize::{RenderedBitmap, Resizer};
pub use self::service::{IconService, SharedStore};
pub use self::source::{MimeType, SourceImage};
pub use self::store::{parse_filename, ArtifactId, ArtifactKind, ArtifactRecord,
                      ArtifactStore, Backend, DirectoryBackend, MemoryBackend,
                      Sweeper, DEFAULT_RETENTION};

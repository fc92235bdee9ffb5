use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::family::IconFamily;
use crate::ico::IconDir;
use crate::icontype::{IconType, ICO_SIZES};
use crate::resize::{RenderedBitmap, Resizer};
use crate::source::SourceImage;

/// The two containers produced from one source image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IconSet {
    /// The encoded Windows ICO file.
    pub ico: Vec<u8>,
    /// The encoded macOS ICNS file.
    pub icns: Vec<u8>,
}

/// A flag the caller can raise to abandon a conversion in progress.  Resize
/// calls that have not started yet are skipped once it is set.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a flag that is not yet raised.
    pub fn new() -> CancelFlag {
        CancelFlag::default()
    }

    /// Raises the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once the flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Turns one source image into an ICO and an ICNS file.
///
/// Every size in both tables is rendered by its own resize call, and the
/// calls run in parallel on the rayon thread pool.  The first failure wins
/// and the rest of the work is thrown away.
#[derive(Clone, Debug)]
pub struct Converter<R> {
    resizer: R,
}

impl<R: Resizer> Converter<R> {
    /// Creates a converter that renders with the given resizer.
    pub fn new(resizer: R) -> Converter<R> {
        Converter { resizer }
    }

    /// Returns the resizer this converter renders with.
    pub fn resizer(&self) -> &R {
        &self.resizer
    }

    /// Converts `source` into both containers.
    pub fn convert(&self, source: &SourceImage) -> Result<IconSet> {
        self.convert_with_cancel(source, &CancelFlag::new())
    }

    /// Converts `source` into both containers, giving up with
    /// [`Error::Cancelled`] if `cancel` is raised before the work finishes.
    pub fn convert_with_cancel(&self,
                               source: &SourceImage,
                               cancel: &CancelFlag)
                               -> Result<IconSet> {
        let run = Run {
            resizer: &self.resizer,
            source,
            cancel,
            failed: AtomicBool::new(false),
        };
        let (ico, icns) = rayon::join(|| run.ico(), || run.icns());
        let set = match (ico, icns) {
            (Ok(ico), Ok(icns)) => IconSet { ico, icns },
            (Err(Error::Cancelled), Err(err)) | (Err(err), _) | (_, Err(err)) => {
                return Err(err)
            }
        };
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        debug!(ico_bytes = set.ico.len(),
               icns_bytes = set.icns.len(),
               "converted source image");
        Ok(set)
    }
}

/// State shared by the resize calls of a single conversion.
struct Run<'a, R> {
    resizer: &'a R,
    source: &'a SourceImage,
    cancel: &'a CancelFlag,
    failed: AtomicBool,
}

impl<'a, R: Resizer> Run<'a, R> {
    fn ico(&self) -> Result<Vec<u8>> {
        let bitmaps = ICO_SIZES.par_iter()
            .map(|&edge| self.render(edge))
            .collect::<Result<Vec<_>>>()?;
        self.guard(IconDir::encode(bitmaps))
    }

    fn icns(&self) -> Result<Vec<u8>> {
        let entries = IconType::ALL.par_iter()
            .map(|&icon_type| {
                self.render(icon_type.pixel_width())
                    .map(|bitmap| (icon_type.ostype(), bitmap.png))
            })
            .collect::<Result<Vec<_>>>()?;
        self.guard(IconFamily::encode(entries))
    }

    fn render(&self, edge: u32) -> Result<RenderedBitmap> {
        if self.cancel.is_cancelled() || self.failed.load(Ordering::SeqCst) {
            return Err(Error::Cancelled);
        }
        let result = match self.resizer.resize(self.source, edge) {
            Err(Error::Resize(reason)) => {
                warn!(edge, %reason, "resize failed, retrying once");
                self.resizer.resize(self.source, edge).map_err(|err| {
                    match err {
                        Error::Resize(reason) => Error::InvalidImage(reason),
                        other => other,
                    }
                })
            }
            other => other,
        };
        match result {
            Ok(bitmap) => {
                debug!(edge, bytes = bitmap.png.len(), "rendered bitmap");
                Ok(bitmap)
            }
            Err(err) => self.guard(Err(err)),
        }
    }

    /// Marks the run as failed so sibling resize calls stop early.
    fn guard<T>(&self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.failed.store(true, Ordering::SeqCst);
        }
        result
    }
}

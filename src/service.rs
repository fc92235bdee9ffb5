use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::convert::{CancelFlag, Converter};
use crate::error::Result;
use crate::resize::Resizer;
use crate::source::{MimeType, SourceImage};
use crate::store::{parse_filename, ArtifactId, ArtifactKind, ArtifactStore,
                   Backend, DirectoryBackend, MemoryBackend, Sweeper};

/// The artifact store type used by [`IconService`].
pub type SharedStore = Arc<ArtifactStore<Box<dyn Backend>>>;

/// Converts uploads and serves the results by id until they expire.
///
/// Build one at startup and share it (e.g. behind an `Arc`) between request
/// handlers.  Dropping the service stops its background sweeper.
pub struct IconService<R> {
    converter: Converter<R>,
    store: SharedStore,
    max_source_bytes: usize,
    _sweeper: Sweeper,
}

#[cfg(feature = "resize")]
impl IconService<crate::resize::ContainResizer> {
    /// Creates a service that renders with the default
    /// [`ContainResizer`](crate::ContainResizer).
    pub fn from_config(config: &Config)
                       -> Result<IconService<crate::resize::ContainResizer>> {
        IconService::new(config, crate::resize::ContainResizer::new())
    }
}

impl<R: Resizer> IconService<R> {
    /// Creates a service from `config`, rendering with `resizer`.  Artifacts
    /// are kept in memory unless `config.output_dir` is set.
    pub fn new(config: &Config, resizer: R) -> Result<IconService<R>> {
        config.validate()?;
        let backend: Box<dyn Backend> = match config.output_dir {
            Some(ref dir) => {
                info!(dir = %dir.display(), "storing artifacts on disk");
                Box::new(DirectoryBackend::open(dir)?)
            }
            None => Box::new(MemoryBackend::new()),
        };
        let store = Arc::new(ArtifactStore::new(backend, config.retention()));
        let sweeper = Sweeper::spawn(Arc::clone(&store),
                                     config.sweep_interval())?;
        Ok(IconService {
            converter: Converter::new(resizer),
            store,
            max_source_bytes: config.max_source_bytes,
            _sweeper: sweeper,
        })
    }

    /// Returns the underlying artifact store.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Converts an uploaded image and stores both icon files, returning the
    /// id to fetch them by.
    pub fn convert_and_store(&self,
                             bytes: Vec<u8>,
                             mime: MimeType)
                             -> Result<ArtifactId> {
        self.convert_and_store_with_cancel(bytes, mime, &CancelFlag::new())
    }

    /// Like [`convert_and_store`](#method.convert_and_store), but abandons
    /// the work (storing nothing) if `cancel` is raised first.
    pub fn convert_and_store_with_cancel(&self,
                                         bytes: Vec<u8>,
                                         mime: MimeType,
                                         cancel: &CancelFlag)
                                         -> Result<ArtifactId> {
        let source = SourceImage::new(bytes, mime, self.max_source_bytes)?;
        let set = match self.converter.convert_with_cancel(&source, cancel) {
            Ok(set) => set,
            Err(err) => {
                warn!(%mime, %err, "conversion failed");
                return Err(err);
            }
        };
        self.store.put(set.ico, set.icns)
    }

    /// Returns one file of a stored artifact.  Ids that are malformed,
    /// unknown or expired all give [`Error::NotFound`](crate::Error::NotFound).
    pub fn fetch_artifact(&self, id: &str, kind: ArtifactKind) -> Result<Vec<u8>> {
        let id = ArtifactId::parse(id)?;
        self.store.get(&id, kind)
    }

    /// Returns the file requested by name, e.g. `lq2x0abc123.icns`.  Names
    /// not matching `^[a-z0-9]+\.(ico|icns)$` are rejected before storage is
    /// consulted.
    pub fn fetch_file(&self, filename: &str) -> Result<(ArtifactKind, Vec<u8>)> {
        let (id, kind) = parse_filename(filename)?;
        let data = self.store.get(&id, kind)?;
        Ok((kind, data))
    }
}

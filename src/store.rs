use chrono::{DateTime, Utc};
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// How long artifacts are kept unless configured otherwise.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(5 * 60);

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LENGTH: usize = 10;
const MAX_ID_LENGTH: usize = 64;

/// 2020-01-01T00:00:00Z; no generated id is older than this.
const EARLIEST_ID_MILLIS: u64 = 1_577_836_800_000;
const MAX_CLOCK_SKEW_MILLIS: u64 = 24 * 60 * 60 * 1000;

// ========================================================================= //

/// Which of an artifact's two files to fetch.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ArtifactKind {
    /// The Windows ICO file.
    Ico,
    /// The macOS ICNS file.
    Icns,
}

impl ArtifactKind {
    /// Both kinds, in the order they are written.
    pub const ALL: [ArtifactKind; 2] = [ArtifactKind::Ico, ArtifactKind::Icns];

    /// Returns the file extension for this kind, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Ico => "ico",
            ArtifactKind::Icns => "icns",
        }
    }

    /// Returns the MIME type served for this kind.
    pub fn content_type(self) -> &'static str {
        match self {
            ArtifactKind::Ico => "image/x-icon",
            ArtifactKind::Icns => "image/icns",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        out.write_str(self.extension())
    }
}

impl FromStr for ArtifactKind {
    type Err = Error;

    fn from_str(input: &str) -> Result<ArtifactKind> {
        match input {
            "ico" => Ok(ArtifactKind::Ico),
            "icns" => Ok(ArtifactKind::Icns),
            other => Err(Error::NotFound(format!("unknown artifact kind: {}",
                                                 other))),
        }
    }
}

// ========================================================================= //

/// The opaque handle of a stored artifact: lowercase ASCII letters and
/// digits only, so it can be used directly as a file stem.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Generates a fresh id: the current time in milliseconds, base 36,
    /// followed by a random base-36 suffix.
    pub fn generate() -> ArtifactId {
        let mut id = to_base36(Utc::now().timestamp_millis().max(0) as u64);
        let mut rng = rand::rng();
        for _ in 0..ID_SUFFIX_LENGTH {
            id.push(char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]));
        }
        ArtifactId(id)
    }

    /// Validates an id received from a caller.  Anything that could not have
    /// been generated by [`ArtifactId::generate`] is reported as not found.
    pub fn parse(input: &str) -> Result<ArtifactId> {
        let well_formed = !input.is_empty() && input.len() <= MAX_ID_LENGTH &&
                          input.bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit());
        if !well_formed {
            return Err(Error::NotFound(format!("malformed artifact id: {:?}",
                                               input)));
        }
        Ok(ArtifactId(input.to_string()))
    }

    /// Returns true if this id could have come from
    /// [`ArtifactId::generate`]: a plausible millisecond timestamp followed
    /// by the random suffix.
    pub fn looks_generated(&self) -> bool {
        if self.0.len() <= ID_SUFFIX_LENGTH {
            return false;
        }
        let stamp = &self.0[..self.0.len() - ID_SUFFIX_LENGTH];
        let latest = Utc::now().timestamp_millis().max(0) as u64 +
                     MAX_CLOCK_SKEW_MILLIS;
        from_base36(stamp).map_or(false, |millis| {
            millis >= EARLIEST_ID_MILLIS && millis <= latest
        })
    }

    /// Returns the id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the file name this id's artifact of the given kind is served
    /// under, e.g. `lq2x0abc123.ico`.
    pub fn filename(&self, kind: ArtifactKind) -> String {
        format!("{}.{}", self.0, kind.extension())
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        out.write_str(&self.0)
    }
}

/// Splits a requested file name such as `abc123.icns` into its id and kind.
/// Names that do not match `^[a-z0-9]+\.(ico|icns)$` are reported as not
/// found without touching storage.
pub fn parse_filename(name: &str) -> Result<(ArtifactId, ArtifactKind)> {
    let (stem, extension) = match name.rsplit_once('.') {
        Some(parts) => parts,
        None => {
            return Err(Error::NotFound(format!("malformed artifact name: \
                                                {:?}",
                                               name)))
        }
    };
    let kind = extension.parse::<ArtifactKind>()?;
    let id = ArtifactId::parse(stem)?;
    Ok((id, kind))
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ID_ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

fn from_base36(digits: &str) -> Option<u64> {
    digits.bytes().try_fold(0u64, |value, byte| {
        let digit = ID_ALPHABET.iter().position(|&d| d == byte)? as u64;
        value.checked_mul(36)?.checked_add(digit)
    })
}

// ========================================================================= //

/// The two files produced by one conversion.  Never modified once created.
#[derive(Clone, Debug)]
pub struct ArtifactRecord {
    /// The handle the artifact is addressed by.
    pub id: ArtifactId,
    /// The encoded ICO file.
    pub ico: Vec<u8>,
    /// The encoded ICNS file.
    pub icns: Vec<u8>,
    /// When the artifact was stored.
    pub created_at: DateTime<Utc>,
}

impl ArtifactRecord {
    /// Returns the bytes of the given kind.
    pub fn bytes(&self, kind: ArtifactKind) -> &[u8] {
        match kind {
            ArtifactKind::Ico => &self.ico,
            ArtifactKind::Icns => &self.icns,
        }
    }
}

/// Where artifact bytes live.  Implementations are write-once: inserting an
/// id that already exists is an error, and nothing is ever overwritten.
pub trait Backend: Send + Sync {
    /// Stores both files of `record`.  Either both become visible or
    /// neither does.
    fn insert(&self, record: &ArtifactRecord) -> Result<()>;

    /// Returns the bytes of one file, or [`Error::NotFound`].
    fn fetch(&self, id: &ArtifactId, kind: ArtifactKind) -> Result<Vec<u8>>;

    /// Deletes both files.  Removing something that is already gone is not
    /// an error.
    fn remove(&self, id: &ArtifactId);
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn insert(&self, record: &ArtifactRecord) -> Result<()> {
        (**self).insert(record)
    }

    fn fetch(&self, id: &ArtifactId, kind: ArtifactKind) -> Result<Vec<u8>> {
        (**self).fetch(id, kind)
    }

    fn remove(&self, id: &ArtifactId) {
        (**self).remove(id)
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<ArtifactId, Arc<ArtifactRecord>>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> MemoryBackend {
        MemoryBackend::default()
    }
}

impl Backend for MemoryBackend {
    fn insert(&self, record: &ArtifactRecord) -> Result<()> {
        let mut records = self.records.write();
        if records.contains_key(&record.id) {
            return Err(already_exists(&record.id));
        }
        records.insert(record.id.clone(), Arc::new(record.clone()));
        Ok(())
    }

    fn fetch(&self, id: &ArtifactId, kind: ArtifactKind) -> Result<Vec<u8>> {
        let record = self.records.read().get(id).cloned();
        match record {
            Some(record) => Ok(record.bytes(kind).to_vec()),
            None => Err(not_found(id, kind)),
        }
    }

    fn remove(&self, id: &ArtifactId) {
        self.records.write().remove(id);
    }
}

/// Materializes artifacts as `<id>.ico` and `<id>.icns` files in a
/// directory.
#[derive(Debug)]
pub struct DirectoryBackend {
    root: PathBuf,
}

impl DirectoryBackend {
    /// Opens (creating if needed) the output directory.  Artifact files left
    /// behind by an earlier process can no longer be addressed, so they are
    /// deleted.  Only names shaped like a generated id are touched; other
    /// `.ico`/`.icns` files in the directory are left alone.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<DirectoryBackend> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        for entry in fs::read_dir(&root)? {
            let path = entry?.path();
            let is_artifact = path.file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| parse_filename(name).ok())
                .map_or(false, |(id, _)| id.looks_generated());
            if is_artifact {
                remove_quietly(&path);
            }
        }
        Ok(DirectoryBackend { root })
    }

    /// Returns the output directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, id: &ArtifactId, kind: ArtifactKind) -> PathBuf {
        self.root.join(id.filename(kind))
    }

    fn write_file(&self,
                  id: &ArtifactId,
                  kind: ArtifactKind,
                  data: &[u8])
                  -> io::Result<()> {
        let mut file = NamedTempFile::new_in(&self.root)?;
        file.write_all(data)?;
        file.flush()?;
        file.persist_noclobber(self.path(id, kind)).map_err(|err| err.error)?;
        Ok(())
    }
}

impl Backend for DirectoryBackend {
    fn insert(&self, record: &ArtifactRecord) -> Result<()> {
        // Neither write replaces an existing file.  Only an `.ico` written
        // by this call is rolled back.
        self.write_file(&record.id, ArtifactKind::Ico, &record.ico)
            .map_err(|err| write_error(&record.id, err))?;
        if let Err(err) = self.write_file(&record.id,
                                          ArtifactKind::Icns,
                                          &record.icns) {
            remove_quietly(&self.path(&record.id, ArtifactKind::Ico));
            return Err(write_error(&record.id, err));
        }
        Ok(())
    }

    fn fetch(&self, id: &ArtifactId, kind: ArtifactKind) -> Result<Vec<u8>> {
        match fs::read(self.path(id, kind)) {
            Ok(data) => Ok(data),
            Err(ref err) if err.kind() == ErrorKind::NotFound => {
                Err(not_found(id, kind))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn remove(&self, id: &ArtifactId) {
        for &kind in &ArtifactKind::ALL {
            remove_quietly(&self.path(id, kind));
        }
    }
}

fn remove_quietly(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        debug!(path = %path.display(), %err, "ignoring failed artifact removal");
    }
}

fn already_exists(id: &ArtifactId) -> Error {
    Error::Io(io::Error::new(ErrorKind::AlreadyExists,
                             format!("artifact {} already exists", id)))
}

fn write_error(id: &ArtifactId, err: io::Error) -> Error {
    if err.kind() == ErrorKind::AlreadyExists {
        already_exists(id)
    } else {
        Error::Io(err)
    }
}

fn not_found(id: &ArtifactId, kind: ArtifactKind) -> Error {
    Error::NotFound(id.filename(kind))
}

// ========================================================================= //

#[derive(Debug, Default)]
struct Deadlines {
    by_id: HashMap<ArtifactId, Instant>,
    queue: BinaryHeap<Reverse<(Instant, ArtifactId)>>,
}

/// Stores artifacts under generated ids and forgets them once the retention
/// window has passed.
///
/// Expired artifacts are unreachable through [`get`](#method.get) as soon as
/// their deadline passes; their bytes are deleted by the next
/// [`sweep`](#method.sweep), usually run by a [`Sweeper`].
#[derive(Debug)]
pub struct ArtifactStore<B = MemoryBackend> {
    backend: B,
    retention: Duration,
    deadlines: Mutex<Deadlines>,
}

impl ArtifactStore<MemoryBackend> {
    /// Creates an in-memory store with the given retention window.
    pub fn in_memory(retention: Duration) -> ArtifactStore<MemoryBackend> {
        ArtifactStore::new(MemoryBackend::new(), retention)
    }
}

impl<B: Backend> ArtifactStore<B> {
    /// Creates a store over `backend` with the given retention window.
    pub fn new(backend: B, retention: Duration) -> ArtifactStore<B> {
        ArtifactStore {
            backend,
            retention,
            deadlines: Mutex::new(Deadlines::default()),
        }
    }

    /// Returns the retention window.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Returns the storage backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the number of artifacts that have not been swept yet.
    pub fn len(&self) -> usize {
        self.deadlines.lock().by_id.len()
    }

    /// Returns true if no artifacts are waiting to be swept.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores a converted pair under a fresh id and returns the id.
    pub fn put(&self, ico: Vec<u8>, icns: Vec<u8>) -> Result<ArtifactId> {
        let mut id = ArtifactId::generate();
        while self.deadlines.lock().by_id.contains_key(&id) {
            id = ArtifactId::generate();
        }
        let record = ArtifactRecord {
            id: id.clone(),
            ico,
            icns,
            created_at: Utc::now(),
        };
        self.backend.insert(&record)?;
        let deadline = Instant::now() + self.retention;
        {
            let mut deadlines = self.deadlines.lock();
            deadlines.by_id.insert(id.clone(), deadline);
            deadlines.queue.push(Reverse((deadline, id.clone())));
        }
        info!(id = %id,
              ico_bytes = record.ico.len(),
              icns_bytes = record.icns.len(),
              "stored artifact");
        Ok(id)
    }

    /// Returns one file of a stored artifact, or [`Error::NotFound`] if the
    /// id is unknown or has expired.
    pub fn get(&self, id: &ArtifactId, kind: ArtifactKind) -> Result<Vec<u8>> {
        let deadline = self.deadlines.lock().by_id.get(id).copied();
        match deadline {
            Some(deadline) if Instant::now() < deadline => {
                self.backend.fetch(id, kind)
            }
            _ => Err(not_found(id, kind)),
        }
    }

    /// Deletes an artifact now.  Deleting an unknown id does nothing.
    pub fn remove(&self, id: &ArtifactId) {
        // The stale queue entry is dropped when it comes due.
        self.deadlines.lock().by_id.remove(id);
        self.backend.remove(id);
    }

    /// Deletes every artifact whose deadline has passed.  Returns how many
    /// were deleted.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Deletes every artifact whose deadline is at or before `now`.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut expired = Vec::new();
        {
            let mut deadlines = self.deadlines.lock();
            while let Some(&Reverse((deadline, _))) = deadlines.queue.peek() {
                if deadline > now {
                    break;
                }
                if let Some(Reverse((deadline, id))) = deadlines.queue.pop() {
                    if deadlines.by_id.get(&id) == Some(&deadline) {
                        deadlines.by_id.remove(&id);
                        expired.push(id);
                    }
                }
            }
        }
        for id in &expired {
            self.backend.remove(id);
            info!(id = %id, "purged expired artifact");
        }
        expired.len()
    }
}

// ========================================================================= //

/// A background thread that sweeps a store at a fixed interval.  The thread
/// stops when the `Sweeper` is dropped.
#[derive(Debug)]
pub struct Sweeper {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Starts sweeping `store` every `interval`.  Fails if the thread cannot
    /// be started.
    pub fn spawn<B>(store: Arc<ArtifactStore<B>>,
                    interval: Duration)
                    -> Result<Sweeper>
        where B: Backend + 'static
    {
        let (stop, stopped) = channel::bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("artifact-sweeper".to_string())
            .spawn(move || loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let purged = store.sweep();
                        if purged > 0 {
                            debug!(purged, "sweep finished");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(Sweeper {
            stop: Some(stop),
            handle: Some(handle),
        })
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        // Dropping the sender wakes the thread.
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_lowercase_and_distinct() {
        let first = ArtifactId::generate();
        let second = ArtifactId::generate();
        assert_ne!(first, second);
        assert!(ArtifactId::parse(first.as_str()).is_ok());
        assert!(first.as_str().len() > ID_SUFFIX_LENGTH);
    }

    #[test]
    fn base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn filename_pattern() {
        let (id, kind) = parse_filename("abc123.icns").unwrap();
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(kind, ArtifactKind::Icns);
        for name in &["../etc/passwd.ico",
                      "ABC123.exe",
                      "ABC123.ico",
                      "abc123",
                      ".ico",
                      "abc.def.ico",
                      "abc123.ICO"] {
            assert!(matches!(parse_filename(name), Err(Error::NotFound(_))),
                    "{} should be rejected",
                    name);
        }
    }

    #[test]
    fn put_then_get_returns_same_bytes() {
        let store = ArtifactStore::in_memory(DEFAULT_RETENTION);
        let id = store.put(b"ico".to_vec(), b"icns".to_vec()).unwrap();
        assert_eq!(store.get(&id, ArtifactKind::Ico).unwrap(), b"ico");
        assert_eq!(store.get(&id, ArtifactKind::Icns).unwrap(), b"icns");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = ArtifactStore::in_memory(DEFAULT_RETENTION);
        let id = ArtifactId::parse("neverissued").unwrap();
        assert!(matches!(store.get(&id, ArtifactKind::Ico),
                         Err(Error::NotFound(_))));
    }

    #[test]
    fn sweep_removes_expired_artifacts() {
        let store = ArtifactStore::in_memory(Duration::from_secs(60));
        let id = store.put(b"a".to_vec(), b"b".to_vec()).unwrap();
        assert_eq!(store.sweep(), 0);
        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(store.sweep_at(later), 1);
        assert!(store.is_empty());
        assert!(matches!(store.backend().fetch(&id, ArtifactKind::Ico),
                         Err(Error::NotFound(_))));
        assert!(matches!(store.get(&id, ArtifactKind::Icns),
                         Err(Error::NotFound(_))));
        // Sweeping again is harmless.
        assert_eq!(store.sweep_at(later), 0);
    }

    #[test]
    fn expired_artifact_is_hidden_before_sweep() {
        let store = ArtifactStore::in_memory(Duration::from_millis(20));
        let id = store.put(b"a".to_vec(), b"b".to_vec()).unwrap();
        thread::sleep(Duration::from_millis(40));
        assert!(matches!(store.get(&id, ArtifactKind::Ico),
                         Err(Error::NotFound(_))));
    }

    #[test]
    fn remove_is_idempotent() {
        let store = ArtifactStore::in_memory(DEFAULT_RETENTION);
        let id = store.put(b"a".to_vec(), b"b".to_vec()).unwrap();
        store.remove(&id);
        store.remove(&id);
        store.remove(&ArtifactId::parse("missing").unwrap());
        assert!(matches!(store.get(&id, ArtifactKind::Ico),
                         Err(Error::NotFound(_))));
        assert_eq!(store.sweep_at(Instant::now() + DEFAULT_RETENTION), 0);
    }

    #[test]
    fn memory_backend_is_write_once() {
        let backend = MemoryBackend::new();
        let record = ArtifactRecord {
            id: ArtifactId::parse("fixed").unwrap(),
            ico: vec![1],
            icns: vec![2],
            created_at: Utc::now(),
        };
        backend.insert(&record).unwrap();
        assert!(backend.insert(&record).is_err());
        assert_eq!(backend.fetch(&record.id, ArtifactKind::Ico).unwrap(),
                   vec![1]);
    }

    fn record(id: &str, ico: &[u8], icns: &[u8]) -> ArtifactRecord {
        ArtifactRecord {
            id: ArtifactId::parse(id).unwrap(),
            ico: ico.to_vec(),
            icns: icns.to_vec(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn generated_shape() {
        assert!(ArtifactId::generate().looks_generated());
        for stem in &["favicon",
                      "app",
                      "myapplicationicon",
                      "0000000000000",
                      "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz"] {
            assert!(!ArtifactId::parse(stem).unwrap().looks_generated(),
                    "{} looks generated", stem);
        }
    }

    #[test]
    fn open_keeps_unrelated_icons() {
        let dir = tempfile::tempdir().unwrap();
        let stale = ArtifactId::generate();
        for name in &["favicon.ico", "app.icns", "notes.txt"] {
            fs::write(dir.path().join(name), b"keep").unwrap();
        }
        for &kind in &ArtifactKind::ALL {
            fs::write(dir.path().join(stale.filename(kind)), b"old").unwrap();
        }
        DirectoryBackend::open(dir.path()).unwrap();
        for name in &["favicon.ico", "app.icns", "notes.txt"] {
            assert_eq!(fs::read(dir.path().join(name)).unwrap(), b"keep");
        }
        for &kind in &ArtifactKind::ALL {
            assert!(!dir.path().join(stale.filename(kind)).exists());
        }
    }

    #[test]
    fn directory_insert_rolls_back_on_icns_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DirectoryBackend::open(dir.path()).unwrap();
        let record = record("conflict", b"ico", b"icns");
        let icns_path = dir.path().join(record.id.filename(ArtifactKind::Icns));
        fs::write(&icns_path, b"existing").unwrap();
        let err = backend.insert(&record).unwrap_err();
        assert!(matches!(err, Error::Io(ref err)
                         if err.kind() == ErrorKind::AlreadyExists));
        let ico_path = dir.path().join(record.id.filename(ArtifactKind::Ico));
        assert!(!ico_path.exists());
        assert_eq!(fs::read(&icns_path).unwrap(), b"existing");
    }

    #[test]
    fn directory_backend_is_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DirectoryBackend::open(dir.path()).unwrap();
        backend.insert(&record("twice", b"first ico", b"first icns")).unwrap();
        let second = record("twice", b"second ico", b"second icns");
        assert!(backend.insert(&second).is_err());
        assert_eq!(backend.fetch(&second.id, ArtifactKind::Ico).unwrap(),
                   b"first ico");
        assert_eq!(backend.fetch(&second.id, ArtifactKind::Icns).unwrap(),
                   b"first icns");
    }

    #[test]
    fn sweeper_purges_in_background() {
        let store = Arc::new(ArtifactStore::in_memory(Duration::from_millis(10)));
        let id = store.put(b"a".to_vec(), b"b".to_vec()).unwrap();
        let sweeper = Sweeper::spawn(Arc::clone(&store),
                                     Duration::from_millis(5))
            .unwrap();
        let started = Instant::now();
        while !store.is_empty() && started.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(5));
        }
        drop(sweeper);
        assert!(store.is_empty());
        assert!(matches!(store.backend().fetch(&id, ArtifactKind::Ico),
                         Err(Error::NotFound(_))));
    }
}

//! Append-only JSON-lines file implementation of the EventStore trait.
//!
//! One event per line, in append order. Each append writes the whole line
//! and `fsync`s before returning, so an acknowledged event survives a crash.
//! A crash mid-write can leave an unterminated final line; it was never
//! acknowledged, so opening the file drops it with a warning. An append that
//! fails while the process keeps running is rolled back to the previous
//! length before the error is returned.
//!
//! All file I/O runs under `spawn_blocking`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use auditchain_core::{AuditEvent, ChainHead};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::traits::EventStore;

/// JSON-lines file store.
///
/// Thread-safe via internal Mutex, which also keeps readers from seeing a
/// line that is still being written.
pub struct FileStore {
    inner: Arc<Mutex<FileStoreInner>>,
}

struct FileStoreInner {
    path: PathBuf,
    /// Opened in append mode.
    file: File,
    head: Option<ChainHead>,
    count: u64,
}

/// Complete events read from a file, and the byte length they occupy.
struct Replay {
    events: Vec<AuditEvent>,
    valid_len: u64,
    file_len: u64,
}

impl FileStore {
    /// Open (or create) a log file at `path` and replay it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let replay = replay(&path)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        if replay.valid_len < replay.file_len {
            warn!(
                path = %path.display(),
                torn_bytes = replay.file_len - replay.valid_len,
                "dropping unterminated final line from audit log"
            );
            file.set_len(replay.valid_len)?;
            file.sync_all()?;
        }

        debug!(path = %path.display(), events = replay.events.len(), "opened file store");

        Ok(Self {
            inner: Arc::new(Mutex::new(FileStoreInner {
                path,
                file,
                head: replay.events.last().map(ChainHead::of),
                count: replay.events.len() as u64,
            })),
        })
    }

    /// Run a blocking operation against the locked file state.
    async fn with_inner<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut FileStoreInner) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = inner.lock()?;
            f(&mut guard)
        })
        .await?
    }
}

/// Read every complete line of `path`. A missing file is an empty log.
fn replay(path: &Path) -> Result<Replay> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    let valid_len = bytes
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);

    let mut events = Vec::new();
    for (index, line) in bytes[..valid_len].split(|&b| b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let event: AuditEvent = serde_json::from_slice(line).map_err(|e| {
            StoreError::Corrupt(format!("{} line {}: {}", path.display(), index + 1, e))
        })?;
        events.push(event);
    }

    Ok(Replay {
        events,
        valid_len: valid_len as u64,
        file_len: bytes.len() as u64,
    })
}

fn encode_line(event: &AuditEvent) -> Result<Vec<u8>> {
    let mut line = serde_json::to_vec(event)?;
    line.push(b'\n');
    Ok(line)
}

/// The file operations an append needs.
trait LogFile: Write {
    fn len(&self) -> io::Result<u64>;
    fn truncate(&self, len: u64) -> io::Result<()>;
    fn sync(&self) -> io::Result<()>;
}

impl LogFile for File {
    fn len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&self) -> io::Result<()> {
        self.sync_all()
    }
}

/// Write `line` at the end of `file` and fsync it.
///
/// On failure the file is cut back to its previous length, so neither a
/// partial line nor an unacknowledged whole line stays behind.
fn append_line<F: LogFile>(file: &mut F, line: &[u8]) -> Result<()> {
    let len = file.len()?;
    let written = file.write_all(line).and_then(|()| file.sync());
    if let Err(e) = written {
        warn!(error = %e, len, "append failed, truncating audit log");
        file.truncate(len)?;
        file.sync()?;
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl EventStore for FileStore {
    async fn append_event(&self, event: &AuditEvent) -> Result<()> {
        let line = encode_line(event)?;
        let head = ChainHead::of(event);

        self.with_inner(move |inner| {
            append_line(&mut inner.file, &line)?;
            inner.head = Some(head);
            inner.count += 1;
            Ok(())
        })
        .await
    }

    async fn list_events(&self) -> Result<Vec<AuditEvent>> {
        self.with_inner(|inner| Ok(replay(&inner.path)?.events)).await
    }

    async fn count(&self) -> Result<u64> {
        self.with_inner(|inner| Ok(inner.count)).await
    }

    async fn head(&self) -> Result<Option<ChainHead>> {
        self.with_inner(|inner| Ok(inner.head.clone())).await
    }

    async fn reset(&self) -> Result<()> {
        self.with_inner(|inner| {
            inner.file.set_len(0)?;
            inner.file.sync_all()?;
            inner.head = None;
            inner.count = 0;
            Ok(())
        })
        .await
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl crate::traits::Tamper for FileStore {
    async fn tamper_with(&self, sequence: u64, f: crate::traits::TamperFn) -> Result<bool> {
        self.with_inner(move |inner| {
            let mut events = replay(&inner.path)?.events;
            let Some(target) = events.iter_mut().find(|e| e.sequence == sequence) else {
                return Ok(false);
            };
            f(target);

            let mut contents = Vec::new();
            for event in &events {
                contents.extend(encode_line(event)?);
            }
            fs::write(&inner.path, contents)?;
            inner.head = events.last().map(ChainHead::of);
            Ok(true)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Tamper;
    use auditchain_core::{now_millis, verify_chain, EventInput};
    use std::cell::RefCell;
    use tempfile::TempDir;

    fn chain(n: u64) -> Vec<AuditEvent> {
        let mut events: Vec<AuditEvent> = Vec::new();
        for seq in 1..=n {
            let prev = events.last().map(|e| e.hash.clone()).unwrap_or_default();
            let input = EventInput::new("upload_completed", format!("upload {seq}"), "u1")
                .document(format!("doc-{seq}"))
                .detail("fileName", format!("file-{seq}.pdf"));
            events.push(AuditEvent::seal(input, format!("id-{seq}"), seq, now_millis(), prev));
        }
        events
    }

    #[tokio::test]
    async fn test_append_and_replay() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.jsonl");
        let events = chain(3);

        {
            let store = FileStore::open(&path).unwrap();
            for event in &events {
                store.append_event(event).await.unwrap();
            }
            assert_eq!(store.count().await.unwrap(), 3);
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.count().await.unwrap(), 3);
        assert_eq!(reopened.head().await.unwrap().unwrap().hash, events[2].hash);

        let stored = reopened.list_events().await.unwrap();
        assert_eq!(stored, events);
        assert!(verify_chain(&stored, None).is_valid);
    }

    #[tokio::test]
    async fn test_torn_tail_dropped_on_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.jsonl");
        let events = chain(2);

        {
            let store = FileStore::open(&path).unwrap();
            for event in &events {
                store.append_event(event).await.unwrap();
            }
        }

        // Simulate a crash halfway through a third line.
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"id\":\"id-3\",\"seq").unwrap();
        drop(file);

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.count().await.unwrap(), 2);

        let mut next = chain(3).pop().unwrap();
        next.previous_hash = events[1].hash.clone();
        store.append_event(&next).await.unwrap();

        let stored = store.list_events().await.unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[2].id, "id-3");
    }

    #[tokio::test]
    async fn test_corrupt_middle_line_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.jsonl");
        let first = serde_json::to_string(&chain(1)[0]).unwrap();
        fs::write(&path, format!("{first}\nnot json\n")).unwrap();

        assert!(matches!(FileStore::open(&path), Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_creates_parent_dirs_and_resets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/logs/audit.jsonl");
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.head().await.unwrap(), None);

        for event in chain(2) {
            store.append_event(&event).await.unwrap();
        }
        store.reset().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.list_events().await.unwrap().is_empty());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    /// Log file that accepts `capacity` bytes in total, then fails.
    struct ShortFile {
        data: RefCell<Vec<u8>>,
        capacity: usize,
        fail_sync: bool,
    }

    impl ShortFile {
        fn new(existing: &[u8], capacity: usize) -> Self {
            Self {
                data: RefCell::new(existing.to_vec()),
                capacity,
                fail_sync: false,
            }
        }
    }

    impl Write for ShortFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let data = self.data.get_mut();
            let room = self.capacity.saturating_sub(data.len());
            if room == 0 {
                return Err(io::Error::new(ErrorKind::Other, "no space left on device"));
            }
            let n = room.min(buf.len());
            data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogFile for ShortFile {
        fn len(&self) -> io::Result<u64> {
            Ok(self.data.borrow().len() as u64)
        }

        fn truncate(&self, len: u64) -> io::Result<()> {
            self.data.borrow_mut().truncate(len as usize);
            Ok(())
        }

        fn sync(&self) -> io::Result<()> {
            if self.fail_sync {
                Err(io::Error::new(ErrorKind::Other, "fsync failed"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_partial_write_is_rolled_back() {
        let events = chain(2);
        let first = encode_line(&events[0]).unwrap();
        let second = encode_line(&events[1]).unwrap();

        let mut file = ShortFile::new(&first, first.len() + second.len() / 2);
        assert!(matches!(append_line(&mut file, &second), Err(StoreError::Io(_))));
        assert_eq!(*file.data.borrow(), first);

        file.capacity = usize::MAX;
        append_line(&mut file, &second).unwrap();
        let contents = file.data.borrow().clone();
        let lines: Vec<AuditEvent> = contents
            .split(|&b| b == b'\n')
            .filter(|l| !l.is_empty())
            .map(|l| serde_json::from_slice(l).unwrap())
            .collect();
        assert_eq!(lines, events);
    }

    #[test]
    fn test_failed_sync_is_rolled_back() {
        let event = chain(1).pop().unwrap();
        let line = encode_line(&event).unwrap();

        let mut file = ShortFile::new(b"", usize::MAX);
        file.fail_sync = true;
        assert!(append_line(&mut file, &line).is_err());
        assert!(file.data.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_float_details_survive_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.jsonl");
        let store = FileStore::open(&path).unwrap();

        let mut events: Vec<AuditEvent> = Vec::new();
        for seq in 1..=200u64 {
            let prev = events.last().map(|e| e.hash.clone()).unwrap_or_default();
            let confidence = seq as f64 * 114.213_414_525_69 + 1.0 / seq as f64;
            let input = EventInput::new("masking_succeeded", "masked", "u1")
                .detail("confidence", confidence)
                .detail("score", 22842.682905138954);
            let event = AuditEvent::seal(input, format!("id-{seq}"), seq, now_millis(), prev);
            store.append_event(&event).await.unwrap();
            events.push(event);
        }

        let stored = FileStore::open(&path).unwrap().list_events().await.unwrap();
        assert_eq!(stored, events);
        let report = verify_chain(&stored, None);
        assert!(report.is_valid, "{:?}", report.issues);
    }

    #[tokio::test]
    async fn test_tamper_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.jsonl");
        let store = FileStore::open(&path).unwrap();
        for event in chain(3) {
            store.append_event(&event).await.unwrap();
        }

        let hit = store
            .tamper_with(2, Box::new(|e: &mut AuditEvent| e.action = "edited".into()))
            .await
            .unwrap();
        assert!(hit);

        let stored = FileStore::open(&path).unwrap().list_events().await.unwrap();
        assert_eq!(stored[1].action, "edited");
        let report = verify_chain(&stored, None);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].sequence, 2);
    }
}

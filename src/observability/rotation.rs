//! Sink destinations.
//!
//! # Responsibilities
//! - Append encoded records to a file, one `write` per record
//! - Rotate the file by size, keeping a bounded number of generations
//! - Write records to the console
//!
//! # Design Decisions
//! - No userspace buffering: each record is written whole and flushed
//! - A record that fails halfway is cut back off the file; if that is
//!   impossible the next record starts on a fresh line
//! - Rotation happens before the write that would overflow the file,
//!   so the newest record always lands in the active file
//! - Rotation only discards the oldest generation when no slot is free,
//!   so retrying an interrupted rotation never loses history
//! - Callers serialize access (one lock per sink); destinations are `&mut`

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::observability::error::SinkWriteError;

/// Default size threshold: 10 MiB.
pub const DEFAULT_CAPACITY_BYTES: u64 = 10 * 1024 * 1024;

/// Default number of rotated generations kept.
pub const DEFAULT_MAX_GENERATIONS: u32 = 5;

/// Something a sink appends encoded records to.
pub trait Destination: Send {
    /// Append one complete, already terminated record.
    fn append(&mut self, record: &[u8]) -> Result<(), SinkWriteError>;

    /// Flush and release the destination.
    fn close(&mut self) -> Result<(), SinkWriteError>;
}

/// Size-based rotation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotate when the active file would grow past this many bytes.
    pub capacity_bytes: u64,
    /// Rotated generations to keep (`base.1` ..= `base.N`).
    pub max_generations: u32,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            max_generations: DEFAULT_MAX_GENERATIONS,
        }
    }
}

/// Storage a failed record can be cut back off.
trait Truncate: Write {
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl Truncate for File {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// What a failed write left behind in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Residue {
    /// The file is back at its last committed length.
    None,
    /// Part of the record is still there, without a terminator.
    TornTail,
}

/// Write `record` whole, or restore the file to `committed` bytes.
fn write_whole<F: Truncate>(
    file: &mut F,
    record: &[u8],
    committed: u64,
) -> Result<(), (io::Error, Residue)> {
    match file.write_all(record).and_then(|_| file.flush()) {
        Ok(()) => Ok(()),
        Err(error) => match file.truncate_to(committed) {
            Ok(()) => Err((error, Residue::None)),
            Err(_) => Err((error, Residue::TornTail)),
        },
    }
}

/// A log file rotated by size.
///
/// The active file keeps the base name; older generations are suffixed
/// `.1` (newest) through `.N` (oldest).
pub struct RotatingFile {
    path: PathBuf,
    policy: RotationPolicy,
    file: Option<File>,
    size: u64,
    rotations: u64,
    /// The active file ends in an unterminated fragment.
    torn_tail: bool,
}

impl RotatingFile {
    /// Open (or create) the active file, creating parent directories.
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = Self {
            path,
            policy,
            file: None,
            size: 0,
            rotations: 0,
            torn_tail: false,
        };
        file.reopen()?;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the active file as tracked by this writer.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of rotations performed since open.
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Path of a generation; `0` is the active file.
    pub fn generation_path(&self, generation: u32) -> PathBuf {
        generation_path(&self.path, generation)
    }

    /// Open the active file and resync size and tail state from disk.
    fn reopen(&mut self) -> io::Result<()> {
        let file = open_append(&self.path)?;
        self.size = file.metadata()?.len();
        self.torn_tail = ends_mid_record(&self.path, self.size);
        self.file = Some(file);
        Ok(())
    }

    fn should_rotate(&self, incoming: u64) -> bool {
        // An empty file always takes the record, even an oversized one.
        self.size > 0 && self.size.saturating_add(incoming) > self.policy.capacity_bytes
    }

    fn rotate(&mut self) -> Result<(), SinkWriteError> {
        if let Some(mut file) = self.file.take() {
            file.flush().map_err(SinkWriteError::Rotate)?;
        }

        let max = self.policy.max_generations;
        if max == 0 {
            // Nothing is retained: start the active file over.
            File::create(&self.path).map_err(SinkWriteError::Rotate)?;
        } else {
            // Shift into the first free slot; only a full set drops the oldest.
            let top = match (1..=max).find(|g| !self.generation_path(*g).exists()) {
                Some(free) => free,
                None => {
                    fs::remove_file(self.generation_path(max)).map_err(SinkWriteError::Rotate)?;
                    max
                }
            };
            for generation in (1..top).rev() {
                fs::rename(self.generation_path(generation), self.generation_path(generation + 1))
                    .map_err(SinkWriteError::Rotate)?;
            }
            if self.path.exists() {
                fs::rename(&self.path, self.generation_path(1)).map_err(SinkWriteError::Rotate)?;
            }
        }

        self.reopen().map_err(SinkWriteError::Reopen)?;
        self.rotations += 1;

        tracing::debug!(
            path = %self.path.display(),
            rotations = self.rotations,
            "Rotated log file"
        );
        Ok(())
    }
}

impl Destination for RotatingFile {
    fn append(&mut self, record: &[u8]) -> Result<(), SinkWriteError> {
        // A failed write or rotation leaves no handle; recover here.
        if self.file.is_none() {
            self.reopen().map_err(SinkWriteError::Reopen)?;
        }

        let incoming = record.len() as u64 + u64::from(self.torn_tail);
        if self.should_rotate(incoming) {
            self.rotate()?;
        }

        let mut file = match self.file.take() {
            Some(file) => file,
            None => return Err(SinkWriteError::Closed),
        };

        let separated;
        let payload = if self.torn_tail {
            separated = [b"\n".as_slice(), record].concat();
            separated.as_slice()
        } else {
            record
        };

        match write_whole(&mut file, payload, self.size) {
            Ok(()) => {
                self.size += payload.len() as u64;
                self.torn_tail = false;
                self.file = Some(file);
                Ok(())
            }
            Err((error, residue)) => {
                if residue == Residue::TornTail {
                    self.torn_tail = true;
                    tracing::warn!(
                        path = %self.path.display(),
                        "Could not cut back a partial record"
                    );
                }
                // Dropping the handle makes the next append resync from disk.
                Err(SinkWriteError::Write(error))
            }
        }
    }

    fn close(&mut self) -> Result<(), SinkWriteError> {
        if let Some(mut file) = self.file.take() {
            file.flush().map_err(SinkWriteError::Write)?;
            file.sync_all().map_err(SinkWriteError::Write)?;
        }
        Ok(())
    }
}

/// Writes records to a stream, typically stdout. Never rotates.
pub struct Console<W> {
    writer: W,
}

impl Console<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> Console<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> Destination for Console<W> {
    fn append(&mut self, record: &[u8]) -> Result<(), SinkWriteError> {
        self.writer
            .write_all(record)
            .and_then(|_| self.writer.flush())
            .map_err(SinkWriteError::Write)
    }

    fn close(&mut self) -> Result<(), SinkWriteError> {
        self.writer.flush().map_err(SinkWriteError::Write)
    }
}

/// Path of generation `n` of `base`; `0` is `base` itself.
pub fn generation_path(base: &Path, generation: u32) -> PathBuf {
    if generation == 0 {
        return base.to_path_buf();
    }
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{generation}"));
    PathBuf::from(name)
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Whether a non-empty file's last byte is something other than a newline.
fn ends_mid_record(path: &Path, size: u64) -> bool {
    if size == 0 {
        return false;
    }
    let mut last = [0u8; 1];
    File::open(path)
        .and_then(|mut f| {
            f.seek(SeekFrom::Start(size - 1))?;
            f.read_exact(&mut last)
        })
        .map(|_| last[0] != b'\n')
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn policy(capacity_bytes: u64, max_generations: u32) -> RotationPolicy {
        RotationPolicy {
            capacity_bytes,
            max_generations,
        }
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_generation_naming() {
        let base = Path::new("logs/api_all.log");
        assert_eq!(generation_path(base, 0), PathBuf::from("logs/api_all.log"));
        assert_eq!(generation_path(base, 3), PathBuf::from("logs/api_all.log.3"));
    }

    #[test]
    fn test_open_creates_parent_dirs_and_tracks_existing_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/feed.log");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"0123456789\n").unwrap();

        let file = RotatingFile::open(&path, RotationPolicy::default()).unwrap();
        assert_eq!(file.size(), 11);

        let other = RotatingFile::open(dir.path().join("a/b/c.log"), RotationPolicy::default()).unwrap();
        assert!(other.path().exists());
    }

    #[test]
    fn test_rotates_when_next_record_would_overflow() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.log");
        let mut file = RotatingFile::open(&path, policy(20, 3)).unwrap();

        // Two 10-byte records fill the file exactly.
        file.append(b"record-01\n").unwrap();
        file.append(b"record-02\n").unwrap();
        assert_eq!(file.rotations(), 0);
        assert_eq!(file.size(), 20);

        file.append(b"record-03\n").unwrap();
        assert_eq!(file.rotations(), 1);
        assert_eq!(lines(&path), vec!["record-03"]);
        assert_eq!(lines(&file.generation_path(1)), vec!["record-01", "record-02"]);
    }

    #[test]
    fn test_keeps_at_most_max_generations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.log");
        let mut file = RotatingFile::open(&path, policy(10, 2)).unwrap();

        for i in 0..6 {
            file.append(format!("record-{i:02}\n").as_bytes()).unwrap();
        }

        assert_eq!(lines(&path), vec!["record-05"]);
        assert_eq!(lines(&file.generation_path(1)), vec!["record-04"]);
        assert_eq!(lines(&file.generation_path(2)), vec!["record-03"]);
        assert!(!file.generation_path(3).exists());
    }

    #[test]
    fn test_zero_generations_truncates_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.log");
        let mut file = RotatingFile::open(&path, policy(10, 0)).unwrap();

        file.append(b"record-01\n").unwrap();
        file.append(b"record-02\n").unwrap();

        assert_eq!(lines(&path), vec!["record-02"]);
        assert!(!file.generation_path(1).exists());
    }

    #[test]
    fn test_oversized_record_goes_into_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.log");
        let mut file = RotatingFile::open(&path, policy(4, 2)).unwrap();

        file.append(b"much longer than four bytes\n").unwrap();
        assert_eq!(file.rotations(), 0);
        assert_eq!(lines(&path).len(), 1);
    }

    /// Storage with a fixed amount of room left; writes past it fail
    /// after accepting what fits.
    struct ShortDisk {
        data: Vec<u8>,
        room: usize,
        can_truncate: bool,
    }

    impl Write for ShortDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.data.len() >= self.room {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(self.room - self.data.len());
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Truncate for ShortDisk {
        fn truncate_to(&mut self, len: u64) -> io::Result<()> {
            if !self.can_truncate {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            self.data.truncate(len as usize);
            Ok(())
        }
    }

    #[test]
    fn test_partial_write_is_cut_back() {
        let mut disk = ShortDisk {
            data: b"first\n".to_vec(),
            room: 10,
            can_truncate: true,
        };

        let (_, residue) = write_whole(&mut disk, b"second-record\n", 6).unwrap_err();
        assert_eq!(residue, Residue::None);
        assert_eq!(disk.data, b"first\n");
    }

    #[test]
    fn test_partial_write_that_cannot_be_cut_back_is_reported() {
        let mut disk = ShortDisk {
            data: b"first\n".to_vec(),
            room: 10,
            can_truncate: false,
        };

        let (_, residue) = write_whole(&mut disk, b"second-record\n", 6).unwrap_err();
        assert_eq!(residue, Residue::TornTail);
        assert_eq!(disk.data, b"first\nseco");
    }

    #[test]
    fn test_torn_tail_is_terminated_before_next_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.log");
        fs::write(&path, b"whole\n{\"half\":").unwrap();

        let mut file = RotatingFile::open(&path, RotationPolicy::default()).unwrap();
        file.append(b"next\n").unwrap();
        file.append(b"after\n").unwrap();

        assert_eq!(lines(&path), vec!["whole", "{\"half\":", "next", "after"]);
        assert_eq!(file.size(), fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_interrupted_rotation_keeps_history_on_retry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.log");
        // Left behind by a rotation that stopped after moving .2 to .3.
        fs::write(&path, b"active-00\n").unwrap();
        fs::write(generation_path(&path, 1), b"older-001\n").unwrap();
        fs::write(generation_path(&path, 3), b"oldest-02\n").unwrap();

        let mut file = RotatingFile::open(&path, policy(10, 3)).unwrap();
        file.append(b"record-01\n").unwrap();

        assert_eq!(file.rotations(), 1);
        assert_eq!(lines(&path), vec!["record-01"]);
        assert_eq!(lines(&file.generation_path(1)), vec!["active-00"]);
        assert_eq!(lines(&file.generation_path(2)), vec!["older-001"]);
        assert_eq!(lines(&file.generation_path(3)), vec!["oldest-02"]);
    }

    #[test]
    fn test_console_writes_whole_records() {
        let mut buf = Vec::new();
        {
            let mut console = Console::new(&mut buf);
            console.append(b"one\n").unwrap();
            console.append(b"two\n").unwrap();
            console.close().unwrap();
        }
        assert_eq!(buf, b"one\ntwo\n");
    }
}

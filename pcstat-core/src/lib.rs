#![allow(unknown_lints)]
#![deny(rustdoc::broken_intra_doc_links, rustdoc::invalid_html_tags)]
//! Data structures and algorithms for reporting page cache residency.
//!
//! This crate holds everything that doesn't need to talk to the kernel: decoding the vector
//! returned by `mincore(2)`, turning it into a [`CacheStatus`] record, compressing it into a
//! histogram, ranking records, and parsing the bits of `/proc/<pid>/` that are needed to find
//! the files mapped by a process.
//!
//! The actual syscalls live in the `pcstat` crate, behind the [`ResidencySource`] trait.
//!
//! # Cargo features
//!
//! * `serde1` -- Optional.  Derives `Serialize` and `Deserialize` for the record types.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

mod histogram;
pub use crate::histogram::*;

mod maps;
pub use crate::maps::*;

mod namespace;
pub use crate::namespace::*;

mod residency;
pub use crate::residency::*;

mod status;
pub use crate::status::*;

mod topk;
pub use crate::topk::*;

/// A type that can be parsed from a reader.
pub trait FromRead: Sized {
    /// Read the type from a Read.
    fn from_read<R: Read>(r: R) -> PcResult<Self>;

    /// Read the type from a file.
    fn from_file<P: AsRef<Path>>(path: P) -> PcResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PcError::Io(e, Some(path.to_path_buf())))?;
        Self::from_read(file).map_err(|e| e.with_path(path))
    }
}

/// A type that can be parsed from a buffered reader, line by line.
pub trait FromBufRead: Sized {
    fn from_buf_read<R: BufRead>(r: R) -> PcResult<Self>;
}

impl<T: FromBufRead> FromRead for T {
    fn from_read<R: Read>(r: R) -> PcResult<Self> {
        T::from_buf_read(BufReader::new(r))
    }
}

/// Number of pages needed to hold `size` bytes, rounding up.
pub fn page_count(size: u64, page_size: u64) -> u64 {
    (size + page_size - 1) / page_size
}

/// The various error conditions of page cache inspection.
///
/// Errors that name a path are scoped to that one file; see [`PcError::is_per_file`].
#[derive(Debug)]
pub enum PcError {
    /// The file could not be opened or inspected.
    Open(io::Error, PathBuf),
    /// The path exists but is a directory or another non-regular file.
    NotRegularFile(PathBuf),
    /// The file is zero bytes long, so there is nothing to map.
    EmptyFile(PathBuf),
    /// `mmap(2)` refused the file.
    Map(io::Error, PathBuf),
    /// `mincore(2)` failed on an established mapping.
    ResidencyQuery(io::Error, PathBuf),
    /// A cached percentage was requested for a record with zero pages.
    UndefinedRatio,
    /// The mount namespace of a process couldn't be read.
    NamespaceLookup(io::Error, Option<PathBuf>),
    /// Entering the mount namespace of the given pid failed.
    NamespaceSwitch(io::Error, i32),
    /// A file under `/proc` had content that couldn't be parsed.
    ProcFormat(Option<PathBuf>, String),
    /// More records were requested than were available.
    InsufficientData { requested: usize, available: usize },
    /// Any other I/O error, such as a missing `/proc/<pid>` directory.
    Io(io::Error, Option<PathBuf>),
}

/// The result type used by this crate.
pub type PcResult<T> = Result<T, PcError>;

impl PcError {
    /// Returns true for errors that only concern a single probed file.
    ///
    /// A multi-file run logs these and moves on to the next file.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            PcError::Open(..)
                | PcError::NotRegularFile(_)
                | PcError::EmptyFile(_)
                | PcError::Map(..)
                | PcError::ResidencyQuery(..)
        )
    }

    /// Attaches `path` to errors that were raised without one.
    pub fn with_path(self, path: &Path) -> Self {
        match self {
            PcError::ProcFormat(None, msg) => PcError::ProcFormat(Some(path.to_path_buf()), msg),
            PcError::NamespaceLookup(e, None) => PcError::NamespaceLookup(e, Some(path.to_path_buf())),
            PcError::Io(e, None) => PcError::Io(e, Some(path.to_path_buf())),
            other => other,
        }
    }
}

impl fmt::Display for PcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PcError::Open(e, p) => write!(f, "could not open {} for read: {}", p.display(), e),
            PcError::NotRegularFile(p) => write!(f, "{} is not a regular file", p.display()),
            PcError::EmptyFile(p) => write!(f, "{} appears to be 0 bytes in length", p.display()),
            PcError::Map(e, p) => write!(f, "could not mmap {}: {}", p.display(), e),
            PcError::ResidencyQuery(e, p) => write!(f, "mincore failed for {}: {}", p.display(), e),
            PcError::UndefinedRatio => write!(f, "cached percentage is undefined for a file with no pages"),
            PcError::NamespaceLookup(e, Some(p)) => {
                write!(f, "could not read mount namespace from {}: {}", p.display(), e)
            }
            PcError::NamespaceLookup(e, None) => write!(f, "could not read mount namespace: {}", e),
            PcError::NamespaceSwitch(e, pid) => {
                write!(f, "could not enter the mount namespace of pid {}: {}", pid, e)
            }
            PcError::ProcFormat(Some(p), msg) => write!(f, "unexpected format in {}: {}", p.display(), msg),
            PcError::ProcFormat(None, msg) => write!(f, "unexpected format: {}", msg),
            PcError::InsufficientData { requested, available } => write!(
                f,
                "requested the top {} records but only {} are available",
                requested, available
            ),
            PcError::Io(e, Some(p)) => write!(f, "I/O error on {}: {}", p.display(), e),
            PcError::Io(e, None) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for PcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PcError::Open(e, _)
            | PcError::Map(e, _)
            | PcError::ResidencyQuery(e, _)
            | PcError::NamespaceLookup(e, _)
            | PcError::NamespaceSwitch(e, _)
            | PcError::Io(e, _) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PcError {
    fn from(io: io::Error) -> Self {
        PcError::Io(io, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 4096), 0);
        assert_eq!(page_count(1, 4096), 1);
        assert_eq!(page_count(4096, 4096), 1);
        assert_eq!(page_count(4097, 4096), 2);
        assert_eq!(page_count(3 * 4096, 4096), 3);
    }

    #[test]
    fn test_error_scope() {
        let p = PathBuf::from("/var/lib/db/data.0");
        assert!(PcError::EmptyFile(p.clone()).is_per_file());
        assert!(PcError::NotRegularFile(p.clone()).is_per_file());
        assert!(PcError::Map(io::Error::from_raw_os_error(12), p).is_per_file());

        assert!(!PcError::UndefinedRatio.is_per_file());
        assert!(!PcError::ProcFormat(None, "x".to_string()).is_per_file());
        assert!(!PcError::InsufficientData {
            requested: 5,
            available: 3
        }
        .is_per_file());
    }

    #[test]
    fn test_with_path() {
        let err = PcError::ProcFormat(None, "bad line".to_string()).with_path(Path::new("/proc/1/maps"));
        match err {
            PcError::ProcFormat(Some(p), msg) => {
                assert_eq!(p, Path::new("/proc/1/maps"));
                assert_eq!(msg, "bad line");
            }
            x => panic!("Unexpected error: {:?}", x),
        }

        // a path that is already there is kept
        let err = PcError::EmptyFile(PathBuf::from("/a")).with_path(Path::new("/b"));
        assert!(matches!(err, PcError::EmptyFile(p) if p == Path::new("/a")));
    }

    #[test]
    fn test_display() {
        let err = PcError::EmptyFile(PathBuf::from("/tmp/empty"));
        assert_eq!(err.to_string(), "/tmp/empty appears to be 0 bytes in length");

        let err = PcError::InsufficientData {
            requested: 5,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "requested the top 5 records but only 3 are available"
        );
    }

    #[test]
    fn test_from_file_missing() {
        let err = MappedFiles::from_file("/this_should_not_exist").unwrap_err();
        match err {
            PcError::Io(e, Some(p)) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
                assert_eq!(p, Path::new("/this_should_not_exist"));
            }
            x => panic!("Unexpected return value: {:?}", x),
        }
    }
}

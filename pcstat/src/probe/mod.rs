//! Probing files for page cache residency.
//!
//! A probe opens the file, takes its size, and hands the open file to a [`ResidencySource`].
//! The size observed at open time bounds everything that follows.  If the file is truncated
//! or extended between the `fstat` and the residency query, the result describes the old size
//! and may not match the file's current contents.
//!
//! ```rust,no_run
//! use pcstat::Prober;
//!
//! let prober = Prober::new().keep_pages(true);
//! for file in ["/usr/bin/ls", "/usr/bin/cat"] {
//!     match prober.stat(file) {
//!         Ok(stat) => println!("{} {:07.3}", stat.name, stat.percent),
//!         Err(e) => eprintln!("skipping {:?}: {}", file, e),
//!     }
//! }
//! ```

use std::fs::{File, Metadata, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use chrono::{DateTime, Local};
use log::debug;

use crate::{CacheStatus, MincoreSource, PcError, PcResult, ResidencyBitmap, ResidencySource};


/// Returns the residency bitmap of the file at `path`, using `mincore(2)`.
pub fn probe<P: AsRef<Path>>(path: P) -> PcResult<ResidencyBitmap> {
    Prober::new().probe(path)
}

/// Probes files with a [`ResidencySource`] and builds [`CacheStatus`] records.
///
/// Every call opens its own file descriptor and its own mapping, so a `Prober` can be shared
/// between threads when its source can.
#[derive(Debug, Clone)]
pub struct Prober<S = MincoreSource> {
    source: S,
    keep_pages: bool,
}

impl Prober<MincoreSource> {
    pub fn new() -> Self {
        Prober::with_source(MincoreSource)
    }
}

impl Default for Prober<MincoreSource> {
    fn default() -> Self {
        Prober::new()
    }
}

impl<S: ResidencySource> Prober<S> {
    pub fn with_source(source: S) -> Self {
        Prober {
            source,
            keep_pages: false,
        }
    }

    /// Keep the per-page bitmap in the records built by [`Prober::stat`].
    ///
    /// By default only the counts are kept.
    pub fn keep_pages(mut self, keep: bool) -> Self {
        self.keep_pages = keep;
        self
    }

    /// Opens `path` and checks that it can be probed, returning the file and its metadata.
    fn open(&self, path: &Path) -> PcResult<(File, Metadata)> {
        // O_NONBLOCK keeps a FIFO from blocking the open; it is rejected right after
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(|e| PcError::Open(e, path.to_path_buf()))?;
        let metadata = file.metadata().map_err(|e| PcError::Open(e, path.to_path_buf()))?;

        if !metadata.is_file() {
            return Err(PcError::NotRegularFile(path.to_path_buf()));
        }
        if metadata.len() == 0 {
            return Err(PcError::EmptyFile(path.to_path_buf()));
        }

        Ok((file, metadata))
    }

    /// Returns the residency bitmap of the file at `path`.
    pub fn probe<P: AsRef<Path>>(&self, path: P) -> PcResult<ResidencyBitmap> {
        let path = path.as_ref();
        let (file, metadata) = self.open(path)?;
        self.source.residency(path, &file, metadata.len())
    }

    /// Probes `path` and aggregates the result into a [`CacheStatus`].
    ///
    /// The record is named after `path` as given.
    pub fn stat<P: AsRef<Path>>(&self, path: P) -> PcResult<CacheStatus> {
        let path = path.as_ref();
        let (file, metadata) = self.open(path)?;

        let mtime: DateTime<Local> = metadata
            .modified()
            .map_err(|e| PcError::Open(e, path.to_path_buf()))?
            .into();
        let size = metadata.len();

        let timestamp = Local::now();
        let bitmap = self.source.residency(path, &file, size)?;
        debug!("probed {:?}: {} bytes, {} pages", path, size, bitmap.len());

        let stat = CacheStatus::aggregate(path.to_string_lossy(), bitmap, size, mtime, timestamp)?;
        if self.keep_pages {
            Ok(stat)
        } else {
            Ok(stat.without_pages())
        }
    }
}

#![allow(unknown_lints)]
#![deny(rustdoc::broken_intra_doc_links, rustdoc::invalid_html_tags)]
//! This crate reports which pages of a file are currently resident in the linux page cache,
//! without reading the file.
//!
//! It works by mapping the file with no access permissions and asking the kernel for the
//! residency of each page with [`mincore(2)`](https://man7.org/linux/man-pages/man2/mincore.2.html).
//! Since the mapping can't be read, inspecting a file never pulls any of its pages into the
//! cache.
//!
//! Files can be given directly, or taken from the memory maps of a running process.  When that
//! process lives in another mount namespace (a container, say), [`namespace::MountNamespaceGate`]
//! moves the calling process into it so the paths found in the maps resolve to the right files.
//!
//! # Examples
//!
//! ```rust,no_run
//! let stat = pcstat::Prober::new().stat("/var/lib/postgresql/data/base/1/1259").unwrap();
//! println!("{}: {}/{} pages cached ({:.3}%)", stat.name, stat.cached, stat.pages, stat.percent);
//! ```
//!
//! # Cargo features
//!
//! * `serde1` -- Default.  Enables JSON output and serde support on the record types.

pub use pcstat_core::*;

use lazy_static::lazy_static;

mod mincore;
pub use crate::mincore::MincoreSource;

pub mod probe;
pub use crate::probe::{probe, Prober};

pub mod format;

pub mod namespace;

pub mod process;

mod term;
pub use crate::term::terminal_columns;

lazy_static! {
    /// Memory page size, in bytes.
    ///
    /// This is calculated from `sysconf(_SC_PAGESIZE)`.
    static ref PAGESIZE: u64 = rustix::param::page_size() as u64;
}

/// Memory page size, in bytes.
pub fn page_size() -> u64 {
    *PAGESIZE
}

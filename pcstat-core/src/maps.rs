use std::collections::hash_set;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::io::BufRead;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::{FromBufRead, PcError, PcResult};

/// The distinct files memory-mapped by a process, from `/proc/<pid>/maps`.
///
/// A line of the maps file names a file when it splits into exactly six whitespace separated
/// fields and the last one is an absolute path:
///
/// ```text
/// 7f1c2a400000-7f1c2a428000 r--p 00000000 fd:01 1835063   /usr/lib/x86_64-linux-gnu/libc.so.6
/// ```
///
/// Anonymous mappings, `[heap]`, `[stack]`, `[vdso]` and friends are skipped, as are paths that
/// contain whitespace or carry a ` (deleted)` suffix.
///
/// The set has no meaningful order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedFiles(HashSet<PathBuf>);

impl MappedFiles {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains<P: AsRef<Path>>(&self, path: P) -> bool {
        self.0.contains(path.as_ref())
    }

    pub fn iter(&self) -> hash_set::Iter<'_, PathBuf> {
        self.0.iter()
    }
}

impl IntoIterator for MappedFiles {
    type Item = PathBuf;
    type IntoIter = hash_set::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromBufRead for MappedFiles {
    fn from_buf_read<R: BufRead>(r: R) -> PcResult<Self> {
        let mut files = HashSet::new();
        // file names are printed as raw bytes, so lines are not necessarily UTF-8
        for (idx, line) in r.split(b'\n').enumerate() {
            let line = line.map_err(|e| PcError::ProcFormat(None, format!("unreadable line {}: {}", idx + 1, e)))?;
            if let Some(path) = mapped_path(&line) {
                files.insert(PathBuf::from(OsStr::from_bytes(path)));
            }
        }
        Ok(MappedFiles(files))
    }
}

fn mapped_path(line: &[u8]) -> Option<&[u8]> {
    let mut fields = line.split(|b| b.is_ascii_whitespace()).filter(|f| !f.is_empty());
    let path = fields.nth(5)?;
    if fields.next().is_some() || !path.starts_with(b"/") {
        return None;
    }
    Some(path)
}

use std::path::Path;

use chrono::{DateTime, Local};
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::{PcError, PcResult, ResidencyBitmap};

/// Page cache status of a single file.
///
/// Built once per probed file by [`CacheStatus::aggregate`].  The page counts always satisfy
/// `cached + uncached == pages`, and `pages` equals the length of `page_status` when the
/// bitmap is kept.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct CacheStatus {
    /// File name as given by the caller
    #[cfg_attr(feature = "serde1", serde(rename = "filename"))]
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Time right before the residency query
    pub timestamp: DateTime<Local>,
    /// Last modification time of the file
    pub mtime: DateTime<Local>,
    /// Total number of memory pages
    pub pages: usize,
    /// Number of pages in the page cache
    pub cached: usize,
    /// Number of pages not in the page cache
    pub uncached: usize,
    /// Percentage of pages that are cached
    pub percent: f64,
    /// Per-page status, if it was kept.
    #[cfg_attr(
        feature = "serde1",
        serde(rename = "status", default, skip_serializing_if = "Option::is_none")
    )]
    pub page_status: Option<ResidencyBitmap>,
}

impl CacheStatus {
    /// Builds the statistics for one file from its residency bitmap.
    ///
    /// Fails with [`PcError::UndefinedRatio`] if the bitmap is empty, since there is no
    /// meaningful cached percentage for a file without pages.
    pub fn aggregate(
        name: impl Into<String>,
        bitmap: ResidencyBitmap,
        size: u64,
        mtime: DateTime<Local>,
        sampled_at: DateTime<Local>,
    ) -> PcResult<CacheStatus> {
        let pages = bitmap.len();
        if pages == 0 {
            return Err(PcError::UndefinedRatio);
        }
        let cached = bitmap.resident_count();

        Ok(CacheStatus {
            name: name.into(),
            size,
            timestamp: sampled_at,
            mtime,
            pages,
            cached,
            uncached: pages - cached,
            percent: (cached as f64 / pages as f64) * 100.0,
            page_status: Some(bitmap),
        })
    }

    /// Drops the per-page bitmap, keeping only the counts.
    pub fn without_pages(self) -> CacheStatus {
        CacheStatus {
            page_status: None,
            ..self
        }
    }

    /// Replaces the name with its last path component.
    ///
    /// This only changes how the record is displayed; the file is never opened again by name.
    pub fn with_basename(self) -> CacheStatus {
        let name = match Path::new(&self.name).file_name() {
            Some(base) => base.to_string_lossy().into_owned(),
            None => return self,
        };
        CacheStatus { name, ..self }
    }

    pub fn is_fully_cached(&self) -> bool {
        self.cached == self.pages
    }
}

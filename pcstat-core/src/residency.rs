use std::fs::File;
use std::path::Path;

use bitflags::bitflags;
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::PcResult;

bitflags! {
    /// One entry of the vector filled in by `mincore(2)`.
    ///
    /// Only the least significant bit is defined.  The other bits are reserved by the kernel
    /// and are dropped when parsing.
    #[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
    pub struct PageResidency: u8 {
        /// The page is resident in memory.
        const RESIDENT = 1;
    }
}

impl PageResidency {
    pub fn parse_info(byte: u8) -> Self {
        PageResidency::from_bits_truncate(byte)
    }

    pub fn is_resident(&self) -> bool {
        self.contains(PageResidency::RESIDENT)
    }
}

/// Per-page cache residency of a file, in file offset order.
///
/// There is one entry per memory page; `true` means the page is in the page cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize), serde(transparent))]
pub struct ResidencyBitmap(Vec<bool>);

impl ResidencyBitmap {
    /// Decodes the vector written by `mincore(2)`.
    pub fn from_mincore_vec(vec: &[u8]) -> Self {
        ResidencyBitmap(
            vec.iter()
                .map(|b| PageResidency::parse_info(*b).is_resident())
                .collect(),
        )
    }

    /// Number of pages
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of pages that are in the page cache.
    pub fn resident_count(&self) -> usize {
        self.0.iter().filter(|r| **r).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, bool> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<bool> {
        self.0
    }
}

impl From<Vec<bool>> for ResidencyBitmap {
    fn from(pages: Vec<bool>) -> Self {
        ResidencyBitmap(pages)
    }
}

impl FromIterator<bool> for ResidencyBitmap {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        ResidencyBitmap(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ResidencyBitmap {
    type Item = &'a bool;
    type IntoIter = std::slice::Iter<'a, bool>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Something that can report which pages of an open file are in the page cache.
///
/// On linux this is `pcstat::MincoreSource`.  Tests use sources that return canned bitmaps.
pub trait ResidencySource {
    /// Returns the residency of the first `len` bytes of `file`.
    ///
    /// `len` is the size observed when the file was opened and is never zero.  `path` is only
    /// used for error reporting.
    fn residency(&self, path: &Path, file: &File, len: u64) -> PcResult<ResidencyBitmap>;
}

impl<S: ResidencySource + ?Sized> ResidencySource for &S {
    fn residency(&self, path: &Path, file: &File, len: u64) -> PcResult<ResidencyBitmap> {
        (**self).residency(path, file, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_residency_parsing() {
        assert!(PageResidency::parse_info(0b0000_0001).is_resident());
        assert!(!PageResidency::parse_info(0b0000_0000).is_resident());

        // reserved bits are ignored
        assert!(!PageResidency::parse_info(0b1111_1110).is_resident());
        assert_eq!(PageResidency::parse_info(0b1000_0001), PageResidency::RESIDENT);
    }

    #[test]
    fn test_from_mincore_vec() {
        let vec = [1u8, 0, 3, 2, 0x81];
        let bitmap = ResidencyBitmap::from_mincore_vec(&vec);
        assert_eq!(bitmap.as_slice(), &[true, false, true, false, true]);
        assert_eq!(bitmap.len(), 5);
        assert_eq!(bitmap.resident_count(), 3);

        let empty = ResidencyBitmap::from_mincore_vec(&[]);
        assert!(empty.is_empty());
        assert_eq!(empty.resident_count(), 0);
    }

    #[cfg(feature = "serde1")]
    #[test]
    fn test_serde_transparent() {
        let bitmap = ResidencyBitmap::from(vec![true, false]);
        assert_eq!(serde_json::to_string(&bitmap).unwrap(), "[true,false]");
    }
}

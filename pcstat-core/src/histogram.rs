//! Compression of a residency bitmap into a line of block glyphs.
//!
//! References:
//! * <http://www.unicode.org/charts/PDF/U2580.pdf>
//! * <https://github.com/holman/spark>

use crate::ResidencyBitmap;

/// One of the eight block heights used to draw a histogram.
///
/// `Empty` is drawn as the lower 1/8 block so that an uncached stretch is still visible, and
/// `Full` as the full block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum BlockLevel {
    Empty = 0,
    Trace = 1,
    Low = 2,
    LowMid = 3,
    Mid = 4,
    HighMid = 5,
    High = 6,
    Full = 7,
}

impl BlockLevel {
    /// Maps the cached fraction of a bucket to a level.
    ///
    /// | fraction     | level |
    /// |--------------|-------|
    /// | 0            | 0     |
    /// | (0, 0.16)    | 1     |
    /// | [0.16, 0.33) | 2     |
    /// | [0.33, 0.50) | 3     |
    /// | [0.50, 0.66) | 4     |
    /// | [0.66, 0.83) | 5     |
    /// | [0.83, 1.00) | 6     |
    /// | 1            | 7     |
    pub fn from_fraction(fraction: f64) -> BlockLevel {
        if fraction <= 0.0 {
            BlockLevel::Empty
        } else if fraction < 0.16 {
            BlockLevel::Trace
        } else if fraction < 0.33 {
            BlockLevel::Low
        } else if fraction < 0.50 {
            BlockLevel::LowMid
        } else if fraction < 0.66 {
            BlockLevel::Mid
        } else if fraction < 0.83 {
            BlockLevel::HighMid
        } else if fraction < 1.00 {
            BlockLevel::High
        } else {
            BlockLevel::Full
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// The unicode block element for this level, `U+2581` through `U+2588`.
    pub fn glyph(self) -> char {
        const GLYPHS: [char; 8] = [
            '\u{2581}', '\u{2582}', '\u{2583}', '\u{2584}', '\u{2585}', '\u{2586}', '\u{2587}', '\u{2588}',
        ];
        GLYPHS[self.index() as usize]
    }
}

/// Renders `bitmap` into at most `available_columns` block levels.
///
/// When there are more columns than pages, every page gets its own glyph, either
/// [`BlockLevel::Full`] or [`BlockLevel::Empty`].
///
/// Otherwise the pages are grouped into buckets of `pages / available_columns` pages and every
/// full bucket is drawn with the level of its cached fraction.  Pages left over after the last
/// full bucket are not drawn.
///
/// A column budget of zero or less is treated as a single column, so the whole file becomes
/// one bucket.
pub fn render(bitmap: &ResidencyBitmap, available_columns: isize) -> Vec<BlockLevel> {
    let pages = bitmap.as_slice();
    let columns = available_columns.max(1) as usize;

    if columns > pages.len() {
        return pages
            .iter()
            .map(|cached| if *cached { BlockLevel::Full } else { BlockLevel::Empty })
            .collect();
    }

    let bucket_size = pages.len() / columns;
    pages
        .chunks_exact(bucket_size)
        .map(|bucket| {
            let cached = bucket.iter().filter(|c| **c).count();
            BlockLevel::from_fraction(cached as f64 / bucket_size as f64)
        })
        .collect()
}

/// Number of glyph columns left for the histogram on a terminal `terminal_columns` wide.
///
/// Block elements render wider than regular characters on many terminals, so only half of
/// what remains after the name column is used.  The result can be zero or negative on a
/// narrow terminal; [`render`] clamps it.
pub fn glyph_columns(terminal_columns: usize, name_width: usize) -> isize {
    (terminal_columns as isize - name_width as isize) / 2 - 10
}

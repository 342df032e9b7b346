//! Rendering [`CacheStatus`] records for people and for other programs.
//!
//! The grid modes pad every name to the longest one and print the percentage as `%07.3f`, so
//! the decimal points line up down the column.

use std::io::Write;

use crate::{glyph_columns, render, CacheStatus, PcResult};

/// Names are padded to at least this many characters, the width of the `Name` header.
const MIN_NAME_WIDTH: usize = 5;

/// Output layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum OutputMode {
    /// ASCII grid
    #[default]
    Table,
    /// Box-drawing grid
    Unicode,
    /// Aligned columns without a grid
    Plain,
    /// Comma separated values, timestamps in unix seconds
    Terse,
    /// A JSON array of records
    #[cfg(feature = "serde1")]
    Json,
    /// One line of block glyphs per file
    Histogram,
}

struct Grid {
    line: char,
    bar: char,
    top: [char; 3],
    rule: [char; 3],
    bottom: [char; 3],
}

const ASCII: Grid = Grid {
    line: '-',
    bar: '|',
    top: ['+', '+', '+'],
    rule: ['|', '+', '|'],
    bottom: ['+', '+', '+'],
};

const BOX: Grid = Grid {
    line: '─',
    bar: '│',
    top: ['┌', '┬', '┐'],
    rule: ['├', '┼', '┤'],
    bottom: ['└', '┴', '┘'],
};

impl Grid {
    fn border(&self, ends: [char; 3], name_width: usize) -> String {
        let [left, cross, right] = ends;
        let mut s = String::new();
        s.push(left);
        for (i, width) in [name_width + 2, 16, 12, 11, 9].into_iter().enumerate() {
            if i > 0 {
                s.push(cross);
            }
            s.extend(std::iter::repeat(self.line).take(width));
        }
        s.push(right);
        s
    }
}

/// Writes a list of [`CacheStatus`] records in one [`OutputMode`].
#[derive(Debug, Clone)]
pub struct Formatter {
    mode: OutputMode,
    header: bool,
    terminal_columns: usize,
}

impl Formatter {
    pub fn new(mode: OutputMode) -> Self {
        Formatter {
            mode,
            header: true,
            terminal_columns: 80,
        }
    }

    /// Whether to print the header row in the grid, plain and terse modes.
    pub fn header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Terminal width used to size histograms.
    pub fn terminal_columns(mut self, columns: usize) -> Self {
        self.terminal_columns = columns;
        self
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn write<W: Write>(&self, out: &mut W, stats: &[CacheStatus]) -> PcResult<()> {
        match self.mode {
            OutputMode::Table => self.write_grid(out, stats, &ASCII)?,
            OutputMode::Unicode => self.write_grid(out, stats, &BOX)?,
            OutputMode::Plain => self.write_plain(out, stats)?,
            OutputMode::Terse => self.write_terse(out, stats)?,
            #[cfg(feature = "serde1")]
            OutputMode::Json => {
                serde_json::to_writer(&mut *out, stats).map_err(std::io::Error::from)?;
                writeln!(out)?;
            }
            OutputMode::Histogram => self.write_histogram(out, stats)?,
        }
        Ok(())
    }

    fn write_grid<W: Write>(&self, out: &mut W, stats: &[CacheStatus], grid: &Grid) -> std::io::Result<()> {
        let width = name_width(stats);
        let bar = grid.bar;

        writeln!(out, "{}", grid.border(grid.top, width))?;
        if self.header {
            writeln!(
                out,
                "{bar} {:<width$} {bar} Size (bytes)   {bar} Pages      {bar} Cached    {bar} Percent {bar}",
                "Name"
            )?;
            writeln!(out, "{}", grid.border(grid.rule, width))?;
        }
        for stat in stats {
            writeln!(
                out,
                "{bar} {:<width$} {bar} {:<15}{bar} {:<11}{bar} {:<10}{bar} {:07.3} {bar}",
                stat.name, stat.size, stat.pages, stat.cached, stat.percent
            )?;
        }
        writeln!(out, "{}", grid.border(grid.bottom, width))
    }

    fn write_plain<W: Write>(&self, out: &mut W, stats: &[CacheStatus]) -> std::io::Result<()> {
        let width = name_width(stats);

        if self.header {
            writeln!(out, "{:<width$}  Size (bytes)    Pages       Cached     Percent", "Name")?;
        }
        for stat in stats {
            writeln!(
                out,
                "{:<width$}  {:<15} {:<11} {:<10} {:07.3}",
                stat.name, stat.size, stat.pages, stat.cached, stat.percent
            )?;
        }
        Ok(())
    }

    fn write_terse<W: Write>(&self, out: &mut W, stats: &[CacheStatus]) -> std::io::Result<()> {
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(&mut *out);

        if self.header {
            wtr.write_record(["name", "size", "timestamp", "mtime", "pages", "cached", "percent"])?;
        }
        for stat in stats {
            wtr.write_record([
                stat.name.clone(),
                stat.size.to_string(),
                stat.timestamp.timestamp().to_string(),
                stat.mtime.timestamp().to_string(),
                stat.pages.to_string(),
                stat.cached.to_string(),
                stat.percent.to_string(),
            ])?;
        }
        wtr.flush()
    }

    fn write_histogram<W: Write>(&self, out: &mut W, stats: &[CacheStatus]) -> std::io::Result<()> {
        let width = name_width(stats);
        let columns = glyph_columns(self.terminal_columns, width);

        for stat in stats {
            let glyphs: String = match &stat.page_status {
                Some(bitmap) => render(bitmap, columns).into_iter().map(|level| level.glyph()).collect(),
                None => String::new(),
            };
            writeln!(out, "{:<width$} {:>8} {}", stat.name, stat.pages, glyphs)?;
        }
        Ok(())
    }
}

/// Width of the name column: the longest name, in characters, but at least 5.
fn name_width(stats: &[CacheStatus]) -> usize {
    stats
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_NAME_WIDTH)
}

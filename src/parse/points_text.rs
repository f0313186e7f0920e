//! Reader for plain-text point files: one point per line, three numbers each.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regex::Regex;
use thiserror::Error;

use crate::geom::PointSet;

/// Result type for reading point files.
pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Error)]
pub enum ParseError {
    /// The input could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The delimiter set is empty or unusable.
    #[error("invalid delimiter set: {0}")]
    Delimiters(String),
    /// The column selection is malformed.
    #[error("invalid column selection: {0}")]
    Columns(String),
}

/// How lines are split and which tokens hold x, y and z.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Characters that separate tokens; any run of them is one separator.
    /// `None` splits on whitespace.
    pub delimiters: Option<String>,
    /// Zero-based token positions of x, y and z.
    pub columns: [usize; 3],
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiters: None,
            columns: [0, 1, 2],
        }
    }
}

impl ReadOptions {
    #[must_use]
    pub fn with_delimiters(mut self, delimiters: impl Into<String>) -> Self {
        self.delimiters = Some(delimiters.into());
        self
    }

    #[must_use]
    pub fn with_columns(mut self, columns: [usize; 3]) -> Self {
        self.columns = columns;
        self
    }
}

/// Parses a one-based `"a,b,c"` column list into zero-based positions.
pub fn parse_columns(spec: &str) -> ParseResult<[usize; 3]> {
    let parsed: Vec<usize> = spec
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .ok()
                .filter(|&column| column >= 1)
                .ok_or_else(|| ParseError::Columns(format!("'{part}' is not a column number")))
        })
        .collect::<ParseResult<_>>()?;

    let &[x, y, z] = parsed.as_slice() else {
        return Err(ParseError::Columns(format!(
            "expected three columns, got {}",
            parsed.len()
        )));
    };
    let columns = [x - 1, y - 1, z - 1];
    validate_columns(columns)?;
    Ok(columns)
}

fn validate_columns(columns: [usize; 3]) -> ParseResult<()> {
    let [x, y, z] = columns;
    if x == y || y == z || x == z {
        return Err(ParseError::Columns(format!(
            "columns must differ, got {}, {}, {}",
            x + 1,
            y + 1,
            z + 1
        )));
    }
    Ok(())
}

/// Counts of accepted and skipped lines.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReadReport {
    pub accepted: usize,
    pub skipped: usize,
    /// One-based numbers of the skipped lines.
    pub skipped_lines: Vec<usize>,
}

enum Splitter {
    Whitespace,
    Pattern(Regex),
}

impl Splitter {
    fn new(delimiters: Option<&str>) -> ParseResult<Self> {
        let Some(delimiters) = delimiters else {
            return Ok(Self::Whitespace);
        };
        if delimiters.is_empty() {
            return Err(ParseError::Delimiters("no delimiter characters given".to_owned()));
        }
        let class: String = delimiters
            .chars()
            .map(|c| regex::escape(&c.to_string()))
            .collect();
        Regex::new(&format!("[{class}]+"))
            .map(Self::Pattern)
            .map_err(|err| ParseError::Delimiters(err.to_string()))
    }

    fn tokens<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Self::Whitespace => line.split_whitespace().collect(),
            Self::Pattern(re) => re
                .split(line)
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .collect(),
        }
    }
}

/// Reads points from any buffered reader. Lines without three finite numbers
/// in the selected columns are skipped and reported, never an error; that
/// includes lines that are not valid UTF-8.
pub fn read_points<R: BufRead>(
    mut reader: R,
    options: &ReadOptions,
) -> ParseResult<(PointSet, ReadReport)> {
    validate_columns(options.columns)?;
    let splitter = Splitter::new(options.delimiters.as_deref())?;

    let mut points = PointSet::new();
    let mut report = ReadReport::default();
    let mut buf = Vec::new();

    for number in 0.. {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }
        let tokens = splitter.tokens(line);
        let value = |column: usize| {
            tokens
                .get(column)
                .and_then(|token| token.parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };
        let [cx, cy, cz] = options.columns;
        match (value(cx), value(cy), value(cz)) {
            (Some(x), Some(y), Some(z)) => {
                points.push(x, y, z);
                report.accepted += 1;
            }
            _ => {
                report.skipped += 1;
                report.skipped_lines.push(number + 1);
            }
        }
    }

    log::debug!("read {} points", report.accepted);
    if report.skipped > 0 {
        log::warn!("skipped {} line(s) without three numeric columns", report.skipped);
    }
    Ok((points, report))
}

pub fn read_points_str(input: &str, options: &ReadOptions) -> ParseResult<(PointSet, ReadReport)> {
    read_points(input.as_bytes(), options)
}

pub fn read_points_file(
    path: impl AsRef<Path>,
    options: &ReadOptions,
) -> ParseResult<(PointSet, ReadReport)> {
    let file = File::open(path.as_ref())?;
    log::debug!("reading points from {}", path.as_ref().display());
    read_points(BufReader::new(file), options)
}

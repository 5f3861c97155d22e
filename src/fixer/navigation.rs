//! Navigation RINEX reformatter.
//!
//! Ephemeris values are stored in fixed width windows. Each window is parsed
//! as a floating point number (legacy `D` exponent markers are tolerated)
//! and redacted in canonical scientific notation: `-1.234567890120E+01`.
use std::{
    io::{BufRead, Write},
    str::FromStr,
};

use log::{debug, trace};

use rinex::prelude::SV;

use crate::{error::Error, fixer::strip_terminator, utils::fmt_scientific};

/// Header section terminates on this marker (included)
const END_OF_HEADER: &str = "END OF HEADER";

/// Value field width
pub const FIELD_WIDTH: usize = 19;

/// Digits after the decimal point
const FIELD_PRECISION: usize = 12;

/// Satellite ID + epoch, preserved as is on record start lines
const RECORD_PREFIX_WIDTH: usize = 23;

/// Continuation lines are redacted with this blank prefix
const CONTINUATION_PREFIX: &str = "    ";

/// Value field [Slot] within a line
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Slot {
    /// First column
    pub offset: usize,
    /// Window width
    pub width: usize,
}

impl Slot {
    const fn new(offset: usize) -> Self {
        Self {
            offset,
            width: FIELD_WIDTH,
        }
    }

    /// True if at least one character of this [Slot] exists
    /// in a line of given length. Partial fields are still processed.
    pub fn fits(&self, length: usize) -> bool {
        length > self.offset
    }

    /// Returns the (possibly truncated) content of this [Slot]
    pub fn extract<'a>(&self, line: &'a str) -> &'a str {
        let end = (self.offset + self.width).min(line.len());
        line.get(self.offset..end).unwrap_or_default()
    }
}

/// The first slot of a record start line is the epoch: not a value field
const RECORD_START_SLOTS: [Slot; 3] = [Slot::new(23), Slot::new(42), Slot::new(61)];

const CONTINUATION_SLOTS: [Slot; 4] = [
    Slot::new(4),
    Slot::new(23),
    Slot::new(42),
    Slot::new(61),
];

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LineKind {
    /// Satellite ID, epoch, then clock bias, drift and drift rate
    RecordStart,
    /// Orbit parameters
    Continuation,
}

impl LineKind {
    /// Value field [Slot]s of this kind of line
    pub fn slots(&self) -> &'static [Slot] {
        match self {
            Self::RecordStart => &RECORD_START_SLOTS,
            Self::Continuation => &CONTINUATION_SLOTS,
        }
    }
}

/// Value field that is not a floating point number
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedField(pub String);

/// Navigation fix [Report]
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Report {
    /// Number of ephemeris records
    pub records: usize,
    /// Number of body lines rewritten
    pub lines: usize,
    /// Number of fields whose content was modified
    pub updated: usize,
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} updated value(s) ({} record(s), {} line(s))",
            self.updated, self.records, self.lines
        )
    }
}

/// A line opens a new record unless it starts with a blank
pub fn classify_line(line: &str) -> LineKind {
    if line.starts_with(' ') {
        LineKind::Continuation
    } else {
        LineKind::RecordStart
    }
}

/// Redacts a value field in canonical form
pub fn normalize_field(raw: &str) -> Result<String, MalformedField> {
    let content = raw.trim().replace('D', "E").replace('d', "e");

    let value = f64::from_str(&content).map_err(|_| MalformedField(raw.trim().to_string()))?;

    Ok(fmt_scientific(value, FIELD_PRECISION, FIELD_WIDTH))
}

/// Rewrites a body line (without terminator).
/// Returns the new content and the number of fields that were modified.
pub fn rewrite_line(line: &str, kind: LineKind) -> Result<(String, usize), MalformedField> {
    let mut updated = 0;
    let mut rewritten = String::with_capacity(80);

    match kind {
        LineKind::RecordStart => {
            let end = RECORD_PREFIX_WIDTH.min(line.len());
            rewritten.push_str(line.get(..end).unwrap_or(line));
        },
        LineKind::Continuation => {
            rewritten.push_str(CONTINUATION_PREFIX);
        },
    }

    for slot in kind.slots().iter().filter(|slot| slot.fits(line.len())) {
        let raw = slot.extract(line);
        let normalized = normalize_field(raw)?;

        if raw.trim() != normalized.trim() {
            updated += 1;
        }

        rewritten.push_str(&normalized);
    }

    Ok((rewritten, updated))
}

/// Copies the header as is, then rewrites every ephemeris line.
/// Aborts on the first malformed field.
pub fn fix<R: BufRead, W: Write>(mut reader: R, mut writer: W) -> Result<Report, Error> {
    let mut report = Report::default();

    let mut end_of_header = false;
    let mut buf = Vec::<u8>::with_capacity(128);
    let mut nth = 0;

    loop {
        buf.clear();

        if reader.read_until(b'\n', &mut buf).map_err(Error::Read)? == 0 {
            break;
        }

        nth += 1;

        // header content is opaque
        if !end_of_header {
            writer.write_all(&buf)?;
            end_of_header = buf
                .windows(END_OF_HEADER.len())
                .any(|window| window == END_OF_HEADER.as_bytes());
            continue;
        }

        let line = std::str::from_utf8(&buf).map_err(|_| Error::MalformedField {
            line: nth,
            field: String::from_utf8_lossy(&buf).trim().to_string(),
        })?;

        let line = strip_terminator(line);

        if line.is_empty() {
            writeln!(writer)?;
            continue;
        }

        let kind = classify_line(line);

        if kind == LineKind::RecordStart {
            report.records += 1;

            match line.get(..3).and_then(|sv| SV::from_str(sv.trim()).ok()) {
                Some(sv) => debug!("line {} - {} new record", nth, sv),
                None => debug!("line {} - new record", nth),
            }
        }

        let (rewritten, updated) = rewrite_line(line, kind)
            .map_err(|MalformedField(field)| Error::MalformedField { line: nth, field })?;

        if updated > 0 {
            trace!("line {} - {} updated value(s)", nth, updated);
        }

        report.lines += 1;
        report.updated += updated;

        writeln!(writer, "{}", rewritten)?;
    }

    Ok(report)
}

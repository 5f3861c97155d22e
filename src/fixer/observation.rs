//! Observation RINEX deduplicator.
//!
//! Consecutive epochs sharing the same timestamp are merged into a single
//! epoch, observations repeated within one epoch are dropped, and each epoch
//! is released with the number of observations it actually contains.
use std::{
    collections::HashSet,
    io::{BufRead, Write},
    str::FromStr,
};

use log::{debug, trace, warn};

use rinex::prelude::obs::EpochFlag;

use crate::{error::Error, fixer::strip_terminator};

/// Epoch lines start with this marker
const EPOCH_MARKER: char = '>';

/// Columns of the "yyyy mm dd hh mm ss.sssssss" timestamp within an epoch line
const TIMESTAMP_START: usize = 2;
const TIMESTAMP_END: usize = 29;

/// Width of the receiver clock offset field, blank when not provided
const CLOCK_OFFSET_WIDTH: usize = 21;

/// Returns the timestamp window of an epoch line (possibly truncated)
fn timestamp(line: &str) -> &str {
    let end = TIMESTAMP_END.min(line.len());
    line.get(TIMESTAMP_START..end).unwrap_or_default()
}

/// Parsed epoch line
#[derive(Debug, Clone, PartialEq)]
pub struct EpochHeader {
    /// Line as encountered
    line: String,
    /// Year, month, day, hours, minutes and fractional seconds tokens
    datetime: [String; 6],
    /// [EpochFlag]
    pub flag: EpochFlag,
    /// Flag token, as encountered
    flag_token: String,
    /// Number of satellites announced by this line
    pub numsat: usize,
    /// Receiver clock offset token
    clock_offset: Option<String>,
}

impl EpochHeader {
    /// Parses an epoch line (without terminator).
    /// Returns None when it does not carry date, time, flag and satellite count.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();

        if tokens.next()? != ">" {
            return None;
        }

        let mut datetime: [String; 6] = Default::default();

        for token in datetime.iter_mut() {
            *token = tokens.next()?.to_string();
        }

        let flag_token = tokens.next()?.to_string();
        let flag = EpochFlag::from_str(&flag_token).ok()?;
        let numsat = tokens.next()?.parse::<usize>().ok()?;
        let clock_offset = tokens.next().map(|offset| offset.to_string());

        Some(Self {
            line: line.to_string(),
            datetime,
            flag,
            flag_token,
            numsat,
            clock_offset,
        })
    }

    /// Timestamp window, which identifies this epoch
    pub fn timestamp(&self) -> &str {
        timestamp(&self.line)
    }

    /// True if both lines describe the same epoch
    pub fn same_epoch(&self, rhs: &Self) -> bool {
        self.timestamp() == rhs.timestamp()
    }

    /// Redacts this epoch line, announcing `numsat` satellites
    pub fn format(&self, numsat: usize) -> String {
        let [year, month, day, hours, minutes, seconds] = &self.datetime;

        let mut formatted = format!(
            "> {:>4} {:>2} {:>2} {:>2} {:>2}{:>11}  {}{:>3}",
            year, month, day, hours, minutes, seconds, self.flag_token, numsat,
        );

        match &self.clock_offset {
            Some(offset) => {
                formatted.push_str(&format!("      {:>15}", offset));
            },
            None => {
                formatted.push_str(&" ".repeat(CLOCK_OFFSET_WIDTH));
            },
        }

        formatted
    }
}

/// Observation fix [Report]
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Report {
    /// Number of epochs released
    pub epochs: usize,
    /// Number of observations released
    pub observations: usize,
    /// Number of duplicated epoch lines dropped
    pub duplicated_epochs: usize,
    /// Number of duplicated observations dropped
    pub duplicated_observations: usize,
    /// Number of duplicated epochs whose flag did not match
    pub flag_mismatches: usize,
}

impl Report {
    /// Total number of lines dropped
    pub fn duplicates(&self) -> usize {
        self.duplicated_epochs + self.duplicated_observations
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} duplicated line(s) removed ({} epoch(s), {} observation(s) released",
            self.duplicates(),
            self.epochs,
            self.observations
        )?;

        if self.flag_mismatches > 0 {
            write!(f, ", {} flag mismatch(es)", self.flag_mismatches)?;
        }

        write!(f, ")")
    }
}

/// Epoch being collected
#[derive(Debug)]
struct PendingEpoch {
    header: EpochHeader,
    lines: Vec<String>,
    contents: HashSet<String>,
}

impl PendingEpoch {
    fn new(header: EpochHeader) -> Self {
        Self {
            header,
            lines: Vec::with_capacity(32),
            contents: HashSet::with_capacity(32),
        }
    }

    /// Collects a new observation.
    /// Returns false when identical content was already collected.
    fn insert(&mut self, line: &str) -> bool {
        if self.contents.contains(line) {
            false
        } else {
            self.contents.insert(line.to_string());
            self.lines.push(line.to_string());
            true
        }
    }

    /// Releases this epoch: header first, then observations in order of appearance
    fn release<W: Write>(self, writer: &mut W, report: &mut Report) -> std::io::Result<()> {
        let numsat = self.lines.len();

        if numsat != self.header.numsat {
            debug!(
                "{} - {} satellite(s) announced, {} released",
                self.header.timestamp().trim(),
                self.header.numsat,
                numsat
            );
        }

        writeln!(writer, "{}", self.header.format(numsat))?;

        for line in self.lines.iter() {
            writeln!(writer, "{}", line)?;
        }

        report.epochs += 1;
        report.observations += numsat;
        Ok(())
    }
}

#[derive(Debug, Default)]
enum State {
    /// Header section, copied as is
    #[default]
    Header,
    /// Collecting observations
    Epoch(PendingEpoch),
}

/// [Deduplicator] consumes an Observation RINEX line by line
pub struct Deduplicator<W: Write> {
    writer: W,
    state: State,
    report: Report,
    nth: usize,
}

impl<W: Write> Deduplicator<W> {
    /// Builds a new [Deduplicator] redacting into this writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            nth: 0,
            state: Default::default(),
            report: Default::default(),
        }
    }

    fn parse_header(&self, content: &str) -> Result<EpochHeader, Error> {
        EpochHeader::parse(content).ok_or_else(|| Error::MalformedEpoch {
            line: self.nth,
            content: content.trim_end().to_string(),
        })
    }

    /// Consumes a new line, terminator included.
    /// Header lines are copied as is, whatever their encoding.
    pub fn consume(&mut self, line: &[u8]) -> Result<(), Error> {
        self.nth += 1;

        if matches!(self.state, State::Header) && !line.starts_with(&[EPOCH_MARKER as u8]) {
            self.writer.write_all(line)?;
            return Ok(());
        }

        let content = std::str::from_utf8(line).map_err(|_| Error::MalformedEpoch {
            line: self.nth,
            content: String::from_utf8_lossy(line).trim_end().to_string(),
        })?;

        let content = strip_terminator(content);

        if content.starts_with(EPOCH_MARKER) {
            let header = self.parse_header(content)?;

            match &mut self.state {
                State::Header => {
                    self.state = State::Epoch(PendingEpoch::new(header));
                },
                State::Epoch(pending) => {
                    if pending.header.same_epoch(&header) {
                        self.report.duplicated_epochs += 1;
                        trace!("line {} - duplicated epoch {}", self.nth, header.timestamp());

                        if pending.header.flag != header.flag {
                            self.report.flag_mismatches += 1;
                            warn!(
                                "line {} - flags of duplicated epochs are different: \"{}\" / \"{}\"",
                                self.nth,
                                pending.header.line.trim_end(),
                                header.line.trim_end()
                            );
                        }
                    } else {
                        let completed = std::mem::replace(pending, PendingEpoch::new(header));
                        completed.release(&mut self.writer, &mut self.report)?;
                    }
                },
            }
        } else if let State::Epoch(pending) = &mut self.state {
            if content.is_empty() {
                trace!("line {} - empty line", self.nth);
            } else if !pending.insert(content) {
                self.report.duplicated_observations += 1;
                trace!("line {} - duplicated observation \"{}\"", self.nth, content);
            }
        }

        Ok(())
    }

    /// Releases the pending epoch, whatever its content.
    /// Returns the writer and the final [Report].
    pub fn finish(self) -> Result<(W, Report), Error> {
        let Self {
            mut writer,
            state,
            mut report,
            ..
        } = self;

        if let State::Epoch(pending) = state {
            pending.release(&mut writer, &mut report)?;
        }

        Ok((writer, report))
    }
}

/// Copies the header as is, then merges duplicated epochs and observations
pub fn fix<R: BufRead, W: Write>(mut reader: R, writer: W) -> Result<Report, Error> {
    let mut deduplicator = Deduplicator::new(writer);
    let mut buf = Vec::<u8>::with_capacity(128);

    loop {
        buf.clear();

        if reader.read_until(b'\n', &mut buf).map_err(Error::Read)? == 0 {
            break;
        }

        deduplicator.consume(&buf)?;
    }

    let (_, report) = deduplicator.finish()?;
    Ok(report)
}

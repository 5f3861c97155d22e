use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("can't locate file \"{}\"", .0.display())]
    InputNotFound(PathBuf),

    #[error("can't read file \"{}\": {}", .0.display(), .1)]
    InputUnreadable(PathBuf, #[source] std::io::Error),

    #[error("can't write to \"{}\": {}", .0.display(), .1)]
    OutputPathUnwritable(PathBuf, #[source] std::io::Error),

    #[error("output \"{}\" would overwrite the input file", .0.display())]
    OutputOverwritesInput(PathBuf),

    #[error("line {line}: malformed numeric field \"{field}\"")]
    MalformedField { line: usize, field: String },

    #[error("line {line}: malformed epoch \"{content}\"")]
    MalformedEpoch { line: usize, content: String },

    #[error("read error: {0}")]
    Read(#[source] std::io::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to determine system time: {0}")]
    SystemTime(String),
}

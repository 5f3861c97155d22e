use flate2::{Compression, read::MultiGzDecoder, write::GzEncoder};

use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

/// Returns true if this path designates a gzip compressed file
pub fn is_gzip(path: &Path) -> bool {
    path.extension().map(|ext| ext == "gz").unwrap_or(false)
}

/// Input [FileDescriptor]: plain or gzip compressed RINEX
pub enum InputDescriptor {
    Plain(File),
    Gzip(MultiGzDecoder<File>),
}

impl Read for InputDescriptor {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(r) => r.read(buf),
            Self::Gzip(r) => r.read(buf),
        }
    }
}

impl InputDescriptor {
    /// Wraps an opened file, decompressing on the fly when `gzip` is set.
    /// Concatenated gzip members are read through.
    pub fn new(gzip: bool, fd: File) -> Self {
        if gzip {
            Self::Gzip(MultiGzDecoder::new(fd))
        } else {
            Self::Plain(fd)
        }
    }
}

/// Output file descriptor
pub enum FileDescriptor {
    Plain(File),
    Gzip(GzEncoder<File>),
}

impl Write for FileDescriptor {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(data),
            Self::Gzip(w) => w.write(data),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(w) => w.flush(),
        }
    }
}

impl FileDescriptor {
    /// Wraps a created file, compressing on the fly when `gzip` is set
    pub fn new(gzip: bool, fd: File) -> Self {
        if gzip {
            let compression = Compression::new(5);
            Self::Gzip(GzEncoder::new(fd, compression))
        } else {
            Self::Plain(fd)
        }
    }

    /// Flushes all content and writes the gzip trailer, if any.
    /// Must be called once all content has been written.
    pub fn finish(self) -> std::io::Result<()> {
        match self {
            Self::Plain(mut w) => w.flush(),
            Self::Gzip(w) => {
                let mut fd = w.finish()?;
                fd.flush()
            },
        }
    }
}

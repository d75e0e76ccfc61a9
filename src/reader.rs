use crate::config::READ_BUFFER_SIZE;
use anyhow::{Context, Result};
use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Bzip2,
    Plain,
}

impl Compression {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => Compression::Gzip,
            Some(ext) if ext.eq_ignore_ascii_case("bz2") => Compression::Bzip2,
            _ => Compression::Plain,
        }
    }
}

/// Lazily yields the lines of a (possibly compressed) dump file.
///
/// Only I/O failures are errors. Invalid UTF-8 is replaced with U+FFFD and
/// logged with its line number.
pub struct DumpReader {
    reader: BufReader<Box<dyn Read + Send>>,
    line_no: u64,
}

impl DumpReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open dump at: {}", path.display()))?;
        let compression = Compression::from_path(path);
        info!(path = %path.display(), ?compression, "Opening dump");

        let inner: Box<dyn Read + Send> = match compression {
            Compression::Gzip => Box::new(MultiGzDecoder::new(file)),
            Compression::Bzip2 => Box::new(BzDecoder::new(file)),
            Compression::Plain => Box::new(file),
        };
        Ok(Self::from_reader(inner))
    }

    pub fn from_reader(inner: Box<dyn Read + Send>) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, inner),
            line_no: 0,
        }
    }
}

impl Iterator for DumpReader {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line_no += 1;
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                let line = match String::from_utf8(buf) {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(line = self.line_no, "Replaced invalid UTF-8 in dump line");
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                };
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

// ============================================================
// DELIMITED SOURCES
// ============================================================
// csv-crate backed row streams over files and in-memory text

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use csv::{ByteRecordsIntoIter, ReaderBuilder};

use crate::domain::error::{AppError, Result};
use crate::domain::table::{is_blank_row, RawRow};

use super::{decode_bytes, detect_delimiter, RowSource};

/// Streams a delimited file through a chunk-sized buffer. The file handle is
/// re-opened on every `open_rows`, which is what makes the second pass
/// possible without buffering the file.
pub struct DelimitedSource {
    path: PathBuf,
    delimiter: u8,
    chunk_size: usize,
}

impl DelimitedSource {
    pub fn new(path: impl Into<PathBuf>, delimiter: u8, chunk_size: usize) -> Self {
        Self {
            path: path.into(),
            delimiter,
            chunk_size,
        }
    }

    /// Open with the delimiter detected from the file's first line.
    pub fn auto_detect(path: impl AsRef<Path>, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|e| AppError::IoError(format!("Failed to open {}: {}", path.display(), e)))?;
        let mut sample = vec![0u8; 4096];
        let read = file.read(&mut sample)?;
        sample.truncate(read);
        let delimiter = detect_delimiter(&decode_bytes(&sample));
        Ok(Self::new(path, delimiter, chunk_size))
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl RowSource for DelimitedSource {
    fn open_rows(&self) -> Result<Box<dyn Iterator<Item = Result<RawRow>> + Send + '_>> {
        let file = File::open(&self.path).map_err(|e| {
            AppError::IoError(format!("Failed to open {}: {}", self.path.display(), e))
        })?;
        let reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(BufReader::with_capacity(self.chunk_size, file));
        Ok(Box::new(RowIter {
            inner: reader.into_byte_records(),
        }))
    }
}

/// In-memory variant sharing the same contract. Used by the contact
/// extractor, which receives decoded upload bytes, and by tests.
pub struct MemorySource {
    content: String,
    delimiter: u8,
}

impl MemorySource {
    pub fn new(content: impl Into<String>, delimiter: u8) -> Self {
        Self {
            content: content.into(),
            delimiter,
        }
    }

    /// Build from decoded text, detecting the delimiter from the first line.
    pub fn auto_detect(content: impl Into<String>) -> Self {
        let content = content.into();
        let delimiter = detect_delimiter(&content);
        Self::new(content, delimiter)
    }
}

impl RowSource for MemorySource {
    fn open_rows(&self) -> Result<Box<dyn Iterator<Item = Result<RawRow>> + Send + '_>> {
        let reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(Cursor::new(self.content.as_bytes()));
        Ok(Box::new(RowIter {
            inner: reader.into_byte_records(),
        }))
    }
}

struct RowIter<R: Read> {
    inner: ByteRecordsIntoIter<R>,
}

impl<R: Read> Iterator for RowIter<R> {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next() {
                None => return None,
                Some(Err(e)) => {
                    return Some(Err(AppError::ParseError(format!(
                        "Failed to decode record: {}",
                        e
                    ))))
                }
                Some(Ok(record)) => {
                    let row: RawRow = record.iter().map(|cell| decode_bytes(cell)).collect();
                    if is_blank_row(&row) {
                        continue;
                    }
                    return Some(Ok(row));
                }
            }
        }
    }
}

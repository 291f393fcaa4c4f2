// ============================================================
// TOKENIZER ADAPTERS
// ============================================================
// Streaming, restartable row sources over delimited text and workbooks

mod delimited;
mod workbook;

pub use delimited::{DelimitedSource, MemorySource};
pub use workbook::WorkbookSource;

use crate::domain::error::Result;
use crate::domain::table::RawRow;

/// A lazy, finite, restartable sequence of raw rows. `open_rows` starts a
/// fresh read from byte 0 each time it is called; the second pass relies on
/// this, so implementations must not assume single-pass consumption.
pub trait RowSource: Send + Sync {
    fn open_rows(&self) -> Result<Box<dyn Iterator<Item = Result<RawRow>> + Send + '_>>;
}

/// Delimiter auto-detection: count comma, tab, and semicolon occurrences in
/// the first line and pick whichever is strictly more frequent than the
/// other two. Comma wins all ties.
pub fn detect_delimiter(sample: &str) -> u8 {
    let line = sample.lines().next().unwrap_or("");
    let commas = line.matches(',').count();
    let tabs = line.matches('\t').count();
    let semicolons = line.matches(';').count();

    if tabs > commas && tabs > semicolons {
        b'\t'
    } else if semicolons > commas && semicolons > tabs {
        b';'
    } else {
        b','
    }
}

/// Decode uploaded bytes to text. Honors a BOM when present, otherwise
/// decodes as UTF-8 with lossy replacement so a stray byte never rejects the
/// whole upload.
pub fn decode_bytes(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text.into_owned();
    }
    let (text, _, _) = encoding_rs::UTF_8.decode(bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_delimiter() {
        assert_eq!(detect_delimiter("a,b,c\nd,e,f"), b',');
        assert_eq!(detect_delimiter("a;b;c"), b';');
        assert_eq!(detect_delimiter("a\tb\tc"), b'\t');
    }

    #[test]
    fn only_first_line_counts() {
        // Semicolons dominate later lines but the first line decides.
        assert_eq!(detect_delimiter("a,b\nx;y;z;w;v"), b',');
    }

    #[test]
    fn ties_default_to_comma() {
        assert_eq!(detect_delimiter("a,b;c"), b',');
        assert_eq!(detect_delimiter(""), b',');
    }

    #[test]
    fn decode_handles_utf8_and_bom() {
        assert_eq!(decode_bytes("país".as_bytes()), "país");
        let mut bom = vec![0xEF, 0xBB, 0xBF];
        bom.extend_from_slice(b"name,email");
        assert_eq!(decode_bytes(&bom), "name,email");
    }

    #[test]
    fn utf16_bom_selects_the_encoding() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "name,país".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_bytes(&bytes), "name,país");
    }

    #[test]
    fn decode_never_fails_on_invalid_bytes() {
        let decoded = decode_bytes(&[b'a', 0xFF, b'b']);
        assert!(decoded.starts_with('a') && decoded.ends_with('b'));
    }
}

//! Chunk arithmetic and the binary/legacy-base64 data column.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rusqlite::types::Value;

/// Fixed chunk size: 1,800 KiB. Already-stored files keep their original
/// chunk boundaries if this constant ever changes; only new writes would
/// use a new size.
pub const CHUNK_SIZE: usize = 1_800 * 1024;

/// Number of chunks a file of `len` bytes occupies. Always at least 1 (an
/// empty file is still one chunk-0 row).
pub fn chunk_count(len: usize) -> usize {
    if len == 0 {
        1
    } else {
        len.div_ceil(CHUNK_SIZE)
    }
}

/// Decode a `data` column value into its bytes: a blob yields its bytes
/// directly, a non-empty string decodes as legacy base64, anything else
/// (null, empty string) yields zero bytes.
pub fn decode_cell(value: Value) -> Vec<u8> {
    match value {
        Value::Blob(bytes) => bytes,
        Value::Text(text) if !text.is_empty() => BASE64.decode(text).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// The byte length a legacy base64 string decodes to, without actually
/// decoding it: `floor(len * 3 / 4) - trailing '=' count`.
pub fn legacy_decoded_len(encoded: &str) -> u64 {
    let trailing_padding = encoded.chars().rev().take_while(|&c| c == '=').count() as u64;
    (encoded.len() as u64 * 3 / 4).saturating_sub(trailing_padding)
}

/// Raw on-disk length of a `data` cell: blob byte length or text character
/// length, without decoding. Used by storage stats, which count legacy text
/// by its stored length rather than its decoded length.
pub fn raw_cell_len(value: &Value) -> u64 {
    match value {
        Value::Blob(bytes) => bytes.len() as u64,
        Value::Text(text) => text.len() as u64,
        _ => 0,
    }
}

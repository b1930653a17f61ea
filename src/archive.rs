//! ZIP archive assembly
//!
//! Packages an ordered list of binary outputs into a single archive held in
//! memory. Entries appear in input order.

use std::io::{Cursor, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Prefix used for entries without a caller-supplied name
pub const DEFAULT_ENTRY_PREFIX: &str = "page";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Archive `entries`, naming entry `i` after `names[i]` when present.
///
/// Entries past the end of `names` (or all of them when `names` is `None`)
/// fall back to `page-{i+1}.pdf`.
pub fn create_archive(entries: &[Vec<u8>], names: Option<&[String]>) -> Result<Vec<u8>, ArchiveError> {
    let names: Vec<String> = (0..entries.len())
        .map(|i| {
            names
                .and_then(|n| n.get(i))
                .cloned()
                .unwrap_or_else(|| entry_name(DEFAULT_ENTRY_PREFIX, i))
        })
        .collect();

    write_archive(entries, &names)
}

/// Archive `entries` as `{prefix}-1.pdf`, `{prefix}-2.pdf`, ...
pub fn create_archive_with_prefix(entries: &[Vec<u8>], prefix: &str) -> Result<Vec<u8>, ArchiveError> {
    let names: Vec<String> = (0..entries.len()).map(|i| entry_name(prefix, i)).collect();
    write_archive(entries, &names)
}

fn entry_name(prefix: &str, index: usize) -> String {
    format!("{}-{}.pdf", prefix, index + 1)
}

fn write_archive(entries: &[Vec<u8>], names: &[String]) -> Result<Vec<u8>, ArchiveError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    for (name, data) in names.iter().zip(entries) {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(data)?;
    }

    let cursor = zip.finish()?;
    tracing::debug!(entries = entries.len(), bytes = cursor.get_ref().len(), "Archive assembled");

    Ok(cursor.into_inner())
}

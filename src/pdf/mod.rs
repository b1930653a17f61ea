//! PDF page manipulation
//!
//! Splits, merges and regroups the pages of caller-supplied PDFs using `lopdf`.
//! Every operation is synchronous and CPU-bound; handlers run them on the
//! blocking pool.

mod error;
mod extract;
mod pages;

pub use error::PdfError;
pub use extract::{extract_page_groups, merge_pdfs, page_count, split_pdf, validate_page_groups};


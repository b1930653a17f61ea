//! Page-group extraction, split and merge
//!
//! All validation happens before any output document is built, so a request
//! with one bad index yields an error and nothing else.

use super::error::PdfError;
use super::pages::{finish, load, page_ids, rebuild_page_tree};

/// Check page groups against a document's page count.
///
/// Indices are 0-based. Returns the groups converted to `usize` once every
/// index has been checked; the first violation wins.
pub fn validate_page_groups(
    groups: &[Vec<i64>],
    page_count: usize,
) -> Result<Vec<Vec<usize>>, PdfError> {
    if groups.is_empty() {
        return Err(PdfError::InvalidInput(
            "At least one page group is required".to_string(),
        ));
    }

    groups
        .iter()
        .enumerate()
        .map(|(position, group)| {
            if group.is_empty() {
                return Err(PdfError::InvalidInput(format!(
                    "Page groups cannot be empty (group {} has no pages)",
                    position + 1
                )));
            }
            group
                .iter()
                .map(|&index| match usize::try_from(index) {
                    Ok(i) if i < page_count => Ok(i),
                    _ => Err(PdfError::IndexOutOfRange { index, page_count }),
                })
                .collect()
        })
        .collect()
}

/// Build one PDF per page group, preserving the order given in each group.
///
/// Duplicate indices inside a group produce duplicate pages.
pub fn extract_page_groups(pdf_bytes: &[u8], groups: &[Vec<i64>]) -> Result<Vec<Vec<u8>>, PdfError> {
    let source = load(pdf_bytes)?;
    let pages = page_ids(&source);
    let groups = validate_page_groups(groups, pages.len())?;

    tracing::debug!(
        page_count = pages.len(),
        groups = groups.len(),
        "Extracting page groups"
    );

    groups
        .iter()
        .map(|group| {
            let order: Vec<_> = group.iter().map(|&i| pages[i]).collect();
            let mut doc = source.clone();
            rebuild_page_tree(&mut doc, &order)?;
            finish(doc)
        })
        .collect()
}

/// Split a PDF into single-page documents, one per page in order.
pub fn split_pdf(pdf_bytes: &[u8]) -> Result<Vec<Vec<u8>>, PdfError> {
    let source = load(pdf_bytes)?;
    let pages = page_ids(&source);

    tracing::debug!(page_count = pages.len(), "Splitting PDF");

    pages
        .iter()
        .map(|&page_id| {
            let mut doc = source.clone();
            rebuild_page_tree(&mut doc, &[page_id])?;
            finish(doc)
        })
        .collect()
}

/// Concatenate the pages of several PDFs into one document.
pub fn merge_pdfs(documents: &[Vec<u8>]) -> Result<Vec<u8>, PdfError> {
    if documents.is_empty() {
        return Err(PdfError::InvalidInput(
            "At least one PDF document is required".to_string(),
        ));
    }

    // Parse everything up front so a bad input fails before any merging
    let mut parsed = documents
        .iter()
        .map(|bytes| load(bytes))
        .collect::<Result<Vec<_>, _>>()?;

    let mut merged = parsed.remove(0);
    let mut order = page_ids(&merged);

    for mut doc in parsed {
        // Flatten first so pages keep attributes inherited from their own tree
        let own = page_ids(&doc);
        rebuild_page_tree(&mut doc, &own)?;

        doc.renumber_objects_with(merged.max_id + 1);
        order.extend(page_ids(&doc));
        merged.max_id = doc.max_id;
        merged.objects.extend(doc.objects);
    }

    tracing::debug!(
        documents = documents.len(),
        page_count = order.len(),
        "Merging PDFs"
    );

    rebuild_page_tree(&mut merged, &order)?;
    finish(merged)
}

/// Number of pages in a PDF
pub fn page_count(pdf_bytes: &[u8]) -> Result<usize, PdfError> {
    Ok(page_ids(&load(pdf_bytes)?).len())
}

#[cfg(test)]
mod tests {
    use super::super::pages::testing::{page_widths, pages_have_resources, sample_pdf};
    use super::*;

    #[test]
    fn test_extract_two_groups_from_five_pages() {
        let pdf = sample_pdf(5);

        let outputs = extract_page_groups(&pdf, &[vec![0, 1], vec![3, 4]]).unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(page_widths(&outputs[0]), vec![100, 101]);
        assert_eq!(page_widths(&outputs[1]), vec![103, 104]);
    }

    #[test]
    fn test_extract_preserves_group_order_not_document_order() {
        let pdf = sample_pdf(4);

        let outputs = extract_page_groups(&pdf, &[vec![3, 0, 2]]).unwrap();

        assert_eq!(page_widths(&outputs[0]), vec![103, 100, 102]);
    }

    #[test]
    fn test_extract_duplicates_count_as_pages() {
        let pdf = sample_pdf(3);

        let outputs = extract_page_groups(&pdf, &[vec![1, 1, 1], vec![0]]).unwrap();

        assert_eq!(page_count(&outputs[0]).unwrap(), 3);
        assert_eq!(page_widths(&outputs[0]), vec![101, 101, 101]);
        assert_eq!(page_count(&outputs[1]).unwrap(), 1);
    }

    #[test]
    fn test_extract_single_pages() {
        let pdf = sample_pdf(3);

        let outputs = extract_page_groups(&pdf, &[vec![0], vec![1], vec![2]]).unwrap();

        assert_eq!(outputs.len(), 3);
        for (i, output) in outputs.iter().enumerate() {
            assert_eq!(page_widths(output), vec![100 + i as i64]);
            assert!(pages_have_resources(output));
        }
    }

    #[test]
    fn test_extract_out_of_range_reports_index_and_range() {
        let pdf = sample_pdf(2);

        let err = extract_page_groups(&pdf, &[vec![0, 5]]).unwrap_err();

        match &err {
            PdfError::IndexOutOfRange { index, page_count } => {
                assert_eq!(*index, 5);
                assert_eq!(*page_count, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains('5'));
        assert!(message.contains("0-1"));
    }

    #[test]
    fn test_extract_late_invalid_group_fails_whole_request() {
        let pdf = sample_pdf(3);

        let result = extract_page_groups(&pdf, &[vec![0], vec![1], vec![3]]);

        assert!(matches!(
            result,
            Err(PdfError::IndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn test_extract_negative_index_is_out_of_range() {
        let pdf = sample_pdf(3);

        let result = extract_page_groups(&pdf, &[vec![-1]]);

        assert!(matches!(
            result,
            Err(PdfError::IndexOutOfRange { index: -1, .. })
        ));
    }

    #[test]
    fn test_extract_empty_group_list_is_invalid_input() {
        let pdf = sample_pdf(3);

        let result = extract_page_groups(&pdf, &[]);

        assert!(matches!(result, Err(PdfError::InvalidInput(_))));
    }

    #[test]
    fn test_extract_empty_group_is_invalid_input() {
        let pdf = sample_pdf(3);

        let result = extract_page_groups(&pdf, &[vec![0], vec![]]);

        assert!(matches!(result, Err(PdfError::InvalidInput(_))));
    }

    #[test]
    fn test_extract_invalid_document() {
        let result = extract_page_groups(b"%PDF-1.4 truncated", &[vec![0]]);

        assert!(matches!(result, Err(PdfError::InvalidDocument(_))));
    }

    #[test]
    fn test_validate_page_groups_converts_indices() {
        let groups = validate_page_groups(&[vec![2, 0], vec![1]], 3).unwrap();
        assert_eq!(groups, vec![vec![2, 0], vec![1]]);
    }

    #[test]
    fn test_split_pdf() {
        let pdf = sample_pdf(3);

        let pages = split_pdf(&pdf).unwrap();

        assert_eq!(pages.len(), 3);
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page_widths(page), vec![100 + i as i64]);
        }
    }

    #[test]
    fn test_split_invalid_pdf() {
        assert!(matches!(
            split_pdf(b"not a pdf"),
            Err(PdfError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_merge_pdfs_concatenates_in_order() {
        let first = sample_pdf(2);
        let second = sample_pdf(3);

        let merged = merge_pdfs(&[first, second]).unwrap();

        assert_eq!(page_widths(&merged), vec![100, 101, 100, 101, 102]);
        assert!(pages_have_resources(&merged));
    }

    #[test]
    fn test_merge_single_pdf() {
        let merged = merge_pdfs(&[sample_pdf(1)]).unwrap();
        assert_eq!(page_count(&merged).unwrap(), 1);
    }

    #[test]
    fn test_merge_requires_input() {
        assert!(matches!(merge_pdfs(&[]), Err(PdfError::InvalidInput(_))));
    }

    #[test]
    fn test_merge_rejects_invalid_member() {
        let result = merge_pdfs(&[sample_pdf(1), b"garbage".to_vec()]);
        assert!(matches!(result, Err(PdfError::InvalidDocument(_))));
    }
}

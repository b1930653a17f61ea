//! Page tree surgery on top of `lopdf`.
//!
//! Output documents are built by rewriting the source's page tree into a
//! single flat `/Pages` node that lists exactly the requested pages, then
//! pruning everything no longer reachable from the trailer.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId};

use super::error::PdfError;

/// Page attributes a page may inherit from its ancestors (PDF 32000 7.7.3.4)
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Catalog entries that point into the old page tree
const STALE_CATALOG_KEYS: [&[u8]; 6] = [
    b"Outlines",
    b"OpenAction",
    b"StructTreeRoot",
    b"PageLabels",
    b"Dests",
    b"Names",
];

/// Guard against malformed cyclic `/Parent` chains
const MAX_TREE_DEPTH: usize = 64;

/// Parse bytes into a document with a usable page tree.
pub(crate) fn load(bytes: &[u8]) -> Result<Document, PdfError> {
    let doc = Document::load_mem(bytes).map_err(|e| PdfError::InvalidDocument(e.to_string()))?;

    if doc.is_encrypted() {
        return Err(PdfError::InvalidDocument(
            "encrypted documents are not supported".to_string(),
        ));
    }
    pages_root(&doc)?;

    Ok(doc)
}

/// Page object ids in reading order
pub(crate) fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

fn pages_root(doc: &Document) -> Result<ObjectId, PdfError> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| PdfError::InvalidDocument(format!("missing page tree: {}", e)))
}

fn parent_of(dict: &Dictionary) -> Option<ObjectId> {
    dict.get(b"Parent").and_then(Object::as_reference).ok()
}

/// Collect inheritable attributes from the page's ancestors, nearest first.
fn inherited_attributes(doc: &Document, page: &Dictionary) -> Dictionary {
    let mut found = Dictionary::new();
    let mut current = parent_of(page);
    let mut depth = 0;

    while let Some(node_id) = current {
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };
        for key in INHERITABLE {
            if !found.has(key) {
                if let Ok(value) = node.get(key) {
                    found.set(key.to_vec(), value.clone());
                }
            }
        }
        current = parent_of(node);
    }

    found
}

/// Replace the page tree with one flat node listing `order`.
///
/// Inherited attributes are copied onto each page first so pages render the
/// same once detached from their old ancestors. A page listed more than once
/// is cloned into a new object for every repeat.
pub(crate) fn rebuild_page_tree(doc: &mut Document, order: &[ObjectId]) -> Result<(), PdfError> {
    let root = pages_root(doc)?;

    let mut pages = Vec::with_capacity(order.len());
    for &page_id in order {
        let source = doc
            .get_dictionary(page_id)
            .map_err(|e| PdfError::InvalidDocument(format!("unreadable page {:?}: {}", page_id, e)))?;

        let mut page = source.clone();
        for (key, value) in inherited_attributes(doc, source).iter() {
            if !page.has(key) {
                page.set(key.clone(), value.clone());
            }
        }
        page.set("Parent", root);
        pages.push((page_id, page));
    }

    let mut placed = HashSet::with_capacity(pages.len());
    let mut kids = Vec::with_capacity(pages.len());
    for (page_id, page) in pages {
        let id = if placed.insert(page_id) {
            doc.objects.insert(page_id, Object::Dictionary(page));
            page_id
        } else {
            doc.add_object(page)
        };
        kids.push(Object::Reference(id));
    }

    let mut tree = Dictionary::new();
    tree.set("Type", Object::Name(b"Pages".to_vec()));
    tree.set("Count", kids.len() as i64);
    tree.set("Kids", kids);
    doc.objects.insert(root, Object::Dictionary(tree));

    Ok(())
}

/// Drop unreachable objects and serialize.
pub(crate) fn finish(mut doc: Document) -> Result<Vec<u8>, PdfError> {
    let catalog_id = doc.trailer.get(b"Root").and_then(Object::as_reference).ok();
    if let Some(catalog) = catalog_id
        .and_then(|id| doc.get_object_mut(id).ok())
        .and_then(|object| object.as_dict_mut().ok())
    {
        for key in STALE_CATALOG_KEYS {
            catalog.remove(key);
        }
    }

    doc.prune_objects();
    doc.renumber_objects();
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| PdfError::Write(e.to_string()))?;
    Ok(out)
}

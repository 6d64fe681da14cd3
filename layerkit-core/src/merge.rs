//! Concatenates PDF buffers page by page.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use tracing::{debug, info};

use crate::error::MergeError;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against malformed, cyclic `Parent` chains.
const MAX_TREE_DEPTH: usize = 64;

/// Merges `buffers` into one document holding every page of every input, in order.
///
/// An empty slice yields a valid document with zero pages.
pub fn merge_pdfs<B: AsRef<[u8]>>(buffers: &[B]) -> Result<Vec<u8>, MergeError> {
    let mut merged = Document::with_version("1.7");
    let pages_id = merged.new_object_id();
    let mut kids: Vec<Object> = Vec::new();

    for (index, buffer) in buffers.iter().enumerate() {
        let mut doc = Document::load_mem(buffer.as_ref())
            .map_err(|source| MergeError::Load { index, source })?;
        doc.renumber_objects_with(merged.max_id + 1);
        merged.max_id = merged.max_id.max(doc.max_id);

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        debug!(index, pages = page_ids.len(), "Appending pages from buffer");

        for page_id in &page_ids {
            let inherited = inherited_attributes(&doc, *page_id);
            if let Ok(page) = doc.get_object_mut(*page_id).and_then(Object::as_dict_mut) {
                for (key, value) in inherited {
                    if !page.has(&key) {
                        page.set(key, value);
                    }
                }
                page.set("Parent", pages_id);
            }
            kids.push(Object::Reference(*page_id));
        }

        for (id, object) in doc.objects {
            if is_structural(&object) {
                continue;
            }
            merged.objects.insert(id, object);
        }
    }

    let page_count = kids.len();
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    merged
        .save_to(&mut out)
        .map_err(|e| MergeError::Serialize(e.to_string()))?;
    info!(inputs = buffers.len(), pages = page_count, bytes = out.len(), "Merged PDF buffers");
    Ok(out)
}

/// Number of pages in a PDF buffer.
pub fn page_count(buffer: &[u8]) -> Result<usize, MergeError> {
    let doc = Document::load_mem(buffer).map_err(|source| MergeError::Load { index: 0, source })?;
    Ok(doc.get_pages().len())
}

/// Catalogs and page-tree nodes are rebuilt for the merged document.
fn is_structural(object: &Object) -> bool {
    match object.as_dict() {
        Ok(dict) => matches!(type_name(dict), Some(b"Catalog") | Some(b"Pages")),
        Err(_) => false,
    }
}

fn type_name(dict: &Dictionary) -> Option<&[u8]> {
    dict.get(b"Type").and_then(Object::as_name).ok()
}

/// Closest ancestor value for each inheritable key the page itself lacks.
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let mut found: Vec<(Vec<u8>, Object)> = Vec::new();
    let Ok(page) = doc.get_dictionary(page_id) else {
        return found;
    };

    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(node_id) = parent {
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };
        for key in INHERITABLE_KEYS {
            if page.has(key) || found.iter().any(|(k, _)| k.as_slice() == key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                found.push((key.to_vec(), value.clone()));
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
    found
}

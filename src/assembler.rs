use crate::error::AssembleError;
use crate::results::{OutputDocument, OutputMode, PageRenderResult, TaggedPdf};
use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Turns render results into the final output.
///
/// Failed pages are dropped. If nothing rendered the run has no output and
/// [`AssembleError::NoPagesRendered`] is returned.
pub fn assemble(
    results: Vec<PageRenderResult>,
    mode: OutputMode,
) -> Result<OutputDocument, AssembleError> {
    let rendered: Vec<TaggedPdf> = results
        .into_iter()
        .filter_map(|result| match result {
            PageRenderResult::Rendered { url, pdf } => Some(TaggedPdf { url, bytes: pdf }),
            PageRenderResult::Failed { .. } => None,
        })
        .collect();

    if rendered.is_empty() {
        return Err(AssembleError::NoPagesRendered);
    }

    match mode {
        OutputMode::Separate => Ok(OutputDocument::Separate(rendered)),
        OutputMode::Combined => {
            let mut merged = MergedPdf::new();
            for page in &rendered {
                let source =
                    Document::load_mem(&page.bytes).map_err(|e| AssembleError::MalformedPdf {
                        url: page.url.clone(),
                        reason: e.to_string(),
                    })?;
                let added = merged.append(source);
                ::log::debug!("Merged {} pages from {}", added, page.url);
            }
            let page_count = merged.page_count();
            let bytes = merged.into_bytes()?;
            ::log::info!(
                "Combined {} documents into {} pages",
                rendered.len(),
                page_count
            );
            Ok(OutputDocument::Combined { bytes, page_count })
        }
    }
}

/// A PDF being built by appending whole documents
pub struct MergedPdf {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl Default for MergedPdf {
    fn default() -> Self {
        Self::new()
    }
}

impl MergedPdf {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Appends every page of `source` in its own order and returns how many
    /// pages were added.
    pub fn append(&mut self, mut source: Document) -> usize {
        source.renumber_objects_with(self.doc.max_id + 1);

        // The source page tree is dropped, so pull inherited attributes down
        // into each page before re-parenting it.
        let mut pages = Vec::new();
        for page_id in source.get_pages().into_values() {
            let Ok(page) = source.get_dictionary(page_id) else {
                continue;
            };
            let mut page = page.clone();
            for key in INHERITABLE {
                if !page.has(key) {
                    if let Some(value) = inherited_attribute(&source, &page, key) {
                        page.set(key, value);
                    }
                }
            }
            page.set("Parent", self.pages_id);
            pages.push((page_id, page));
        }

        let mut max_id = self.doc.max_id;
        for (id, object) in source.objects {
            max_id = max_id.max(id.0);
            if has_type(&object, b"Catalog") || has_type(&object, b"Pages") {
                continue;
            }
            self.doc.objects.insert(id, object);
        }
        self.doc.max_id = max_id;

        let added = pages.len();
        for (id, page) in pages {
            self.doc.objects.insert(id, Object::Dictionary(page));
            self.kids.push(id);
        }
        added
    }

    /// Writes the page tree and catalog and serializes the document
    pub fn into_bytes(mut self) -> Result<Vec<u8>, AssembleError> {
        let kids: Vec<Object> = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| AssembleError::Serialize(e.to_string()))?;
        Ok(bytes)
    }
}

fn has_type(object: &Object, name: &[u8]) -> bool {
    object
        .as_dict()
        .ok()
        .and_then(|dict| dict.get(b"Type").ok())
        .and_then(|t| t.as_name().ok())
        == Some(name)
}

fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    // Page trees are shallow; the bound only guards against reference cycles.
    for _ in 0..64 {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::page_range::RotationInstruction;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

pub struct PdfDocument {
    pub doc: Document,
    pub path: String,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let bytes =
            std::fs::read(&path).with_context(|| format!("Failed to read PDF: {}", path_str))?;
        let mut pdf =
            Self::from_bytes(&bytes).with_context(|| format!("Failed to open PDF: {}", path_str))?;
        debug!(path = %path_str, pages = pdf.page_count(), "Opened PDF");
        pdf.path = path_str;
        Ok(pdf)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).context("Failed to parse PDF")?;
        Ok(PdfDocument {
            doc,
            path: "<memory>".to_string(),
        })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get 1-indexed page object IDs
    pub fn page_ids(&self) -> Vec<(u32, ObjectId)> {
        let mut pages: Vec<_> = self.doc.get_pages().into_iter().collect();
        pages.sort_by_key(|(num, _)| *num);
        pages
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        if let Ok(Object::Reference(info_ref)) = self.doc.trailer.get(b"Info") {
            if let Ok(Object::Dictionary(dict)) = self.doc.get_object(*info_ref) {
                info.title = get_string_from_dict(dict, b"Title");
                info.author = get_string_from_dict(dict, b"Author");
                info.creator = get_string_from_dict(dict, b"Creator");
                info.producer = get_string_from_dict(dict, b"Producer");
                info.creation_date = get_string_from_dict(dict, b"CreationDate");
                info.mod_date = get_string_from_dict(dict, b"ModDate");
                info.subject = get_string_from_dict(dict, b"Subject");
                info.keywords = get_string_from_dict(dict, b"Keywords");
            }
        }

        info.page_count = self.page_count();
        info.version = self.doc.version.clone();
        info
    }

    fn check_pages(&self, pages: &[u32]) -> Result<()> {
        let total = self.page_count();
        for &page in pages {
            if page == 0 || page > total {
                anyhow::bail!("Page {} is out of range (1-{})", page, total);
            }
        }
        Ok(())
    }

    /// Keep only the given pages, in document order
    #[instrument(skip(self), fields(path = %self.path))]
    pub fn extract_pages(&self, pages: &[u32]) -> Result<Document> {
        self.check_pages(pages)?;

        let keep: HashSet<u32> = pages.iter().copied().collect();
        let pages_to_delete: Vec<u32> = self
            .page_ids()
            .into_iter()
            .map(|(num, _)| num)
            .filter(|num| !keep.contains(num))
            .collect();

        let mut new_doc = self.doc.clone();
        if !pages_to_delete.is_empty() {
            new_doc.delete_pages(&pages_to_delete);
            new_doc.prune_objects();
        }

        debug!(kept = keep.len(), "Extracted pages");
        Ok(new_doc)
    }

    /// Remove the given pages
    #[instrument(skip(self), fields(path = %self.path))]
    pub fn delete_pages(&self, pages: &[u32]) -> Result<Document> {
        self.check_pages(pages)?;

        let mut new_doc = self.doc.clone();
        new_doc.delete_pages(pages);
        new_doc.prune_objects();

        info!(deleted = pages.len(), "Deleted pages");
        Ok(new_doc)
    }

    /// Rebuild the page tree so that its pages follow `order`.
    ///
    /// The tree is flattened to a single level under the root Pages node.
    #[instrument(skip(self, order), fields(path = %self.path, pages = order.len()))]
    pub fn reorder_pages(&self, order: &[u32]) -> Result<Document> {
        self.check_pages(order)?;

        let pages = self.page_ids();
        let page_ids: Vec<ObjectId> = order
            .iter()
            .map(|&page| pages[(page - 1) as usize].1)
            .collect();

        let mut new_doc = self.doc.clone();
        let root_id = pages_root_id(&new_doc)?;
        for &page_id in &page_ids {
            inherit_attributes(&mut new_doc, page_id)?;
            new_doc
                .get_dictionary_mut(page_id)
                .context("Page object is not a dictionary")?
                .set("Parent", Object::Reference(root_id));
        }

        let root = new_doc
            .get_dictionary_mut(root_id)
            .context("Page tree root is not a dictionary")?;
        root.set(
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        );
        root.set("Count", Object::Integer(page_ids.len() as i64));

        new_doc.prune_objects();
        info!("Reordered pages");
        Ok(new_doc)
    }

    /// Set each instructed page's `/Rotate` to its absolute angle
    #[instrument(skip(self, rotations), fields(path = %self.path, pages = rotations.len()))]
    pub fn rotate_pages(&self, rotations: &[RotationInstruction]) -> Result<Document> {
        let targets: Vec<u32> = rotations.iter().map(|r| r.page).collect();
        self.check_pages(&targets)?;

        let mut new_doc = self.doc.clone();
        let pages = new_doc.get_pages();
        for instruction in rotations {
            let page_id = pages[&instruction.page];
            new_doc
                .get_dictionary_mut(page_id)
                .context("Page object is not a dictionary")?
                .set("Rotate", Object::Integer(i64::from(instruction.rotation)));
            debug!(
                page = instruction.page,
                rotation = instruction.rotation,
                "Page rotated"
            );
        }

        info!("Rotated pages");
        Ok(new_doc)
    }

    /// Append the pages of every document after the first onto the first
    pub fn merge(documents: Vec<PdfDocument>) -> Result<Document> {
        let mut documents = documents.into_iter();
        let first = match documents.next() {
            Some(first) => first,
            None => anyhow::bail!("No input files specified"),
        };

        let mut merged = first.doc;
        let root_id = pages_root_id(&merged)?;

        for source in documents {
            let mut doc = source.doc;
            doc.renumber_objects_with(merged.max_id + 1);

            let mut page_ids: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
            page_ids.sort_by_key(|(num, _)| *num);
            for &(_, page_id) in &page_ids {
                inherit_attributes(&mut doc, page_id)
                    .with_context(|| format!("Failed to prepare pages of {}", source.path))?;
            }

            merged.max_id = merged.max_id.max(doc.max_id);
            merged.objects.extend(doc.objects);

            for &(_, page_id) in &page_ids {
                merged
                    .get_dictionary_mut(page_id)
                    .context("Page object is not a dictionary")?
                    .set("Parent", Object::Reference(root_id));
            }

            let root = merged
                .get_dictionary_mut(root_id)
                .context("Page tree root is not a dictionary")?;
            let kids = root
                .get_mut(b"Kids")
                .and_then(Object::as_array_mut)
                .context("Page tree root has no Kids array")?;
            kids.extend(page_ids.iter().map(|&(_, id)| Object::Reference(id)));
            let count = root.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
            root.set("Count", Object::Integer(count + page_ids.len() as i64));

            debug!(source = %source.path, pages = page_ids.len(), "Appended document");
        }

        merged.prune_objects();
        Ok(merged)
    }

    /// Save to a file
    pub fn save<P: AsRef<Path>>(doc: &mut Document, path: P) -> Result<()> {
        let bytes = Self::to_bytes(doc)?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to save PDF: {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn to_bytes(doc: &mut Document) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).context("Failed to serialize PDF")?;
        Ok(buffer)
    }
}

fn pages_root_id(doc: &Document) -> Result<ObjectId> {
    doc.catalog()
        .context("Failed to get document catalog")?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .context("Document catalog has no Pages reference")
}

/// Copy attributes a page inherits from its ancestors onto the page itself,
/// so it keeps them when re-parented.
fn inherit_attributes(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let page = doc
        .get_dictionary(page_id)
        .context("Page object is not a dictionary")?;

    let mut missing: Vec<&[u8]> = INHERITABLE
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    let mut inherited: Vec<(&[u8], Object)> = Vec::new();
    let mut visited = HashSet::from([page_id]);
    let mut parent = parent_of(page);

    while let Some(parent_id) = parent {
        if missing.is_empty() || !visited.insert(parent_id) {
            break;
        }
        let Ok(node) = doc.get_dictionary(parent_id) else {
            break;
        };
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                inherited.push((*key, value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = parent_of(node);
    }

    if !inherited.is_empty() {
        let page = doc
            .get_dictionary_mut(page_id)
            .context("Page object is not a dictionary")?;
        for (key, value) in inherited {
            page.set(key.to_vec(), value);
        }
    }
    Ok(())
}

fn parent_of(node: &Dictionary) -> Option<ObjectId> {
    node.get(b"Parent").and_then(Object::as_reference).ok()
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub version: String,
    pub page_count: u32,
}

fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    // UTF-16BE with BOM, otherwise treat as PDFDocEncoding (Latin-1 subset)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let u16_chars: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        String::from_utf16(&u16_chars).ok()
    } else {
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}

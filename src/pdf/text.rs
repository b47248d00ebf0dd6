use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct PageText {
    pub page: u32,
    pub text: String,
}

fn read_pdf(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read PDF: {}", path.display()))
}

/// Extract text from all pages of a PDF
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let bytes = read_pdf(path)?;

    pdf_extract::extract_text_from_mem(&bytes)
        .with_context(|| format!("Failed to extract text from PDF: {}", path.display()))
}

/// Extract text from specific pages of a PDF
pub fn extract_text_pages<P: AsRef<Path>>(path: P, pages: &[u32]) -> Result<Vec<PageText>> {
    let path = path.as_ref();
    let bytes = read_pdf(path)?;

    let page_texts = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .with_context(|| format!("Failed to extract text from PDF: {}", path.display()))?;
    let total_pages = page_texts.len() as u32;
    debug!(path = %path.display(), pages = total_pages, "Extracted text by page");

    pages
        .iter()
        .map(|&page| {
            if page == 0 || page > total_pages {
                anyhow::bail!("Page {} is out of range (1-{})", page, total_pages);
            }
            Ok(PageText {
                page,
                text: page_texts[(page - 1) as usize].clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::tests::create_test_pdf;

    fn write_fixture(dir: &Path, pages: u32) -> std::path::PathBuf {
        let path = dir.join("doc.pdf");
        std::fs::write(&path, create_test_pdf(pages, false)).unwrap();
        path
    }

    #[test]
    fn test_extract_text_pages_indexes_each_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), 3);

        let pages = extract_text_pages(&path, &[3, 2]).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page, 3);
        assert!(pages[0].text.contains("Page 3"));
        assert!(!pages[0].text.contains("Page 2"));
        assert_eq!(pages[1].page, 2);
        assert!(pages[1].text.contains("Page 2"));
        assert!(!pages[1].text.contains("Page 1"));
    }

    #[test]
    fn test_extract_text_pages_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), 2);

        let err = extract_text_pages(&path, &[3]).unwrap_err();
        assert_eq!(err.to_string(), "Page 3 is out of range (1-2)");
    }

    #[test]
    fn test_extract_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), 2);

        let text = extract_text(&path).unwrap();
        assert!(text.contains("Page 1"));
        assert!(text.contains("Page 2"));
    }
}

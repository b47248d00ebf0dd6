use crate::page_range::{parse_pages_to_delete, retained_pages};
use crate::pdf::PdfDocument;
use anyhow::Result;
use std::path::Path;
use tracing::debug;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, pages: &str, output: Q) -> Result<()> {
    let doc = PdfDocument::open(&input)?;
    let total_pages = doc.page_count();

    let to_delete = parse_pages_to_delete(pages, total_pages)?;
    let kept = retained_pages(&to_delete, total_pages)?;
    debug!(?to_delete, kept = kept.len(), "Resolved deletion");

    let mut new_doc = doc.delete_pages(&to_delete)?;
    PdfDocument::save(&mut new_doc, &output)?;

    println!(
        "Deleted {} page(s), {} remaining, saved to {}",
        to_delete.len(),
        kept.len(),
        output.as_ref().display()
    );

    Ok(())
}

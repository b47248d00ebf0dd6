use crate::page_range::parse_ranges;
use crate::pdf::text::{extract_text, extract_text_pages};
use crate::pdf::PdfDocument;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P, pages: Option<&str>) -> Result<()> {
    let Some(pages) = pages else {
        println!("{}", extract_text(&path)?);
        return Ok(());
    };

    let total = PdfDocument::open(&path)?.page_count();
    let page_list: Vec<u32> = parse_ranges(pages, total)
        .iter()
        .flat_map(|range| range.pages())
        .collect();

    for page_text in extract_text_pages(&path, &page_list)? {
        println!("--- Page {} ---", page_text.page);
        println!("{}", page_text.text);
        println!();
    }

    Ok(())
}

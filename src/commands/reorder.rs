use crate::page_range::normalize_page_order;
use crate::pdf::PdfDocument;
use anyhow::Result;
use serde_json::Value;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, order: &str, output: Q) -> Result<()> {
    let doc = PdfDocument::open(&input)?;

    let order = normalize_page_order(Some(&order_value(order)), doc.page_count())?;

    let mut new_doc = doc.reorder_pages(&order)?;
    PdfDocument::save(&mut new_doc, &output)?;

    println!(
        "Reordered {} page(s), saved to {}",
        order.len(),
        output.as_ref().display()
    );

    Ok(())
}

/// Comma-separated entries, left as strings for the order validator to coerce
fn order_value(order: &str) -> Value {
    if order.trim().is_empty() {
        return Value::Array(Vec::new());
    }
    Value::Array(
        order
            .split(',')
            .map(|entry| Value::String(entry.to_string()))
            .collect(),
    )
}

use crate::page_range::normalize_rotation_instructions;
use crate::pdf::PdfDocument;
use anyhow::Result;
use serde_json::{json, Value};
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    rotations: &[String],
    output: Q,
) -> Result<()> {
    let doc = PdfDocument::open(&input)?;

    let instructions =
        normalize_rotation_instructions(Some(&rotations_value(rotations)), doc.page_count())?;

    let mut new_doc = doc.rotate_pages(&instructions)?;
    PdfDocument::save(&mut new_doc, &output)?;

    for r in &instructions {
        println!("p{}: {}°", r.page, r.rotation);
    }
    println!(
        "Rotated {} page(s), saved to {}",
        instructions.len(),
        output.as_ref().display()
    );

    Ok(())
}

/// Turn `PAGE:DEGREES` arguments into `{page, rotation}` entries.
///
/// An argument without a colon yields an entry with no rotation, which the
/// normalizer rejects as invalid.
fn rotations_value(rotations: &[String]) -> Value {
    Value::Array(
        rotations
            .iter()
            .map(|arg| match arg.split_once(':') {
                Some((page, degrees)) => json!({ "page": page, "rotation": degrees }),
                None => json!({ "page": arg }),
            })
            .collect(),
    )
}

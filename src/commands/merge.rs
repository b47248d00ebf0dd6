use crate::pdf::PdfDocument;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(inputs: &[P], output: Q) -> Result<()> {
    let files = collect_inputs(inputs)?;
    if files.is_empty() {
        anyhow::bail!("No input files specified");
    }

    if files.len() == 1 {
        // Just copy the single file
        std::fs::copy(&files[0], &output).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                files[0].display(),
                output.as_ref().display()
            )
        })?;
        println!("Copied 1 file to {}", output.as_ref().display());
        return Ok(());
    }

    let documents = files
        .iter()
        .map(PdfDocument::open)
        .collect::<Result<Vec<_>>>()?;

    let mut merged = PdfDocument::merge(documents)?;
    let total_pages = merged.get_pages().len();
    PdfDocument::save(&mut merged, &output)?;

    println!(
        "Merged {} files ({} pages) into {}",
        files.len(),
        total_pages,
        output.as_ref().display()
    );

    Ok(())
}

/// Expand directories into the PDFs they contain, sorted by path
pub fn collect_inputs<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if !input.is_dir() {
            files.push(input.to_path_buf());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input).follow_links(true) {
            let entry =
                entry.with_context(|| format!("Failed to read directory: {}", input.display()))?;
            let is_pdf = entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            if entry.file_type().is_file() && is_pdf {
                found.push(entry.into_path());
            }
        }
        found.sort();
        debug!(dir = %input.display(), files = found.len(), "Collected PDFs");
        files.extend(found);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::tests::{create_test_pdf, page_markers};

    #[test]
    fn test_collect_inputs_expands_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("b.pdf"), b"").unwrap();
        std::fs::write(dir.join("a.PDF"), b"").unwrap();
        std::fs::write(dir.join("notes.txt"), b"").unwrap();
        std::fs::write(dir.join("nested").join("c.pdf"), b"").unwrap();

        let files = collect_inputs(&[dir.clone(), PathBuf::from("extra.pdf")]).unwrap();
        assert_eq!(
            files,
            vec![
                dir.join("a.PDF"),
                dir.join("b.pdf"),
                dir.join("nested").join("c.pdf"),
                PathBuf::from("extra.pdf"),
            ]
        );
    }

    #[test]
    fn test_merge_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        std::fs::write(dir.join("1.pdf"), create_test_pdf(2, false)).unwrap();
        std::fs::write(dir.join("2.pdf"), create_test_pdf(1, false)).unwrap();
        let output = dir.join("merged.out");

        run(&[dir.clone()], &output).unwrap();

        let merged = lopdf::Document::load(&output).unwrap();
        assert_eq!(page_markers(&merged), vec![1, 2, 1]);
    }
}

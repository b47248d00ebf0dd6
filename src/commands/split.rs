use crate::page_range::{parse_ranges, PageRange};
use crate::pdf::PdfDocument;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct SplitPart {
    pub path: PathBuf,
    pub start: u32,
    pub end: u32,
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, ranges: &str, output_dir: Q) -> Result<()> {
    let parts = split_file(&input, ranges, &output_dir)?;

    println!(
        "Split {} into {} file(s) in {}",
        input.as_ref().display(),
        parts.len(),
        output_dir.as_ref().display()
    );

    Ok(())
}

/// Write one PDF per range in `ranges` into `output_dir`
pub fn split_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    ranges: &str,
    output_dir: Q,
) -> Result<Vec<SplitPart>> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();

    let doc = PdfDocument::open(input)?;
    let total_pages = doc.page_count();
    if total_pages == 0 {
        anyhow::bail!("{} has no pages", input.display());
    }

    // Create output directory if it doesn't exist
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("page");

    let mut parts = Vec::new();
    for (index, range) in parse_ranges(ranges, total_pages).iter().enumerate() {
        let path = output_path(output_dir, stem, index + 1, range);
        let pages: Vec<u32> = range.pages().collect();

        let mut new_doc = doc.extract_pages(&pages)?;
        PdfDocument::save(&mut new_doc, &path)?;
        info!(output = %path.display(), pages = range.page_count(), "Wrote part");

        parts.push(SplitPart {
            path,
            start: range.start,
            end: range.end,
        });
    }

    Ok(parts)
}

fn output_path(dir: &Path, stem: &str, index: usize, range: &PageRange) -> PathBuf {
    let name = if range.start == range.end {
        format!("{}_{:03}_p{}.pdf", stem, index, range.start)
    } else {
        format!("{}_{:03}_p{}-{}.pdf", stem, index, range.start, range.end)
    };
    dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::tests::{create_test_pdf, page_markers};

    #[test]
    fn test_output_path_names() {
        let dir = Path::new("out");
        assert_eq!(
            output_path(dir, "report", 1, &PageRange { start: 3, end: 3 }),
            dir.join("report_001_p3.pdf")
        );
        assert_eq!(
            output_path(dir, "report", 12, &PageRange { start: 2, end: 5 }),
            dir.join("report_012_p2-5.pdf")
        );
    }

    #[test]
    fn test_split_file_writes_each_range() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let input = dir.join("doc.pdf");
        std::fs::write(&input, create_test_pdf(5, false)).unwrap();

        let parts = split_file(&input, "4-2, 5, bogus", dir.join("parts")).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!((parts[0].start, parts[0].end), (2, 4));
        assert_eq!(parts[1].path, dir.join("parts").join("doc_002_p5.pdf"));

        let first = lopdf::Document::load(&parts[0].path).unwrap();
        assert_eq!(page_markers(&first), vec![2, 3, 4]);
    }

    #[test]
    fn test_split_file_defaults_to_every_page() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let input = dir.join("doc.pdf");
        std::fs::write(&input, create_test_pdf(3, true)).unwrap();

        let parts = split_file(&input, "", dir).unwrap();
        assert_eq!(parts.len(), 3);
        for (i, part) in parts.iter().enumerate() {
            let doc = lopdf::Document::load(&part.path).unwrap();
            assert_eq!(page_markers(&doc), vec![i as i64 + 1]);
        }
    }
}

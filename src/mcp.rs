use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::commands::merge::collect_inputs;
use crate::commands::split::split_file;
use crate::page_range::{
    normalize_page_order, normalize_rotation_instructions, parse_pages_to_delete, parse_ranges,
    retained_pages, RotationInstruction,
};
use crate::pdf::text::{extract_text, extract_text_pages, PageText};
use crate::pdf::{document::PdfInfo, PdfDocument};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(
        description = "Page ranges such as '1-3,5,7'. Empty or unusable input splits every page into its own file"
    )]
    #[serde(default)]
    pub ranges: String,
    #[schemars(description = "Directory to write the parts into")]
    pub output_dir: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfDeleteRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Pages to delete, e.g. '2-4,6'. At least one page must remain")]
    pub pages: String,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfReorderRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(
        description = "New page sequence as an array of 1-based page numbers listing every page exactly once, e.g. [3, 1, 2]"
    )]
    pub order: Option<Value>,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfRotateRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(
        description = "Array of {page, rotation} objects. Rotation is an absolute angle in degrees and must be a multiple of 90; the last entry for a page wins"
    )]
    pub rotations: Option<Value>,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfMergeRequest {
    #[schemars(description = "PDF files or directories of PDFs, in merge order")]
    pub inputs: Vec<String>,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfTextRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Optional page ranges such as '1-5,10'. Omit for the whole document")]
    pub pages: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a tool outcome as pretty JSON, or as an `Error: ...` line
fn respond<T: Serialize>(tool: &str, result: Result<T>) -> String {
    match result {
        Ok(value) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("Error: {}", e))
        }
        Err(e) => {
            warn!(tool, error = %e, "Tool call failed");
            format!("Error: {:#}", e)
        }
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get PDF metadata including title, author, creator, producer, creation date, PDF version and page count")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        respond(
            "pdf_info",
            PdfDocument::open(&path).map(|doc| PdfInfoResult {
                path,
                info: doc.get_info(),
            }),
        )
    }

    #[tool(description = "Split a PDF into one file per page range. Malformed ranges are skipped; out-of-bounds pages are clamped")]
    fn pdf_split(&self, Parameters(req): Parameters<PdfSplitRequest>) -> String {
        respond(
            "pdf_split",
            split_file(&req.path, &req.ranges, &req.output_dir),
        )
    }

    #[tool(description = "Delete pages from a PDF and save the result to a new file")]
    fn pdf_delete_pages(&self, Parameters(req): Parameters<PdfDeleteRequest>) -> String {
        respond("pdf_delete_pages", delete_pages(req))
    }

    #[tool(description = "Reorder the pages of a PDF. The order must be a permutation of all pages")]
    fn pdf_reorder_pages(&self, Parameters(req): Parameters<PdfReorderRequest>) -> String {
        respond("pdf_reorder_pages", reorder_pages(req))
    }

    #[tool(description = "Set absolute page rotations (0, 90, 180 or 270 degrees) in a PDF")]
    fn pdf_rotate_pages(&self, Parameters(req): Parameters<PdfRotateRequest>) -> String {
        respond("pdf_rotate_pages", rotate_pages(req))
    }

    #[tool(description = "Combine several PDFs, or directories of PDFs, into one file")]
    fn pdf_merge(&self, Parameters(req): Parameters<PdfMergeRequest>) -> String {
        respond("pdf_merge", merge(req))
    }

    #[tool(description = "Extract text from a PDF, optionally restricted to page ranges like '1-5,10'")]
    fn pdf_extract_text(&self, Parameters(req): Parameters<PdfTextRequest>) -> String {
        respond("pdf_extract_text", extract(req))
    }
}

fn delete_pages(req: PdfDeleteRequest) -> Result<EditResult> {
    let doc = PdfDocument::open(&req.path)?;
    let total = doc.page_count();

    let to_delete = parse_pages_to_delete(&req.pages, total)?;
    let kept = retained_pages(&to_delete, total)?;

    let mut new_doc = doc.delete_pages(&to_delete)?;
    PdfDocument::save(&mut new_doc, &req.output)?;
    info!(output = %req.output, deleted = to_delete.len(), "Deleted pages");

    Ok(EditResult {
        output_path: req.output,
        page_count: kept.len() as u32,
        pages: to_delete,
        rotations: Vec::new(),
    })
}

fn reorder_pages(req: PdfReorderRequest) -> Result<EditResult> {
    let doc = PdfDocument::open(&req.path)?;
    let order = normalize_page_order(req.order.as_ref(), doc.page_count())?;

    let mut new_doc = doc.reorder_pages(&order)?;
    PdfDocument::save(&mut new_doc, &req.output)?;

    Ok(EditResult {
        output_path: req.output,
        page_count: order.len() as u32,
        pages: order,
        rotations: Vec::new(),
    })
}

fn rotate_pages(req: PdfRotateRequest) -> Result<EditResult> {
    let doc = PdfDocument::open(&req.path)?;
    let total = doc.page_count();
    let rotations = normalize_rotation_instructions(req.rotations.as_ref(), total)?;

    let mut new_doc = doc.rotate_pages(&rotations)?;
    PdfDocument::save(&mut new_doc, &req.output)?;

    Ok(EditResult {
        output_path: req.output,
        page_count: total,
        pages: rotations.iter().map(|r| r.page).collect(),
        rotations,
    })
}

fn merge(req: PdfMergeRequest) -> Result<EditResult> {
    let files = collect_inputs(&req.inputs)?;
    let documents = files
        .iter()
        .map(PdfDocument::open)
        .collect::<Result<Vec<_>>>()?;

    let mut merged = PdfDocument::merge(documents)?;
    PdfDocument::save(&mut merged, &req.output)?;

    Ok(EditResult {
        output_path: req.output,
        page_count: merged.get_pages().len() as u32,
        pages: Vec::new(),
        rotations: Vec::new(),
    })
}

fn extract(req: PdfTextRequest) -> Result<TextResult> {
    let Some(pages) = req.pages else {
        return Ok(TextResult::Document {
            text: extract_text(&req.path)?,
        });
    };

    let total = PdfDocument::open(&req.path)?.page_count();
    let page_list: Vec<u32> = parse_ranges(&pages, total)
        .iter()
        .flat_map(|range| range.pages())
        .collect();
    extract_text_pages(&req.path, &page_list).map(TextResult::Pages)
}

// Result types for MCP tools

#[derive(Debug, Serialize)]
pub struct PdfInfoResult {
    pub path: String,
    #[serde(flatten)]
    pub info: PdfInfo,
}

#[derive(Debug, Serialize)]
pub struct EditResult {
    pub output_path: String,
    /// Page count of the written document
    pub page_count: u32,
    /// Pages the operation acted on, in the order it used them
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rotations: Vec<RotationInstruction>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TextResult {
    Document { text: String },
    Pages(Vec<PageText>),
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF page tools. Use pdf_info for metadata and page count, pdf_split to cut a \
                 document into page ranges, pdf_delete_pages, pdf_reorder_pages and \
                 pdf_rotate_pages to edit pages, pdf_merge to combine files, and \
                 pdf_extract_text to read text."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();
    info!("Starting MCP server on stdio");

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::tests::{create_test_pdf, page_markers};
    use serde_json::json;

    fn fixture(pages: u32) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, create_test_pdf(pages, false)).unwrap();
        (dir, input.display().to_string())
    }

    #[test]
    fn test_reorder_tool() {
        let (dir, path) = fixture(3);
        let output = dir.path().join("out.pdf").display().to_string();
        let server = PdfServer::new();

        let response = server.pdf_reorder_pages(Parameters(PdfReorderRequest {
            path,
            order: Some(json!(["3", 1, 2])),
            output: output.clone(),
        }));
        let parsed: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed["pages"], json!([3, 1, 2]));

        let doc = lopdf::Document::load(&output).unwrap();
        assert_eq!(page_markers(&doc), vec![3, 1, 2]);
    }

    #[test]
    fn test_delete_all_pages_is_reported() {
        let (dir, path) = fixture(2);
        let server = PdfServer::new();

        let response = server.pdf_delete_pages(Parameters(PdfDeleteRequest {
            path,
            pages: "1-2".to_string(),
            output: dir.path().join("out.pdf").display().to_string(),
        }));
        assert_eq!(response, "Error: You cannot delete all pages of the document");
    }

    #[test]
    fn test_rotate_tool_rejects_missing_rotations() {
        let (dir, path) = fixture(2);
        let server = PdfServer::new();

        let response = server.pdf_rotate_pages(Parameters(PdfRotateRequest {
            path,
            rotations: None,
            output: dir.path().join("out.pdf").display().to_string(),
        }));
        assert_eq!(response, "Error: No rotations were provided");
    }

    #[test]
    fn test_rotate_tool() {
        let (dir, path) = fixture(2);
        let server = PdfServer::new();

        let response = server.pdf_rotate_pages(Parameters(PdfRotateRequest {
            path,
            rotations: Some(json!([{"page": 2, "rotation": 450}])),
            output: dir.path().join("out.pdf").display().to_string(),
        }));
        let parsed: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed["rotations"], json!([{"page": 2, "rotation": 90}]));
        assert_eq!(parsed["page_count"], json!(2));
    }

    #[test]
    fn test_errors_include_cause_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();
        let server = PdfServer::new();

        let response = server.pdf_info(Parameters(PathRequest {
            path: path.display().to_string(),
        }));
        assert!(response.starts_with("Error: Failed to open PDF: "));
        assert!(response.contains(": Failed to parse PDF"));
    }
}

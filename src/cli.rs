use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagesmith")]
#[command(about = "PDF page splitting, deletion, reordering and rotation with MCP server support")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server over stdio
    Mcp,

    /// Display PDF metadata
    Info {
        /// PDF file to inspect
        path: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Split a PDF into one file per page range
    #[command(alias = "burst")]
    Split {
        /// PDF file to split
        path: PathBuf,

        /// Page ranges (e.g., "1-3,5,7"); defaults to one file per page
        #[arg(short, long, default_value = "")]
        ranges: String,

        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// Remove pages from a PDF
    #[command(alias = "rm")]
    Delete {
        /// PDF file to edit
        path: PathBuf,

        /// Pages to delete (e.g., "2-4,6")
        pages: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Rearrange the pages of a PDF
    Reorder {
        /// PDF file to edit
        path: PathBuf,

        /// New page sequence listing every page once (e.g., "3,1,2")
        order: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Set page rotations
    Rotate {
        /// PDF file to edit
        path: PathBuf,

        /// PAGE:DEGREES instruction; later instructions for a page win
        #[arg(short, long = "rotation", value_name = "PAGE:DEGREES", required = true)]
        rotations: Vec<String>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Combine multiple PDFs into one
    Merge {
        /// PDF files, or directories whose PDFs are merged in name order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract text from a PDF
    Text {
        /// PDF file to read
        path: PathBuf,

        /// Page ranges (e.g., "1-5,10"); defaults to the whole document
        #[arg(short, long)]
        pages: Option<String>,
    },
}

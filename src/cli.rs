use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "md2notion")]
#[command(about = "Batch-import Markdown files (with LaTeX math) as Notion pages")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Markdown files to import
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Import every .md file in this directory (non-recursive)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Notion integration token (or set NOTION_TOKEN)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Parent page ID the new pages are created under (or set NOTION_PARENT_PAGE)
    #[arg(long, value_name = "PAGE_ID")]
    pub parent: Option<String>,

    /// Convert locally and write block JSON instead of uploading
    #[arg(long)]
    pub convert_only: bool,

    /// Output directory for --convert-only
    #[arg(short, long, default_value = "./converted")]
    pub output: PathBuf,

    /// Probe the Notion API connection and exit
    #[arg(long)]
    pub test: bool,

    /// Convert and batch everything but issue no network calls
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

//! # md2notion
//!
//! A library for converting Markdown documents (including LaTeX math) into
//! Notion API block records and uploading them in rate-limited batches.
//! Supports upload, dry-run, and local convert-only modes.
//!
//! ## Example Usage
//!
//! ```rust
//! use md2notion::{Batcher, BlockBuilder, BlockParser, MAX_BLOCKS_PER_REQUEST};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let parser = BlockParser::new();
//!     let blocks = parser.parse("# Notes\n\nSome **bold** text.\n\n$$\nE = mc^2\n$$")?;
//!
//!     // Map to Notion block records
//!     let records = BlockBuilder::build(&blocks);
//!
//!     // Partition into request-sized batches
//!     let batches = Batcher::split(records, MAX_BLOCKS_PER_REQUEST)?;
//!
//!     println!("{} batches ready to upload", batches.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod services;
pub mod types;

// Re-export main types and services for easier usage
pub use error::{Md2NotionError, Result};
pub use services::{
    with_retries, Batcher, BlockBuilder, BlockParser, InlineFormatter, NotionClient, Pipeline,
    RetryPolicy, RunMode,
};
pub use types::{
    Block, DocumentResult, MarkdownDocument, RunSummary, TextSpan, UploadConfig, UploadOutcome,
    MAX_BLOCKS_PER_REQUEST, MAX_RICH_TEXT_ELEMENTS, MAX_TEXT_LENGTH,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

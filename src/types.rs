use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Notion rejects requests with more than 100 children blocks.
pub const MAX_BLOCKS_PER_REQUEST: usize = 100;
/// A single rich_text element holds at most 2000 characters.
pub const MAX_TEXT_LENGTH: usize = 2000;
/// A single block holds at most 100 rich_text elements.
pub const MAX_RICH_TEXT_ELEMENTS: usize = 100;

/// One styled run of text inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub content: String,
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub link: Option<String>,
    /// Inline math span; content is the raw LaTeX expression.
    pub equation: bool,
}

impl TextSpan {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            bold: false,
            italic: false,
            code: false,
            link: None,
            equation: false,
        }
    }

    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.code && !self.equation && self.link.is_none()
    }
}

/// One structural unit of a parsed document. Blocks are leaves; nested
/// lists and quotes are out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    Heading { level: u8, spans: Vec<TextSpan> },
    Paragraph { spans: Vec<TextSpan> },
    BulletItem { spans: Vec<TextSpan> },
    NumberedItem { spans: Vec<TextSpan> },
    Quote { spans: Vec<TextSpan> },
    CodeBlock { language: String, text: String },
    Divider,
    EquationBlock { expression: String },
}

/// A parsed source file. `source` is the originating file name and is used
/// only for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownDocument {
    pub source: String,
    pub blocks: Vec<Block>,
}

/// Per-document outcome of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub enum UploadOutcome {
    Succeeded { blocks: usize },
    Failed { reason: String },
    DryRun { blocks: usize },
    ConvertedOnly { path: PathBuf },
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentResult {
    pub source: String,
    pub title: String,
    pub outcome: UploadOutcome,
}

impl DocumentResult {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, UploadOutcome::Failed { .. })
    }
}

/// Aggregated counts across a run; the CLI derives the exit code from
/// `failed`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub dry_run: usize,
    pub converted: usize,
}

impl RunSummary {
    pub fn record(&mut self, result: &DocumentResult) {
        match result.outcome {
            UploadOutcome::Succeeded { .. } => self.succeeded += 1,
            UploadOutcome::Failed { .. } => self.failed += 1,
            UploadOutcome::DryRun { .. } => self.dry_run += 1,
            UploadOutcome::ConvertedOnly { .. } => self.converted += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.dry_run + self.converted
    }
}

/// Tunables for the upload driver. Tests override the delays with zero so
/// retry behavior can be exercised without wall-clock sleeps.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Blocks per append request; must be in 1..=100.
    pub batch_limit: usize,
    /// Unconditional pause between consecutive requests (~3 req/s limit).
    pub request_delay: Duration,
    /// Pause between documents when uploading more than one.
    pub document_delay: Duration,
    /// Retries after the first attempt for 429/5xx/connection failures.
    pub max_retries: u32,
    /// Base backoff, doubled on each retry.
    pub retry_backoff: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            batch_limit: MAX_BLOCKS_PER_REQUEST,
            request_delay: Duration::from_millis(350),
            document_delay: Duration::from_millis(500),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
        }
    }
}

use crate::error::{Md2NotionError, Result};
use crate::services::{Batcher, BlockBuilder, BlockParser, NotionClient};
use crate::types::{
    DocumentResult, MarkdownDocument, RunSummary, UploadOutcome, MAX_BLOCKS_PER_REQUEST,
};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// What the pipeline does with a document after parse → build → batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Upload,
    DryRun,
    ConvertOnly,
}

/// Drives each document through parse → build → batch → (upload | dry-run
/// count | on-disk output). Documents are processed strictly one at a time;
/// a failure is recorded against its own document and never stops the run.
pub struct Pipeline {
    parser: BlockParser,
    title_pattern: Regex,
    mode: RunMode,
    client: Option<NotionClient>,
    parent_id: Option<String>,
    output_dir: PathBuf,
    batch_limit: usize,
    document_delay: Duration,
}

impl Pipeline {
    pub fn upload(client: NotionClient, parent_id: String) -> Self {
        let batch_limit = client.config().batch_limit;
        let document_delay = client.config().document_delay;
        Self {
            client: Some(client),
            parent_id: Some(parent_id),
            batch_limit,
            document_delay,
            ..Self::base(RunMode::Upload)
        }
    }

    pub fn dry_run() -> Self {
        Self::base(RunMode::DryRun)
    }

    pub fn convert_only(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            ..Self::base(RunMode::ConvertOnly)
        }
    }

    fn base(mode: RunMode) -> Self {
        Self {
            parser: BlockParser::new(),
            title_pattern: Regex::new(r"(?m)^#\s+(.+)$").unwrap(),
            mode,
            client: None,
            parent_id: None,
            output_dir: PathBuf::from("./converted"),
            batch_limit: MAX_BLOCKS_PER_REQUEST,
            document_delay: Duration::ZERO,
        }
    }

    pub async fn process_all(&self, paths: &[PathBuf]) -> (Vec<DocumentResult>, RunSummary) {
        let mut results = Vec::with_capacity(paths.len());
        let mut summary = RunSummary::default();

        for (idx, path) in paths.iter().enumerate() {
            info!("[{}/{}] Processing {}", idx + 1, paths.len(), path.display());
            let result = self.process_file(path).await;

            match &result.outcome {
                UploadOutcome::Succeeded { blocks } => {
                    info!("Uploaded '{}' ({} blocks)", result.title, blocks)
                }
                UploadOutcome::DryRun { blocks } => {
                    info!("Would upload '{}' ({} blocks)", result.title, blocks)
                }
                UploadOutcome::ConvertedOnly { path } => {
                    info!("Converted '{}' -> {}", result.title, path.display())
                }
                UploadOutcome::Failed { reason } => {
                    error!("Failed '{}': {}", result.source, reason)
                }
            }

            summary.record(&result);
            results.push(result);

            if self.mode == RunMode::Upload && idx + 1 < paths.len() {
                sleep(self.document_delay).await;
            }
        }

        (results, summary)
    }

    /// Always returns a result; errors become a `Failed` outcome so the
    /// remaining documents in the run are unaffected.
    pub async fn process_file(&self, path: &Path) -> DocumentResult {
        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        match self.run_document(path, &source).await {
            Ok(result) => result,
            Err(err) => DocumentResult {
                source: source.clone(),
                title: file_stem(path),
                outcome: UploadOutcome::Failed {
                    reason: err.to_string(),
                },
            },
        }
    }

    async fn run_document(&self, path: &Path, source: &str) -> Result<DocumentResult> {
        let text = fs::read_to_string(path).await?;
        let title = self.extract_title(&text, path);

        let document = MarkdownDocument {
            source: source.to_string(),
            blocks: self.parser.parse(&text)?,
        };
        let records = BlockBuilder::build(&document.blocks);

        let outcome = match self.mode {
            RunMode::ConvertOnly => {
                let output_path = self.write_converted(path, &records).await?;
                UploadOutcome::ConvertedOnly { path: output_path }
            }
            RunMode::DryRun => {
                let chunks = Batcher::split(records, self.batch_limit)?;
                let blocks: usize = chunks.iter().map(Vec::len).sum();
                UploadOutcome::DryRun { blocks }
            }
            RunMode::Upload => {
                if records.is_empty() {
                    // Nothing to send; an empty document is a reported no-op.
                    warn!("'{}' produced no blocks, skipping upload", source);
                    UploadOutcome::Succeeded { blocks: 0 }
                } else {
                    let blocks = self.upload_records(&title, records).await?;
                    UploadOutcome::Succeeded { blocks }
                }
            }
        };

        Ok(DocumentResult {
            source: source.to_string(),
            title,
            outcome,
        })
    }

    async fn upload_records(&self, title: &str, records: Vec<serde_json::Value>) -> Result<usize> {
        let client = self.client.as_ref().ok_or_else(|| Md2NotionError::Config {
            reason: "Upload mode requires a Notion client".to_string(),
        })?;
        let parent_id = self.parent_id.as_deref().ok_or_else(|| Md2NotionError::Config {
            reason: "Upload mode requires a parent page ID".to_string(),
        })?;

        let chunks = Batcher::split(records, self.batch_limit)?;
        let page_id = client.create_page(parent_id, title).await?;
        sleep(client.config().request_delay).await;
        client.append_batches(&page_id, &chunks).await
    }

    /// Deterministic, human-inspectable output: the block records the
    /// upload would send, pretty-printed as JSON next to the source name.
    async fn write_converted(&self, path: &Path, records: &[serde_json::Value]) -> Result<PathBuf> {
        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir).await.map_err(|e| {
                Md2NotionError::OutputDirectory {
                    reason: format!("Failed to create output directory: {}", e),
                }
            })?;
        }

        let output_path = self
            .output_dir
            .join(format!("{}.blocks.json", file_stem(path)));
        let json = serde_json::to_string_pretty(records).map_err(|e| {
            Md2NotionError::OutputDirectory {
                reason: format!("Failed to serialize block records: {}", e),
            }
        })?;

        fs::write(&output_path, json).await?;
        Ok(output_path)
    }

    /// The first `# ` heading names the page; files without one fall back
    /// to the file stem.
    fn extract_title(&self, text: &str, path: &Path) -> String {
        self.title_pattern
            .captures(text)
            .map(|caps| caps[1].trim().to_string())
            .unwrap_or_else(|| file_stem(path))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_temp(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn dry_run_counts_blocks_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(dir.path(), "note.md", "# T\n\none\n\ntwo\n\n- three");

        let result = Pipeline::dry_run().process_file(&path).await;
        assert_eq!(result.title, "T");
        match result.outcome {
            UploadOutcome::DryRun { blocks } => assert_eq!(blocks, 4),
            other => panic!("expected dry-run outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn convert_only_writes_deterministic_json() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let path = write_temp(dir.path(), "eq.md", "$$\nx^2\n$$");

        let pipeline = Pipeline::convert_only(out.path().to_path_buf());
        let first = pipeline.process_file(&path).await;
        let written = match first.outcome {
            UploadOutcome::ConvertedOnly { ref path } => path.clone(),
            ref other => panic!("expected converted outcome, got {:?}", other),
        };
        assert_eq!(written, out.path().join("eq.blocks.json"));

        let content = std::fs::read_to_string(&written).unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(records[0]["equation"]["expression"], "x^2");

        // Converting again produces byte-identical output.
        pipeline.process_file(&path).await;
        assert_eq!(std::fs::read_to_string(&written).unwrap(), content);
    }

    #[tokio::test]
    async fn parse_error_isolates_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_temp(dir.path(), "bad.md", "$$\nnever closed");
        let good = write_temp(dir.path(), "good.md", "fine");

        let pipeline = Pipeline::dry_run();
        let (results, summary) = pipeline.process_all(&[bad, good]).await;

        assert!(results[0].is_failure());
        match &results[0].outcome {
            UploadOutcome::Failed { reason } => assert!(reason.contains("math")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!results[1].is_failure());
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.dry_run, 1);
    }

    #[tokio::test]
    async fn missing_file_is_a_failed_outcome() {
        let result = Pipeline::dry_run()
            .process_file(Path::new("/nonexistent/never.md"))
            .await;
        assert!(result.is_failure());
    }

    #[tokio::test]
    async fn title_falls_back_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(dir.path(), "notes-03.md", "no heading here");
        let result = Pipeline::dry_run().process_file(&path).await;
        assert_eq!(result.title, "notes-03");
    }

    #[tokio::test]
    async fn empty_document_reports_zero_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(dir.path(), "empty.md", "\n\n");
        let result = Pipeline::dry_run().process_file(&path).await;
        match result.outcome {
            UploadOutcome::DryRun { blocks } => assert_eq!(blocks, 0),
            other => panic!("expected dry-run outcome, got {:?}", other),
        }
    }
}

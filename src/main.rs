mod cli;
mod error;
mod services;
mod types;

use clap::Parser;
use cli::Cli;
use error::{Md2NotionError, Result};
use services::{NotionClient, Pipeline};
use std::path::PathBuf;
use tracing::{error, info, Level};
use types::{DocumentResult, RunSummary, UploadConfig, UploadOutcome};
use walkdir::WalkDir;

const TOKEN_ENV: &str = "NOTION_TOKEN";
const PARENT_ENV: &str = "NOTION_PARENT_PAGE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match run(&cli).await {
        Ok(summary) if summary.failed > 0 => {
            error!("{}/{} documents failed", summary.failed, summary.total());
            std::process::exit(1);
        }
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Operation failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<RunSummary> {
    let token = cli
        .token
        .clone()
        .or_else(|| std::env::var(TOKEN_ENV).ok());
    let parent = cli
        .parent
        .clone()
        .or_else(|| std::env::var(PARENT_ENV).ok());

    if cli.test {
        let token = token.ok_or_else(|| missing_token_error())?;
        let client = NotionClient::new(token, UploadConfig::default())?;
        let name = client.test_connection().await?;
        info!("API connection OK, integration: {}", name);
        return Ok(RunSummary::default());
    }

    let files = collect_files(cli)?;
    info!("Found {} files to process", files.len());

    let pipeline = if cli.convert_only {
        Pipeline::convert_only(cli.output.clone())
    } else if cli.dry_run {
        info!("Dry run: nothing will be uploaded");
        Pipeline::dry_run()
    } else {
        let token = token.ok_or_else(|| missing_token_error())?;
        let parent = parent.ok_or_else(|| Md2NotionError::Config {
            reason: format!(
                "Missing parent page: pass --parent or set {}. \
                 The parent is the Notion page the imported pages are created under.",
                PARENT_ENV
            ),
        })?;

        let client = NotionClient::new(token, UploadConfig::default())?;
        let name = client.test_connection().await?;
        info!("Connected to Notion as integration '{}'", name);
        Pipeline::upload(client, parent)
    };

    let (results, summary) = pipeline.process_all(&files).await;
    print_summary(&results, &summary);
    Ok(summary)
}

fn missing_token_error() -> Md2NotionError {
    Md2NotionError::Config {
        reason: format!(
            "Missing Notion token: pass --token or set {}. \
             Create an integration at https://www.notion.so/my-integrations",
            TOKEN_ENV
        ),
    }
}

/// Positional files plus, when `--dir` is given, every `*.md` directly in
/// that directory in name order. Missing files are rejected up front so the
/// run never starts half-configured.
fn collect_files(cli: &Cli) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if let Some(dir) = &cli.dir {
        if !dir.is_dir() {
            return Err(Md2NotionError::FileNotFound {
                path: dir.display().to_string(),
            });
        }
        let mut from_dir: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
            .collect();
        from_dir.sort();
        files.extend(from_dir);
    }

    files.extend(cli.files.iter().cloned());

    for file in &files {
        if !file.is_file() {
            return Err(Md2NotionError::FileNotFound {
                path: file.display().to_string(),
            });
        }
    }

    if files.is_empty() {
        return Err(Md2NotionError::Config {
            reason: "No input files: pass FILE arguments or --dir <DIR>".to_string(),
        });
    }

    Ok(files)
}

fn print_summary(results: &[DocumentResult], summary: &RunSummary) {
    println!("\n=== Import Summary ===");
    for result in results {
        match &result.outcome {
            UploadOutcome::Succeeded { blocks } => {
                println!("  ok    {} ({} blocks)", result.title, blocks)
            }
            UploadOutcome::DryRun { blocks } => {
                println!("  dry   {} ({} blocks)", result.title, blocks)
            }
            UploadOutcome::ConvertedOnly { path } => {
                println!("  saved {} -> {}", result.title, path.display())
            }
            UploadOutcome::Failed { reason } => {
                println!("  FAIL  {}: {}", result.source, reason)
            }
        }
    }
    println!(
        "Succeeded: {} | Failed: {} | Dry-run: {} | Converted: {} | Total: {}",
        summary.succeeded,
        summary.failed,
        summary.dry_run,
        summary.converted,
        summary.total()
    );
}

pub mod batcher;
pub mod builder;
pub mod formatter;
pub mod parser;
pub mod pipeline;
pub mod uploader;

pub use batcher::Batcher;
pub use builder::BlockBuilder;
pub use formatter::InlineFormatter;
pub use parser::BlockParser;
pub use pipeline::{Pipeline, RunMode};
pub use uploader::{with_retries, NotionClient, RetryPolicy};

use crate::error::{Md2NotionError, Result};
use crate::types::MAX_BLOCKS_PER_REQUEST;
use serde_json::Value;

/// Partitions block records into request-sized chunks, preserving document
/// order. Concatenating the chunks in order reproduces the input exactly.
pub struct Batcher;

impl Batcher {
    pub fn split(records: Vec<Value>, limit: usize) -> Result<Vec<Vec<Value>>> {
        if limit == 0 || limit > MAX_BLOCKS_PER_REQUEST {
            return Err(Md2NotionError::Config {
                reason: format!(
                    "Batch limit must be between 1 and {}, got {}",
                    MAX_BLOCKS_PER_REQUEST, limit
                ),
            });
        }

        let mut chunks = Vec::with_capacity(records.len().div_ceil(limit));
        let mut iter = records.into_iter().peekable();
        while iter.peek().is_some() {
            chunks.push(iter.by_ref().take(limit).collect());
        }
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(n: usize) -> Vec<Value> {
        (0..n).map(|i| json!({ "index": i })).collect()
    }

    #[test]
    fn splits_250_blocks_into_100_100_50() {
        let chunks = Batcher::split(records(250), 100).unwrap();
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[test]
    fn exact_multiple_fills_every_chunk() {
        let chunks = Batcher::split(records(200), 100).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 100));
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(Batcher::split(Vec::new(), 100).unwrap().is_empty());
    }

    #[test]
    fn concatenated_chunks_reproduce_the_input() {
        let input = records(137);
        let chunks = Batcher::split(input.clone(), 25).unwrap();
        assert_eq!(chunks.len(), 6);
        let flattened: Vec<Value> = chunks.into_iter().flatten().collect();
        assert_eq!(flattened, input);
    }

    #[test]
    fn zero_limit_is_a_configuration_error() {
        let err = Batcher::split(records(5), 0).unwrap_err();
        assert!(matches!(err, Md2NotionError::Config { .. }));
    }

    #[test]
    fn limit_above_the_api_ceiling_is_rejected() {
        let err = Batcher::split(records(5), 101).unwrap_err();
        assert!(matches!(err, Md2NotionError::Config { .. }));
    }
}

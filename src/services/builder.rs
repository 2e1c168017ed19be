use crate::types::{Block, TextSpan, MAX_RICH_TEXT_ELEMENTS, MAX_TEXT_LENGTH};
use serde_json::{json, Map, Value};

/// Maps the closed [`Block`] enum onto Notion block objects. The mapping is
/// total: every variant has exactly one target shape, so adding a variant
/// fails to compile until it is handled here.
///
/// Two API limits are enforced during the mapping: rich_text content longer
/// than 2000 characters is chunked into multiple elements, and a block
/// carrying more than 100 rich_text elements is split into several blocks of
/// the same type.
pub struct BlockBuilder;

impl BlockBuilder {
    pub fn build(blocks: &[Block]) -> Vec<Value> {
        blocks
            .iter()
            .map(Self::record)
            .flat_map(Self::split_oversized)
            .collect()
    }

    fn record(block: &Block) -> Value {
        match block {
            Block::Heading { level, spans } => Self::tagged(
                &format!("heading_{}", level),
                json!({ "rich_text": Self::rich_text(spans) }),
            ),
            Block::Paragraph { spans } => Self::tagged(
                "paragraph",
                json!({ "rich_text": Self::rich_text(spans) }),
            ),
            Block::BulletItem { spans } => Self::tagged(
                "bulleted_list_item",
                json!({ "rich_text": Self::rich_text(spans) }),
            ),
            Block::NumberedItem { spans } => Self::tagged(
                "numbered_list_item",
                json!({ "rich_text": Self::rich_text(spans) }),
            ),
            Block::Quote { spans } => {
                Self::tagged("quote", json!({ "rich_text": Self::rich_text(spans) }))
            }
            Block::CodeBlock { language, text } => Self::tagged(
                "code",
                json!({
                    "rich_text": Self::text_elements(text, None, None),
                    "language": if language.is_empty() { "plain text" } else { language },
                }),
            ),
            Block::Divider => Self::tagged("divider", json!({})),
            Block::EquationBlock { expression } => {
                Self::tagged("equation", json!({ "expression": expression }))
            }
        }
    }

    fn tagged(kind: &str, payload: Value) -> Value {
        let mut record = Map::new();
        record.insert("type".to_string(), Value::String(kind.to_string()));
        record.insert(kind.to_string(), payload);
        Value::Object(record)
    }

    fn rich_text(spans: &[TextSpan]) -> Vec<Value> {
        spans.iter().flat_map(Self::span_elements).collect()
    }

    fn span_elements(span: &TextSpan) -> Vec<Value> {
        if span.equation {
            return vec![json!({
                "type": "equation",
                "equation": { "expression": span.content }
            })];
        }

        let mut annotations = Map::new();
        if span.bold {
            annotations.insert("bold".to_string(), Value::Bool(true));
        }
        if span.italic {
            annotations.insert("italic".to_string(), Value::Bool(true));
        }
        if span.code {
            annotations.insert("code".to_string(), Value::Bool(true));
        }
        let annotations = (!annotations.is_empty()).then(|| Value::Object(annotations));

        Self::text_elements(&span.content, annotations, span.link.as_deref())
    }

    fn text_elements(content: &str, annotations: Option<Value>, link: Option<&str>) -> Vec<Value> {
        Self::chunk_chars(content)
            .into_iter()
            .map(|chunk| {
                let mut text = json!({ "content": chunk });
                if let Some(url) = link {
                    text["link"] = json!({ "url": url });
                }
                let mut element = json!({ "type": "text", "text": text });
                if let Some(annotations) = &annotations {
                    element["annotations"] = annotations.clone();
                }
                element
            })
            .collect()
    }

    /// Splits on character (not byte) boundaries so multi-byte text cannot
    /// be cut mid-codepoint.
    fn chunk_chars(content: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut buf = String::new();
        let mut len = 0;

        for ch in content.chars() {
            buf.push(ch);
            len += 1;
            if len == MAX_TEXT_LENGTH {
                chunks.push(std::mem::take(&mut buf));
                len = 0;
            }
        }
        if !buf.is_empty() {
            chunks.push(buf);
        }
        chunks
    }

    fn split_oversized(record: Value) -> Vec<Value> {
        let Some(kind) = record
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            return vec![record];
        };
        let Some(elements) = record
            .get(&kind)
            .and_then(|payload| payload.get("rich_text"))
            .and_then(Value::as_array)
        else {
            return vec![record];
        };
        if elements.len() <= MAX_RICH_TEXT_ELEMENTS {
            return vec![record];
        }

        let elements = elements.clone();
        let payload = record
            .get(&kind)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        elements
            .chunks(MAX_RICH_TEXT_ELEMENTS)
            .map(|chunk| {
                let mut part = payload.clone();
                part.insert("rich_text".to_string(), Value::Array(chunk.to_vec()));
                Self::tagged(&kind, Value::Object(part))
            })
            .collect()
    }
}

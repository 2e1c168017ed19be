use crate::error::{Md2NotionError, Result};
use crate::services::InlineFormatter;
use crate::types::Block;
use regex::Regex;
use tracing::debug;

/// Line-oriented markdown parser producing the flat [`Block`] sequence.
///
/// Parsing is pure: the same input always yields the same blocks. The only
/// structural error is an unterminated `$$` region; a code fence left open
/// simply runs to the end of the document.
pub struct BlockParser {
    formatter: InlineFormatter,
    heading: Regex,
    divider: Regex,
    bullet: Regex,
    numbered: Regex,
    quote: Regex,
}

impl BlockParser {
    pub fn new() -> Self {
        Self {
            formatter: InlineFormatter::new(),
            heading: Regex::new(r"^(#{1,3})\s+(.+)$").unwrap(),
            divider: Regex::new(r"^(-{3,}|\*{3,}|_{3,})$").unwrap(),
            bullet: Regex::new(r"^[-*+]\s+(.*)$").unwrap(),
            numbered: Regex::new(r"^\d+\.\s+(.*)$").unwrap(),
            quote: Regex::new(r"^>\s?(.*)$").unwrap(),
        }
    }

    pub fn parse(&self, source: &str) -> Result<Vec<Block>> {
        let text = source.replace("\r\n", "\n");
        let lines: Vec<&str> = text.lines().collect();
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let stripped = lines[i].trim();

            if stripped.is_empty() {
                i += 1;
                continue;
            }

            if stripped.starts_with("$$") {
                i = self.parse_math(&lines, i, &mut blocks)?;
                continue;
            }

            if let Some(rest) = stripped.strip_prefix("```") {
                i = Self::parse_code_fence(&lines, i, rest.trim(), &mut blocks);
                continue;
            }

            if self.divider.is_match(stripped) {
                blocks.push(Block::Divider);
                i += 1;
                continue;
            }

            if let Some(caps) = self.heading.captures(stripped) {
                blocks.push(Block::Heading {
                    level: caps[1].len() as u8,
                    spans: self.formatter.format(&caps[2]),
                });
                i += 1;
                continue;
            }

            if stripped.starts_with('>') {
                i = self.parse_quote(&lines, i, &mut blocks);
                continue;
            }

            if let Some(caps) = self.bullet.captures(stripped) {
                blocks.push(Block::BulletItem {
                    spans: self.formatter.format(&caps[1]),
                });
                i += 1;
                continue;
            }

            if let Some(caps) = self.numbered.captures(stripped) {
                blocks.push(Block::NumberedItem {
                    spans: self.formatter.format(&caps[1]),
                });
                i += 1;
                continue;
            }

            i = self.parse_paragraph(&lines, i, &mut blocks);
        }

        debug!("Parsed {} blocks from {} lines", blocks.len(), lines.len());
        Ok(blocks)
    }

    /// `$$` math regions. Accepted forms, matching what real-world notes
    /// contain:
    ///   `$$expr$$` on one line, a standalone `$$` pair around verbatim
    ///   lines, an expression trailing the opening `$$`, and a closing `$$`
    ///   trailing the final expression line. A region with no closing `$$`
    ///   is a parse error.
    fn parse_math(&self, lines: &[&str], start: usize, blocks: &mut Vec<Block>) -> Result<usize> {
        let opener = lines[start].trim();
        let after_open = opener[2..].trim();

        // Single-line form: $$expr$$
        if let Some(inner) = after_open.strip_suffix("$$") {
            if !inner.trim().is_empty() {
                blocks.push(Block::EquationBlock {
                    expression: inner.trim().to_string(),
                });
                return Ok(start + 1);
            }
        }

        let mut expression_lines: Vec<&str> = Vec::new();
        if !after_open.is_empty() {
            expression_lines.push(after_open);
        }

        let mut i = start + 1;
        while i < lines.len() {
            let stripped = lines[i].trim();
            if stripped == "$$" {
                blocks.push(Block::EquationBlock {
                    expression: expression_lines.join("\n").trim().to_string(),
                });
                return Ok(i + 1);
            }
            if let Some(inner) = stripped.strip_suffix("$$") {
                if !inner.is_empty() {
                    expression_lines.push(inner.trim_end());
                    blocks.push(Block::EquationBlock {
                        expression: expression_lines.join("\n").trim().to_string(),
                    });
                    return Ok(i + 1);
                }
            }
            expression_lines.push(lines[i]);
            i += 1;
        }

        Err(Md2NotionError::UnterminatedMath { line: start + 1 })
    }

    fn parse_code_fence(
        lines: &[&str],
        start: usize,
        language: &str,
        blocks: &mut Vec<Block>,
    ) -> usize {
        let mut code_lines: Vec<&str> = Vec::new();
        let mut i = start + 1;

        while i < lines.len() && !lines[i].trim().starts_with("```") {
            code_lines.push(lines[i]);
            i += 1;
        }

        blocks.push(Block::CodeBlock {
            language: language.to_string(),
            text: code_lines.join("\n"),
        });

        // Skip the closing fence when present; an unclosed fence consumed
        // the rest of the document.
        if i < lines.len() {
            i += 1;
        }
        i
    }

    /// Consecutive `>` lines merge into one quote, joined with a line
    /// break. A blank line (or any non-quote line) terminates the quote.
    fn parse_quote(&self, lines: &[&str], start: usize, blocks: &mut Vec<Block>) -> usize {
        let mut quote_lines: Vec<String> = Vec::new();
        let mut i = start;

        while i < lines.len() {
            let stripped = lines[i].trim();
            match self.quote.captures(stripped) {
                Some(caps) => quote_lines.push(caps[1].to_string()),
                None => break,
            }
            i += 1;
        }

        blocks.push(Block::Quote {
            spans: self.formatter.format(&quote_lines.join("\n")),
        });
        i
    }

    fn parse_paragraph(&self, lines: &[&str], start: usize, blocks: &mut Vec<Block>) -> usize {
        let mut paragraph_lines = vec![lines[start].trim()];
        let mut i = start + 1;

        while i < lines.len() {
            let stripped = lines[i].trim();
            if stripped.is_empty() || self.starts_new_block(stripped) {
                break;
            }
            paragraph_lines.push(stripped);
            i += 1;
        }

        blocks.push(Block::Paragraph {
            spans: self.formatter.format(&paragraph_lines.join(" ")),
        });
        i
    }

    fn starts_new_block(&self, stripped: &str) -> bool {
        stripped.starts_with("$$")
            || stripped.starts_with("```")
            || stripped.starts_with('>')
            || self.divider.is_match(stripped)
            || self.heading.is_match(stripped)
            || self.bullet.is_match(stripped)
            || self.numbered.is_match(stripped)
    }
}

impl Default for BlockParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextSpan;

    fn parse(source: &str) -> Vec<Block> {
        BlockParser::new().parse(source).unwrap()
    }

    #[test]
    fn heading_and_bold_paragraph() {
        let blocks = parse("# Title\n\nSome **bold** text.");
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 1,
                spans: vec![TextSpan::plain("Title")]
            }
        );
        match &blocks[1] {
            Block::Paragraph { spans } => {
                assert_eq!(spans[0], TextSpan::plain("Some "));
                assert!(spans[1].bold);
                assert_eq!(spans[2], TextSpan::plain(" text."));
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn heading_levels() {
        let blocks = parse("# one\n## two\n### three\n#### four");
        assert_eq!(blocks[0], heading(1, "one"));
        assert_eq!(blocks[1], heading(2, "two"));
        assert_eq!(blocks[2], heading(3, "three"));
        // Only three heading levels exist; deeper markers read as text.
        assert!(matches!(blocks[3], Block::Paragraph { .. }));
    }

    fn heading(level: u8, text: &str) -> Block {
        Block::Heading {
            level,
            spans: vec![TextSpan::plain(text)],
        }
    }

    #[test]
    fn block_equation() {
        let blocks = parse("$$\nx^2+y^2=z^2\n$$");
        assert_eq!(
            blocks,
            vec![Block::EquationBlock {
                expression: "x^2+y^2=z^2".to_string()
            }]
        );
    }

    #[test]
    fn single_line_equation() {
        let blocks = parse("$$e^{i\\pi} = -1$$");
        assert_eq!(
            blocks,
            vec![Block::EquationBlock {
                expression: "e^{i\\pi} = -1".to_string()
            }]
        );
    }

    #[test]
    fn equation_with_trailing_close() {
        let blocks = parse("$$\na + b\nc + d$$\nafter");
        assert_eq!(
            blocks[0],
            Block::EquationBlock {
                expression: "a + b\nc + d".to_string()
            }
        );
        assert!(matches!(blocks[1], Block::Paragraph { .. }));
    }

    #[test]
    fn unterminated_math_is_an_error() {
        let err = BlockParser::new().parse("text\n\n$$\nx = y\n").unwrap_err();
        assert!(matches!(err, Md2NotionError::UnterminatedMath { line: 3 }));
    }

    #[test]
    fn code_fence_is_verbatim() {
        let blocks = parse("```rust\nlet x = **not bold**;\n\nlet y = 2;\n```");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: "rust".to_string(),
                text: "let x = **not bold**;\n\nlet y = 2;".to_string()
            }]
        );
    }

    #[test]
    fn unclosed_code_fence_runs_to_eof() {
        let blocks = parse("```\nline one\nline two");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: String::new(),
                text: "line one\nline two".to_string()
            }]
        );
    }

    #[test]
    fn dividers() {
        let blocks = parse("---\n\n***\n\n_____");
        assert_eq!(blocks, vec![Block::Divider, Block::Divider, Block::Divider]);
    }

    #[test]
    fn consecutive_quote_lines_merge() {
        let blocks = parse("> first\n> second\n\n> third");
        assert_eq!(blocks.len(), 2);
        match &blocks[0] {
            Block::Quote { spans } => {
                assert_eq!(spans[0].content, "first\nsecond");
            }
            other => panic!("expected quote, got {:?}", other),
        }
    }

    #[test]
    fn each_list_line_is_its_own_block() {
        let blocks = parse("- a\n* b\n+ c\n1. one\n2. two");
        assert_eq!(blocks.len(), 5);
        assert!(matches!(blocks[0], Block::BulletItem { .. }));
        assert!(matches!(blocks[2], Block::BulletItem { .. }));
        assert!(matches!(blocks[3], Block::NumberedItem { .. }));
        match &blocks[4] {
            Block::NumberedItem { spans } => assert_eq!(spans[0].content, "two"),
            other => panic!("expected numbered item, got {:?}", other),
        }
    }

    #[test]
    fn paragraph_lines_merge_until_blank_or_block() {
        let blocks = parse("first line\nsecond line\n\nnext paragraph\n# done");
        assert_eq!(blocks.len(), 3);
        match &blocks[0] {
            Block::Paragraph { spans } => {
                assert_eq!(spans[0].content, "first line second line")
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
        assert!(matches!(blocks[2], Block::Heading { .. }));
    }

    #[test]
    fn blank_lines_collapse() {
        let blocks = parse("a\n\n\n\n\nb");
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn crlf_input_is_normalized() {
        assert_eq!(parse("# Title\r\n\r\nbody"), parse("# Title\n\nbody"));
    }

    #[test]
    fn empty_document_has_no_blocks() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n  \n").is_empty());
    }

    #[test]
    fn parsing_is_deterministic() {
        let source = "# T\n\n> q\n> q2\n\n- item\n\n$$\nx\n$$\n\npara **b**";
        assert_eq!(parse(source), parse(source));
    }
}

use crate::types::TextSpan;
use regex::Regex;
use url::Url;

/// Converts one run of text into styled spans: inline math `$…$`, bold
/// `**…**`, italic `*…*` / `_…_`, inline code `` `…` ``, and `[text](url)`
/// links. Recognition is leftmost-match with the alternation order giving
/// priority; anything that does not match a complete delimiter pair stays
/// literal text.
pub struct InlineFormatter {
    pattern: Regex,
    link_pattern: Regex,
    amount_pattern: Regex,
}

impl InlineFormatter {
    pub fn new() -> Self {
        let pattern = Regex::new(concat!(
            r"(\$[^$\n]+\$)",           // inline math
            r"|(\*\*[^*]+\*\*)",        // bold
            r"|(\*[^*]+\*)",            // italic (asterisk)
            r"|(_[^_]+_)",              // italic (underscore)
            r"|(`[^`]+`)",              // inline code
            r"|(\[[^\]]+\]\([^)]+\))",  // link
        ))
        .unwrap();

        Self {
            pattern,
            link_pattern: Regex::new(r"^\[([^\]]+)\]\(([^)]+)\)$").unwrap(),
            amount_pattern: Regex::new(r"^[\d,\.]+$").unwrap(),
        }
    }

    pub fn format(&self, raw: &str) -> Vec<TextSpan> {
        let mut spans = Vec::new();
        let mut last_end = 0;

        for mat in self.pattern.find_iter(raw) {
            if mat.start() > last_end {
                Self::push_plain(&mut spans, &raw[last_end..mat.start()]);
            }
            self.push_styled(&mut spans, raw, mat.start(), mat.end());
            last_end = mat.end();
        }

        if last_end < raw.len() {
            Self::push_plain(&mut spans, &raw[last_end..]);
        }

        spans
    }

    fn push_styled(&self, spans: &mut Vec<TextSpan>, raw: &str, start: usize, end: usize) {
        let matched = &raw[start..end];

        if matched.starts_with('$') {
            self.push_math(spans, raw, start, end);
        } else if matched.starts_with("**") {
            spans.push(TextSpan {
                bold: true,
                ..TextSpan::plain(&matched[2..matched.len() - 2])
            });
        } else if matched.starts_with('*') || matched.starts_with('_') {
            spans.push(TextSpan {
                italic: true,
                ..TextSpan::plain(&matched[1..matched.len() - 1])
            });
        } else if matched.starts_with('`') {
            spans.push(TextSpan {
                code: true,
                ..TextSpan::plain(&matched[1..matched.len() - 1])
            });
        } else {
            self.push_link(spans, matched);
        }
    }

    /// `$…$` immediately next to another `$` belongs to a block-math fence,
    /// and a bare numeric amount ($100, $3.50) is money, not math. Both stay
    /// literal.
    fn push_math(&self, spans: &mut Vec<TextSpan>, raw: &str, start: usize, end: usize) {
        let expression = &raw[start + 1..end - 1];
        let preceded = start > 0 && raw.as_bytes()[start - 1] == b'$';
        let followed = end < raw.len() && raw.as_bytes()[end] == b'$';
        let is_amount = expression
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
            && self.amount_pattern.is_match(expression);

        if preceded || followed || is_amount || expression.trim().is_empty() {
            Self::push_plain(spans, &raw[start..end]);
        } else {
            spans.push(TextSpan {
                equation: true,
                ..TextSpan::plain(expression)
            });
        }
    }

    /// Notion rejects rich_text links whose URL is not absolute, so a link
    /// with an unparsable URL is kept as literal text.
    fn push_link(&self, spans: &mut Vec<TextSpan>, matched: &str) {
        let Some(caps) = self.link_pattern.captures(matched) else {
            Self::push_plain(spans, matched);
            return;
        };
        let text = &caps[1];
        let href = &caps[2];

        if Url::parse(href).is_ok() {
            spans.push(TextSpan {
                link: Some(href.to_string()),
                ..TextSpan::plain(text)
            });
        } else {
            Self::push_plain(spans, matched);
        }
    }

    fn push_plain(spans: &mut Vec<TextSpan>, content: &str) {
        if !content.is_empty() {
            spans.push(TextSpan::plain(content));
        }
    }
}

impl Default for InlineFormatter {
    fn default() -> Self {
        Self::new()
    }
}

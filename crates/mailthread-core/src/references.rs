//! Message-id extraction from Message-Id, References and In-Reply-To header text.

use std::collections::HashSet;

/// Parent identifiers named by one header, in header order with duplicates removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReferences {
    pub parents: Vec<String>,
    /// Last non-self identifier seen, duplicates included.
    pub last_reference: Option<String>,
}

impl ParsedReferences {
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Parses the first message id in `raw`, discarding whitespace, RFC 822
/// comments, leading unstructured text and the angle brackets.
#[must_use]
pub fn parse_identifier(raw: &str) -> Option<String> {
    parse_identifier_prefix(raw).0
}

/// Parses every message id in `raw`, dropping `self_id` and repeats.
#[must_use]
pub fn parse_reference_list(self_id: &str, raw: Option<&str>) -> ParsedReferences {
    let mut out = ParsedReferences::default();
    let Some(mut rest) = raw else {
        return out;
    };

    let mut seen = HashSet::new();
    while !rest.is_empty() {
        let (parsed, next) = parse_identifier_prefix(rest);
        rest = next;
        let Some(id) = parsed else {
            continue;
        };
        if id == self_id {
            continue;
        }
        if seen.insert(id.clone()) {
            out.parents.push(id.clone());
        }
        out.last_reference = Some(id);
    }
    out
}

/// Returns the parsed id (if any) and the unparsed remainder.
fn parse_identifier_prefix(raw: &str) -> (Option<String>, &str) {
    let bytes = raw.as_bytes();
    let len = bytes.len();

    let mut pos = skip_space_and_comments(bytes, 0);
    while pos < len && bytes[pos] != b'<' {
        pos += 1;
    }
    if pos >= len {
        return (None, "");
    }
    pos = skip_space_and_comments(bytes, pos + 1);

    let start = pos;
    let mut end = start;
    while end < len && bytes[end] != b'>' {
        end += 1;
    }
    let rest = if end < len { &raw[end + 1..] } else { "" };

    // Only ASCII delimiters were matched, so both offsets sit on char boundaries.
    let id = raw[start..end]
        .chars()
        .filter(|ch| *ch != ' ' && *ch != '\t')
        .collect::<String>();
    if id.is_empty() {
        (None, rest)
    } else {
        (Some(id), rest)
    }
}

/// Skips whitespace and (nested, backslash-escaped) parenthesized comments.
fn skip_space_and_comments(bytes: &[u8], mut pos: usize) -> usize {
    let len = bytes.len();
    while pos < len && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b'(') {
        while pos < len && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos < len && bytes[pos] == b'(' {
            let mut depth = 1;
            pos += 1;
            while pos < len && depth > 0 {
                match bytes[pos] {
                    b'(' => depth += 1,
                    b')' => depth -= 1,
                    b'\\' if pos + 1 < len => pos += 1,
                    _ => {}
                }
                pos += 1;
            }
        }
    }
    pos
}

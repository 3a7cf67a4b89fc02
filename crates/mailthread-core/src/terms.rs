use std::collections::HashSet;

const MIN_TERM_CHARS: usize = 2;
const MAX_TERM_CHARS: usize = 64;

/// Lowercased alphanumeric words of `text`, first occurrence order, at most `limit`.
#[must_use]
pub fn extract_terms(text: &str, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for word in text.split(|ch: char| !ch.is_alphanumeric()) {
        if out.len() >= limit {
            break;
        }
        let chars = word.chars().count();
        if !(MIN_TERM_CHARS..=MAX_TERM_CHARS).contains(&chars) {
            continue;
        }
        let term = word.to_lowercase();
        if seen.insert(term.clone()) {
            out.push(term);
        }
    }
    out
}

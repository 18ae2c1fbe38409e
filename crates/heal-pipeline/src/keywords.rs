//! Search-phrase synthesis from semantic keys
//!
//! When a locator's value is empty but the caller supplied a semantic key
//! (a property-path-like name such as `login.input.email_address`), the key
//! is tokenized into a search phrase used in place of the value.

/// Generic UI-role words that carry no element identity on their own. They
/// act as boundary markers: the tokens after the last stoplist word are the
/// ones that name the element.
const STOPLIST: &[&str] = &[
    "page", "element", "btn", "button", "input", "field", "lbl", "label", "txt", "text", "img",
    "image", "link", "lnk", "div", "span", "section",
];

const MIN_TOKEN_LEN: usize = 3;

/// Synthesize a search phrase from a semantic key.
///
/// Splits on separators and camel-case boundaries, then keeps the meaningful
/// tokens after the last stoplist word. Falls back to all meaningful tokens,
/// then to the last two tokens, then to the key's final raw segment.
///
/// `"login.input.email_address"` yields `"email address"`.
pub fn search_terms_from_key(key: &str) -> String {
    if key.trim().is_empty() {
        return String::new();
    }

    let words = split_words(key);
    if words.is_empty() {
        return last_segment(key);
    }

    let is_stop = |w: &str| STOPLIST.contains(&w);
    let meaningful = |w: &&String| w.len() >= MIN_TOKEN_LEN && !is_stop(w);

    // Tokens after the last stoplist word name the element.
    if let Some(boundary) = words.iter().rposition(|w| is_stop(w)) {
        let tail: Vec<&String> = words[boundary + 1..].iter().filter(meaningful).collect();
        if !tail.is_empty() {
            return join(&tail);
        }
    }

    let filtered: Vec<&String> = words.iter().filter(meaningful).collect();
    if !filtered.is_empty() {
        return join(&filtered);
    }

    // Everything got filtered: the last couple of raw tokens are the best
    // guess left.
    let start = words.len().saturating_sub(2);
    let tail: Vec<&String> = words[start..].iter().collect();
    if !tail.is_empty() {
        return join(&tail);
    }

    last_segment(key)
}

/// Split on separator characters and lower-to-upper camel-case boundaries,
/// lowercasing the result.
fn split_words(key: &str) -> Vec<String> {
    let mut spaced = String::with_capacity(key.len() + 8);
    let mut prev_lower = false;
    for c in key.chars() {
        if matches!(c, '.' | '_' | '-') {
            spaced.push(' ');
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            spaced.push(' ');
        }
        prev_lower = c.is_lowercase();
        spaced.push(c);
    }

    spaced
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn join(words: &[&String]) -> String {
    words
        .iter()
        .map(|w| w.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn last_segment(key: &str) -> String {
    key.rsplit(['.', '_', '-'])
        .find(|s| !s.is_empty())
        .unwrap_or(key)
        .to_string()
}

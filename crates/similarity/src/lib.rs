//! Deterministic string similarity metrics for locator healing
//!
//! All scores are pure functions of their inputs and fall within `[0, 1]`.
//! The healing strategies combine three views of similarity: normalized
//! token-set overlap, edit-distance similarity, and a weighted feature score
//! over a whole element.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static DIGIT_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static HASH_FRAGMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_-][a-f0-9]{8,}").unwrap());
static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TRAILING_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[._-]+$").unwrap());
static LEADING_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[._-]+").unwrap());

/// Normalize a string for comparison: lowercase, collapse non-alphanumeric
/// runs to single spaces, trim. Idempotent.
pub fn normalize(s: &str) -> String {
    let lowered = s.to_lowercase();
    let mapped: String = lowered
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Token-set overlap ratio over normalized inputs.
///
/// Both empty normalize to 1.0, exactly one empty to 0.0.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let na = normalize(a);
    let nb = normalize(b);
    if na.is_empty() && nb.is_empty() {
        return 1.0;
    }
    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }

    let sa: HashSet<&str> = na.split(' ').collect();
    let sb: HashSet<&str> = nb.split(' ').collect();
    let intersection = sa.intersection(&sb).count() as f64;
    let union = sa.union(&sb).count() as f64;
    intersection / union
}

/// Classic dynamic-programming edit distance, case-sensitive, per char.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Edit-distance similarity: `1 - distance / max(len)`, computed over
/// lowercased inputs. Equal strings and two empties score 1.0. Symmetric.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein(&a.to_lowercase(), &b.to_lowercase());
    1.0 - (distance as f64 / max_len as f64)
}

/// Strip volatile fragments from a locator value: digit runs, hash-like
/// hex tokens, and leading/trailing separators. The remainder is the stable
/// "key part" used for partial matching.
pub fn key_part(value: &str) -> String {
    let s = DIGIT_RUNS.replace_all(value, "");
    let s = HASH_FRAGMENTS.replace_all(&s, "");
    let s = SPACE_RUNS.replace_all(&s, " ");
    let s = TRAILING_SEPARATORS.replace_all(&s, "");
    let s = LEADING_SEPARATORS.replace_all(&s, "");
    s.trim().to_string()
}

/// Partial-match score: edit-distance similarity, +0.2 when the key parts
/// match exactly, +0.1 when one string contains the other. Capped at 1.0.
pub fn partial_match_score(original: &str, candidate: &str) -> f64 {
    let mut score = similarity(original, candidate);

    let original_key = key_part(original);
    let candidate_key = key_part(candidate);
    if !original_key.is_empty() && original_key.eq_ignore_ascii_case(&candidate_key) {
        score = (score + 0.2).min(1.0);
    }

    if candidate.contains(original) || original.contains(candidate) {
        score = (score + 0.1).min(1.0);
    }

    score
}

/// Attribute bundle of one element as seen by the whole-element scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureInput<'a> {
    pub resource_id: &'a str,
    pub content_desc: &'a str,
    pub name: &'a str,
    pub text: &'a str,
    pub label: &'a str,
    pub value: &'a str,
    pub class_name: &'a str,
    pub usable: bool,
}

/// Weighted feature score of an element against a target string.
///
/// An exact case-insensitive identifier/description/name match scores 0.9
/// outright; otherwise token overlap on the textual attributes dominates,
/// with small bonuses for class-name containment and usability.
pub fn feature_score(features: &FeatureInput<'_>, target: &str) -> f64 {
    if !target.is_empty() {
        let exact = [features.resource_id, features.content_desc, features.name]
            .into_iter()
            .any(|attr| !attr.is_empty() && attr.eq_ignore_ascii_case(target));
        if exact {
            return 0.9;
        }
    }

    let text_sim = token_set_ratio(features.text, target)
        .max(token_set_ratio(features.label, target))
        .max(token_set_ratio(features.value, target));
    let mut score = 0.3 * text_sim;

    if !target.is_empty()
        && !features.class_name.is_empty()
        && normalize(features.class_name).contains(&normalize(target))
    {
        score += 0.05;
    }

    if features.usable {
        score += 0.05;
    }

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_is_idempotent() {
        for s in ["Hello, World!", "login__button-42", "  a  b  ", "", "ÜBER-café"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_normalize_collapses_punctuation() {
        assert_eq!(normalize("login.input.email_address"), "login input email address");
        assert_eq!(normalize("  A--B  "), "a b");
    }

    #[test]
    fn test_token_set_ratio_boundaries() {
        assert_eq!(token_set_ratio("login button", "login button"), 1.0);
        assert_eq!(token_set_ratio("", ""), 1.0);
        assert_eq!(token_set_ratio("", "x"), 0.0);
        assert_eq!(token_set_ratio("a b", "b c"), 1.0 / 3.0);
    }

    #[test]
    fn test_similarity_symmetric() {
        let pairs = [
            ("login_button", "login_button_v2"),
            ("abc", "xyz"),
            ("", "abc"),
            ("Welcome", "welcome"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn test_similarity_values() {
        assert_eq!(similarity("same", "same"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        // distance 3 over max length 15
        let s = similarity("login_button", "login_button_v2");
        assert!((s - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_key_part_strips_volatile_fragments() {
        assert_eq!(key_part("login_button_42"), "login_button");
        assert_eq!(key_part("item_deadbeefcafe"), "item");
        assert_eq!(key_part("__submit__"), "submit");
        assert_eq!(key_part("12345"), "");
    }

    #[test]
    fn test_partial_match_score_bonuses() {
        // Containment bonus
        let s = partial_match_score("login_button", "login_button_v2");
        assert!((s - 0.9).abs() < 1e-9);
        // Exact key-part match bonus on top of base similarity
        let s = partial_match_score("cart_7", "cart_9");
        assert!(s > similarity("cart_7", "cart_9"));
    }

    #[test]
    fn test_feature_score_exact_identifier() {
        let features = FeatureInput {
            resource_id: "com.demo:id/login",
            usable: true,
            ..Default::default()
        };
        assert_eq!(feature_score(&features, "COM.DEMO:ID/LOGIN"), 0.9);
    }

    #[test]
    fn test_feature_score_weighted_path() {
        let features = FeatureInput {
            text: "log in",
            class_name: "demo.widget.Log-In.Button",
            usable: true,
            ..Default::default()
        };
        // 0.3 * 1.0 + 0.05 (class contains) + 0.05 (usable)
        let score = feature_score(&features, "log in");
        assert!((score - 0.4).abs() < 1e-9);
    }
}

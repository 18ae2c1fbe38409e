//! The four ordered healing strategies
//!
//! Each strategy scans the node list in document order under the shared
//! budget and returns its best hit at or above the minimum threshold.
//! Replacement is strict (`>`), so ties resolve to the earlier node.

use healer_core_types::{LocatorKind, Platform};
use heal_similarity::{key_part, partial_match_score, similarity};
use snapshot_parser::{attribute_for_kind, context_attributes, Snapshot, SnapshotNode};
use tracing::debug;

use crate::alternatives::build_tree_path;
use crate::budget::HealBudget;

/// Boost applied when one of the compared strings contains the other.
const CONTAINMENT_BOOST: f64 = 0.15;

/// Key parts shorter than this are too generic to partial-match against.
const MIN_KEY_PART_LEN: usize = 3;

/// Keywords at or under this length are ignored by the context strategy.
const MIN_KEYWORD_LEN: usize = 2;

/// Best match found by one strategy: the node it matched, the locator kind
/// the match implies, and the expression value for that kind.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyHit {
    pub node_index: usize,
    pub kind: LocatorKind,
    pub value: String,
    pub score: f64,
}

/// Strategy 1: score the attribute the original locator kind addresses on
/// each usable node with edit-distance similarity, boosted for containment.
pub fn by_same_kind(
    snapshot: &Snapshot,
    kind: LocatorKind,
    value: &str,
    min_score: f64,
    budget: &mut HealBudget,
) -> Option<StrategyHit> {
    let mut best: Option<StrategyHit> = None;

    for node in &snapshot.nodes {
        if !budget.can_process() {
            break;
        }
        budget.tick();
        if !node.usable {
            continue;
        }

        let attr = attribute_for_kind(node, kind, snapshot.platform);
        if attr.trim().is_empty() {
            continue;
        }

        let mut score = similarity(value, attr);
        if attr.contains(value) || value.contains(attr) {
            score = (score + CONTAINMENT_BOOST).min(1.0);
        }

        if score >= min_score && best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(StrategyHit {
                node_index: node.index,
                kind,
                value: attr.to_string(),
                score,
            });
        }
    }

    if let Some(hit) = &best {
        debug!(score = hit.score, value = %hit.value, "same-kind strategy hit");
    }
    best
}

/// Strategy 2: strip dynamic fragments from both sides and require a
/// substring relationship between the key parts before scoring.
pub fn by_partial_match(
    snapshot: &Snapshot,
    kind: LocatorKind,
    value: &str,
    min_score: f64,
    budget: &mut HealBudget,
) -> Option<StrategyHit> {
    let original_key = key_part(value).to_lowercase();
    if original_key.len() < MIN_KEY_PART_LEN {
        return None;
    }

    let mut best: Option<StrategyHit> = None;

    for node in &snapshot.nodes {
        if !budget.can_process() {
            break;
        }
        budget.tick();
        if !node.usable {
            continue;
        }

        let attr = attribute_for_kind(node, kind, snapshot.platform);
        if attr.trim().is_empty() {
            continue;
        }

        let candidate_key = key_part(attr).to_lowercase();
        if !candidate_key.contains(&original_key) && !original_key.contains(&candidate_key) {
            continue;
        }

        let score = partial_match_score(value, attr);
        if score >= min_score && best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(StrategyHit {
                node_index: node.index,
                kind,
                value: attr.to_string(),
                score,
            });
        }
    }

    if let Some(hit) = &best {
        debug!(score = hit.score, value = %hit.value, "partial-match strategy hit");
    }
    best
}

/// Strategy 3: score several platform-specific attributes of each node
/// independently; each attribute implies the locator kind a hit would use.
pub fn by_alternative_attributes(
    snapshot: &Snapshot,
    value: &str,
    min_score: f64,
    budget: &mut HealBudget,
) -> Option<StrategyHit> {
    let mut best: Option<StrategyHit> = None;

    for node in &snapshot.nodes {
        if !budget.can_process() {
            break;
        }
        budget.tick();
        if !node.usable {
            continue;
        }

        for (attr, implied_kind) in alternative_attributes(node, snapshot.platform) {
            if attr.trim().is_empty() {
                continue;
            }
            let score = similarity(value, attr);
            if score >= min_score && best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(StrategyHit {
                    node_index: node.index,
                    kind: implied_kind,
                    value: attr.to_string(),
                    score,
                });
            }
        }
    }

    if let Some(hit) = &best {
        debug!(score = hit.score, kind = ?hit.kind, "alternative-attribute strategy hit");
    }
    best
}

/// Attribute probes and the locator kind each would imply, per platform.
fn alternative_attributes(node: &SnapshotNode, platform: Platform) -> Vec<(&str, LocatorKind)> {
    match platform {
        Platform::Ios => vec![
            (node.name.as_str(), LocatorKind::Accessibility),
            (node.label.as_str(), LocatorKind::Name),
            (node.value.as_str(), LocatorKind::Name),
            (node.type_tag.as_str(), LocatorKind::ClassName),
        ],
        Platform::Android => vec![
            (node.resource_id.as_str(), LocatorKind::Id),
            (node.content_desc.as_str(), LocatorKind::Accessibility),
            (node.text.as_str(), LocatorKind::Name),
            (node.class_name.as_str(), LocatorKind::ClassName),
        ],
        Platform::Unknown => Vec::new(),
    }
}

/// Strategy 4: keyword coverage over a node's own attributes plus its
/// parent's attributes and previous sibling's text. Hits always report a
/// structural tree-path expression.
pub fn by_context(
    snapshot: &Snapshot,
    value: &str,
    min_score: f64,
    budget: &mut HealBudget,
) -> Option<StrategyHit> {
    let cleaned: String = value
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    let keywords: Vec<&str> = cleaned.split_whitespace().collect();
    if keywords.is_empty() {
        return None;
    }

    let mut best: Option<StrategyHit> = None;

    for node in &snapshot.nodes {
        if !budget.can_process() {
            break;
        }
        budget.tick();
        if !node.usable {
            continue;
        }

        let mut context = context_attributes(node, snapshot.platform);
        if let Some(parent) = node.parent.and_then(|i| snapshot.nodes.get(i)) {
            context.push_str(&context_attributes(parent, snapshot.platform));
        }
        if let Some(sibling) = node.prev_sibling.and_then(|i| snapshot.nodes.get(i)) {
            context.push_str(&sibling.text);
        }
        let context = context.to_lowercase();

        let matched = keywords
            .iter()
            .filter(|kw| kw.len() > MIN_KEYWORD_LEN && context.contains(*kw))
            .count();
        let score = matched as f64 / keywords.len() as f64;

        if score >= min_score && best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(StrategyHit {
                node_index: node.index,
                kind: LocatorKind::XPath,
                value: build_tree_path(node, snapshot.platform),
                score,
            });
        }
    }

    if let Some(hit) = &best {
        debug!(score = hit.score, path = %hit.value, "context strategy hit");
    }
    best
}

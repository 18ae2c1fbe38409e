//! Strategy orchestration over a single snapshot
//!
//! Runs the four strategies in order under one shared budget, picks the
//! highest-scoring hit with strict replacement (ties keep the earlier
//! strategy), and turns the winner into a [`Candidate`] with fallback
//! alternatives derived from the winning node.

use std::time::Duration;

use healer_core_types::{Candidate, LocatorSpec, Platform};
use snapshot_parser::{parse_snapshot, Snapshot};
use tracing::{debug, info, warn};

use crate::alternatives::fallback_locators;
use crate::budget::HealBudget;
use crate::config::HealConfig;
use crate::keywords::search_terms_from_key;
use crate::strategies::{
    by_alternative_attributes, by_context, by_partial_match, by_same_kind, StrategyHit,
};

/// Terminal state of one pipeline run. "No candidate" is a legitimate
/// outcome, not an error.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub candidate: Option<Candidate>,
    pub platform: Platform,
    pub elapsed: Duration,
    pub nodes_processed: usize,
    pub budget_exhausted: bool,
}

impl PipelineOutcome {
    fn empty(platform: Platform, budget: Option<&HealBudget>) -> Self {
        Self {
            candidate: None,
            platform,
            elapsed: budget.map(HealBudget::elapsed).unwrap_or_default(),
            nodes_processed: budget.map(HealBudget::nodes_processed).unwrap_or_default(),
            budget_exhausted: budget.is_some_and(HealBudget::is_exhausted),
        }
    }
}

/// Run the healing pipeline for one stale locator against one snapshot.
///
/// A blank original value with a semantic key triggers a pre-pass that
/// synthesizes a search phrase from the key. Unparseable snapshots degrade
/// to "no candidate"; only the engine constructor can reject configuration.
pub fn run(
    spec: &LocatorSpec,
    semantic_key: Option<&str>,
    snapshot_source: &str,
    config: &HealConfig,
) -> PipelineOutcome {
    let mut value = spec.value.trim().to_string();
    if value.is_empty() {
        if let Some(key) = semantic_key.filter(|k| !k.trim().is_empty()) {
            value = search_terms_from_key(key);
            info!(key, phrase = %value, "synthesized search phrase from semantic key");
        }
    }
    if value.is_empty() {
        return PipelineOutcome::empty(Platform::Unknown, None);
    }

    let snapshot = match parse_snapshot(snapshot_source) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %e, "snapshot unparseable, healing degrades to no match");
            return PipelineOutcome::empty(Platform::Unknown, None);
        }
    };

    let mut budget = HealBudget::new(config.max_elapsed, config.max_nodes);
    let hit = run_strategies(&snapshot, spec, &value, config, &mut budget);

    let candidate = hit.map(|hit| {
        let fallbacks = snapshot
            .nodes
            .get(hit.node_index)
            .map(|node| fallback_locators(node, snapshot.platform))
            .unwrap_or_default();
        Candidate::new(hit.kind, hit.value, hit.score, snapshot.platform)
            .with_fallbacks(fallbacks)
    });

    if candidate.is_none() && budget.is_exhausted() {
        warn!(
            elapsed_ms = budget.elapsed().as_millis() as u64,
            nodes = budget.nodes_processed(),
            "healing budget exhausted without a match"
        );
    }

    PipelineOutcome {
        candidate,
        platform: snapshot.platform,
        elapsed: budget.elapsed(),
        nodes_processed: budget.nodes_processed(),
        budget_exhausted: budget.is_exhausted(),
    }
}

fn run_strategies(
    snapshot: &Snapshot,
    spec: &LocatorSpec,
    value: &str,
    config: &HealConfig,
    budget: &mut HealBudget,
) -> Option<StrategyHit> {
    let min = config.min_similarity;

    let mut best = by_same_kind(snapshot, spec.kind, value, min, budget);
    if let Some(hit) = &best {
        if hit.score >= config.high_confidence {
            debug!(score = hit.score, "same-kind match accepted at high confidence");
            return best;
        }
    }

    let high_enough = |best: &Option<StrategyHit>| {
        config.early_exit_all_strategies
            && best
                .as_ref()
                .is_some_and(|hit| hit.score >= config.high_confidence)
    };

    if budget.has_time_remaining() && !high_enough(&best) {
        let hit = by_partial_match(snapshot, spec.kind, value, min, budget);
        best = replace_if_better(best, hit);
    }

    if budget.has_time_remaining() && !high_enough(&best) {
        let hit = by_alternative_attributes(snapshot, value, min, budget);
        best = replace_if_better(best, hit);
    }

    if budget.has_time_remaining() && !high_enough(&best) {
        // The context scan is the most expensive pass; only start it with a
        // comfortable amount of budget left.
        if budget.remaining() > config.context_margin {
            let hit = by_context(snapshot, value, min, budget);
            best = replace_if_better(best, hit);
        } else {
            debug!("context strategy skipped, insufficient time remaining");
        }
    }

    best
}

/// Strict `>` keeps the earlier strategy's result on ties.
fn replace_if_better(best: Option<StrategyHit>, challenger: Option<StrategyHit>) -> Option<StrategyHit> {
    match (best, challenger) {
        (Some(best), Some(challenger)) if challenger.score > best.score => Some(challenger),
        (None, challenger) => challenger,
        (best, _) => best,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use healer_core_types::LocatorKind;

    #[test]
    fn test_replace_if_better_is_strict() {
        let hit = |score: f64| StrategyHit {
            node_index: 0,
            kind: LocatorKind::Id,
            value: "x".to_string(),
            score,
        };
        let earlier = hit(0.7);
        let tied = StrategyHit {
            value: "y".to_string(),
            ..hit(0.7)
        };
        let kept = replace_if_better(Some(earlier.clone()), Some(tied));
        assert_eq!(kept.unwrap().value, "x");

        let replaced = replace_if_better(Some(earlier), Some(hit(0.71)));
        assert!((replaced.unwrap().score - 0.71).abs() < 1e-9);
    }

    #[test]
    fn test_blank_value_without_key_yields_nothing() {
        let spec = LocatorSpec::new(LocatorKind::Id, "  ");
        let outcome = run(&spec, None, "<hierarchy/>", &HealConfig::default());
        assert!(outcome.candidate.is_none());
        assert!(!outcome.budget_exhausted);
    }

    #[test]
    fn test_malformed_snapshot_degrades_to_no_match() {
        let spec = LocatorSpec::new(LocatorKind::Id, "login");
        let outcome = run(&spec, None, "<hierarchy><open>", &HealConfig::default());
        assert!(outcome.candidate.is_none());
    }
}

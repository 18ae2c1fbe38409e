//! Healing engine: cache-fronted pipeline with telemetry
//!
//! The engine owns the flow described by the architecture: check the result
//! cache, run the pipeline on a miss, update the cache, and record a
//! telemetry event for every attempt. Cache and report handles are injected
//! so concurrent callers can share them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use healer_core_types::{Candidate, HealSource, HealerError, LocatorKind, LocatorSpec, Platform};
use heal_cache::HealCache;
use heal_similarity::{feature_score, FeatureInput};
use heal_telemetry::{now_ms, HealingEvent, HealingReport};
use snapshot_parser::{parse_snapshot, SnapshotNode};
use tracing::{debug, info};

use crate::alternatives::build_tree_path;
use crate::config::HealConfig;
use crate::pipeline;

/// Result of one healing attempt as seen by the caller.
#[derive(Debug, Clone)]
pub struct HealOutcome {
    pub candidate: Option<Candidate>,
    pub source: Option<HealSource>,
    pub platform: Platform,
    pub elapsed: Duration,
    pub budget_exhausted: bool,
}

/// Cache-fronted healing engine shared across tests in a session.
pub struct HealingEngine {
    cache: Arc<HealCache>,
    report: Arc<HealingReport>,
    config: HealConfig,
}

impl HealingEngine {
    pub fn new(config: HealConfig) -> Result<Self, HealerError> {
        Self::with_components(
            config,
            Arc::new(HealCache::default()),
            Arc::new(HealingReport::new()),
        )
    }

    /// Construct with shared cache and report handles.
    pub fn with_components(
        config: HealConfig,
        cache: Arc<HealCache>,
        report: Arc<HealingReport>,
    ) -> Result<Self, HealerError> {
        config.validate()?;
        Ok(Self {
            cache,
            report,
            config,
        })
    }

    /// Heal a stale locator against a fresh snapshot.
    ///
    /// Never fails: "no candidate" is a normal outcome and the external
    /// collaborator's cue to attempt its own recovery.
    pub fn heal(
        &self,
        spec: &LocatorSpec,
        semantic_key: Option<&str>,
        snapshot_source: &str,
    ) -> HealOutcome {
        let started = Instant::now();
        let key = spec.cache_key(semantic_key);

        if let Some(entry) = self.cache.get(&key) {
            info!(key = %key, score = entry.candidate.score, "healed locator served from cache");
            let candidate = entry.candidate;
            self.record_event(
                spec,
                semantic_key,
                Some(&candidate),
                HealSource::Cache,
                started.elapsed(),
                candidate.platform,
            );
            return HealOutcome {
                platform: candidate.platform,
                candidate: Some(candidate),
                source: Some(HealSource::Cache),
                elapsed: started.elapsed(),
                budget_exhausted: false,
            };
        }

        let outcome = pipeline::run(spec, semantic_key, snapshot_source, &self.config);

        if let Some(candidate) = &outcome.candidate {
            self.cache.put(&key, candidate.clone());
            info!(
                key = %key,
                kind = candidate.kind.as_str(),
                value = %candidate.value,
                score = candidate.score,
                "locator healed"
            );
        } else {
            debug!(key = %key, "no healing candidate found");
        }

        self.record_event(
            spec,
            semantic_key,
            outcome.candidate.as_ref(),
            HealSource::Local,
            outcome.elapsed,
            outcome.platform,
        );

        HealOutcome {
            source: outcome.candidate.is_some().then_some(HealSource::Local),
            candidate: outcome.candidate,
            platform: outcome.platform,
            elapsed: outcome.elapsed,
            budget_exhausted: outcome.budget_exhausted,
        }
    }

    /// Report whether a previously returned candidate actually worked. Feeds
    /// the cache's reliability tracking.
    pub fn record_usage(&self, spec: &LocatorSpec, semantic_key: Option<&str>, success: bool) {
        self.cache
            .record_usage(&spec.cache_key(semantic_key), success);
    }

    /// Register a candidate recovered by an external collaborator (semantic
    /// or visual healing) so cache and telemetry stay consistent.
    pub fn record_external(
        &self,
        spec: &LocatorSpec,
        semantic_key: Option<&str>,
        candidate: Candidate,
        elapsed: Duration,
    ) {
        let key = spec.cache_key(semantic_key);
        self.cache.put(&key, candidate.clone());
        self.record_event(
            spec,
            semantic_key,
            Some(&candidate),
            HealSource::External,
            elapsed,
            candidate.platform,
        );
    }

    pub fn cache(&self) -> &Arc<HealCache> {
        &self.cache
    }

    pub fn report(&self) -> &Arc<HealingReport> {
        &self.report
    }

    pub fn config(&self) -> &HealConfig {
        &self.config
    }

    /// Full session report with the cache's aggregate statistics embedded.
    ///
    /// The engine is the only place holding both handles, so the merge
    /// happens here rather than in the telemetry crate.
    pub fn full_report(&self) -> serde_json::Value {
        let mut report = self.report.full_report();
        if let serde_json::Value::Object(map) = &mut report {
            map.insert(
                "cache_statistics".to_string(),
                serde_json::to_value(self.cache.stats()).unwrap_or(serde_json::Value::Null),
            );
        }
        report
    }

    fn record_event(
        &self,
        spec: &LocatorSpec,
        semantic_key: Option<&str>,
        candidate: Option<&Candidate>,
        source: HealSource,
        elapsed: Duration,
        platform: Platform,
    ) {
        self.report.record(HealingEvent {
            original_kind: spec.kind,
            original_value: spec.value.clone(),
            semantic_key: semantic_key
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            healed_kind: candidate.map(|c| c.kind),
            healed_value: candidate.map(|c| c.value.clone()),
            confidence: candidate.map(|c| c.score).unwrap_or(0.0),
            alternatives: candidate.map(|c| c.fallbacks.clone()).unwrap_or_default(),
            source,
            success: candidate.is_some(),
            elapsed_ms: elapsed.as_millis() as u64,
            timestamp_ms: now_ms(),
            platform,
        });
    }
}

/// Rank whole elements of a snapshot against a target phrase using the
/// weighted feature score, independent of any original locator kind.
///
/// Used when the caller has only a human description of the element.
pub fn heal_by_feature_score(snapshot_source: &str, target: &str, min_score: f64) -> Option<Candidate> {
    let snapshot = parse_snapshot(snapshot_source).ok()?;
    let mut best: Option<(f64, &SnapshotNode)> = None;

    for node in &snapshot.nodes {
        let features = FeatureInput {
            resource_id: &node.resource_id,
            content_desc: &node.content_desc,
            name: &node.name,
            text: &node.text,
            label: &node.label,
            value: &node.value,
            class_name: &node.class_name,
            usable: node.usable,
        };
        let score = feature_score(&features, target);
        if score >= min_score && best.is_none_or(|(b, _)| score > b) {
            best = Some((score, node));
        }
    }

    best.map(|(score, node)| {
        let (kind, value) = primary_locator(node, snapshot.platform);
        Candidate::new(kind, value, score, snapshot.platform)
            .with_fallbacks(crate::alternatives::fallback_locators(node, snapshot.platform))
    })
}

/// The most stable addressable expression a node offers on its platform.
fn primary_locator(node: &SnapshotNode, platform: Platform) -> (LocatorKind, String) {
    let pick = |pairs: &[(LocatorKind, &String)]| {
        pairs
            .iter()
            .find(|(_, v)| !v.is_empty())
            .map(|(k, v)| (*k, v.to_string()))
    };

    let found = match platform {
        Platform::Android => pick(&[
            (LocatorKind::Id, &node.resource_id),
            (LocatorKind::Accessibility, &node.content_desc),
            (LocatorKind::Name, &node.text),
        ]),
        Platform::Ios => pick(&[
            (LocatorKind::Accessibility, &node.name),
            (LocatorKind::Name, &node.label),
        ]),
        Platform::Unknown => {
            let probed = snapshot_parser::probe_identifier(node);
            (!probed.is_empty()).then(|| (LocatorKind::Accessibility, probed.to_string()))
        }
    };

    found.unwrap_or_else(|| (LocatorKind::XPath, build_tree_path(node, platform)))
}

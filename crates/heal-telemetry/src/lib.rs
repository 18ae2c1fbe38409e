//! Session-scoped healing event log and JSON reporting
//!
//! Every healing attempt, successful or not, is recorded as a
//! [`HealingEvent`]. The [`HealingReport`] aggregates them over a test
//! session and renders two JSON shapes: a full report with per-locator
//! breakdowns and a simplified report that deduplicates repeat attempts on
//! the same locator.

use std::collections::HashMap;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use healer_core_types::{HealSource, LocatorKind, LocatorSpec, Platform};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};

/// One healing attempt, resolved or not.
#[derive(Debug, Clone, Serialize)]
pub struct HealingEvent {
    pub original_kind: LocatorKind,
    pub original_value: String,
    pub semantic_key: Option<String>,
    pub healed_kind: Option<LocatorKind>,
    pub healed_value: Option<String>,
    pub confidence: f64,
    pub alternatives: Vec<String>,
    pub source: HealSource,
    pub success: bool,
    pub elapsed_ms: u64,
    pub timestamp_ms: u64,
    pub platform: Platform,
}

impl HealingEvent {
    /// Same key formula the result cache uses, so report aggregation and
    /// cache lookups agree on locator identity.
    pub fn cache_key(&self) -> String {
        LocatorSpec::new(self.original_kind, self.original_value.clone())
            .cache_key(self.semantic_key.as_deref())
    }
}

/// Aggregate counters over a session, serializable for the summary section.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_attempts: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub cache_hits: usize,
    pub cache_hit_rate: f64,
    pub average_elapsed_ms: f64,
    pub session_elapsed_ms: u64,
}

struct ReportState {
    events: Vec<HealingEvent>,
    session_start: Instant,
    session_start_ms: u64,
}

/// Thread-safe accumulator of healing events for one test session.
pub struct HealingReport {
    state: Mutex<ReportState>,
}

impl HealingReport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ReportState {
                events: Vec::new(),
                session_start: Instant::now(),
                session_start_ms: now_ms(),
            }),
        }
    }

    pub fn record(&self, event: HealingEvent) {
        self.state.lock().events.push(event);
    }

    pub fn events(&self) -> Vec<HealingEvent> {
        self.state.lock().events.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all events and restart the session clock.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.events.clear();
        state.session_start = Instant::now();
        state.session_start_ms = now_ms();
    }

    /// Wall-clock timestamp of the current session's start.
    pub fn session_start_ms(&self) -> u64 {
        self.state.lock().session_start_ms
    }

    pub fn summary(&self) -> ReportSummary {
        let state = self.state.lock();
        Self::summarize(&state.events, state.session_start)
    }

    fn summarize(events: &[HealingEvent], session_start: Instant) -> ReportSummary {
        let total = events.len();
        let successful = events.iter().filter(|e| e.success).count();
        let cache_hits = events
            .iter()
            .filter(|e| e.source == HealSource::Cache)
            .count();
        let total_elapsed: u64 = events.iter().map(|e| e.elapsed_ms).sum();

        ReportSummary {
            total_attempts: total,
            successful,
            failed: total - successful,
            success_rate: ratio(successful, total),
            cache_hits,
            cache_hit_rate: ratio(cache_hits, total),
            average_elapsed_ms: if total > 0 {
                total_elapsed as f64 / total as f64
            } else {
                0.0
            },
            session_elapsed_ms: session_start.elapsed().as_millis() as u64,
        }
    }

    /// Full JSON report: session summary, per-source breakdown, per-locator
    /// aggregation, and the complete event list.
    pub fn full_report(&self) -> Value {
        let state = self.state.lock();
        let summary = Self::summarize(&state.events, state.session_start);

        let mut by_source: HashMap<&'static str, usize> = HashMap::new();
        for event in &state.events {
            *by_source.entry(event.source.as_str()).or_default() += 1;
        }

        let mut by_locator: HashMap<String, (usize, usize)> = HashMap::new();
        for event in &state.events {
            let entry = by_locator.entry(event.cache_key()).or_default();
            entry.0 += 1;
            if event.success {
                entry.1 += 1;
            }
        }
        let locators: Vec<Value> = by_locator
            .into_iter()
            .map(|(key, (attempts, successes))| {
                json!({
                    "locator": key,
                    "attempts": attempts,
                    "successes": successes,
                    "success_rate": ratio(successes, attempts),
                })
            })
            .collect();

        json!({
            "generated_at_ms": now_ms(),
            "session_start_ms": state.session_start_ms,
            "summary": summary,
            "by_source": by_source,
            "locators": locators,
            "events": state.events,
        })
    }

    /// Simplified JSON report: one entry per unique locator, keeping the
    /// most recent attempt and counting how many repeats the cache absorbed.
    pub fn simplified_report(&self) -> Value {
        let state = self.state.lock();

        // Last event per cache key wins; preserve first-seen order.
        let mut order: Vec<String> = Vec::new();
        let mut latest: HashMap<String, &HealingEvent> = HashMap::new();
        let mut cache_hits: HashMap<String, usize> = HashMap::new();

        for event in &state.events {
            let key = event.cache_key();
            if !latest.contains_key(&key) {
                order.push(key.clone());
            }
            if event.source == HealSource::Cache {
                *cache_hits.entry(key.clone()).or_default() += 1;
            }
            latest.insert(key, event);
        }

        let entries: Vec<Value> = order
            .iter()
            .map(|key| {
                let event = latest[key];
                json!({
                    "locator": key,
                    "original": {
                        "kind": event.original_kind.as_str(),
                        "value": event.original_value,
                    },
                    "healed": event.healed_kind.map(|kind| json!({
                        "kind": kind.as_str(),
                        "value": event.healed_value,
                        "confidence": event.confidence,
                    })),
                    "success": event.success,
                    "cache_hits": cache_hits.get(key).copied().unwrap_or(0),
                })
            })
            .collect();

        json!({
            "generated_at_ms": now_ms(),
            "session_start_ms": state.session_start_ms,
            "total_unique_locators": order.len(),
            "total_attempts": state.events.len(),
            "locators": entries,
        })
    }
}

impl Default for HealingReport {
    fn default() -> Self {
        Self::new()
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(value: &str, source: HealSource, success: bool) -> HealingEvent {
        HealingEvent {
            original_kind: LocatorKind::Id,
            original_value: value.to_string(),
            semantic_key: None,
            healed_kind: success.then_some(LocatorKind::Id),
            healed_value: success.then(|| format!("{value}_v2")),
            confidence: if success { 0.9 } else { 0.0 },
            alternatives: Vec::new(),
            source,
            success,
            elapsed_ms: 10,
            timestamp_ms: now_ms(),
            platform: Platform::Android,
        }
    }

    #[test]
    fn test_summary_counts() {
        let report = HealingReport::new();
        report.record(event("a", HealSource::Local, true));
        report.record(event("a", HealSource::Cache, true));
        report.record(event("b", HealSource::Local, false));

        let summary = report.summary();
        assert_eq!(summary.total_attempts, 3);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.cache_hits, 1);
        assert!((summary.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((summary.cache_hit_rate - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_simplified_report_dedupes_by_cache_key() {
        let report = HealingReport::new();
        report.record(event("login", HealSource::Local, true));
        report.record(event("login", HealSource::Cache, true));
        report.record(event("login", HealSource::Cache, true));
        report.record(event("cart", HealSource::Local, false));

        let simplified = report.simplified_report();
        assert_eq!(simplified["total_unique_locators"], 2);
        assert_eq!(simplified["total_attempts"], 4);

        let locators = simplified["locators"].as_array().unwrap();
        assert_eq!(locators.len(), 2);
        assert_eq!(locators[0]["locator"], "id||login");
        assert_eq!(locators[0]["cache_hits"], 2);
        assert_eq!(locators[1]["locator"], "id||cart");
        assert_eq!(locators[1]["cache_hits"], 0);
    }

    #[test]
    fn test_semantic_key_distinguishes_locators() {
        let report = HealingReport::new();
        let mut with_key = event("login", HealSource::Local, true);
        with_key.semantic_key = Some("login.submit".to_string());
        report.record(event("login", HealSource::Local, true));
        report.record(with_key);

        let simplified = report.simplified_report();
        assert_eq!(simplified["total_unique_locators"], 2);
    }

    #[test]
    fn test_full_report_shape() {
        let report = HealingReport::new();
        report.record(event("a", HealSource::Local, true));
        report.record(event("a", HealSource::Local, false));

        let full = report.full_report();
        assert_eq!(full["summary"]["total_attempts"], 2);
        assert_eq!(full["by_source"]["local"], 2);
        let locators = full["locators"].as_array().unwrap();
        assert_eq!(locators.len(), 1);
        assert_eq!(locators[0]["attempts"], 2);
        assert_eq!(locators[0]["successes"], 1);
        assert_eq!(full["events"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_clear_resets_session() {
        let report = HealingReport::new();
        report.record(event("a", HealSource::Local, true));
        let started = report.session_start_ms();
        report.clear();
        assert!(report.is_empty());
        assert_eq!(report.summary().total_attempts, 0);
        assert!(report.session_start_ms() >= started);
    }

    #[test]
    fn test_reports_carry_session_start_timestamp() {
        let report = HealingReport::new();
        report.record(event("a", HealSource::Local, true));

        let full = report.full_report();
        let start = full["session_start_ms"].as_u64().unwrap();
        assert!(start > 0);
        assert!(start <= full["generated_at_ms"].as_u64().unwrap());

        let simplified = report.simplified_report();
        assert_eq!(simplified["session_start_ms"].as_u64().unwrap(), start);
    }
}

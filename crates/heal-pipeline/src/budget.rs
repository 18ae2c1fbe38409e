//! Cooperative time and node budget shared by all strategies

use std::time::{Duration, Instant};

/// Wall-clock and node-count budget for one healing attempt.
///
/// Polled between node iterations; a single slow step is never preempted.
/// Exhaustion is a normal termination condition, not an error.
#[derive(Debug)]
pub struct HealBudget {
    started: Instant,
    deadline: Instant,
    max_nodes: usize,
    nodes_processed: usize,
    exhausted: bool,
}

impl HealBudget {
    pub fn new(max_elapsed: Duration, max_nodes: usize) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: started + max_elapsed,
            max_nodes,
            nodes_processed: 0,
            exhausted: false,
        }
    }

    /// Whether another node may be processed. Latches the exhausted flag on
    /// the first failed check.
    pub fn can_process(&mut self) -> bool {
        if self.nodes_processed >= self.max_nodes || Instant::now() >= self.deadline {
            self.exhausted = true;
            return false;
        }
        true
    }

    /// Count one processed node.
    pub fn tick(&mut self) {
        self.nodes_processed += 1;
    }

    pub fn has_time_remaining(&self) -> bool {
        Instant::now() < self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn nodes_processed(&self) -> usize {
        self.nodes_processed
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_limit_latches_exhaustion() {
        let mut budget = HealBudget::new(Duration::from_secs(60), 2);
        assert!(budget.can_process());
        budget.tick();
        assert!(budget.can_process());
        budget.tick();
        assert!(!budget.can_process());
        assert!(budget.is_exhausted());
        assert_eq!(budget.nodes_processed(), 2);
    }

    #[test]
    fn test_zero_time_budget_is_immediately_exhausted() {
        let mut budget = HealBudget::new(Duration::ZERO, 100);
        assert!(!budget.can_process());
        assert!(!budget.has_time_remaining());
        assert!(budget.is_exhausted());
    }

    #[test]
    fn test_fresh_budget_is_not_exhausted() {
        let budget = HealBudget::new(Duration::from_secs(45), 1000);
        assert!(!budget.is_exhausted());
        assert!(budget.has_time_remaining());
        assert!(budget.remaining() <= Duration::from_secs(45));
    }
}

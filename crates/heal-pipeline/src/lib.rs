//! Budgeted multi-strategy locator healing
//!
//! When a UI locator goes stale, the [`HealingEngine`] takes the original
//! locator, an optional semantic key, and a fresh UI-tree snapshot, and runs
//! four ordered strategies under a shared time/node budget to propose a
//! scored replacement. Results are cached with reliability tracking and
//! every attempt is recorded for session telemetry.

pub mod alternatives;
pub mod budget;
pub mod config;
pub mod engine;
pub mod keywords;
pub mod pipeline;
pub mod strategies;

pub use budget::HealBudget;
pub use config::HealConfig;
pub use engine::{heal_by_feature_score, HealOutcome, HealingEngine};
pub use keywords::search_terms_from_key;
pub use pipeline::{run, PipelineOutcome};
pub use strategies::StrategyHit;

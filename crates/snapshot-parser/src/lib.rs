//! UI-tree snapshot parsing and element feature extraction
//!
//! Turns a textual UI-tree snapshot (an Appium-style page source) into a
//! flat, document-ordered list of [`SnapshotNode`] with platform tagging, and
//! projects each node into the comparable attribute bundle the healing
//! strategies score against.

pub mod errors;
pub mod features;
pub mod parser;

pub use errors::SnapshotError;
pub use features::{attribute_for_kind, context_attributes, probe_identifier};
pub use parser::{detect_platform, parse_snapshot, Snapshot, SnapshotNode};

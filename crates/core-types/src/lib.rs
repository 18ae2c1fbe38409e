//! Shared primitives for the locator healing engine
//!
//! Every crate in the workspace speaks in terms of these types: a
//! [`LocatorSpec`] describes what the caller originally asked for, a
//! [`Candidate`] is a scored replacement proposed by the pipeline, and
//! [`classify_failure`] tells the retry wrapper at the boundary whether a
//! driver failure is worth healing at all.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mobile platform detected from a UI-tree snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Ios,
    Android,
    #[default]
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Unknown => "unknown",
        }
    }
}

/// Locator strategy enumeration
///
/// Canonical set of ways to address a UI element. Platform-specific kinds
/// (`UiAutomator`, `IosClassChain`, `IosPredicate`) only appear in fallback
/// expressions for the matching platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocatorKind {
    /// Identifier attribute (resource-id on Android, name on iOS)
    Id,
    /// Accessibility identifier (content-desc on Android, name on iOS)
    Accessibility,
    /// Visible name or text
    Name,
    /// Class or element-type tag
    ClassName,
    /// Structural tree-path expression
    XPath,
    /// Android UiSelector expression
    UiAutomator,
    /// iOS class chain expression
    IosClassChain,
    /// iOS NSPredicate expression
    IosPredicate,
}

impl LocatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocatorKind::Id => "id",
            LocatorKind::Accessibility => "accessibility",
            LocatorKind::Name => "name",
            LocatorKind::ClassName => "classname",
            LocatorKind::XPath => "xpath",
            LocatorKind::UiAutomator => "uiautomator",
            LocatorKind::IosClassChain => "ios-class-chain",
            LocatorKind::IosPredicate => "ios-predicate",
        }
    }

    /// Normalize a free-form kind string onto the canonical set.
    ///
    /// Accepts the aliases drivers commonly report ("aid", "resourceid",
    /// "cn", "iosnspredicatestring", ...). Unknown kinds default to
    /// `Accessibility`, the broadest attribute to heal against.
    pub fn canonical(raw: &str) -> LocatorKind {
        let lower: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_lowercase();

        match lower.as_str() {
            "id" | "resourceid" => LocatorKind::Id,
            "accessibility" | "aid" | "accessibilityid" => LocatorKind::Accessibility,
            "name" | "text" => LocatorKind::Name,
            "classname" | "cn" | "class" | "tagname" => LocatorKind::ClassName,
            "xpath" => LocatorKind::XPath,
            "uiautomator" | "androiduiautomator" => LocatorKind::UiAutomator,
            "classchain" | "iosclasschain" => LocatorKind::IosClassChain,
            "predicate" | "iospredicate" | "iosnspredicatestring" => LocatorKind::IosPredicate,
            _ => LocatorKind::Accessibility,
        }
    }
}

/// Immutable description of what the caller originally asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorSpec {
    pub kind: LocatorKind,
    pub value: String,
}

impl LocatorSpec {
    pub fn new(kind: LocatorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Deterministic cache key for this spec plus an optional semantic key.
    ///
    /// Shared by the result cache and telemetry so the two always agree on
    /// which attempts refer to the same locator.
    pub fn cache_key(&self, semantic_key: Option<&str>) -> String {
        match semantic_key.filter(|k| !k.is_empty()) {
            Some(key) => format!("{}||{}||KEY:{}", self.kind.as_str(), self.value, key),
            None => format!("{}||{}", self.kind.as_str(), self.value),
        }
    }
}

/// A scored replacement locator proposed by the healing pipeline.
///
/// Immutable once returned. `score` is always within `[0, 1]` and
/// `fallbacks` never repeats the primary value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub kind: LocatorKind,
    pub value: String,
    pub score: f64,
    pub platform: Platform,
    /// Alternative locator expressions in priority order, `kind=value` form.
    pub fallbacks: Vec<String>,
}

impl Candidate {
    pub fn new(kind: LocatorKind, value: impl Into<String>, score: f64, platform: Platform) -> Self {
        Self {
            kind,
            value: value.into(),
            score: score.clamp(0.0, 1.0),
            platform,
            fallbacks: Vec::new(),
        }
    }

    /// Attach fallback expressions, dropping duplicates and any entry whose
    /// value part equals the primary value.
    pub fn with_fallbacks(mut self, fallbacks: Vec<String>) -> Self {
        let mut seen = Vec::new();
        for fb in fallbacks {
            let value_part = fb.split_once('=').map(|(_, v)| v).unwrap_or(fb.as_str());
            if value_part != self.value && !seen.contains(&fb) {
                seen.push(fb);
            }
        }
        self.fallbacks = seen;
        self
    }

    pub fn is_high_confidence(&self, threshold: f64) -> bool {
        self.score >= threshold
    }
}

/// Where a healing result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealSource {
    Cache,
    Local,
    External,
}

impl HealSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealSource::Cache => "cache",
            HealSource::Local => "local",
            HealSource::External => "external",
        }
    }
}

/// Healer error enumeration
///
/// "Element not found" is never an error in this engine; only programmer
/// errors (malformed configuration) surface as `Err`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HealerError {
    /// Configuration rejected during engine construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Driver failure taxonomy at the retry-wrapper boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverFailure {
    ElementNotFound,
    Timeout,
    StaleElement,
    InvalidSelector,
    ElementNotInteractable,
    ClickIntercepted,
    UnexpectedAlert,
    SessionLost,
    SessionNotCreated,
    DriverUnreachable,
    Unknown,
}

/// How critical a driver failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Classification of a driver failure: whether locator healing can recover
/// it, and how severe it is for the test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureClass {
    pub recoverable: bool,
    pub severity: Severity,
}

/// Classify a driver failure for the retry wrapper.
///
/// Locator-level failures are recoverable by healing; session-level failures
/// require a driver restart and must stop the run.
pub fn classify_failure(failure: DriverFailure) -> FailureClass {
    match failure {
        DriverFailure::ElementNotFound
        | DriverFailure::Timeout
        | DriverFailure::StaleElement
        | DriverFailure::InvalidSelector => FailureClass {
            recoverable: true,
            severity: Severity::High,
        },
        DriverFailure::ElementNotInteractable | DriverFailure::ClickIntercepted => FailureClass {
            recoverable: true,
            severity: Severity::Medium,
        },
        DriverFailure::UnexpectedAlert => FailureClass {
            recoverable: false,
            severity: Severity::High,
        },
        DriverFailure::SessionLost
        | DriverFailure::SessionNotCreated
        | DriverFailure::DriverUnreachable => FailureClass {
            recoverable: false,
            severity: Severity::Critical,
        },
        DriverFailure::Unknown => FailureClass {
            recoverable: false,
            severity: Severity::Medium,
        },
    }
}

//! Snapshot parsing with platform detection

use std::collections::HashMap;

use healer_core_types::Platform;
use tracing::debug;

use crate::errors::SnapshotError;

/// One element of a parsed UI-tree snapshot.
///
/// Raw attributes are kept as owned strings (empty when absent, matching how
/// drivers report them); `usable` is computed once at parse time so the
/// strategies never re-derive it. `parent` and `prev_sibling` index into the
/// owning [`Snapshot`]'s node list.
#[derive(Debug, Clone)]
pub struct SnapshotNode {
    pub index: usize,
    pub tag: String,
    pub resource_id: String,
    pub content_desc: String,
    pub text: String,
    pub name: String,
    pub label: String,
    pub value: String,
    pub type_tag: String,
    pub class_name: String,
    pub usable: bool,
    pub parent: Option<usize>,
    pub prev_sibling: Option<usize>,
}

/// A parsed snapshot: detected platform plus nodes in document order.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub platform: Platform,
    pub nodes: Vec<SnapshotNode>,
}

/// Detect the platform from snapshot content.
///
/// iOS markers take priority (XCUITest element-type prefixes), then Android
/// markers (package-style class names, Android attribute names).
pub fn detect_platform(source: &str) -> Platform {
    if source.contains("XCUIElement") || source.contains("XCUIApplication") {
        return Platform::Ios;
    }
    if source.contains("android.") || source.contains("com.android.") {
        return Platform::Android;
    }
    if source.contains("resource-id") || source.contains("content-desc") {
        return Platform::Android;
    }
    Platform::Unknown
}

/// Parse a textual snapshot into a flat, order-stable node list.
///
/// Empty or whitespace-only input yields an empty snapshot; malformed XML
/// yields [`SnapshotError::Malformed`]. Neither outcome panics.
pub fn parse_snapshot(source: &str) -> Result<Snapshot, SnapshotError> {
    if source.trim().is_empty() {
        return Ok(Snapshot::default());
    }

    let platform = detect_platform(source);
    let doc = roxmltree::Document::parse(source)
        .map_err(|e| SnapshotError::Malformed(e.to_string()))?;

    let mut nodes = Vec::new();
    let mut index_of = HashMap::new();

    for element in doc.descendants().filter(|n| n.is_element()) {
        let index = nodes.len();
        index_of.insert(element.id(), index);

        let parent = element
            .parent()
            .filter(|p| p.is_element())
            .and_then(|p| index_of.get(&p.id()).copied());
        let prev_sibling = element
            .prev_sibling_element()
            .and_then(|s| index_of.get(&s.id()).copied());

        let attr = |name: &str| element.attribute(name).unwrap_or("").to_string();

        let usable = is_usable(
            platform,
            element.attribute("visible"),
            element.attribute("enabled"),
            element.attribute("displayed"),
        );

        nodes.push(SnapshotNode {
            index,
            tag: element.tag_name().name().to_string(),
            resource_id: attr("resource-id"),
            content_desc: attr("content-desc"),
            text: attr("text"),
            name: attr("name"),
            label: attr("label"),
            value: attr("value"),
            type_tag: attr("type"),
            class_name: attr("class"),
            usable,
            parent,
            prev_sibling,
        });
    }

    debug!(platform = platform.as_str(), nodes = nodes.len(), "parsed snapshot");

    Ok(Snapshot { platform, nodes })
}

/// Visible-and-enabled check with platform-specific attribute names.
///
/// Missing attributes count as usable; only an explicit "false" disables.
fn is_usable(
    platform: Platform,
    visible: Option<&str>,
    enabled: Option<&str>,
    displayed: Option<&str>,
) -> bool {
    let is_false = |v: Option<&str>| v.is_some_and(|s| s.eq_ignore_ascii_case("false"));

    match platform {
        Platform::Android => !is_false(enabled) && !is_false(displayed),
        Platform::Ios => !is_false(visible) && !is_false(enabled),
        Platform::Unknown => true,
    }
}

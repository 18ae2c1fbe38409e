//! Element feature extraction
//!
//! Projects a raw [`SnapshotNode`] into the attribute a given locator kind
//! would address on the detected platform. Attribute semantics differ per
//! platform: "identifier" means `name` on iOS but `resource-id` on Android.

use healer_core_types::{LocatorKind, Platform};

use crate::parser::SnapshotNode;

/// Extract the attribute value the given locator kind addresses on this node.
///
/// Returns an empty string when the node carries nothing for that kind.
pub fn attribute_for_kind<'a>(
    node: &'a SnapshotNode,
    kind: LocatorKind,
    platform: Platform,
) -> &'a str {
    match platform {
        Platform::Ios => match kind {
            LocatorKind::Id | LocatorKind::Accessibility => &node.name,
            LocatorKind::Name => {
                if node.label.is_empty() {
                    &node.value
                } else {
                    &node.label
                }
            }
            LocatorKind::ClassName => &node.type_tag,
            _ => &node.name,
        },
        Platform::Android => match kind {
            LocatorKind::Id => &node.resource_id,
            LocatorKind::Accessibility => &node.content_desc,
            LocatorKind::Name => &node.text,
            LocatorKind::ClassName => &node.class_name,
            _ => &node.content_desc,
        },
        Platform::Unknown => probe_identifier(node),
    }
}

/// Probe order for platforms we could not identify: identifier, description,
/// text, label. First non-empty wins.
pub fn probe_identifier(node: &SnapshotNode) -> &str {
    [&node.name, &node.content_desc, &node.text, &node.label]
        .into_iter()
        .find(|v| !v.is_empty())
        .map(String::as_str)
        .unwrap_or("")
}

/// Concatenate a node's platform-relevant attributes for context matching.
pub fn context_attributes(node: &SnapshotNode, platform: Platform) -> String {
    let parts: &[&String] = match platform {
        Platform::Ios => &[&node.name, &node.label, &node.value, &node.type_tag],
        Platform::Android => &[
            &node.resource_id,
            &node.content_desc,
            &node.text,
            &node.class_name,
        ],
        Platform::Unknown => &[
            &node.name,
            &node.label,
            &node.text,
            &node.resource_id,
            &node.content_desc,
        ],
    };

    let mut out = String::new();
    for part in parts {
        if !part.is_empty() {
            out.push_str(part);
            out.push(' ');
        }
    }
    out
}

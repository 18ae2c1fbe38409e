//! Fallback locator expressions for a healed node
//!
//! Once a winner is chosen, the node it matched is turned into a priority
//! list of alternative `kind=value` expressions the caller can try when the
//! primary healed locator fails at use time.

use healer_core_types::{LocatorKind, Platform};
use snapshot_parser::SnapshotNode;

/// Build a structural path expression for a node: `//Tag[@attr='value']`,
/// predicated on the most stable attribute the platform offers.
pub fn build_tree_path(node: &SnapshotNode, platform: Platform) -> String {
    let mut path = format!("//{}", node.tag);

    let predicate = match platform {
        Platform::Android => [
            ("resource-id", &node.resource_id),
            ("content-desc", &node.content_desc),
            ("text", &node.text),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_empty()),
        Platform::Ios => [("name", &node.name), ("label", &node.label)]
            .into_iter()
            .find(|(_, v)| !v.is_empty()),
        Platform::Unknown => [
            ("resource-id", &node.resource_id),
            ("name", &node.name),
            ("content-desc", &node.content_desc),
            ("text", &node.text),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_empty()),
    };

    if let Some((attr, value)) = predicate {
        path.push_str(&format!("[@{attr}='{value}']"));
    }
    path
}

/// Enumerate alternative locator expressions for a node in priority order.
///
/// Expressions use `kind=value` form. The caller filters out entries equal
/// to the primary value when attaching them to a candidate.
pub fn fallback_locators(node: &SnapshotNode, platform: Platform) -> Vec<String> {
    let mut alternatives = Vec::new();

    match platform {
        Platform::Ios => {
            if !node.name.is_empty() {
                alternatives.push(format!("{}={}", LocatorKind::Accessibility.as_str(), node.name));
            }
            if !node.label.is_empty() {
                alternatives.push(format!("{}={}", LocatorKind::Name.as_str(), node.label));
            }
            if !node.name.is_empty() && !node.type_tag.is_empty() {
                alternatives.push(format!(
                    "{}=**/{}[`name == '{}'`]",
                    LocatorKind::IosClassChain.as_str(),
                    node.type_tag,
                    node.name
                ));
            }
            if !node.name.is_empty() {
                alternatives.push(format!(
                    "{}=name == '{}'",
                    LocatorKind::IosPredicate.as_str(),
                    node.name
                ));
            }
        }
        Platform::Android => {
            if !node.resource_id.is_empty() {
                alternatives.push(format!("{}={}", LocatorKind::Id.as_str(), node.resource_id));
            }
            if !node.content_desc.is_empty() {
                alternatives.push(format!(
                    "{}={}",
                    LocatorKind::Accessibility.as_str(),
                    node.content_desc
                ));
            }
            if !node.text.is_empty() {
                alternatives.push(format!("{}={}", LocatorKind::Name.as_str(), node.text));
            }
            if !node.resource_id.is_empty() {
                alternatives.push(format!(
                    "{}=new UiSelector().resourceId(\"{}\")",
                    LocatorKind::UiAutomator.as_str(),
                    node.resource_id
                ));
            } else if !node.content_desc.is_empty() {
                alternatives.push(format!(
                    "{}=new UiSelector().description(\"{}\")",
                    LocatorKind::UiAutomator.as_str(),
                    node.content_desc
                ));
            }
        }
        Platform::Unknown => {}
    }

    alternatives.push(format!(
        "{}={}",
        LocatorKind::XPath.as_str(),
        build_tree_path(node, platform)
    ));

    alternatives
}

#[cfg(test)]
mod tests {
    use super::*;

    fn android_node() -> SnapshotNode {
        SnapshotNode {
            index: 0,
            tag: "android.widget.Button".to_string(),
            resource_id: "com.demo:id/login".to_string(),
            content_desc: "Log in".to_string(),
            text: "LOG IN".to_string(),
            name: String::new(),
            label: String::new(),
            value: String::new(),
            type_tag: String::new(),
            class_name: "android.widget.Button".to_string(),
            usable: true,
            parent: None,
            prev_sibling: None,
        }
    }

    fn ios_node() -> SnapshotNode {
        SnapshotNode {
            index: 0,
            tag: "XCUIElementTypeButton".to_string(),
            resource_id: String::new(),
            content_desc: String::new(),
            text: String::new(),
            name: "login_button".to_string(),
            label: "Log in".to_string(),
            value: String::new(),
            type_tag: "XCUIElementTypeButton".to_string(),
            class_name: String::new(),
            usable: true,
            parent: None,
            prev_sibling: None,
        }
    }

    #[test]
    fn test_android_tree_path_prefers_resource_id() {
        let node = android_node();
        assert_eq!(
            build_tree_path(&node, Platform::Android),
            "//android.widget.Button[@resource-id='com.demo:id/login']"
        );

        let mut without_id = node;
        without_id.resource_id.clear();
        assert_eq!(
            build_tree_path(&without_id, Platform::Android),
            "//android.widget.Button[@content-desc='Log in']"
        );
    }

    #[test]
    fn test_bare_tree_path_without_attributes() {
        let mut node = android_node();
        node.resource_id.clear();
        node.content_desc.clear();
        node.text.clear();
        assert_eq!(build_tree_path(&node, Platform::Android), "//android.widget.Button");
    }

    #[test]
    fn test_android_fallback_priority_order() {
        let alternatives = fallback_locators(&android_node(), Platform::Android);
        assert_eq!(
            alternatives,
            vec![
                "id=com.demo:id/login".to_string(),
                "accessibility=Log in".to_string(),
                "name=LOG IN".to_string(),
                "uiautomator=new UiSelector().resourceId(\"com.demo:id/login\")".to_string(),
                "xpath=//android.widget.Button[@resource-id='com.demo:id/login']".to_string(),
            ]
        );
    }

    #[test]
    fn test_ios_fallbacks_include_class_chain_and_predicate() {
        let alternatives = fallback_locators(&ios_node(), Platform::Ios);
        assert!(alternatives.contains(&"accessibility=login_button".to_string()));
        assert!(alternatives.contains(&"name=Log in".to_string()));
        assert!(alternatives
            .contains(&"ios-class-chain=**/XCUIElementTypeButton[`name == 'login_button'`]".to_string()));
        assert!(alternatives.contains(&"ios-predicate=name == 'login_button'".to_string()));
        assert!(alternatives
            .contains(&"xpath=//XCUIElementTypeButton[@name='login_button']".to_string()));
    }
}

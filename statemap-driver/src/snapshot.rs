use serde::{Deserialize, Serialize};

/// One observed screen: the URL and title the browser reported plus the
/// accessibility tree rooted at the document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub tree: AxNode,
    /// Digest of the raw markup, when the capturing driver provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom_hash: Option<String>,
}

impl Snapshot {
    pub fn new(url: impl Into<String>, title: impl Into<String>, tree: AxNode) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            tree,
            dom_hash: None,
        }
    }

    /// A snapshot with no structure at all, e.g. a blank or still-loading page.
    pub fn empty(url: impl Into<String>) -> Self {
        Self::new(url, "", AxNode::default())
    }

    pub fn with_dom_hash(mut self, hash: impl Into<String>) -> Self {
        self.dom_hash = Some(hash.into());
        self
    }
}

/// A node of the accessibility tree as captured by a driver. The shape
/// mirrors what aria-snapshot style APIs report: a role, an accessible
/// name, and the small set of ARIA state attributes that matter for
/// distinguishing dynamic conditions of the same screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxNode {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub name: String,
    /// Role-dependent value; for links this carries the href.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AxNode>,
}

impl AxNode {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            ..Self::default()
        }
    }

    pub fn named(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_children(mut self, children: Vec<AxNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = Some(expanded);
        self
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = Some(selected);
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    pub fn with_pressed(mut self, pressed: bool) -> Self {
        self.pressed = Some(pressed);
        self
    }

    pub fn with_current(mut self, current: bool) -> Self {
        self.current = Some(current);
        self
    }

    /// Preorder traversal over the whole subtree, `self` included.
    pub fn visit(&self, f: &mut impl FnMut(&AxNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_is_preorder() {
        let tree = AxNode::new("root").with_children(vec![
            AxNode::new("navigation")
                .with_children(vec![AxNode::named("link", "Home").with_value("/home")]),
            AxNode::new("main"),
        ]);

        let mut roles = Vec::new();
        tree.visit(&mut |node| roles.push(node.role.clone()));
        assert_eq!(roles, vec!["root", "navigation", "link", "main"]);
    }

    #[test]
    fn snapshot_serde_skips_absent_state() {
        let snap = Snapshot::new("http://app/login", "Login", AxNode::new("form"));
        let json = serde_json::to_string(&snap).unwrap();
        assert!(!json.contains("expanded"));
        assert!(!json.contains("dom_hash"));

        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}

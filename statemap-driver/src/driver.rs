use async_trait::async_trait;

use crate::action::{ActionDescriptor, ActionType};
use crate::error::Result;
use crate::snapshot::{AxNode, Snapshot};

/// The browser-facing contract the discovery engine drives. One driver
/// instance owns one browser context; calls are issued strictly one at a
/// time because every action mutates the live screen.
#[async_trait]
pub trait Driver: Send {
    /// Capture the screen the driver is currently positioned on.
    async fn capture_snapshot(&mut self) -> Result<Snapshot>;

    /// Enumerate candidate interactions in snapshot order. Pure over the
    /// snapshot; the default walks the accessibility tree.
    fn list_candidate_actions(&self, snapshot: &Snapshot) -> Vec<ActionDescriptor> {
        enumerate_actions(snapshot)
    }

    /// Perform one action and return the screen it lands on.
    async fn execute(&mut self, action: &ActionDescriptor) -> Result<Snapshot>;

    /// Return to the previously visited screen.
    async fn go_back(&mut self) -> Result<Snapshot>;

    /// Position the driver on an absolute URL.
    async fn navigate(&mut self, url: &str) -> Result<Snapshot>;
}

const FILL_ROLES: [&str; 4] = ["textbox", "combobox", "searchbox", "spinbutton"];

/// Candidate actions for a snapshot, in document (preorder) order: links
/// with an href become navigations, other links and buttons become clicks,
/// text-entry roles become fills. Enumeration order is the contract that
/// makes repeated runs deterministic.
pub fn enumerate_actions(snapshot: &Snapshot) -> Vec<ActionDescriptor> {
    let mut actions = Vec::new();
    collect(&snapshot.tree, &mut actions);
    actions
}

fn collect(node: &AxNode, actions: &mut Vec<ActionDescriptor>) {
    if node.disabled != Some(true) {
        match node.role.as_str() {
            "button" if !node.name.is_empty() => {
                actions.push(ActionDescriptor::click(node.name.clone()));
            }
            "link" if !node.name.is_empty() => {
                let descriptor = match &node.value {
                    Some(href) => ActionDescriptor::navigate(node.name.clone(), href.clone()),
                    None => ActionDescriptor::click(node.name.clone()),
                };
                actions.push(descriptor);
            }
            role if FILL_ROLES.contains(&role) && !node.name.is_empty() => {
                actions.push(ActionDescriptor {
                    action_type: ActionType::Fill,
                    target: node.name.clone(),
                    value: None,
                });
            }
            _ => {}
        }
    }

    for child in &node.children {
        collect(child, actions);
    }
}

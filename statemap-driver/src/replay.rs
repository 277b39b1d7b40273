use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::action::{ActionDescriptor, ActionType};
use crate::driver::Driver;
use crate::error::{DriverError, Result};
use crate::snapshot::Snapshot;

/// A recorded walk through an application: every reachable page plus the
/// edges that connect them. Scripts back the engine's tests and the CLI's
/// offline mode; a live browser driver is a separate implementation of the
/// same trait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    pub start_url: String,
    pub pages: Vec<Snapshot>,
    #[serde(default)]
    pub edges: Vec<ReplayEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayEdge {
    pub from_url: String,
    pub action_type: ActionType,
    pub target: String,
    #[serde(default)]
    pub to_url: String,
    /// Scripted failure: executing this edge raises a driver error.
    #[serde(default)]
    pub fail: bool,
}

impl ReplayScript {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            pages: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn page(mut self, snapshot: Snapshot) -> Self {
        self.pages.push(snapshot);
        self
    }

    pub fn edge(
        mut self,
        from_url: impl Into<String>,
        action_type: ActionType,
        target: impl Into<String>,
        to_url: impl Into<String>,
    ) -> Self {
        self.edges.push(ReplayEdge {
            from_url: from_url.into(),
            action_type,
            target: target.into(),
            to_url: to_url.into(),
            fail: false,
        });
        self
    }

    pub fn failing_edge(
        mut self,
        from_url: impl Into<String>,
        action_type: ActionType,
        target: impl Into<String>,
    ) -> Self {
        self.edges.push(ReplayEdge {
            from_url: from_url.into(),
            action_type,
            target: target.into(),
            to_url: String::new(),
            fail: true,
        });
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

type EdgeKey = (String, ActionType, String);

/// Deterministic in-process driver that serves snapshots from a
/// [`ReplayScript`]. Unscripted pages and edges surface as driver errors,
/// which is exactly how a flaky live target looks to the engine.
pub struct ReplayDriver {
    pages: HashMap<String, Snapshot>,
    edges: HashMap<EdgeKey, ReplayEdge>,
    current: String,
    history: Vec<String>,
    executed: Vec<ActionDescriptor>,
}

impl ReplayDriver {
    pub fn new(script: ReplayScript) -> Result<Self> {
        let mut pages = HashMap::new();
        for snapshot in script.pages {
            pages.insert(snapshot.url.clone(), snapshot);
        }
        if !pages.contains_key(&script.start_url) {
            return Err(DriverError::MalformedScript(format!(
                "start page {} is not scripted",
                script.start_url
            )));
        }

        let mut edges = HashMap::new();
        for edge in script.edges {
            if !edge.fail && !pages.contains_key(&edge.to_url) {
                return Err(DriverError::MalformedScript(format!(
                    "edge '{}' from {} leads to unscripted page {}",
                    edge.target, edge.from_url, edge.to_url
                )));
            }
            let key = (edge.from_url.clone(), edge.action_type, edge.target.clone());
            edges.insert(key, edge);
        }

        Ok(Self {
            pages,
            edges,
            current: script.start_url,
            history: Vec::new(),
            executed: Vec::new(),
        })
    }

    pub fn current_url(&self) -> &str {
        &self.current
    }

    /// Every action attempted through [`Driver::execute`], in order.
    pub fn executed(&self) -> &[ActionDescriptor] {
        &self.executed
    }

    fn snapshot_of(&self, url: &str) -> Result<Snapshot> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| DriverError::PageNotScripted(url.to_string()))
    }
}

#[async_trait::async_trait]
impl Driver for ReplayDriver {
    async fn capture_snapshot(&mut self) -> Result<Snapshot> {
        self.snapshot_of(&self.current)
    }

    async fn execute(&mut self, action: &ActionDescriptor) -> Result<Snapshot> {
        self.executed.push(action.clone());

        let key = (
            self.current.clone(),
            action.action_type,
            action.target.clone(),
        );
        let edge = self.edges.get(&key).cloned().ok_or_else(|| {
            DriverError::ActionFailed {
                target: action.target.clone(),
                reason: format!("no scripted outcome on {}", self.current),
            }
        })?;

        if edge.fail {
            return Err(DriverError::ActionFailed {
                target: action.target.clone(),
                reason: "scripted failure".to_string(),
            });
        }

        debug!(from = %self.current, to = %edge.to_url, action = %action, "replaying edge");
        let snapshot = self.snapshot_of(&edge.to_url)?;
        self.history.push(std::mem::replace(&mut self.current, edge.to_url));
        Ok(snapshot)
    }

    async fn go_back(&mut self) -> Result<Snapshot> {
        let previous = self.history.pop().ok_or(DriverError::HistoryEmpty)?;
        self.current = previous;
        self.snapshot_of(&self.current)
    }

    async fn navigate(&mut self, url: &str) -> Result<Snapshot> {
        let snapshot = self.snapshot_of(url)?;
        if self.current != url {
            self.history.push(std::mem::replace(&mut self.current, url.to_string()));
        }
        Ok(snapshot)
    }
}

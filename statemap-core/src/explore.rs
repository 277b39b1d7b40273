use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use statemap_driver::{ActionDescriptor, Driver, Snapshot};

use crate::error::DiscoveryError;
use crate::fingerprint::Fingerprint;
use crate::graph::StateGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Dfs,
    Bfs,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Dfs => "DFS",
            Strategy::Bfs => "BFS",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether a candidate action may be attempted at all. Actions
/// rejected here are never sent to the driver.
pub type SafeActionPredicate = Arc<dyn Fn(&ActionDescriptor) -> bool + Send + Sync>;

/// Called after every state resolution with the current state count and
/// the id that was just confirmed or created.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

const DESTRUCTIVE_VERBS: [&str; 12] = [
    "delete",
    "remove",
    "destroy",
    "drop",
    "erase",
    "wipe",
    "reset",
    "format",
    "uninstall",
    "logout",
    "log out",
    "sign out",
];

/// Default predicate: refuse anything whose target reads like a
/// destructive verb.
pub fn default_safe_action() -> SafeActionPredicate {
    Arc::new(|action| {
        let target = action.target.to_lowercase();
        !DESTRUCTIVE_VERBS.iter().any(|verb| target.contains(verb))
    })
}

/// Per-run configuration; immutable for the run's duration.
pub struct DiscoveryConfig {
    pub strategy: Strategy,
    pub max_states: usize,
    pub timeout: Option<Duration>,
    pub safe_action: SafeActionPredicate,
    pub progress: Option<ProgressCallback>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Dfs,
            max_states: 100,
            timeout: None,
            safe_action: default_safe_action(),
            progress: None,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = max_states;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_safe_action(mut self, predicate: SafeActionPredicate) -> Self {
        self.safe_action = predicate;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }
}

#[derive(Debug)]
pub struct DiscoveryReport {
    pub run_id: String,
    pub strategy: Strategy,
    pub graph: StateGraph,
    pub actions_attempted: usize,
    pub actions_failed: usize,
    pub duration: Duration,
}

struct FrontierEntry {
    state_id: String,
    next_action: usize,
}

/// One discovery run: driver, graph, frontier and configuration bundled
/// into an explicit session object that is constructed per run and
/// consumed by [`DiscoverySession::run`]. The frontier and visited set are
/// working state only and die with the session.
pub struct DiscoverySession<D: Driver> {
    driver: D,
    config: DiscoveryConfig,
    graph: StateGraph,
    frontier: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    actions: HashMap<String, Vec<ActionDescriptor>>,
    entry_urls: HashMap<String, String>,
    current: Option<String>,
    attempted: usize,
    failed: usize,
}

impl<D: Driver> DiscoverySession<D> {
    pub fn new(driver: D, config: DiscoveryConfig) -> Self {
        Self::with_graph(driver, config, StateGraph::new())
    }

    /// Start from a pre-populated graph (normally a loaded seed). Matching
    /// snapshots reuse the seeded ids instead of allocating new ones.
    pub fn with_graph(driver: D, config: DiscoveryConfig, graph: StateGraph) -> Self {
        Self {
            driver,
            config,
            graph,
            frontier: VecDeque::new(),
            visited: HashSet::new(),
            actions: HashMap::new(),
            entry_urls: HashMap::new(),
            current: None,
            attempted: 0,
            failed: 0,
        }
    }

    pub async fn run(mut self) -> Result<DiscoveryReport, DiscoveryError> {
        let started = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        info!(%run_id, strategy = %self.config.strategy, "starting discovery");

        let snapshot = self
            .driver
            .capture_snapshot()
            .await
            .map_err(DiscoveryError::Aborted)?;
        let fingerprint = Fingerprint::from_snapshot(&snapshot);
        let root = self.graph.match_or_create(&fingerprint, None);
        self.report_progress(&root.id);
        self.admit(&root.id, &snapshot);
        self.current = Some(root.id.clone());

        while let Some(entry) = self.frontier.pop_front() {
            if self.budget_reached(started) {
                info!(
                    states = self.graph.state_count(),
                    "budget reached, finishing run"
                );
                break;
            }

            let Some(action) = self
                .actions
                .get(&entry.state_id)
                .and_then(|actions| actions.get(entry.next_action))
                .cloned()
            else {
                continue;
            };

            if self.reposition(&entry.state_id).await {
                self.attempted += 1;
                match self.driver.execute(&action).await {
                    Ok(next_snapshot) => {
                        let next_fingerprint = Fingerprint::from_snapshot(&next_snapshot);
                        let next = self.graph.match_or_create(&next_fingerprint, None);
                        self.graph.add_transition(
                            entry.state_id.clone(),
                            next.id.clone(),
                            action.action_type,
                            action.target.clone(),
                            action.value.clone(),
                            next.similarity,
                        )?;
                        self.report_progress(&next.id);

                        if !self.visited.contains(&next.id) {
                            self.admit(&next.id, &next_snapshot);
                        }

                        if next.id == entry.state_id {
                            self.current = Some(entry.state_id.clone());
                        } else {
                            // The action left the origin screen; restore it so
                            // the remaining actions run from the same place.
                            match self.driver.go_back().await {
                                Ok(_) => self.current = Some(entry.state_id.clone()),
                                Err(err) => {
                                    warn!(error = %err, state = %entry.state_id, "go_back failed after action");
                                    self.current = None;
                                }
                            }
                        }
                    }
                    Err(err) => {
                        warn!(state = %entry.state_id, action = %action, error = %err, "action failed, skipping");
                        self.failed += 1;
                    }
                }
            } else {
                self.failed += 1;
            }

            self.queue_continuation(&entry);
        }

        let report = DiscoveryReport {
            run_id,
            strategy: self.config.strategy,
            actions_attempted: self.attempted,
            actions_failed: self.failed,
            duration: started.elapsed(),
            graph: self.graph,
        };
        info!(
            states = report.graph.state_count(),
            transitions = report.graph.transition_count(),
            attempted = report.actions_attempted,
            failed = report.actions_failed,
            "discovery finished"
        );
        Ok(report)
    }

    /// First visit of a state: record its entry URL, enumerate and filter
    /// its candidate actions once (the filtered snapshot order stays fixed
    /// for the whole run) and queue it according to the strategy.
    fn admit(&mut self, state_id: &str, snapshot: &Snapshot) {
        if !self.visited.insert(state_id.to_string()) {
            return;
        }

        let candidates = self.driver.list_candidate_actions(snapshot);
        let total = candidates.len();
        let safe: Vec<ActionDescriptor> = candidates
            .into_iter()
            .filter(|action| (self.config.safe_action)(action))
            .collect();
        if safe.len() < total {
            debug!(
                state = state_id,
                filtered = total - safe.len(),
                "unsafe actions excluded"
            );
        }

        self.entry_urls
            .insert(state_id.to_string(), snapshot.url.clone());
        let has_actions = !safe.is_empty();
        self.actions.insert(state_id.to_string(), safe);

        if has_actions {
            let entry = FrontierEntry {
                state_id: state_id.to_string(),
                next_action: 0,
            };
            match self.config.strategy {
                Strategy::Dfs => self.frontier.push_front(entry),
                Strategy::Bfs => self.frontier.push_back(entry),
            }
        }
    }

    /// Requeue the state for its next pending action. DFS pushes to the
    /// front so a state's action list is exhausted before its children;
    /// BFS pushes to the back, one action per state per round.
    fn queue_continuation(&mut self, entry: &FrontierEntry) {
        let remaining = self
            .actions
            .get(&entry.state_id)
            .map(|actions| actions.len())
            .unwrap_or(0);
        let next_action = entry.next_action + 1;
        if next_action >= remaining {
            return;
        }

        let continuation = FrontierEntry {
            state_id: entry.state_id.clone(),
            next_action,
        };
        match self.config.strategy {
            Strategy::Dfs => self.frontier.push_front(continuation),
            Strategy::Bfs => self.frontier.push_back(continuation),
        }
    }

    async fn reposition(&mut self, state_id: &str) -> bool {
        if self.current.as_deref() == Some(state_id) {
            return true;
        }

        let Some(url) = self.entry_urls.get(state_id).cloned() else {
            warn!(state = state_id, "no entry url recorded, cannot reposition");
            return false;
        };
        match self.driver.navigate(&url).await {
            Ok(_) => {
                self.current = Some(state_id.to_string());
                true
            }
            Err(err) => {
                warn!(state = state_id, error = %err, "navigation failed, skipping action");
                self.current = None;
                false
            }
        }
    }

    fn budget_reached(&self, started: Instant) -> bool {
        if self.graph.state_count() >= self.config.max_states {
            return true;
        }
        match self.config.timeout {
            Some(timeout) => started.elapsed() >= timeout,
            None => false,
        }
    }

    fn report_progress(&self, state_id: &str) {
        if let Some(progress) = &self.config.progress {
            progress(self.graph.state_count(), state_id.to_string());
        }
    }
}

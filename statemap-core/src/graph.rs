use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use statemap_driver::ActionType;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::{debug, info, warn};

use crate::classify;
use crate::error::{GraphError, Result};
use crate::fingerprint::Fingerprint;
use crate::similarity::Scorer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateType {
    Form,
    Dashboard,
    List,
    Detail,
    Error,
    Interactive,
    Unknown,
}

impl StateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateType::Form => "form",
            StateType::Dashboard => "dashboard",
            StateType::List => "list",
            StateType::Detail => "detail",
            StateType::Error => "error",
            StateType::Interactive => "interactive",
            StateType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verifiable UI state. Created exactly once by
/// [`StateGraph::match_or_create`]; only `metadata` and
/// `last_confirmed_at` change afterwards, when later exploration
/// re-confirms the state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub id: String,
    pub state_type: StateType,
    pub fingerprint: Fingerprint,
    /// Tri-state on purpose: seed graphs may carry `null` here and the
    /// value is preserved verbatim across load/merge cycles.
    pub discovered_manually: Option<bool>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub last_confirmed_at: DateTime<Utc>,
}

impl State {
    pub fn new(id: String, state_type: StateType, fingerprint: Fingerprint) -> Self {
        let now = Utc::now();
        let mut state = Self {
            id,
            state_type,
            fingerprint: fingerprint.clone(),
            discovered_manually: Some(false),
            metadata: BTreeMap::new(),
            created_at: now,
            last_confirmed_at: now,
        };
        state.record_elements(&fingerprint.element_keys());
        state
    }

    /// Self-healing metadata update: remember actionable elements seen on
    /// this state that were not recorded yet.
    fn record_elements(&mut self, keys: &[(String, String)]) {
        let entry = self
            .metadata
            .entry("element_descriptors".to_string())
            .or_insert_with(|| json!([]));
        let Some(list) = entry.as_array_mut() else {
            return;
        };
        for (role, name) in keys {
            let already_recorded = list.iter().any(|v| {
                v.get("role").and_then(|r| r.as_str()) == Some(role)
                    && v.get("name").and_then(|n| n.as_str()) == Some(name)
            });
            if !already_recorded {
                list.push(json!({ "role": role, "name": name }));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from_id: String,
    pub to_id: String,
    pub action_type: ActionType,
    pub action_target: String,
    pub action_value: Option<String>,
    pub similarity_at_creation: f64,
}

impl Transition {
    pub fn key(&self) -> TransitionKey {
        TransitionKey {
            from_id: self.from_id.clone(),
            action_type: self.action_type,
            action_target: self.action_target.clone(),
            action_value: self.action_value.clone(),
        }
    }
}

/// Identity of an edge within the graph; re-adding an existing key is a
/// no-op rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransitionKey {
    pub from_id: String,
    pub action_type: ActionType,
    pub action_target: String,
    pub action_value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub id: String,
    pub is_new: bool,
    pub similarity: f64,
}

/// The FSM under construction: states in insertion order (which doubles as
/// the deterministic tie-break order) plus dedup-keyed transitions. States
/// are only ever added, never removed, during a run.
#[derive(Debug, Clone)]
pub struct StateGraph {
    states: Vec<State>,
    index: HashMap<String, usize>,
    transitions: Vec<Transition>,
    seen: HashSet<TransitionKey>,
    scorer: Scorer,
}

impl Default for StateGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl StateGraph {
    pub fn new() -> Self {
        Self::with_scorer(Scorer::new())
    }

    pub fn with_scorer(scorer: Scorer) -> Self {
        Self {
            states: Vec::new(),
            index: HashMap::new(),
            transitions: Vec::new(),
            seen: HashSet::new(),
            scorer,
        }
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn state(&self, id: &str) -> Option<&State> {
        self.index.get(id).map(|idx| &self.states[*idx])
    }

    pub fn contains_state(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Best-scoring existing state for a fingerprint, scanned in insertion
    /// order with a strict comparison so the earliest state wins ties. A
    /// tie at or above the match threshold is logged, not raised.
    pub fn best_match(&self, fingerprint: &Fingerprint) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, state) in self.states.iter().enumerate() {
            let score = self.scorer.score(fingerprint, &state.fingerprint);
            match best {
                None => best = Some((idx, score)),
                Some((best_idx, best_score)) => {
                    if score > best_score {
                        best = Some((idx, score));
                    } else if score == best_score && score >= self.scorer.threshold() {
                        warn!(
                            kept = %self.states[best_idx].id,
                            tied = %state.id,
                            score,
                            "ambiguous state match, keeping earliest"
                        );
                    }
                }
            }
        }
        best
    }

    /// Resolve a fingerprint to an existing state or create a new one.
    /// Matching refreshes the state's confirmation timestamp and
    /// self-heals its recorded element descriptors; creation allocates a
    /// readable id from the URL pattern slug.
    pub fn match_or_create(
        &mut self,
        fingerprint: &Fingerprint,
        hint: Option<StateType>,
    ) -> MatchOutcome {
        let best = self.best_match(fingerprint);

        if let Some((idx, score)) = best {
            if score >= self.scorer.threshold() {
                let keys = fingerprint.element_keys();
                let state = &mut self.states[idx];
                state.last_confirmed_at = Utc::now();
                state.record_elements(&keys);
                debug!(id = %state.id, score, "fingerprint matched existing state");
                return MatchOutcome {
                    id: state.id.clone(),
                    is_new: false,
                    similarity: score,
                };
            }
        }

        let (classified, slug) = classify::classify(fingerprint);
        let state_type = hint.unwrap_or(classified);
        let id = self.allocate_id(&slug);
        info!(id = %id, %state_type, "discovered new state");

        self.index.insert(id.clone(), self.states.len());
        self.states
            .push(State::new(id.clone(), state_type, fingerprint.clone()));

        MatchOutcome {
            id,
            is_new: true,
            similarity: best.map(|(_, score)| score).unwrap_or(0.0),
        }
    }

    /// Insert a fully-formed state under its own id, keeping every field
    /// as given. Used when reconstructing from a seed; a duplicate id is a
    /// load failure, not a merge.
    pub fn insert_verbatim(&mut self, state: State) -> Result<()> {
        if self.index.contains_key(&state.id) {
            return Err(GraphError::SeedLoad {
                reason: format!("duplicate state id '{}'", state.id),
            });
        }
        self.index.insert(state.id.clone(), self.states.len());
        self.states.push(state);
        Ok(())
    }

    /// Append an edge. Returns `Ok(false)` when the dedup key is already
    /// present; referencing a state the graph does not own is fatal.
    pub fn add_transition(
        &mut self,
        from_id: impl Into<String>,
        to_id: impl Into<String>,
        action_type: ActionType,
        action_target: impl Into<String>,
        action_value: Option<String>,
        similarity_at_creation: f64,
    ) -> Result<bool> {
        let transition = Transition {
            from_id: from_id.into(),
            to_id: to_id.into(),
            action_type,
            action_target: action_target.into(),
            action_value,
            similarity_at_creation,
        };

        let key = transition.key();
        if self.seen.contains(&key) {
            debug!(from = %transition.from_id, action = %transition.action_type, target = %transition.action_target, "duplicate transition ignored");
            return Ok(false);
        }

        for endpoint in [&transition.from_id, &transition.to_id] {
            if !self.index.contains_key(endpoint) {
                return Err(GraphError::Integrity {
                    id: endpoint.clone(),
                });
            }
        }

        self.seen.insert(key);
        self.transitions.push(transition);
        Ok(true)
    }

    pub fn state_type_distribution(&self) -> BTreeMap<StateType, usize> {
        let mut distribution = BTreeMap::new();
        for state in &self.states {
            *distribution.entry(state.state_type).or_insert(0) += 1;
        }
        distribution
    }

    fn allocate_id(&self, slug: &str) -> String {
        self.free_variant(&format!("V_{slug}"))
    }

    /// First unused id among `base`, `base_2`, `base_3`, ...
    pub(crate) fn free_variant(&self, base: &str) -> String {
        if !self.index.contains_key(base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}_{n}");
            if !self.index.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub(crate) fn confirm(&mut self, id: &str, fingerprint: &Fingerprint) {
        if let Some(idx) = self.index.get(id).copied() {
            let keys = fingerprint.element_keys();
            let state = &mut self.states[idx];
            state.last_confirmed_at = Utc::now();
            state.record_elements(&keys);
        }
    }
}

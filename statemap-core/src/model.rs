use serde::{Deserialize, Serialize};
use statemap_driver::ActionType;
use std::collections::BTreeMap;

use crate::fingerprint::Fingerprint;
use crate::graph::{StateGraph, StateType};

pub const GRAPH_TYPE: &str = "ui_state_machine";
pub const NODE_TYPE_STATE: &str = "state";
pub const EDGE_TYPE_TRANSITION: &str = "transition";

/// Persisted form of a state graph. The field set is the exchange format
/// consumed by downstream tooling, so every field is serialized explicitly
/// (including `discovered_manually: null`) and the document round-trips
/// states and edges in their original order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub base_url: String,
    pub graph_type: String,
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub statistics: GraphStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub node_type: String,
    pub state_type: StateType,
    pub fingerprint: Fingerprint,
    /// Absent and `null` both load as `None`; serialization always writes
    /// the field so the tri-state survives round-trips.
    #[serde(default)]
    pub discovered_manually: Option<bool>,
    #[serde(default)]
    pub element_descriptors: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub edge_type: String,
    pub action_type: ActionType,
    pub action_target: String,
    #[serde(default)]
    pub action_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub state_count: usize,
    pub transition_count: usize,
    pub state_types: BTreeMap<StateType, usize>,
}

impl GraphDocument {
    pub fn from_graph(graph: &StateGraph, base_url: impl Into<String>) -> Self {
        let nodes = graph
            .states()
            .iter()
            .map(|state| NodeRecord {
                id: state.id.clone(),
                node_type: NODE_TYPE_STATE.to_string(),
                state_type: state.state_type,
                fingerprint: state.fingerprint.clone(),
                discovered_manually: state.discovered_manually,
                element_descriptors: state
                    .metadata
                    .get("element_descriptors")
                    .and_then(|value| value.as_array())
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();

        let edges = graph
            .transitions()
            .iter()
            .map(|transition| EdgeRecord {
                source: transition.from_id.clone(),
                target: transition.to_id.clone(),
                edge_type: EDGE_TYPE_TRANSITION.to_string(),
                action_type: transition.action_type,
                action_target: transition.action_target.clone(),
                action_value: transition.action_value.clone(),
            })
            .collect();

        Self {
            base_url: base_url.into(),
            graph_type: GRAPH_TYPE.to_string(),
            nodes,
            edges,
            statistics: GraphStatistics {
                state_count: graph.state_count(),
                transition_count: graph.transition_count(),
                state_types: graph.state_type_distribution(),
            },
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

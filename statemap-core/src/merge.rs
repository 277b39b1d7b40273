use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::error::{GraphError, Result};
use crate::graph::{State, StateGraph};
use crate::model::{GraphDocument, NODE_TYPE_STATE};

/// Reconstruct a graph from its persisted JSON form. Ids, state types,
/// element descriptors and the `discovered_manually` flag come back
/// verbatim; a syntactically broken document is a startup failure, and an
/// edge referencing an unknown state is a graph-integrity failure.
pub fn load_seed(json: &str) -> Result<StateGraph> {
    let document = GraphDocument::from_json(json).map_err(|err| GraphError::SeedLoad {
        reason: err.to_string(),
    })?;
    graph_from_document(&document)
}

pub fn graph_from_document(document: &GraphDocument) -> Result<StateGraph> {
    let mut graph = StateGraph::new();
    let now = Utc::now();

    for node in &document.nodes {
        if node.node_type != NODE_TYPE_STATE {
            return Err(GraphError::SeedLoad {
                reason: format!("unsupported node type '{}'", node.node_type),
            });
        }

        let mut metadata = BTreeMap::new();
        if !node.element_descriptors.is_empty() {
            metadata.insert(
                "element_descriptors".to_string(),
                Value::Array(node.element_descriptors.clone()),
            );
        }

        graph.insert_verbatim(State {
            id: node.id.clone(),
            state_type: node.state_type,
            fingerprint: node.fingerprint.clone(),
            discovered_manually: node.discovered_manually,
            metadata,
            created_at: now,
            last_confirmed_at: now,
        })?;
    }

    for edge in &document.edges {
        graph.add_transition(
            edge.source.clone(),
            edge.target.clone(),
            edge.action_type,
            edge.action_target.clone(),
            edge.action_value.clone(),
            1.0,
        )?;
    }

    info!(
        states = graph.state_count(),
        transitions = graph.transition_count(),
        "seed graph loaded"
    );
    Ok(graph)
}

/// Merge a freshly explored graph into a seed. Seed states and transitions
/// come first and their ids stay authoritative: a live state whose
/// fingerprint matches a seeded one is folded into it (confirmation and
/// element metadata refresh only), everything genuinely new is appended.
/// Nothing is ever removed from the seed, so reconciling an unchanged run
/// back into its own seed is a no-op.
pub fn reconcile(live: &StateGraph, seed: &StateGraph) -> Result<StateGraph> {
    let mut merged = seed.clone();
    let mut id_map: HashMap<String, String> = HashMap::new();

    for state in live.states() {
        let matched = merged
            .best_match(&state.fingerprint)
            .filter(|(_, score)| *score >= merged.scorer().threshold());

        match matched {
            Some((idx, score)) => {
                let merged_id = merged.states()[idx].id.clone();
                debug!(live = %state.id, seed = %merged_id, score, "live state folded into seed state");
                merged.confirm(&merged_id, &state.fingerprint);
                id_map.insert(state.id.clone(), merged_id);
            }
            None => {
                let mut imported = state.clone();
                imported.id = merged.free_variant(&state.id);
                id_map.insert(state.id.clone(), imported.id.clone());
                merged.insert_verbatim(imported)?;
            }
        }
    }

    for transition in live.transitions() {
        let (Some(from), Some(to)) = (
            id_map.get(&transition.from_id),
            id_map.get(&transition.to_id),
        ) else {
            continue;
        };
        merged.add_transition(
            from.clone(),
            to.clone(),
            transition.action_type,
            transition.action_target.clone(),
            transition.action_value.clone(),
            transition.similarity_at_creation,
        )?;
    }

    info!(
        seed_states = seed.state_count(),
        live_states = live.state_count(),
        merged_states = merged.state_count(),
        "graphs reconciled"
    );
    Ok(merged)
}

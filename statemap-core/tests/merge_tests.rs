// Tests for seed loading, persistence round-trips and graph reconciliation

use chrono::Utc;
use std::collections::BTreeMap;

use statemap_core::error::GraphError;
use statemap_core::explore::{DiscoveryConfig, DiscoverySession};
use statemap_core::fingerprint::Fingerprint;
use statemap_core::graph::{State, StateGraph, StateType};
use statemap_core::merge::{load_seed, reconcile};
use statemap_core::model::GraphDocument;
use statemap_driver::{ActionType, AxNode, ReplayDriver, ReplayScript, Snapshot};

fn section_snapshot(i: usize) -> Snapshot {
    Snapshot::new(
        format!("http://app/section-{i}"),
        format!("Section {i}"),
        AxNode::new("root").with_children(vec![
            AxNode::new("navigation").with_children(vec![
                AxNode::named("link", format!("Section {i} overview"))
                    .with_value(format!("/section-{i}")),
            ]),
            AxNode::new("main").with_children(vec![
                AxNode::named("heading", format!("Section {i}")).with_level(1),
                AxNode::named("button", format!("Open {i}")),
                AxNode::named("button", format!("Close {i}")),
            ]),
        ]),
    )
}

fn section_fingerprint(i: usize) -> Fingerprint {
    Fingerprint::from_snapshot(&section_snapshot(i))
}

/// Graph of distinct section screens chained by click transitions.
fn section_graph(count: usize) -> StateGraph {
    let mut graph = StateGraph::new();
    let mut ids = Vec::new();
    for i in 0..count {
        ids.push(graph.match_or_create(&section_fingerprint(i), None).id);
    }
    for i in 1..count {
        graph
            .add_transition(
                ids[i - 1].clone(),
                ids[i].clone(),
                ActionType::Click,
                format!("Open {}", i - 1),
                None,
                1.0,
            )
            .unwrap();
    }
    graph
}

/// Two-screen replay app used for the seeded re-run tests.
fn tiny_app() -> ReplayScript {
    ReplayScript::new("http://app/section-0")
        .page(section_snapshot(0))
        .page(section_snapshot(1))
        .edge(
            "http://app/section-0",
            ActionType::Click,
            "Open 0",
            "http://app/section-1",
        )
        .edge(
            "http://app/section-1",
            ActionType::Click,
            "Open 1",
            "http://app/section-1",
        )
        .edge(
            "http://app/section-0",
            ActionType::Click,
            "Close 0",
            "http://app/section-0",
        )
        .edge(
            "http://app/section-1",
            ActionType::Click,
            "Close 1",
            "http://app/section-1",
        )
        .edge(
            "http://app/section-0",
            ActionType::Navigate,
            "Section 0 overview",
            "http://app/section-0",
        )
        .edge(
            "http://app/section-1",
            ActionType::Navigate,
            "Section 1 overview",
            "http://app/section-1",
        )
}

// ============================================================================
// Round-Trip Tests
// ============================================================================

#[test]
fn test_document_round_trip_preserves_identity_and_order() {
    let graph = section_graph(5);
    let document = GraphDocument::from_graph(&graph, "http://app/");
    let json = document.to_json_pretty().unwrap();
    let loaded = load_seed(&json).unwrap();

    let original_ids: Vec<&str> = graph.states().iter().map(|s| s.id.as_str()).collect();
    let loaded_ids: Vec<&str> = loaded.states().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(original_ids, loaded_ids);

    assert_eq!(loaded.transition_count(), graph.transition_count());
    for (a, b) in graph.transitions().iter().zip(loaded.transitions()) {
        assert_eq!(a.from_id, b.from_id);
        assert_eq!(a.to_id, b.to_id);
        assert_eq!(a.action_type, b.action_type);
        assert_eq!(a.action_target, b.action_target);
        assert_eq!(a.action_value, b.action_value);
    }

    // fingerprints survive byte-for-byte
    for (a, b) in graph.states().iter().zip(loaded.states()) {
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.state_type, b.state_type);
    }
}

#[test]
fn test_discovered_manually_round_trips_verbatim() {
    let mut graph = StateGraph::new();
    let now = Utc::now();
    for (i, flag) in [None, Some(true), Some(false)].into_iter().enumerate() {
        graph
            .insert_verbatim(State {
                id: format!("V_SECTION_{i}"),
                state_type: StateType::Unknown,
                fingerprint: section_fingerprint(i),
                discovered_manually: flag,
                metadata: BTreeMap::new(),
                created_at: now,
                last_confirmed_at: now,
            })
            .unwrap();
    }

    let json = GraphDocument::from_graph(&graph, "http://app/")
        .to_json_pretty()
        .unwrap();
    // the absent flag is written as an explicit null, never dropped
    assert!(json.contains("\"discovered_manually\": null"));

    let loaded = load_seed(&json).unwrap();
    let flags: Vec<Option<bool>> = loaded
        .states()
        .iter()
        .map(|s| s.discovered_manually)
        .collect();
    assert_eq!(flags, vec![None, Some(true), Some(false)]);

    // and a second round-trip still does not default it
    let again = load_seed(
        &GraphDocument::from_graph(&loaded, "http://app/")
            .to_json_pretty()
            .unwrap(),
    )
    .unwrap();
    assert_eq!(again.states()[0].discovered_manually, None);
}

#[test]
fn test_statistics_reflect_graph_contents() {
    let graph = section_graph(3);
    let document = GraphDocument::from_graph(&graph, "http://app/");
    assert_eq!(document.statistics.state_count, 3);
    assert_eq!(document.statistics.transition_count, 2);
    let total: usize = document.statistics.state_types.values().sum();
    assert_eq!(total, 3);
}

// ============================================================================
// Seed Load Failure Tests
// ============================================================================

#[test]
fn test_load_seed_rejects_malformed_json() {
    let err = load_seed("{ this is not json").unwrap_err();
    assert!(matches!(err, GraphError::SeedLoad { .. }));
}

#[test]
fn test_load_seed_rejects_missing_fields() {
    let err = load_seed(r#"{"base_url": "http://app/", "graph_type": "ui_state_machine"}"#)
        .unwrap_err();
    assert!(matches!(err, GraphError::SeedLoad { .. }));
}

#[test]
fn test_load_seed_rejects_dangling_edge() {
    let graph = section_graph(1);
    let json = GraphDocument::from_graph(&graph, "http://app/")
        .to_json_pretty()
        .unwrap();

    let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
    value["edges"].as_array_mut().unwrap().push(serde_json::json!({
        "source": "V_SECTION_0",
        "target": "V_GHOST",
        "edge_type": "transition",
        "action_type": "click",
        "action_target": "Open 0",
        "action_value": null
    }));

    let err = load_seed(&value.to_string()).unwrap_err();
    assert!(matches!(err, GraphError::Integrity { id } if id == "V_GHOST"));
}

// ============================================================================
// Reconciliation Tests
// ============================================================================

#[test]
fn test_reconcile_folds_matching_states_and_appends_new_ones() {
    let seed = section_graph(21);
    let live = section_graph(46);

    let merged = reconcile(&live, &seed).unwrap();
    assert_eq!(merged.state_count(), 46);

    // the 21 seeded ids stay authoritative and come first
    for (i, state) in seed.states().iter().enumerate() {
        assert_eq!(merged.states()[i].id, state.id);
    }

    // the 45 chained transitions exist exactly once
    assert_eq!(merged.transition_count(), 45);
}

#[test]
fn test_reconcile_with_itself_changes_nothing() {
    let seed = section_graph(8);
    let merged = reconcile(&seed, &seed).unwrap();
    assert_eq!(merged.state_count(), seed.state_count());
    assert_eq!(merged.transition_count(), seed.transition_count());
    for (a, b) in seed.states().iter().zip(merged.states()) {
        assert_eq!(a.id, b.id);
    }
}

#[test]
fn test_reconcile_preserves_seed_flags_on_match() {
    let mut seed = StateGraph::new();
    let now = Utc::now();
    seed.insert_verbatim(State {
        id: "V_MANUAL".to_string(),
        state_type: StateType::Form,
        fingerprint: section_fingerprint(0),
        discovered_manually: Some(true),
        metadata: BTreeMap::new(),
        created_at: now,
        last_confirmed_at: now,
    })
    .unwrap();

    let mut live = StateGraph::new();
    live.match_or_create(&section_fingerprint(0), None);

    let merged = reconcile(&live, &seed).unwrap();
    assert_eq!(merged.state_count(), 1);
    let state = merged.state("V_MANUAL").unwrap();
    assert_eq!(state.discovered_manually, Some(true));
    assert_eq!(state.state_type, StateType::Form);
}

// ============================================================================
// Seeded Exploration Tests
// ============================================================================

#[tokio::test]
async fn test_seeded_rerun_against_unchanged_app_is_idempotent() {
    // First run from scratch.
    let driver = ReplayDriver::new(tiny_app()).unwrap();
    let first = DiscoverySession::new(driver, DiscoveryConfig::default())
        .run()
        .await
        .unwrap();

    let json = GraphDocument::from_graph(&first.graph, "http://app/")
        .to_json_pretty()
        .unwrap();

    // Second run seeded with the first run's output.
    let seed = load_seed(&json).unwrap();
    let driver = ReplayDriver::new(tiny_app()).unwrap();
    let second = DiscoverySession::with_graph(driver, DiscoveryConfig::default(), seed)
        .run()
        .await
        .unwrap();

    assert_eq!(second.graph.state_count(), first.graph.state_count());
    assert_eq!(second.graph.transition_count(), first.graph.transition_count());

    let first_ids: Vec<&str> = first.graph.states().iter().map(|s| s.id.as_str()).collect();
    let second_ids: Vec<&str> = second
        .graph
        .states()
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(first_ids, second_ids);
}

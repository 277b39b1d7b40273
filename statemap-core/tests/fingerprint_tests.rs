// Tests for fingerprint extraction

use statemap_core::fingerprint::{Fingerprint, normalize_url_pattern, route_params, structure_hash};
use statemap_driver::{AxNode, Snapshot};

// ============================================================================
// URL Pattern Normalization Tests
// ============================================================================

#[test]
fn test_normalize_plain_path() {
    assert_eq!(normalize_url_pattern("http://app/admin/config"), "admin/config");
}

#[test]
fn test_normalize_root() {
    assert_eq!(normalize_url_pattern("http://app/"), "root");
    assert_eq!(normalize_url_pattern("http://app"), "root");
}

#[test]
fn test_normalize_numeric_id_segment() {
    assert_eq!(normalize_url_pattern("http://app/device/17"), "device/{id}");
    assert_eq!(normalize_url_pattern("http://app/device/42"), "device/{id}");
}

#[test]
fn test_normalize_same_template_instances_collapse() {
    let a = normalize_url_pattern("http://app/device/17/edit");
    let b = normalize_url_pattern("http://app/device/42/edit");
    assert_eq!(a, b);
    assert_eq!(a, "device/{id}/edit");
}

#[test]
fn test_normalize_uuid_segment() {
    assert_eq!(
        normalize_url_pattern("http://app/users/123e4567-e89b-12d3-a456-426614174000"),
        "users/{id}"
    );
}

#[test]
fn test_normalize_hex_segment() {
    assert_eq!(normalize_url_pattern("http://app/session/deadbeef42"), "session/{id}");
}

#[test]
fn test_short_hex_like_words_are_kept() {
    // "feed" and "cafe" are hex-only but too short to be volatile ids
    assert_eq!(normalize_url_pattern("http://app/feed/cafe"), "feed/cafe");
}

#[test]
fn test_normalize_spa_fragment_route() {
    assert_eq!(normalize_url_pattern("http://app/#!/overview"), "overview");
    assert_eq!(normalize_url_pattern("http://app/#/devices/9"), "devices/{id}");
}

#[test]
fn test_normalize_relative_path() {
    assert_eq!(normalize_url_pattern("/login"), "login");
}

#[test]
fn test_route_params_from_query() {
    let params = route_params("http://app/list?page=2&sort=name");
    assert_eq!(params.get("page").map(String::as_str), Some("2"));
    assert_eq!(params.get("sort").map(String::as_str), Some("name"));
}

#[test]
fn test_route_params_from_fragment_query() {
    let params = route_params("http://app/#!/devices?filter=online");
    assert_eq!(params.get("filter").map(String::as_str), Some("online"));
}

// ============================================================================
// Structure Hash Tests
// ============================================================================

#[test]
fn test_structure_hash_ignores_text_changes() {
    let before = AxNode::new("main").with_children(vec![
        AxNode::named("heading", "Welcome back").with_level(1),
        AxNode::named("button", "Save"),
    ]);
    let after = AxNode::new("main").with_children(vec![
        AxNode::named("heading", "Hello again").with_level(1),
        AxNode::named("button", "Store"),
    ]);
    assert_eq!(structure_hash(&before), structure_hash(&after));
}

#[test]
fn test_structure_hash_tracks_topology_changes() {
    let flat = AxNode::new("main").with_children(vec![AxNode::named("button", "Save")]);
    let nested = AxNode::new("main").with_children(vec![
        AxNode::new("form").with_children(vec![AxNode::named("button", "Save")]),
    ]);
    assert_ne!(structure_hash(&flat), structure_hash(&nested));
}

// ============================================================================
// Extraction Tests
// ============================================================================

fn dashboard_snapshot() -> Snapshot {
    Snapshot::new(
        "http://app/#!/overview",
        "Overview - Console",
        AxNode::new("root").with_children(vec![
            AxNode::new("navigation").with_children(vec![
                AxNode::named("link", "Overview").with_value("#!/overview"),
                AxNode::named("link", "Devices").with_value("#!/devices"),
                AxNode::named("button", "Menu").with_expanded(false),
            ]),
            AxNode::new("main").with_children(vec![
                AxNode::named("heading", "Overview").with_level(1),
                AxNode::named("heading", "Recent activity").with_level(2),
                AxNode::named("searchbox", "Search devices"),
                AxNode::named("button", "Refresh"),
                AxNode::named("button", "Export").with_disabled(true),
            ]),
        ]),
    )
}

#[test]
fn test_extract_landmarks_in_document_order() {
    let fp = Fingerprint::from_snapshot(&dashboard_snapshot());
    assert_eq!(fp.semantic.landmarks, vec!["navigation", "main"]);
}

#[test]
fn test_extract_heading_hierarchy() {
    let fp = Fingerprint::from_snapshot(&dashboard_snapshot());
    assert_eq!(
        fp.semantic.headings,
        vec!["h1: Overview", "h2: Recent activity"]
    );
    assert_eq!(fp.content.main_heading, "Overview");
}

#[test]
fn test_extract_actionable_elements_by_role_group() {
    let fp = Fingerprint::from_snapshot(&dashboard_snapshot());
    let button_names: Vec<&str> = fp.functional.buttons.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(button_names, vec!["Menu", "Refresh", "Export"]);
    assert_eq!(fp.functional.links.len(), 2);
    assert_eq!(fp.functional.inputs.len(), 1);
    assert_eq!(fp.functional.total_count(), 6);
}

#[test]
fn test_disabled_element_keeps_signature_but_not_enabled() {
    let fp = Fingerprint::from_snapshot(&dashboard_snapshot());
    let export = fp
        .functional
        .buttons
        .iter()
        .find(|b| b.name == "Export")
        .unwrap();
    assert!(!export.enabled);
}

#[test]
fn test_aria_states_summarized_per_element() {
    let fp = Fingerprint::from_snapshot(&dashboard_snapshot());
    assert_eq!(
        fp.semantic.aria_states.get("expanded:button:Menu"),
        Some(&false)
    );
}

#[test]
fn test_empty_snapshot_yields_empty_collections() {
    let fp = Fingerprint::from_snapshot(&Snapshot::empty("http://app/blank"));
    assert!(fp.semantic.landmarks.is_empty());
    assert!(fp.semantic.headings.is_empty());
    assert!(fp.semantic.aria_states.is_empty());
    assert_eq!(fp.functional.total_count(), 0);
    // the URL pattern is still meaningful for a blank screen
    assert_eq!(fp.structural.url_pattern, "blank");
}

#[test]
fn test_extraction_is_deterministic() {
    let snapshot = dashboard_snapshot();
    assert_eq!(
        Fingerprint::from_snapshot(&snapshot),
        Fingerprint::from_snapshot(&snapshot)
    );
}

#[test]
fn test_style_dimension_passes_through_dom_hash() {
    let snapshot = dashboard_snapshot().with_dom_hash("abc123");
    let fp = Fingerprint::from_snapshot(&snapshot);
    assert_eq!(fp.style.as_deref(), Some("abc123"));

    let without = Fingerprint::from_snapshot(&dashboard_snapshot());
    assert_eq!(without.style, None);
}

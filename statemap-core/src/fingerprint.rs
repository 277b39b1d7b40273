use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use statemap_driver::{AxNode, Snapshot};
use url::Url;

/// ARIA landmark roles, the most stable identifiers a screen exposes.
pub const LANDMARK_ROLES: [&str; 8] = [
    "navigation",
    "main",
    "complementary",
    "contentinfo",
    "banner",
    "search",
    "form",
    "region",
];

const INPUT_ROLES: [&str; 6] = [
    "textbox",
    "combobox",
    "searchbox",
    "spinbutton",
    "checkbox",
    "radio",
];

/// Placeholder substituted for volatile URL path segments, so two
/// instances of the same template normalize identically.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Multi-dimensional summary of one observed screen. Immutable once
/// extracted; all comparison happens through the similarity scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub semantic: SemanticIdentity,
    pub functional: FunctionalIdentity,
    pub structural: StructuralIdentity,
    pub content: ContentIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticIdentity {
    /// Landmark roles in document order.
    pub landmarks: Vec<String>,
    /// Ordered heading sequence, `"h<level>: <text>"`.
    pub headings: Vec<String>,
    /// Per-element ARIA state summary, `"<state>:<role>:<name>" -> value`.
    pub aria_states: BTreeMap<String, bool>,
    /// Hash over the tree topology (roles and child counts only).
    pub structure_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionalIdentity {
    pub buttons: Vec<ElementSignature>,
    pub links: Vec<ElementSignature>,
    pub inputs: Vec<ElementSignature>,
}

impl FunctionalIdentity {
    pub fn total_count(&self) -> usize {
        self.buttons.len() + self.links.len() + self.inputs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementSignature> {
        self.buttons
            .iter()
            .chain(self.links.iter())
            .chain(self.inputs.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSignature {
    pub role: String,
    pub name: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_state: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralIdentity {
    pub url_pattern: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub route_params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentIdentity {
    pub title: String,
    pub main_heading: String,
}

impl Fingerprint {
    /// Extract a fingerprint from a captured snapshot. Pure and
    /// deterministic; an empty or structureless snapshot yields empty
    /// collections rather than an error, since absence of structure is
    /// itself a meaningful observation (blank or loading screens).
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let tree = &snapshot.tree;

        let mut landmarks = Vec::new();
        let mut headings = Vec::new();
        let mut aria_states = BTreeMap::new();
        let mut functional = FunctionalIdentity::default();

        tree.visit(&mut |node| {
            let role = node.role.as_str();
            if LANDMARK_ROLES.contains(&role) {
                landmarks.push(role.to_string());
            }
            if role == "heading" && !node.name.is_empty() {
                headings.push(format!("h{}: {}", node.level.unwrap_or(0), node.name));
            }
            collect_aria_states(node, &mut aria_states);

            if role == "button" {
                functional.buttons.push(signature_of(node));
            } else if role == "link" {
                functional.links.push(signature_of(node));
            } else if INPUT_ROLES.contains(&role) {
                functional.inputs.push(signature_of(node));
            }
        });

        let main_heading = headings
            .iter()
            .find(|h| h.starts_with("h1: "))
            .or_else(|| headings.first())
            .map(|h| h.splitn(2, ": ").nth(1).unwrap_or("").to_string())
            .unwrap_or_default();

        Self {
            semantic: SemanticIdentity {
                landmarks,
                headings,
                aria_states,
                structure_hash: structure_hash(tree),
            },
            functional,
            structural: StructuralIdentity {
                url_pattern: normalize_url_pattern(&snapshot.url),
                route_params: route_params(&snapshot.url),
            },
            content: ContentIdentity {
                title: snapshot.title.clone(),
                main_heading,
            },
            style: snapshot.dom_hash.clone(),
        }
    }

    /// `(role, name)` pairs of every actionable element, the unit the
    /// functional similarity metric and the self-healing metadata update
    /// operate on.
    pub fn element_keys(&self) -> Vec<(String, String)> {
        self.functional
            .iter()
            .map(|sig| (sig.role.clone(), sig.name.clone()))
            .collect()
    }
}

impl SemanticIdentity {
    /// Token set the semantic Jaccard metric runs over: the landmark-role
    /// set, the heading sequence (index-qualified so reordering matters)
    /// and the ARIA state map.
    pub fn tokens(&self) -> BTreeSet<String> {
        let mut tokens = BTreeSet::new();
        for role in &self.landmarks {
            tokens.insert(format!("landmark:{role}"));
        }
        for (i, heading) in self.headings.iter().enumerate() {
            tokens.insert(format!("heading:{i}:{heading}"));
        }
        for (key, value) in &self.aria_states {
            tokens.insert(format!("aria:{key}={value}"));
        }
        tokens
    }
}

fn signature_of(node: &AxNode) -> ElementSignature {
    let mut extra_state = BTreeMap::new();
    for (attr, value) in [
        ("expanded", node.expanded),
        ("selected", node.selected),
        ("checked", node.checked),
        ("pressed", node.pressed),
        ("current", node.current),
    ] {
        if let Some(v) = value {
            extra_state.insert(attr.to_string(), v);
        }
    }
    ElementSignature {
        role: node.role.clone(),
        name: node.name.clone(),
        enabled: node.disabled != Some(true),
        extra_state,
    }
}

fn collect_aria_states(node: &AxNode, states: &mut BTreeMap<String, bool>) {
    for (attr, value) in [
        ("expanded", node.expanded),
        ("selected", node.selected),
        ("checked", node.checked),
        ("pressed", node.pressed),
        ("current", node.current),
        ("disabled", node.disabled),
    ] {
        if let Some(v) = value {
            states.insert(format!("{attr}:{}:{}", node.role, node.name), v);
        }
    }
}

/// Hash of the tree topology: preorder `(role, child_count)` tuples only.
/// Text content is excluded on purpose, so copy edits do not change the
/// hash while structural rework does.
pub fn structure_hash(tree: &AxNode) -> String {
    let mut encoded = String::new();
    tree.visit(&mut |node| {
        encoded.push_str(&node.role);
        encoded.push(':');
        encoded.push_str(&node.children.len().to_string());
        encoded.push(';');
    });

    let mut hasher = Sha256::new();
    hasher.update(encoded.as_bytes());
    hex::encode(hasher.finalize())[..16].to_string()
}

/// Normalize a URL into a comparable pattern: the path (or SPA fragment
/// route) with volatile segments replaced by [`ID_PLACEHOLDER`]. An empty
/// path normalizes to `"root"`.
pub fn normalize_url_pattern(url: &str) -> String {
    let (path, _) = split_route(url);

    let pattern: Vec<String> = path
        .trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if is_volatile_segment(segment) {
                ID_PLACEHOLDER.to_string()
            } else {
                segment.to_string()
            }
        })
        .collect();

    if pattern.is_empty() {
        "root".to_string()
    } else {
        pattern.join("/")
    }
}

/// Query and fragment-query parameters of a URL, flattened last-wins.
pub fn route_params(url: &str) -> BTreeMap<String, String> {
    let (_, query) = split_route(url);
    let mut params = BTreeMap::new();
    if let Some(query) = query {
        for pair in query.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                if !key.is_empty() {
                    params.insert(key.to_string(), value.to_string());
                }
            }
        }
    }
    params
}

/// Split a URL into its route path and query. Single-page apps route via
/// the fragment, so a non-empty fragment (with optional `!` prefix and its
/// own query string) takes precedence over the real path.
fn split_route(url: &str) -> (String, Option<String>) {
    let parsed = Url::parse(url)
        .or_else(|_| Url::parse("http://placeholder.invalid").and_then(|base| base.join(url)));

    let parsed = match parsed {
        Ok(parsed) => parsed,
        Err(_) => return (url.to_string(), None),
    };

    match parsed.fragment().filter(|f| !f.is_empty()) {
        Some(fragment) => {
            let route = fragment.strip_prefix('!').unwrap_or(fragment);
            match route.split_once('?') {
                Some((path, query)) => (path.to_string(), Some(query.to_string())),
                None => (route.to_string(), parsed.query().map(str::to_string)),
            }
        }
        None => (
            parsed.path().to_string(),
            parsed.query().map(str::to_string),
        ),
    }
}

fn is_volatile_segment(segment: &str) -> bool {
    if segment.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if is_uuid(segment) {
        return true;
    }
    segment.len() >= 8 && segment.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_uuid(segment: &str) -> bool {
    if segment.len() != 36 {
        return false;
    }
    segment.chars().enumerate().all(|(i, c)| match i {
        8 | 13 | 18 | 23 => c == '-',
        _ => c.is_ascii_hexdigit(),
    })
}

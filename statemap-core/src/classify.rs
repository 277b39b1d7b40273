use crate::fingerprint::{Fingerprint, ID_PLACEHOLDER};
use crate::graph::StateType;

const LOGOUT_NAMES: [&str; 3] = ["log out", "logout", "sign out"];
const LOGIN_NAMES: [&str; 3] = ["login", "log in", "sign in"];

/// Heuristic classification of a fingerprint into a state type plus a
/// human-readable id slug (`LOGIN_FORM_EMPTY`, `DEVICES_ID`). The graph
/// prefixes the slug with `V_` and suffixes on collision; this function
/// stays pure.
pub fn classify(fingerprint: &Fingerprint) -> (StateType, String) {
    let pattern = &fingerprint.structural.url_pattern;
    let pattern_lower = pattern.to_lowercase();
    let title_lower = fingerprint.content.title.to_lowercase();
    let landmarks = &fingerprint.semantic.landmarks;

    let has_form = landmarks.iter().any(|l| l == "form");
    let has_login_button = any_name_in(fingerprint, &LOGIN_NAMES);
    let has_logout = any_name_in(fingerprint, &LOGOUT_NAMES);

    // Error screens first; a login form with an error banner stays a form.
    let looks_errored = pattern_lower.contains("error") || title_lower.contains("error");
    if looks_errored && !(has_form && has_login_button) {
        if pattern_lower.contains("login") || title_lower.contains("login") {
            return (StateType::Error, "LOGIN_FORM_ERROR".to_string());
        }
        return (StateType::Error, format!("ERROR_{}", slug_of(pattern)));
    }

    if has_form && has_login_button && !has_logout {
        return (StateType::Form, "LOGIN_FORM_EMPTY".to_string());
    }

    if landmarks.iter().any(|l| l == "main")
        && (pattern_lower.contains("dashboard")
            || pattern_lower.contains("overview")
            || title_lower.contains("dashboard")
            || title_lower.contains("overview"))
    {
        return (StateType::Dashboard, slug_of(pattern));
    }

    if pattern.ends_with(ID_PLACEHOLDER) {
        return (StateType::Detail, slug_of(pattern));
    }

    if has_form || !fingerprint.functional.inputs.is_empty() {
        return (StateType::Form, slug_of(pattern));
    }

    if pattern_lower.contains("list") || fingerprint.functional.links.len() >= 8 {
        return (StateType::List, slug_of(pattern));
    }

    // Screens distinguished only by dynamic ARIA condition (expanded
    // menus, selected tabs) rather than by route.
    if !fingerprint.semantic.aria_states.is_empty() {
        return (StateType::Interactive, slug_of(pattern));
    }

    (StateType::Unknown, slug_of(pattern))
}

fn any_name_in(fingerprint: &Fingerprint, names: &[&str]) -> bool {
    fingerprint
        .functional
        .iter()
        .any(|sig| names.contains(&sig.name.to_lowercase().as_str()))
}

/// Uppercase underscore slug of a URL pattern, e.g. `devices/{id}` into
/// `DEVICES_ID`.
pub fn slug_of(pattern: &str) -> String {
    let slug: String = pattern
        .chars()
        .map(|c| match c {
            '/' | '-' | '.' | ' ' => '_',
            '{' | '}' | '#' | '!' => '\0',
            _ => c.to_ascii_uppercase(),
        })
        .filter(|c| *c != '\0')
        .collect();

    let slug = slug.trim_matches('_').to_string();
    if slug.is_empty() {
        "UNKNOWN".to_string()
    } else {
        slug
    }
}

use std::collections::BTreeMap;
use tracing::trace;

use crate::fingerprint::Fingerprint;

/// Minimum composite score for two fingerprints to be treated as the same
/// state. Inclusive: a pair scoring exactly the threshold matches.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.80;

/// Weighting hierarchy across the five fingerprint dimensions. The
/// defaults implement the resilience ordering: semantic identity dominates,
/// style is a tiebreaker only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityWeights {
    pub semantic: f64,
    pub functional: f64,
    pub structural: f64,
    pub content: f64,
    pub style: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            semantic: 0.60,
            functional: 0.25,
            structural: 0.10,
            content: 0.04,
            style: 0.01,
        }
    }
}

impl SimilarityWeights {
    pub fn sum(&self) -> f64 {
        self.semantic + self.functional + self.structural + self.content + self.style
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-9
    }
}

/// Weighted fuzzy comparison of fingerprints. Every sub-metric is
/// symmetric and bounded in [0, 1], so the composite is too.
#[derive(Debug, Clone)]
pub struct Scorer {
    weights: SimilarityWeights,
    threshold: f64,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Scorer {
    pub fn new() -> Self {
        Self {
            weights: SimilarityWeights::default(),
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_weights(mut self, weights: SimilarityWeights) -> Self {
        debug_assert!(weights.is_normalized(), "weights must sum to 1.0");
        self.weights = weights;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn score(&self, a: &Fingerprint, b: &Fingerprint) -> f64 {
        let semantic = semantic_score(a, b);
        let functional = functional_score(a, b);
        let structural = structural_score(a, b);
        let content = content_score(a, b);
        let style = style_score(a, b);

        let weighted = semantic * self.weights.semantic
            + functional * self.weights.functional
            + structural * self.weights.structural
            + content * self.weights.content
            + style * self.weights.style;
        // Divide by the weight sum (1.0 for the defaults) so identical
        // fingerprints score exactly 1.0 under float rounding.
        let weighted = weighted / self.weights.sum();

        trace!(
            semantic,
            functional,
            structural,
            content,
            style,
            weighted,
            "similarity breakdown"
        );
        weighted
    }

    pub fn is_match(&self, a: &Fingerprint, b: &Fingerprint) -> bool {
        self.score(a, b) >= self.threshold
    }
}

/// Jaccard over the combined semantic token set, blended with an
/// exact-topology bonus when the structure hashes agree.
fn semantic_score(a: &Fingerprint, b: &Fingerprint) -> f64 {
    let tokens_a = a.semantic.tokens();
    let tokens_b = b.semantic.tokens();

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    let jaccard = if union == 0 {
        1.0
    } else {
        intersection as f64 / union as f64
    };

    let hash_bonus = if a.semantic.structure_hash == b.semantic.structure_hash {
        1.0
    } else {
        0.0
    };

    0.85 * jaccard + 0.15 * hash_bonus
}

/// Multiset Jaccard over `(role, name)` signatures of actionable elements.
fn functional_score(a: &Fingerprint, b: &Fingerprint) -> f64 {
    let counts_a = element_counts(a);
    let counts_b = element_counts(b);

    if counts_a.is_empty() && counts_b.is_empty() {
        return 1.0;
    }

    let mut intersection = 0usize;
    let mut union = 0usize;
    for (key, count_a) in &counts_a {
        let count_b = counts_b.get(key).copied().unwrap_or(0);
        intersection += (*count_a).min(count_b);
        union += (*count_a).max(count_b);
    }
    for (key, count_b) in &counts_b {
        if !counts_a.contains_key(key) {
            union += *count_b;
        }
    }

    if union == 0 {
        1.0
    } else {
        intersection as f64 / union as f64
    }
}

fn element_counts(fp: &Fingerprint) -> BTreeMap<(String, String), usize> {
    let mut counts = BTreeMap::new();
    for key in fp.element_keys() {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

fn structural_score(a: &Fingerprint, b: &Fingerprint) -> f64 {
    if a.structural.url_pattern == b.structural.url_pattern {
        1.0
    } else {
        text_ratio(&a.structural.url_pattern, &b.structural.url_pattern)
    }
}

fn content_score(a: &Fingerprint, b: &Fingerprint) -> f64 {
    let text_a = format!("{} {}", a.content.title, a.content.main_heading);
    let text_b = format!("{} {}", b.content.title, b.content.main_heading);
    text_ratio(text_a.trim(), text_b.trim())
}

fn style_score(a: &Fingerprint, b: &Fingerprint) -> f64 {
    if a.style == b.style { 1.0 } else { 0.0 }
}

/// Edit-distance similarity ratio in [0, 1]. Symmetric by construction.
pub fn text_ratio(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let chars_a: Vec<char> = a.chars().collect();
    let chars_b: Vec<char> = b.chars().collect();
    let max_len = chars_a.len().max(chars_b.len());
    let distance = levenshtein(&chars_a, &chars_b);
    1.0 - distance as f64 / max_len as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

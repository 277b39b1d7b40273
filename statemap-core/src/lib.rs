pub mod classify;
pub mod error;
pub mod explore;
pub mod fingerprint;
pub mod graph;
pub mod merge;
pub mod model;
pub mod similarity;

pub use error::{DiscoveryError, GraphError};
pub use explore::{DiscoveryConfig, DiscoveryReport, DiscoverySession, Strategy};
pub use fingerprint::Fingerprint;
pub use graph::{MatchOutcome, State, StateGraph, StateType, Transition};
pub use merge::{load_seed, reconcile};
pub use model::GraphDocument;
pub use similarity::{DEFAULT_MATCH_THRESHOLD, Scorer, SimilarityWeights};

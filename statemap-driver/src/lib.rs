pub mod action;
pub mod driver;
pub mod error;
pub mod replay;
pub mod snapshot;

pub use action::{ActionDescriptor, ActionType};
pub use driver::{Driver, enumerate_actions};
pub use error::DriverError;
pub use replay::{ReplayDriver, ReplayScript};
pub use snapshot::{AxNode, Snapshot};

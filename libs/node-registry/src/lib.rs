pub mod error;
pub mod expander;
pub mod ingest;
pub mod registry;
pub mod relay;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use error::RelayError;
pub use expander::{Expansion, ExpanderPolicy, SubscriptionExpander};
pub use ingest::{Ingest, IngestOutcome};
pub use registry::NodeRegistry;
pub use relay::{CommandRelay, RelayCommand};
pub use service::NodeService;

// Application layer - use cases and orchestration over the storage traits.

pub mod aggregator;
pub mod error;
pub mod service;

pub use aggregator::*;
pub use error::*;
pub use service::*;

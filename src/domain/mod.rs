pub mod archive;
pub mod cascade;
pub mod context;
pub mod error;
pub mod ids;
pub mod model;
pub mod races;
pub mod relocation;
pub mod reports;
pub mod trainers;

pub use context::{RequestContext, Role};
pub use error::{DomainError, DomainResult};

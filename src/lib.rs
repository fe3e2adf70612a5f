pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::RacingService;
pub use domain::{DomainError, DomainResult, RequestContext, Role};
pub use storage::{MemoryStore, PostgresStore, RacingStore};

pub mod racing_service;

pub use racing_service::RacingService;

//! Infrastructure layer: entity store adapters, rate admission, configuration.

pub mod config;
pub mod rate_limit;
pub mod store;

pub use config::{ConfigError, Settings};
pub use rate_limit::{Decision, Identity, RateAdmission, RateLimit, RouteClass, RouteLimits};
pub use store::{InMemoryDatabase, InMemoryStore, PostgresDatabase, PostgresStore};

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, URL parsing)
//!     → ValidatedConfig (immutable)
//!     → handed to startup, shared via Arc where needed
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the backend pool is static
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError, ValidatedConfig};
pub use schema::{
    BalancerConfig, CertificateConfig, HealthConfig, LimiterConfig, ListenerConfig,
    NoHealthyPolicy, ObservabilityConfig, SelectionType, StickyConfig, TimeoutConfig,
};
pub use validation::ValidationError;

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SigwaitConfig (validated, immutable)
//!     → command-line overrides applied by main.rs
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs (or none at all)
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ConfirmationConfig;
pub use schema::ObservabilityConfig;
pub use schema::RpcConfig;
pub use schema::SigwaitConfig;

//! ankibox core library: domain types, configuration, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes, [`Record`], configuration structs
//! - [`error`]: [`ConfigError`]
//! - [`config`]: locate / load / validate, mirror path derivation

pub mod config;
pub mod error;
pub mod types;

pub use error::ConfigError;
pub use types::{
    BoxConfig, BoxName, Config, DeletionMark, ExternalId, Provenance, Record, SourceKind,
};

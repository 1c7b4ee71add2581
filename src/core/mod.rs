//! Core engine types and utilities

pub mod types;
pub mod error;
pub mod logging;
pub mod updatable;

pub use types::*;
pub use error::{ConfigError, Error};
pub use updatable::{ListenerId, Updatable, Validate};

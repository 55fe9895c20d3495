//! # realty-core
//!
//! Core types, traits, and abstractions for the realty property service.
//!
//! This crate provides the domain models, request parsing, and trait
//! definitions that the other realty crates depend on.

pub mod defaults;
pub mod error;
pub mod form;
pub mod models;
pub mod search;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use form::{parse_list_field, FlagInput, ListInput, ListParse, NumberInput, PropertyForm};
pub use models::*;
pub use search::{PropertySearchFilter, PropertySearchQuery};
pub use traits::*;

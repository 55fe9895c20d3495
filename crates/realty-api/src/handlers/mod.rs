//! HTTP handler modules for realty-api.

pub mod health;
pub mod properties;

//! Service layer for business logic.

pub mod property_service;

pub use property_service::{ImageUploadOutcome, PropertyService};

//! # realty-api
//!
//! HTTP API for the realty property service: property search, the
//! create/update pipeline, status changes and image management.
//!
//! The binary (`src/main.rs`) wires the concrete backends into an
//! [`AppState`] and wraps [`router`] with the middleware stack.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, patch, put},
    Router,
};

use realty_core::{Geocoder, PropertyRepository, StorageBackend};
use realty_storage::StorageBuckets;

pub use error::ApiError;
pub use services::PropertyService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub properties: PropertyService,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn PropertyRepository>,
        geocoder: Arc<dyn Geocoder>,
        storage: Arc<dyn StorageBackend>,
        buckets: StorageBuckets,
    ) -> Self {
        Self {
            properties: PropertyService::new(repo, geocoder, storage, buckets),
        }
    }
}

/// All routes, without middleware.
pub fn router(state: AppState) -> Router {
    use handlers::{health, properties};

    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/properties",
            get(properties::list_properties).post(properties::create_property),
        )
        .route(
            "/properties/status/bulk",
            patch(properties::bulk_update_property_status),
        )
        .route(
            "/properties/:id",
            get(properties::get_property)
                .put(properties::update_property)
                .delete(properties::delete_property),
        )
        .route(
            "/properties/:id/status",
            patch(properties::update_property_status),
        )
        .route(
            "/properties/:id/images",
            put(properties::update_property_images).post(properties::upload_property_images),
        )
        .route(
            "/properties/:id/leases",
            get(properties::list_property_leases),
        )
        .with_state(state)
}

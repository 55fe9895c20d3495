//! Core traits for realty abstractions.
//!
//! The HTTP layer depends only on these traits, so the database, geocoder and
//! object storage backends can be swapped (or faked in tests).

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;
use crate::search::PropertySearchFilter;

// =============================================================================
// PROPERTY REPOSITORY
// =============================================================================

/// Request for creating a property together with its location.
#[derive(Debug, Clone)]
pub struct CreatePropertyRequest {
    pub manager_cognito_id: String,
    pub address: Address,
    pub coordinates: Coordinates,
    pub fields: PropertyFields,
}

/// Repository for property listings and their locations.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Run a filtered search. Results carry their location but no manager.
    async fn search(&self, filter: &PropertySearchFilter) -> Result<Vec<PropertyDetail>>;

    /// Fetch a property with its location and manager.
    async fn get(&self, id: i32) -> Result<Option<PropertyDetail>>;

    /// Fetch a property only if it is owned by the given manager.
    async fn get_owned(&self, id: i32, manager_cognito_id: &str)
        -> Result<Option<PropertyDetail>>;

    /// Insert the location and property in one transaction. Returns the new id.
    async fn create(&self, req: CreatePropertyRequest) -> Result<i32>;

    /// Overwrite the editable fields of a property.
    async fn update_fields(&self, id: i32, fields: &PropertyFields) -> Result<()>;

    /// Overwrite a location's address and coordinates.
    async fn update_location(
        &self,
        location_id: i32,
        address: &Address,
        coordinates: Coordinates,
    ) -> Result<()>;

    /// Delete a property and its location.
    ///
    /// Fails with `Error::DeleteBlocked` while any lease is still active.
    async fn delete(&self, id: i32) -> Result<()>;

    /// Set the status of a single property.
    async fn update_status(&self, id: i32, status: PropertyStatus) -> Result<Property>;

    /// Set the status of several properties atomically.
    ///
    /// Either every requested property is owned by the manager and all are
    /// updated, or nothing changes and `Error::Forbidden` is returned.
    async fn bulk_update_status(
        &self,
        ids: &[i32],
        manager_cognito_id: &str,
        status: PropertyStatus,
    ) -> Result<Vec<Property>>;

    /// Replace the managed image list of a property.
    async fn update_images(&self, id: i32, images: &[String]) -> Result<Property>;

    /// Leases of a property with their tenants, oldest first.
    async fn list_leases(&self, property_id: i32) -> Result<Vec<LeaseWithTenant>>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<()>;
}

// =============================================================================
// GEOCODING
// =============================================================================

/// Resolves a postal address to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up an address.
    ///
    /// A lookup that succeeds but finds nothing returns
    /// [`Coordinates::FALLBACK`]; only transport-level failures are errors.
    async fn geocode(&self, address: &Address) -> Result<Coordinates>;

    /// Backend name for logs and health output.
    fn name(&self) -> &str;
}

// =============================================================================
// OBJECT STORAGE
// =============================================================================

/// Bucketed object storage with publicly readable URLs.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store an object and return its public URL.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String>;

    /// Remove objects by path in one call.
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()>;

    /// Public URL of an object.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Backend name for logs and health output.
    fn name(&self) -> &str;
}

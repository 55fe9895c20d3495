//! Property HTTP handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use realty_core::{
    Error, LeaseWithTenant, Property, PropertyDetail, PropertySearchFilter, PropertySearchQuery,
    PropertyStatus,
};

use crate::auth::RequireManager;
use crate::extract::{ImageUpload, JsonBody, PropertyId, PropertyPayload};
use crate::{ApiError, AppState};

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

/// Request body for a single status change.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Request body for a bulk status change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusRequest {
    #[serde(default)]
    pub property_ids: Vec<i32>,
    pub status: String,
}

/// Request body replacing the managed image list.
#[derive(Debug, Deserialize)]
pub struct UpdateImagesRequest {
    pub images: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BulkStatusResponse {
    pub message: String,
    pub properties: Vec<Property>,
}

#[derive(Debug, Serialize)]
pub struct UpdateImagesResponse {
    pub success: bool,
    pub data: Property,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImagesResponse {
    pub success: bool,
    pub image_urls: Vec<String>,
    pub total_images: usize,
}

fn parse_status(status: &str) -> Result<PropertyStatus, ApiError> {
    status
        .parse::<PropertyStatus>()
        .map_err(|e| ApiError::from(Error::InvalidInput(e)))
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Search properties.
///
/// # Returns
/// - 200 OK with the matching properties (possibly empty)
/// - 400 Bad Request for malformed numeric filters or an unknown property type
pub async fn list_properties(
    State(state): State<AppState>,
    Query(query): Query<PropertySearchQuery>,
) -> Result<Json<Vec<PropertyDetail>>, ApiError> {
    let filter = PropertySearchFilter::from_query(&query)?;
    let properties = state.properties.search(&filter).await?;
    Ok(Json(properties))
}

/// Get a property with its location and manager.
pub async fn get_property(
    State(state): State<AppState>,
    PropertyId(id): PropertyId,
) -> Result<Json<PropertyDetail>, ApiError> {
    Ok(Json(state.properties.get(id).await?))
}

/// Create a property owned by the calling manager.
///
/// Accepts multipart (with `photos` files) or JSON.
///
/// # Returns
/// - 201 Created with the property joined with its location and manager
/// - 400 Bad Request for missing or malformed fields
/// - 403 Forbidden when the body names another manager
/// - 500 Internal Server Error when geocoding fails
pub async fn create_property(
    State(state): State<AppState>,
    manager: RequireManager,
    payload: PropertyPayload,
) -> Result<(StatusCode, Json<PropertyDetail>), ApiError> {
    let property = state
        .properties
        .create(manager.id(), payload.form, payload.files)
        .await?;
    Ok((StatusCode::CREATED, Json(property)))
}

/// Apply a partial update. Fields absent from the request keep their value.
pub async fn update_property(
    State(state): State<AppState>,
    manager: RequireManager,
    PropertyId(id): PropertyId,
    payload: PropertyPayload,
) -> Result<Json<PropertyDetail>, ApiError> {
    let property = state
        .properties
        .update(id, manager.id(), payload.form, payload.files)
        .await?;
    Ok(Json(property))
}

/// Delete a property.
///
/// # Returns
/// - 200 OK when deleted
/// - 400 Bad Request while the property has an active lease
/// - 404 Not Found when missing or owned by someone else
pub async fn delete_property(
    State(state): State<AppState>,
    manager: RequireManager,
    PropertyId(id): PropertyId,
) -> Result<Json<MessageResponse>, ApiError> {
    state.properties.delete(id, manager.id()).await?;
    Ok(Json(MessageResponse {
        message: "Property deleted successfully".to_string(),
    }))
}

pub async fn update_property_status(
    State(state): State<AppState>,
    manager: RequireManager,
    PropertyId(id): PropertyId,
    JsonBody(req): JsonBody<UpdateStatusRequest>,
) -> Result<Json<Property>, ApiError> {
    let status = parse_status(&req.status)?;
    let property = state
        .properties
        .update_status(id, manager.id(), status)
        .await?;
    Ok(Json(property))
}

/// Change the status of several properties at once.
///
/// # Returns
/// - 200 OK with the updated properties
/// - 400 Bad Request for an empty id list or unknown status
/// - 403 Forbidden if any id is missing or not owned; nothing is changed
pub async fn bulk_update_property_status(
    State(state): State<AppState>,
    manager: RequireManager,
    JsonBody(req): JsonBody<BulkStatusRequest>,
) -> Result<Json<BulkStatusResponse>, ApiError> {
    let status = parse_status(&req.status)?;
    let properties = state
        .properties
        .bulk_update_status(&req.property_ids, manager.id(), status)
        .await?;
    Ok(Json(BulkStatusResponse {
        message: format!("Successfully updated {} properties", properties.len()),
        properties,
    }))
}

/// Replace the managed image list; dropped images are removed from storage.
pub async fn update_property_images(
    State(state): State<AppState>,
    manager: RequireManager,
    PropertyId(id): PropertyId,
    JsonBody(req): JsonBody<UpdateImagesRequest>,
) -> Result<Json<UpdateImagesResponse>, ApiError> {
    let property = state
        .properties
        .sync_images(id, manager.id(), req.images)
        .await?;
    Ok(Json(UpdateImagesResponse {
        success: true,
        data: property,
    }))
}

/// Upload image files and append them to the managed image list.
pub async fn upload_property_images(
    State(state): State<AppState>,
    manager: RequireManager,
    PropertyId(id): PropertyId,
    upload: ImageUpload,
) -> Result<Json<UploadImagesResponse>, ApiError> {
    let outcome = state
        .properties
        .upload_images(id, manager.id(), upload.files)
        .await?;
    Ok(Json(UploadImagesResponse {
        success: true,
        total_images: outcome.property.fields.images.len(),
        image_urls: outcome.uploaded,
    }))
}

pub async fn list_property_leases(
    State(state): State<AppState>,
    PropertyId(id): PropertyId,
) -> Result<Json<Vec<LeaseWithTenant>>, ApiError> {
    Ok(Json(state.properties.list_leases(id).await?))
}

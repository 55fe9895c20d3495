//! Property mutation pipeline.
//!
//! Orchestrates the repository, geocoder and object storage for each
//! property operation. Failure handling differs per dependency:
//!
//! - photo/image uploads run concurrently; a failed upload is logged and
//!   dropped without aborting its siblings
//! - geocoding failures reject a create but only log on update, where the
//!   previous coordinates are kept
//! - storage cleanup after an image sync is best-effort; the database list
//!   is authoritative

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use realty_core::{
    Address, Coordinates, CreatePropertyRequest, Error, Geocoder, LeaseWithTenant, Property,
    PropertyDetail, PropertyFields, PropertyForm, PropertyRepository, PropertySearchFilter,
    PropertyStatus, Result, StorageBackend, UploadedFile,
};
use realty_storage::{
    detect_content_type, extract_storage_path, image_object_path, photo_object_path,
    StorageBuckets,
};

/// Result of uploading files to a property's managed image list.
#[derive(Debug, Clone)]
pub struct ImageUploadOutcome {
    pub uploaded: Vec<String>,
    pub property: Property,
}

/// An object written to storage while handling a request.
#[derive(Debug, Clone)]
struct StoredObject {
    path: String,
    url: String,
}

fn urls(objects: &[StoredObject]) -> Vec<String> {
    objects.iter().map(|o| o.url.clone()).collect()
}

/// Service for property create/update/status/image operations.
#[derive(Clone)]
pub struct PropertyService {
    repo: Arc<dyn PropertyRepository>,
    geocoder: Arc<dyn Geocoder>,
    storage: Arc<dyn StorageBackend>,
    buckets: StorageBuckets,
}

impl PropertyService {
    pub fn new(
        repo: Arc<dyn PropertyRepository>,
        geocoder: Arc<dyn Geocoder>,
        storage: Arc<dyn StorageBackend>,
        buckets: StorageBuckets,
    ) -> Self {
        Self {
            repo,
            geocoder,
            storage,
            buckets,
        }
    }

    pub fn repository(&self) -> &Arc<dyn PropertyRepository> {
        &self.repo
    }

    pub fn geocoder(&self) -> &Arc<dyn Geocoder> {
        &self.geocoder
    }

    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub async fn search(&self, filter: &PropertySearchFilter) -> Result<Vec<PropertyDetail>> {
        self.repo.search(filter).await
    }

    pub async fn get(&self, id: i32) -> Result<PropertyDetail> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Property {} not found", id)))
    }

    pub async fn list_leases(&self, property_id: i32) -> Result<Vec<LeaseWithTenant>> {
        self.repo.list_leases(property_id).await
    }

    async fn get_owned(&self, id: i32, manager_cognito_id: &str) -> Result<PropertyDetail> {
        self.repo
            .get_owned(id, manager_cognito_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(
                    "Property not found or you do not have permission to modify it".to_string(),
                )
            })
    }

    // =========================================================================
    // CREATE / UPDATE
    // =========================================================================

    /// Create a property owned by `manager_cognito_id`.
    pub async fn create(
        &self,
        manager_cognito_id: &str,
        form: PropertyForm,
        photos: Vec<UploadedFile>,
    ) -> Result<PropertyDetail> {
        let start = Instant::now();

        if let Some(claimed) = form
            .manager_cognito_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            if claimed != manager_cognito_id {
                return Err(Error::Forbidden(
                    "Cannot create a property for another manager".to_string(),
                ));
            }
        }

        let (address, mut fields) = form.into_new()?;
        let uploaded = self.upload_photos(photos).await;
        fields.photo_urls = urls(&uploaded);

        let inserted = self
            .geocode_and_insert(manager_cognito_id, address, fields)
            .await;
        let (id, coordinates) = match inserted {
            Ok(inserted) => inserted,
            Err(e) => {
                self.discard(&self.buckets.photos, &uploaded).await;
                return Err(e);
            }
        };

        info!(
            subsystem = "api",
            component = "property_service",
            op = "create",
            property_id = id,
            manager = manager_cognito_id,
            longitude = coordinates.longitude,
            latitude = coordinates.latitude,
            duration_ms = start.elapsed().as_millis() as u64,
            "Property created"
        );

        self.repo
            .get(id)
            .await?
            .ok_or_else(|| Error::Internal(format!("Property {} vanished after create", id)))
    }

    /// No location, no property: a geocoder failure aborts the insert.
    async fn geocode_and_insert(
        &self,
        manager_cognito_id: &str,
        address: Address,
        fields: PropertyFields,
    ) -> Result<(i32, Coordinates)> {
        let coordinates = self.geocoder.geocode(&address).await?;
        let id = self
            .repo
            .create(CreatePropertyRequest {
                manager_cognito_id: manager_cognito_id.to_string(),
                address,
                coordinates,
                fields,
            })
            .await?;
        Ok((id, coordinates))
    }

    /// Apply a partial update to a property owned by `manager_cognito_id`.
    pub async fn update(
        &self,
        id: i32,
        manager_cognito_id: &str,
        form: PropertyForm,
        photos: Vec<UploadedFile>,
    ) -> Result<PropertyDetail> {
        let start = Instant::now();
        let current = self.get_owned(id, manager_cognito_id).await?;

        let mut fields = form.merge_into(&current.property.fields)?;
        let uploaded = self.upload_photos(photos).await;
        fields.photo_urls.extend(urls(&uploaded));

        if let Some(address) = form.address() {
            let coordinates = match self.geocoder.geocode(&address).await {
                Ok(coordinates) => coordinates,
                Err(e) => {
                    warn!(
                        subsystem = "api",
                        component = "property_service",
                        property_id = id,
                        error = %e,
                        "Geocoding failed on update, keeping previous coordinates"
                    );
                    current.location.coordinates
                }
            };
            if let Err(e) = self
                .repo
                .update_location(current.location.id, &address, coordinates)
                .await
            {
                warn!(
                    subsystem = "api",
                    component = "property_service",
                    property_id = id,
                    location_id = current.location.id,
                    error = %e,
                    "Location update failed, continuing"
                );
            }
        }

        if let Err(e) = self.repo.update_fields(id, &fields).await {
            self.discard(&self.buckets.photos, &uploaded).await;
            return Err(e);
        }

        info!(
            subsystem = "api",
            component = "property_service",
            op = "update",
            property_id = id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Property updated"
        );

        // Re-read so the response reflects committed state.
        self.get(id).await
    }

    pub async fn delete(&self, id: i32, manager_cognito_id: &str) -> Result<()> {
        self.get_owned(id, manager_cognito_id).await?;
        self.repo.delete(id).await?;
        info!(
            subsystem = "api",
            component = "property_service",
            op = "delete",
            property_id = id,
            "Property deleted"
        );
        Ok(())
    }

    // =========================================================================
    // STATUS
    // =========================================================================

    pub async fn update_status(
        &self,
        id: i32,
        manager_cognito_id: &str,
        status: PropertyStatus,
    ) -> Result<Property> {
        self.get_owned(id, manager_cognito_id).await?;
        self.repo.update_status(id, status).await
    }

    /// Set the status of every property in `ids`, or of none of them.
    pub async fn bulk_update_status(
        &self,
        ids: &[i32],
        manager_cognito_id: &str,
        status: PropertyStatus,
    ) -> Result<Vec<Property>> {
        if ids.is_empty() {
            return Err(Error::InvalidInput(
                "Property IDs array is required".to_string(),
            ));
        }
        let updated = self
            .repo
            .bulk_update_status(ids, manager_cognito_id, status)
            .await?;
        info!(
            subsystem = "api",
            component = "property_service",
            op = "bulk_update_status",
            status = %status,
            result_count = updated.len(),
            "Bulk status update applied"
        );
        Ok(updated)
    }

    // =========================================================================
    // IMAGES
    // =========================================================================

    /// Replace the managed image list and remove dropped objects from storage.
    pub async fn sync_images(
        &self,
        id: i32,
        manager_cognito_id: &str,
        images: Vec<String>,
    ) -> Result<Property> {
        let current = self.get_owned(id, manager_cognito_id).await?;
        let images: Vec<String> = images
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();

        let removed_paths: Vec<String> = current
            .property
            .fields
            .images
            .iter()
            .filter(|url| !images.contains(url))
            .filter_map(|url| {
                let path = extract_storage_path(url, &self.buckets.images);
                if path.is_none() {
                    debug!(url = %url, "No storage path in removed image URL");
                }
                path
            })
            .collect();

        if !removed_paths.is_empty() {
            match self.storage.remove(&self.buckets.images, &removed_paths).await {
                Ok(()) => debug!(
                    subsystem = "api",
                    component = "property_service",
                    property_id = id,
                    count = removed_paths.len(),
                    "Removed images from storage"
                ),
                Err(e) => warn!(
                    subsystem = "api",
                    component = "property_service",
                    property_id = id,
                    error = %e,
                    "Failed to remove images from storage, continuing"
                ),
            }
        }

        self.repo.update_images(id, &images).await
    }

    /// Upload files to the image bucket and append them to the image list.
    pub async fn upload_images(
        &self,
        id: i32,
        manager_cognito_id: &str,
        files: Vec<UploadedFile>,
    ) -> Result<ImageUploadOutcome> {
        if files.is_empty() {
            return Err(Error::InvalidInput("No files uploaded".to_string()));
        }
        let current = self.get_owned(id, manager_cognito_id).await?;

        let millis = Utc::now().timestamp_millis();
        // Offset per file so same-named files in one batch get distinct keys.
        let uploaded = self
            .upload_all(&self.buckets.images, files, |index, file| {
                image_object_path(id, millis + index as i64, &file.file_name)
            })
            .await;
        if uploaded.is_empty() {
            return Err(Error::Storage("Failed to upload any images".to_string()));
        }

        let mut images = current.property.fields.images;
        images.extend(urls(&uploaded));
        let property = match self.repo.update_images(id, &images).await {
            Ok(property) => property,
            Err(e) => {
                self.discard(&self.buckets.images, &uploaded).await;
                return Err(e);
            }
        };

        Ok(ImageUploadOutcome {
            uploaded: urls(&uploaded),
            property,
        })
    }

    // =========================================================================
    // UPLOADS
    // =========================================================================

    async fn upload_photos(&self, photos: Vec<UploadedFile>) -> Vec<StoredObject> {
        let prefix = self.buckets.photo_prefix.clone();
        self.upload_all(&self.buckets.photos, photos, |_, file| {
            photo_object_path(&prefix, &file.file_name)
        })
        .await
    }

    /// Best-effort removal of objects uploaded by a request that then failed.
    async fn discard(&self, bucket: &str, objects: &[StoredObject]) {
        if objects.is_empty() {
            return;
        }
        let paths: Vec<String> = objects.iter().map(|o| o.path.clone()).collect();
        match self.storage.remove(bucket, &paths).await {
            Ok(()) => debug!(
                subsystem = "api",
                component = "property_service",
                bucket,
                count = paths.len(),
                "Discarded uploads of failed request"
            ),
            Err(e) => warn!(
                subsystem = "api",
                component = "property_service",
                bucket,
                count = paths.len(),
                error = %e,
                "Failed to discard uploads of failed request"
            ),
        }
    }

    /// Upload files concurrently, returning the successful ones in input
    /// order.
    async fn upload_all<F>(
        &self,
        bucket: &str,
        files: Vec<UploadedFile>,
        key: F,
    ) -> Vec<StoredObject>
    where
        F: Fn(usize, &UploadedFile) -> String,
    {
        if files.is_empty() {
            return Vec::new();
        }
        let start = Instant::now();
        let total = files.len();
        let storage = &self.storage;

        let uploads = files.into_iter().enumerate().map(|(index, file)| {
            let path = key(index, &file);
            async move {
                let content_type = detect_content_type(&file.data, file.content_type.as_deref());
                let result = storage
                    .upload(bucket, &path, &file.data, &content_type)
                    .await;
                match result {
                    Ok(url) => Some(StoredObject { path, url }),
                    Err(e) => {
                        warn!(
                            subsystem = "api",
                            component = "property_service",
                            bucket,
                            path = %path,
                            error = %e,
                            "Upload failed, dropping file"
                        );
                        None
                    }
                }
            }
        });
        let stored: Vec<StoredObject> = join_all(uploads).await.into_iter().flatten().collect();

        debug!(
            subsystem = "api",
            component = "property_service",
            op = "upload",
            bucket,
            requested = total,
            result_count = stored.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Uploads finished"
        );
        stored
    }
}

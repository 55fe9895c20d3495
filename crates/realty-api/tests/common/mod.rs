//! In-memory fakes for the repository, geocoder and object storage.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};

use realty_api::AppState;
use realty_core::{
    Address, Coordinates, CreatePropertyRequest, Error, Geocoder, Lease, LeaseWithTenant,
    Location, Manager, Property, PropertyDetail, PropertyFields, PropertyRepository,
    PropertySearchFilter, PropertyStatus, Result, StorageBackend, Tenant, UploadedFile,
};
use realty_storage::StorageBuckets;

pub const MANAGER: &str = "manager-1";
pub const OTHER_MANAGER: &str = "manager-2";
pub const STORAGE_BASE: &str = "https://storage.test";

// =============================================================================
// REPOSITORY
// =============================================================================

#[derive(Default)]
struct Store {
    properties: BTreeMap<i32, (Property, Location)>,
    leases: Vec<LeaseWithTenant>,
    next_id: i32,
}

#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
    fail_writes: Mutex<bool>,
}

fn manager(cognito_id: &str) -> Manager {
    Manager {
        id: 1,
        cognito_id: cognito_id.to_string(),
        name: format!("Manager {}", cognito_id),
        email: format!("{}@example.com", cognito_id),
        phone_number: "555-0100".to_string(),
    }
}

fn detail(property: &Property, location: &Location, with_manager: bool) -> PropertyDetail {
    PropertyDetail {
        property: property.clone(),
        location: location.clone(),
        manager: with_manager.then(|| manager(&property.manager_cognito_id)),
    }
}

fn matches(filter: &PropertySearchFilter, p: &Property, l: &Location) -> bool {
    let f = &p.fields;
    filter
        .favorite_ids
        .as_ref()
        .map_or(true, |ids| ids.contains(&p.id))
        && filter.price_min.map_or(true, |v| f.price_per_month >= v)
        && filter.price_max.map_or(true, |v| f.price_per_month <= v)
        && filter.beds_min.map_or(true, |v| f.beds as f64 >= v)
        && filter.baths_min.map_or(true, |v| f.baths >= v)
        && filter
            .property_type
            .map_or(true, |t| f.property_type == t)
        && filter.square_feet_min.map_or(true, |v| f.square_feet as f64 >= v)
        && filter.square_feet_max.map_or(true, |v| f.square_feet as f64 <= v)
        && filter.amenities.iter().all(|a| f.amenities.contains(a))
        && filter.near.map_or(true, |c| {
            let dx = c.longitude - l.coordinates.longitude;
            let dy = c.latitude - l.coordinates.latitude;
            (dx * dx + dy * dy).sqrt() <= realty_core::defaults::search_radius_degrees()
        })
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `update_fields` and `update_images` fail like a lost connection.
    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }

    fn check_write(&self) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    /// Insert a property directly, bypassing the service.
    pub fn seed(
        &self,
        manager_cognito_id: &str,
        fields: PropertyFields,
        coordinates: Coordinates,
    ) -> i32 {
        let mut store = self.store.lock().unwrap();
        store.next_id += 1;
        let id = store.next_id;
        let location = Location {
            id,
            address: sample_address(),
            coordinates,
        };
        let property = Property {
            id,
            fields,
            status: PropertyStatus::Available,
            posted_date: Utc::now(),
            average_rating: None,
            number_of_reviews: None,
            location_id: id,
            manager_cognito_id: manager_cognito_id.to_string(),
        };
        store.properties.insert(id, (property, location));
        id
    }

    /// Add a lease ending `days_left` days from now (negative: already ended).
    pub fn add_lease(&self, property_id: i32, days_left: i64) {
        let mut store = self.store.lock().unwrap();
        let id = store.leases.len() as i32 + 1;
        let now = Utc::now();
        store.leases.push(LeaseWithTenant {
            lease: Lease {
                id,
                start_date: now - Duration::days(365),
                end_date: now + Duration::days(days_left),
                rent: 1500.0,
                deposit: 1500.0,
                property_id,
                tenant_cognito_id: "tenant-1".to_string(),
            },
            tenant: Tenant {
                id: 1,
                cognito_id: "tenant-1".to_string(),
                name: "Tenant One".to_string(),
                email: "tenant@example.com".to_string(),
                phone_number: "555-0199".to_string(),
            },
        });
    }

    pub fn snapshot(&self, id: i32) -> Option<(Property, Location)> {
        self.store.lock().unwrap().properties.get(&id).cloned()
    }

    pub fn count(&self) -> usize {
        self.store.lock().unwrap().properties.len()
    }
}

#[async_trait]
impl PropertyRepository for InMemoryRepository {
    async fn search(&self, filter: &PropertySearchFilter) -> Result<Vec<PropertyDetail>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .properties
            .values()
            .filter(|(p, l)| matches(filter, p, l))
            .map(|(p, l)| detail(p, l, false))
            .collect())
    }

    async fn get(&self, id: i32) -> Result<Option<PropertyDetail>> {
        let store = self.store.lock().unwrap();
        Ok(store.properties.get(&id).map(|(p, l)| detail(p, l, true)))
    }

    async fn get_owned(
        &self,
        id: i32,
        manager_cognito_id: &str,
    ) -> Result<Option<PropertyDetail>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .properties
            .get(&id)
            .filter(|(p, _)| p.manager_cognito_id == manager_cognito_id)
            .map(|(p, l)| detail(p, l, true)))
    }

    async fn create(&self, req: CreatePropertyRequest) -> Result<i32> {
        let id = self.seed(&req.manager_cognito_id, req.fields, req.coordinates);
        let mut store = self.store.lock().unwrap();
        if let Some((_, location)) = store.properties.get_mut(&id) {
            location.address = req.address;
        }
        Ok(id)
    }

    async fn update_fields(&self, id: i32, fields: &PropertyFields) -> Result<()> {
        self.check_write()?;
        let mut store = self.store.lock().unwrap();
        let (property, _) = store
            .properties
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Property {} not found", id)))?;
        property.fields = fields.clone();
        Ok(())
    }

    async fn update_location(
        &self,
        location_id: i32,
        address: &Address,
        coordinates: Coordinates,
    ) -> Result<()> {
        let mut store = self.store.lock().unwrap();
        let (_, location) = store
            .properties
            .values_mut()
            .find(|(_, l)| l.id == location_id)
            .ok_or_else(|| Error::NotFound(format!("Location {} not found", location_id)))?;
        location.address = address.clone();
        location.coordinates = coordinates;
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<()> {
        let mut store = self.store.lock().unwrap();
        let now = Utc::now();
        let active = store
            .leases
            .iter()
            .filter(|l| l.lease.property_id == id && l.lease.is_active_at(now))
            .count();
        if active > 0 {
            return Err(Error::DeleteBlocked(format!(
                "Cannot delete property with {} active lease(s)",
                active
            )));
        }
        store.properties.remove(&id);
        store.leases.retain(|l| l.lease.property_id != id);
        Ok(())
    }

    async fn update_status(&self, id: i32, status: PropertyStatus) -> Result<Property> {
        let mut store = self.store.lock().unwrap();
        let (property, _) = store
            .properties
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Property {} not found", id)))?;
        property.status = status;
        Ok(property.clone())
    }

    async fn bulk_update_status(
        &self,
        ids: &[i32],
        manager_cognito_id: &str,
        status: PropertyStatus,
    ) -> Result<Vec<Property>> {
        let mut store = self.store.lock().unwrap();
        let mut wanted = ids.to_vec();
        wanted.sort_unstable();
        wanted.dedup();
        let owned = wanted
            .iter()
            .filter(|id| {
                store
                    .properties
                    .get(*id)
                    .is_some_and(|(p, _)| p.manager_cognito_id == manager_cognito_id)
            })
            .count();
        if owned != wanted.len() {
            return Err(Error::Forbidden(
                "One or more properties do not exist or are not owned by this manager"
                    .to_string(),
            ));
        }
        let mut updated = Vec::with_capacity(wanted.len());
        for id in wanted {
            if let Some((property, _)) = store.properties.get_mut(&id) {
                property.status = status;
                updated.push(property.clone());
            }
        }
        Ok(updated)
    }

    async fn update_images(&self, id: i32, images: &[String]) -> Result<Property> {
        self.check_write()?;
        let mut store = self.store.lock().unwrap();
        let (property, _) = store
            .properties
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Property {} not found", id)))?;
        property.fields.images = images.to_vec();
        Ok(property.clone())
    }

    async fn list_leases(&self, property_id: i32) -> Result<Vec<LeaseWithTenant>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .leases
            .iter()
            .filter(|l| l.lease.property_id == property_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// GEOCODER
// =============================================================================

pub enum GeocodeMode {
    Found(Coordinates),
    NoResults,
    Fail,
}

pub struct StubGeocoder {
    mode: Mutex<GeocodeMode>,
    calls: Mutex<Vec<Address>>,
}

impl StubGeocoder {
    pub fn new(mode: GeocodeMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: GeocodeMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> Vec<Address> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, address: &Address) -> Result<Coordinates> {
        self.calls.lock().unwrap().push(address.clone());
        match &*self.mode.lock().unwrap() {
            GeocodeMode::Found(c) => Ok(*c),
            GeocodeMode::NoResults => Ok(Coordinates::FALLBACK),
            GeocodeMode::Fail => Err(Error::Geocoding("connection refused".to_string())),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

// =============================================================================
// STORAGE
// =============================================================================

#[derive(Default)]
pub struct RecordingStorage {
    uploads: Mutex<Vec<(String, String, String)>>,
    removals: Mutex<Vec<(String, Vec<String>)>>,
    /// Uploads whose path contains this text fail.
    fail_uploads_containing: Mutex<Option<String>>,
    fail_removals: Mutex<bool>,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads_containing(&self, needle: &str) {
        *self.fail_uploads_containing.lock().unwrap() = Some(needle.to_string());
    }

    pub fn fail_removals(&self) {
        *self.fail_removals.lock().unwrap() = true;
    }

    /// `(bucket, path, content_type)` of successful uploads.
    pub fn uploads(&self) -> Vec<(String, String, String)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn removals(&self) -> Vec<(String, Vec<String>)> {
        self.removals.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageBackend for RecordingStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        _data: &[u8],
        content_type: &str,
    ) -> Result<String> {
        if let Some(needle) = &*self.fail_uploads_containing.lock().unwrap() {
            if path.contains(needle.as_str()) {
                return Err(Error::Storage(format!("upload of {} rejected", path)));
            }
        }
        let mut uploads = self.uploads.lock().unwrap();
        if uploads.iter().any(|(b, p, _)| b == bucket && p == path) {
            return Err(Error::Storage(format!("{} already exists", path)));
        }
        uploads.push((
            bucket.to_string(),
            path.to_string(),
            content_type.to_string(),
        ));
        Ok(self.public_url(bucket, path))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        self.removals
            .lock()
            .unwrap()
            .push((bucket.to_string(), paths.to_vec()));
        if *self.fail_removals.lock().unwrap() {
            return Err(Error::Storage("bucket unavailable".to_string()));
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", STORAGE_BASE, bucket, path)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub struct Harness {
    pub repo: Arc<InMemoryRepository>,
    pub geocoder: Arc<StubGeocoder>,
    pub storage: Arc<RecordingStorage>,
    pub state: AppState,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_geocoder(GeocodeMode::Found(Coordinates::new(-89.65, 39.78)))
    }

    pub fn with_geocoder(mode: GeocodeMode) -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        let geocoder = Arc::new(StubGeocoder::new(mode));
        let storage = Arc::new(RecordingStorage::new());
        let state = AppState::new(
            repo.clone(),
            geocoder.clone(),
            storage.clone(),
            StorageBuckets::default(),
        );
        Self {
            repo,
            geocoder,
            storage,
            state,
        }
    }
}

pub fn sample_address() -> Address {
    Address {
        address: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        country: "USA".to_string(),
        postal_code: "62701".to_string(),
    }
}

pub fn sample_fields(name: &str) -> PropertyFields {
    PropertyFields {
        name: name.to_string(),
        description: "Bright two-bedroom near the park".to_string(),
        price_per_month: 1500.0,
        security_deposit: 1500.0,
        application_fee: 50.0,
        photo_urls: vec![format!(
            "{}/storage/v1/object/public/property-photos/properties/a.jpg",
            STORAGE_BASE
        )],
        images: vec![
            format!(
                "{}/storage/v1/object/public/property-images/1/100-front.jpg",
                STORAGE_BASE
            ),
            format!(
                "{}/storage/v1/object/public/property-images/1/101-back.jpg",
                STORAGE_BASE
            ),
        ],
        amenities: vec!["WiFi".to_string(), "Pool".to_string()],
        highlights: vec!["Quiet".to_string()],
        is_pets_allowed: true,
        is_parking_included: false,
        beds: 2,
        baths: 1.5,
        square_feet: 900,
        property_type: realty_core::PropertyType::Apartment,
    }
}

pub fn photo(name: &str) -> UploadedFile {
    UploadedFile {
        file_name: name.to_string(),
        content_type: Some("image/jpeg".to_string()),
        data: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10],
    }
}

/// Unsigned JWT carrying `sub` and `custom:role`.
pub fn bearer(sub: &str, role: &str) -> String {
    let claims = serde_json::json!({ "sub": sub, "custom:role": role });
    format!(
        "Bearer eyJhbGciOiJub25lIn0.{}.sig",
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

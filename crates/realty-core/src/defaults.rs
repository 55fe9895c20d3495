//! Centralized default constants for the realty service.
//!
//! All crates reference these constants instead of defining their own magic
//! numbers. Environment variable names live next to their defaults.

// =============================================================================
// SEARCH
// =============================================================================

/// Radius of the proximity search around a requested point.
pub const SEARCH_RADIUS_KM: f64 = 1000.0;

/// Approximate kilometres per degree, used to express the radius in degrees
/// for geometry-space `ST_DWithin`.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Sentinel query value meaning "no filter".
pub const ANY_SENTINEL: &str = "any";

/// Spatial reference id for WGS 84 longitude/latitude.
pub const SRID_WGS84: i32 = 4326;

/// Search radius in degrees (`SEARCH_RADIUS_KM / KM_PER_DEGREE`).
pub fn search_radius_degrees() -> f64 {
    SEARCH_RADIUS_KM / KM_PER_DEGREE
}

// =============================================================================
// GEOCODING
// =============================================================================

pub const ENV_GEOCODER_BASE_URL: &str = "GEOCODER_BASE_URL";
pub const ENV_GEOCODER_USER_AGENT: &str = "GEOCODER_USER_AGENT";
pub const ENV_GEOCODER_TIMEOUT_SECS: &str = "GEOCODER_TIMEOUT_SECS";

/// Default free-text geocoder endpoint (OpenStreetMap Nominatim).
pub const GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Identifying client header required by the Nominatim usage policy.
pub const GEOCODER_USER_AGENT: &str = "Bolibro-Realty (bolibro623@gmail.com)";

/// Geocoder request timeout.
pub const GEOCODER_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// OBJECT STORAGE
// =============================================================================

pub const ENV_STORAGE_BACKEND: &str = "STORAGE_BACKEND";
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_SERVICE_KEY: &str = "SUPABASE_SERVICE_KEY";
pub const ENV_STORAGE_PHOTO_BUCKET: &str = "STORAGE_PHOTO_BUCKET";
pub const ENV_STORAGE_IMAGE_BUCKET: &str = "STORAGE_IMAGE_BUCKET";
pub const ENV_FILE_STORAGE_PATH: &str = "FILE_STORAGE_PATH";
pub const ENV_FILE_STORAGE_PUBLIC_URL: &str = "FILE_STORAGE_PUBLIC_URL";
pub const ENV_STORAGE_TIMEOUT_SECS: &str = "STORAGE_TIMEOUT_SECS";

/// Bucket receiving photos uploaded with create/update requests.
pub const STORAGE_PHOTO_BUCKET: &str = "property-photos";

/// Bucket receiving images managed through the image endpoints.
pub const STORAGE_IMAGE_BUCKET: &str = "property-images";

/// Key prefix for photos uploaded with create/update requests.
pub const PHOTO_PREFIX: &str = "properties";

/// Local directory for the filesystem storage backend.
pub const FILE_STORAGE_PATH: &str = "/var/lib/realty/files";

/// Public URL prefix served for the filesystem storage backend.
pub const FILE_STORAGE_PUBLIC_URL: &str = "http://localhost:3002/files";

/// Object storage request timeout.
pub const STORAGE_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// SERVER
// =============================================================================

pub const SERVER_HOST: &str = "0.0.0.0";
pub const SERVER_PORT: u16 = 3002;
pub const DATABASE_URL: &str = "postgres://localhost/realty";

/// Maximum request body size (multipart photo uploads included).
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

// =============================================================================
// DATABASE POOL
// =============================================================================

pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Seconds to wait for a free connection before failing the request.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_radius_degrees() {
        let degrees = search_radius_degrees();
        assert!((degrees - 9.009).abs() < 0.001);
    }

    #[test]
    fn test_bucket_defaults_are_distinct() {
        assert_ne!(STORAGE_PHOTO_BUCKET, STORAGE_IMAGE_BUCKET);
    }
}

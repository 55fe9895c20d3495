//! Domain models for properties, locations, leases, and principals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ENUMS
// =============================================================================

/// Lifecycle status of a property listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyStatus {
    #[default]
    Available,
    Rented,
    UnderMaintenance,
    Inactive,
}

impl PropertyStatus {
    /// Stored/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Rented => "Rented",
            Self::UnderMaintenance => "UnderMaintenance",
            Self::Inactive => "Inactive",
        }
    }
}

impl std::fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PropertyStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(Self::Available),
            "rented" => Ok(Self::Rented),
            "undermaintenance" | "under_maintenance" => Ok(Self::UnderMaintenance),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("Invalid property status: {}", s)),
        }
    }
}

/// Kind of dwelling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Rooms,
    Tinyhouse,
    #[default]
    Apartment,
    Villa,
    Townhouse,
    Cottage,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rooms => "Rooms",
            Self::Tinyhouse => "Tinyhouse",
            Self::Apartment => "Apartment",
            Self::Villa => "Villa",
            Self::Townhouse => "Townhouse",
            Self::Cottage => "Cottage",
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PropertyType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rooms" => Ok(Self::Rooms),
            "tinyhouse" => Ok(Self::Tinyhouse),
            "apartment" => Ok(Self::Apartment),
            "villa" => Ok(Self::Villa),
            "townhouse" => Ok(Self::Townhouse),
            "cottage" => Ok(Self::Cottage),
            _ => Err(format!("Invalid property type: {}", s)),
        }
    }
}

// =============================================================================
// LOCATION
// =============================================================================

/// A WGS 84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    /// Stored when a lookup yields nothing usable. Coordinates are never null.
    pub const FALLBACK: Coordinates = Coordinates {
        longitude: 0.0,
        latitude: 0.0,
    };

    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Postal address of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

impl Address {
    /// Build an address only when all five components are present and non-blank.
    pub fn from_parts(
        address: Option<&str>,
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
        postal_code: Option<&str>,
    ) -> Option<Self> {
        let take = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            address: take(address)?,
            city: take(city)?,
            state: take(state)?,
            country: take(country)?,
            postal_code: take(postal_code)?,
        })
    }
}

/// Stored location row with resolved coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: i32,
    #[serde(flatten)]
    pub address: Address,
    pub coordinates: Coordinates,
}

// =============================================================================
// PRINCIPALS
// =============================================================================

/// Principal owning properties, keyed by the identity provider subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manager {
    pub id: i32,
    pub cognito_id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

/// Principal who may hold leases and favorite properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: i32,
    pub cognito_id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

// =============================================================================
// PROPERTY
// =============================================================================

/// Fields a manager sets when creating or editing a listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFields {
    pub name: String,
    pub description: String,
    pub price_per_month: f64,
    pub security_deposit: f64,
    pub application_fee: f64,
    pub photo_urls: Vec<String>,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub highlights: Vec<String>,
    pub is_pets_allowed: bool,
    pub is_parking_included: bool,
    pub beds: i32,
    pub baths: f64,
    pub square_feet: i32,
    pub property_type: PropertyType,
}

/// Stored property row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i32,
    #[serde(flatten)]
    pub fields: PropertyFields,
    pub status: PropertyStatus,
    pub posted_date: DateTime<Utc>,
    pub average_rating: Option<f64>,
    pub number_of_reviews: Option<i32>,
    pub location_id: i32,
    pub manager_cognito_id: String,
}

/// Property joined with its location and, where requested, its manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetail {
    #[serde(flatten)]
    pub property: Property,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<Manager>,
}

// =============================================================================
// LEASE
// =============================================================================

/// Time-bounded occupancy agreement between a tenant and a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    pub id: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub rent: f64,
    pub deposit: f64,
    pub property_id: i32,
    pub tenant_cognito_id: String,
}

impl Lease {
    /// A lease blocks deletion while its end date has not passed.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.end_date >= now
    }
}

/// Lease joined with its tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseWithTenant {
    #[serde(flatten)]
    pub lease: Lease,
    pub tenant: Tenant,
}

// =============================================================================
// UPLOADS
// =============================================================================

/// A file received in a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

//! # realty-geocode
//!
//! Geocoding adapters implementing [`realty_core::Geocoder`].

pub mod nominatim;

pub use nominatim::{first_result_coordinates, NominatimConfig, NominatimGeocoder};

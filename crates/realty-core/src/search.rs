//! Property search filters.
//!
//! [`PropertySearchQuery`] is the raw query-string shape accepted by
//! `GET /properties`. [`PropertySearchFilter::from_query`] validates it once
//! and produces the typed filter the predicate builder consumes.
//!
//! Parsing rules:
//!
//! - Empty values are treated as absent.
//! - `beds`, `baths`, `propertyType`, `amenities`, `availableFrom` accept the
//!   sentinel `"any"`, meaning "no filter".
//! - Malformed numeric bounds are rejected.
//! - An unparsable `availableFrom` and missing or non-numeric coordinates are
//!   dropped silently.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::defaults::ANY_SENTINEL;
use crate::error::{Error, Result};
use crate::models::{Coordinates, PropertyType};

/// Raw search parameters as received on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySearchQuery {
    pub favorite_ids: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub beds: Option<String>,
    pub baths: Option<String>,
    pub property_type: Option<String>,
    pub square_feet_min: Option<String>,
    pub square_feet_max: Option<String>,
    pub amenities: Option<String>,
    pub available_from: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

/// Validated property search filter. Every `None`/empty field imposes no
/// constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySearchFilter {
    pub favorite_ids: Option<Vec<i32>>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub beds_min: Option<f64>,
    pub baths_min: Option<f64>,
    pub property_type: Option<PropertyType>,
    pub square_feet_min: Option<f64>,
    pub square_feet_max: Option<f64>,
    pub amenities: Vec<String>,
    pub available_from: Option<DateTime<Utc>>,
    pub near: Option<Coordinates>,
}

impl PropertySearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate raw query parameters into a typed filter.
    pub fn from_query(query: &PropertySearchQuery) -> Result<Self> {
        Ok(Self {
            favorite_ids: parse_id_list(query.favorite_ids.as_deref()),
            price_min: parse_bound("priceMin", query.price_min.as_deref())?,
            price_max: parse_bound("priceMax", query.price_max.as_deref())?,
            beds_min: parse_bound("beds", non_sentinel(query.beds.as_deref()))?,
            baths_min: parse_bound("baths", non_sentinel(query.baths.as_deref()))?,
            property_type: non_sentinel(query.property_type.as_deref())
                .map(|v| v.parse::<PropertyType>().map_err(Error::InvalidInput))
                .transpose()?,
            square_feet_min: parse_bound("squareFeetMin", query.square_feet_min.as_deref())?,
            square_feet_max: parse_bound("squareFeetMax", query.square_feet_max.as_deref())?,
            amenities: non_sentinel(query.amenities.as_deref())
                .map(split_delimited)
                .unwrap_or_default(),
            available_from: non_sentinel(query.available_from.as_deref()).and_then(parse_date),
            near: parse_point(query.latitude.as_deref(), query.longitude.as_deref()),
        })
    }

    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.price_min = min;
        self.price_max = max;
        self
    }

    pub fn with_min_beds(mut self, beds: f64) -> Self {
        self.beds_min = Some(beds);
        self
    }

    pub fn with_min_baths(mut self, baths: f64) -> Self {
        self.baths_min = Some(baths);
        self
    }

    pub fn with_property_type(mut self, property_type: PropertyType) -> Self {
        self.property_type = Some(property_type);
        self
    }

    pub fn with_square_feet_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.square_feet_min = min;
        self.square_feet_max = max;
        self
    }

    pub fn with_amenities<I, S>(mut self, amenities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.amenities = amenities.into_iter().map(Into::into).collect();
        self
    }

    pub fn available_from(mut self, date: DateTime<Utc>) -> Self {
        self.available_from = Some(date);
        self
    }

    pub fn near(mut self, latitude: f64, longitude: f64) -> Self {
        self.near = Some(Coordinates::new(longitude, latitude));
        self
    }

    pub fn with_favorite_ids(mut self, ids: Vec<i32>) -> Self {
        self.favorite_ids = Some(ids);
        self
    }

    /// True when no constraint is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn non_sentinel(value: Option<&str>) -> Option<&str> {
    non_empty(value).filter(|v| !v.eq_ignore_ascii_case(ANY_SENTINEL))
}

fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<f64>> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Some(n)),
            _ => Err(Error::InvalidInput(format!(
                "{} must be a number, got '{}'",
                name, raw
            ))),
        },
    }
}

fn parse_id_list(value: Option<&str>) -> Option<Vec<i32>> {
    let raw = non_empty(value)?;
    Some(
        raw.split(',')
            .filter_map(|id| id.trim().parse::<i32>().ok())
            .collect(),
    )
}

/// Split a comma-delimited list, trimming items and dropping empties.
pub fn split_delimited(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_point(latitude: Option<&str>, longitude: Option<&str>) -> Option<Coordinates> {
    let lat = non_empty(latitude)?.parse::<f64>().ok()?;
    let lng = non_empty(longitude)?.parse::<f64>().ok()?;
    let point = Coordinates::new(lng, lat);
    point.is_finite().then_some(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> PropertySearchQuery {
        PropertySearchQuery::default()
    }

    #[test]
    fn test_empty_query_is_empty_filter() {
        let filter = PropertySearchFilter::from_query(&query()).unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn test_any_sentinel_equals_omitted() {
        let q = PropertySearchQuery {
            beds: Some("any".into()),
            baths: Some("ANY".into()),
            property_type: Some("any".into()),
            amenities: Some("any".into()),
            available_from: Some("any".into()),
            ..query()
        };
        let filter = PropertySearchFilter::from_query(&q).unwrap();
        assert_eq!(filter, PropertySearchFilter::from_query(&query()).unwrap());
    }

    #[test]
    fn test_numeric_bounds_parse() {
        let q = PropertySearchQuery {
            price_min: Some("500".into()),
            price_max: Some("2500.5".into()),
            beds: Some("2".into()),
            baths: Some("1.5".into()),
            square_feet_min: Some("".into()),
            square_feet_max: Some("1200".into()),
            ..query()
        };
        let filter = PropertySearchFilter::from_query(&q).unwrap();
        assert_eq!(filter.price_min, Some(500.0));
        assert_eq!(filter.price_max, Some(2500.5));
        assert_eq!(filter.beds_min, Some(2.0));
        assert_eq!(filter.baths_min, Some(1.5));
        assert_eq!(filter.square_feet_min, None);
        assert_eq!(filter.square_feet_max, Some(1200.0));
    }

    #[test]
    fn test_malformed_bound_is_rejected() {
        let q = PropertySearchQuery {
            price_min: Some("cheap".into()),
            ..query()
        };
        let err = PropertySearchFilter::from_query(&q).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("priceMin")));
    }

    #[test]
    fn test_unknown_property_type_is_rejected() {
        let q = PropertySearchQuery {
            property_type: Some("Castle".into()),
            ..query()
        };
        assert!(PropertySearchFilter::from_query(&q).is_err());
    }

    #[test]
    fn test_amenities_split_and_trimmed() {
        let q = PropertySearchQuery {
            amenities: Some("WiFi, Pool,,Gym ".into()),
            ..query()
        };
        let filter = PropertySearchFilter::from_query(&q).unwrap();
        assert_eq!(filter.amenities, vec!["WiFi", "Pool", "Gym"]);
    }

    #[test]
    fn test_available_from_accepts_dates_and_ignores_garbage() {
        let q = PropertySearchQuery {
            available_from: Some("2026-05-01".into()),
            ..query()
        };
        let filter = PropertySearchFilter::from_query(&q).unwrap();
        assert_eq!(
            filter.available_from.unwrap().to_rfc3339(),
            "2026-05-01T00:00:00+00:00"
        );

        let q = PropertySearchQuery {
            available_from: Some("next spring".into()),
            ..query()
        };
        let filter = PropertySearchFilter::from_query(&q).unwrap();
        assert!(filter.available_from.is_none());
    }

    #[test]
    fn test_proximity_requires_both_numeric_coordinates() {
        let both = PropertySearchQuery {
            latitude: Some("40.0".into()),
            longitude: Some("-75.0".into()),
            ..query()
        };
        let filter = PropertySearchFilter::from_query(&both).unwrap();
        assert_eq!(filter.near, Some(Coordinates::new(-75.0, 40.0)));

        let only_lat = PropertySearchQuery {
            latitude: Some("40.0".into()),
            ..query()
        };
        assert!(PropertySearchFilter::from_query(&only_lat).unwrap().near.is_none());

        let garbage = PropertySearchQuery {
            latitude: Some("north".into()),
            longitude: Some("-75.0".into()),
            ..query()
        };
        assert!(PropertySearchFilter::from_query(&garbage).unwrap().near.is_none());

        let infinite = PropertySearchQuery {
            latitude: Some("inf".into()),
            longitude: Some("-75.0".into()),
            ..query()
        };
        assert!(PropertySearchFilter::from_query(&infinite).unwrap().near.is_none());
    }

    #[test]
    fn test_favorite_ids_skip_non_integers() {
        let q = PropertySearchQuery {
            favorite_ids: Some("1, 2,x,3".into()),
            ..query()
        };
        let filter = PropertySearchFilter::from_query(&q).unwrap();
        assert_eq!(filter.favorite_ids, Some(vec![1, 2, 3]));
    }
}

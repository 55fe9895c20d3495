//! Property search predicate builder.
//!
//! Turns a validated [`PropertySearchFilter`] into a SQL WHERE clause over
//! `property p JOIN location l`. Every value is bound as a `$n` parameter;
//! nothing from the request is ever spliced into the SQL text.
//!
//! Fragments are joined with `AND`. An empty filter yields `TRUE`.

use chrono::{DateTime, Utc};

use realty_core::defaults::{search_radius_degrees, SRID_WGS84};
use realty_core::PropertySearchFilter;

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// Array of integers (for `= ANY`).
    IntArray(Vec<i32>),
    /// Double-precision parameter.
    Float(f64),
    /// Timestamp parameter.
    Timestamp(DateTime<Utc>),
    /// String parameter.
    String(String),
    /// Array of strings (for array containment).
    StringArray(Vec<String>),
}

/// Result of building a property filter.
#[derive(Debug, Clone)]
pub struct PropertyFilterResult {
    /// WHERE clause body (without the `WHERE` keyword).
    pub where_clause: String,
    /// Parameters in the order they appear in `where_clause`.
    pub params: Vec<QueryParam>,
    /// Number of predicate fragments that were emitted.
    pub fragment_count: usize,
}

/// Generates the WHERE clause for a property search.
///
/// ```rust,ignore
/// use realty_core::PropertySearchFilter;
/// use realty_db::PropertyFilterQueryBuilder;
///
/// let filter = PropertySearchFilter::new().with_price_range(Some(500.0), None);
/// let result = PropertyFilterQueryBuilder::new(filter, 0).build();
/// // result.where_clause: "p.price_per_month >= $1"
/// // result.params: [QueryParam::Float(500.0)]
/// ```
pub struct PropertyFilterQueryBuilder {
    filter: PropertySearchFilter,
    param_offset: usize,
}

impl PropertyFilterQueryBuilder {
    /// Create a builder.
    ///
    /// `param_offset` is the number of parameters already bound before the
    /// WHERE clause; the first emitted placeholder is `$param_offset + 1`.
    pub fn new(filter: PropertySearchFilter, param_offset: usize) -> Self {
        Self {
            filter,
            param_offset,
        }
    }

    pub fn build(&self) -> PropertyFilterResult {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<QueryParam> = Vec::new();
        let mut idx = self.param_offset;
        let mut next = |param: QueryParam, params: &mut Vec<QueryParam>| {
            idx += 1;
            params.push(param);
            idx
        };
        let f = &self.filter;

        if let Some(ids) = &f.favorite_ids {
            let n = next(QueryParam::IntArray(ids.clone()), &mut params);
            clauses.push(format!("p.id = ANY(${}::int[])", n));
        }
        if let Some(min) = f.price_min {
            let n = next(QueryParam::Float(min), &mut params);
            clauses.push(format!("p.price_per_month >= ${}", n));
        }
        if let Some(max) = f.price_max {
            let n = next(QueryParam::Float(max), &mut params);
            clauses.push(format!("p.price_per_month <= ${}", n));
        }
        if let Some(beds) = f.beds_min {
            let n = next(QueryParam::Float(beds), &mut params);
            clauses.push(format!("p.beds >= ${}", n));
        }
        if let Some(baths) = f.baths_min {
            let n = next(QueryParam::Float(baths), &mut params);
            clauses.push(format!("p.baths >= ${}", n));
        }
        if let Some(min) = f.square_feet_min {
            let n = next(QueryParam::Float(min), &mut params);
            clauses.push(format!("p.square_feet >= ${}", n));
        }
        if let Some(max) = f.square_feet_max {
            let n = next(QueryParam::Float(max), &mut params);
            clauses.push(format!("p.square_feet <= ${}", n));
        }
        if let Some(property_type) = f.property_type {
            let n = next(
                QueryParam::String(property_type.as_str().to_string()),
                &mut params,
            );
            clauses.push(format!("p.property_type = ${}", n));
        }
        if !f.amenities.is_empty() {
            let n = next(QueryParam::StringArray(f.amenities.clone()), &mut params);
            clauses.push(format!("p.amenities @> ${}::text[]", n));
        }
        if let Some(date) = f.available_from {
            let n = next(QueryParam::Timestamp(date), &mut params);
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM lease le WHERE le.property_id = p.id AND le.start_date <= ${})",
                n
            ));
        }
        if let Some(point) = f.near {
            let lng = next(QueryParam::Float(point.longitude), &mut params);
            let lat = next(QueryParam::Float(point.latitude), &mut params);
            let radius = next(QueryParam::Float(search_radius_degrees()), &mut params);
            clauses.push(format!(
                "ST_DWithin(l.coordinates::geometry, ST_SetSRID(ST_MakePoint(${}, ${}), {}), ${})",
                lng, lat, SRID_WGS84, radius
            ));
        }

        let fragment_count = clauses.len();
        let where_clause = if clauses.is_empty() {
            "TRUE".to_string()
        } else {
            clauses.join(" AND ")
        };

        PropertyFilterResult {
            where_clause,
            params,
            fragment_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use realty_core::{PropertySearchQuery, PropertyType};

    fn build(filter: PropertySearchFilter) -> PropertyFilterResult {
        PropertyFilterQueryBuilder::new(filter, 0).build()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let result = build(PropertySearchFilter::new());
        assert_eq!(result.where_clause, "TRUE");
        assert!(result.params.is_empty());
        assert_eq!(result.fragment_count, 0);
    }

    #[test]
    fn test_any_sentinel_produces_same_sql_as_omitted() {
        let with_any = PropertySearchFilter::from_query(&PropertySearchQuery {
            beds: Some("any".into()),
            baths: Some("any".into()),
            property_type: Some("any".into()),
            amenities: Some("any".into()),
            available_from: Some("any".into()),
            ..Default::default()
        })
        .unwrap();
        let omitted = PropertySearchFilter::from_query(&PropertySearchQuery::default()).unwrap();
        assert_eq!(build(with_any).where_clause, build(omitted).where_clause);
    }

    #[test]
    fn test_price_bounds_are_independent() {
        let result = build(PropertySearchFilter::new().with_price_range(None, Some(2000.0)));
        assert_eq!(result.where_clause, "p.price_per_month <= $1");
        assert_eq!(result.params, vec![QueryParam::Float(2000.0)]);

        let result = build(PropertySearchFilter::new().with_price_range(Some(500.0), Some(2000.0)));
        assert_eq!(
            result.where_clause,
            "p.price_per_month >= $1 AND p.price_per_month <= $2"
        );
    }

    #[test]
    fn test_beds_and_baths_are_lower_bounds() {
        let result = build(PropertySearchFilter::new().with_min_beds(2.0).with_min_baths(1.5));
        assert_eq!(result.where_clause, "p.beds >= $1 AND p.baths >= $2");
        assert_eq!(
            result.params,
            vec![QueryParam::Float(2.0), QueryParam::Float(1.5)]
        );
    }

    #[test]
    fn test_amenities_use_containment() {
        let result = build(PropertySearchFilter::new().with_amenities(["WiFi", "Pool"]));
        assert_eq!(result.where_clause, "p.amenities @> $1::text[]");
        assert_eq!(
            result.params,
            vec![QueryParam::StringArray(vec!["WiFi".into(), "Pool".into()])]
        );
    }

    #[test]
    fn test_available_from_uses_lease_exists() {
        let date = "2026-05-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let result = build(PropertySearchFilter::new().available_from(date));
        assert!(result.where_clause.starts_with("EXISTS (SELECT 1 FROM lease le"));
        assert!(result.where_clause.contains("le.start_date <= $1"));
        assert_eq!(result.params, vec![QueryParam::Timestamp(date)]);
    }

    #[test]
    fn test_proximity_binds_lng_lat_radius() {
        let result = build(PropertySearchFilter::new().near(40.0, -75.0));
        assert_eq!(
            result.where_clause,
            "ST_DWithin(l.coordinates::geometry, ST_SetSRID(ST_MakePoint($1, $2), 4326), $3)"
        );
        assert_eq!(result.params[0], QueryParam::Float(-75.0));
        assert_eq!(result.params[1], QueryParam::Float(40.0));
        assert_eq!(result.params[2], QueryParam::Float(1000.0 / 111.0));
    }

    #[test]
    fn test_property_type_and_favorites() {
        let result = build(
            PropertySearchFilter::new()
                .with_favorite_ids(vec![3, 5])
                .with_property_type(PropertyType::Villa),
        );
        assert_eq!(
            result.where_clause,
            "p.id = ANY($1::int[]) AND p.property_type = $2"
        );
        assert_eq!(result.params[1], QueryParam::String("Villa".into()));
    }

    #[test]
    fn test_param_offset_and_conjunction() {
        let filter = PropertySearchFilter::new()
            .with_price_range(Some(500.0), None)
            .with_square_feet_range(Some(400.0), Some(1200.0))
            .with_amenities(["WiFi"]);
        let result = PropertyFilterQueryBuilder::new(filter, 2).build();
        assert_eq!(
            result.where_clause,
            "p.price_per_month >= $3 AND p.square_feet >= $4 AND p.square_feet <= $5 AND p.amenities @> $6::text[]"
        );
        assert_eq!(result.fragment_count, 4);
        assert_eq!(result.params.len(), 4);
    }

    #[test]
    fn test_values_never_appear_in_sql() {
        let filter = PropertySearchFilter::new().with_amenities(["'; DROP TABLE property; --"]);
        let result = build(filter);
        assert!(!result.where_clause.contains("DROP"));
    }
}

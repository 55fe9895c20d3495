//! Property repository implementation.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use realty_core::{
    Address, Coordinates, CreatePropertyRequest, Error, Lease, LeaseWithTenant, Location,
    Manager, Property, PropertyDetail, PropertyFields, PropertyRepository, PropertySearchFilter,
    PropertyStatus, PropertyType, Result, Tenant,
};

use crate::property_filter::{PropertyFilterQueryBuilder, QueryParam};

const PROPERTY_COLUMNS: &str = "p.id, p.name, p.description, p.price_per_month, \
    p.security_deposit, p.application_fee, p.photo_urls, p.images, p.amenities, p.highlights, \
    p.is_pets_allowed, p.is_parking_included, p.beds, p.baths, p.square_feet, p.property_type, \
    p.status, p.posted_date, p.average_rating, p.number_of_reviews, p.location_id, \
    p.manager_cognito_id";

const LOCATION_COLUMNS: &str = "l.address, l.city, l.state, l.country, l.postal_code";

const MANAGER_COLUMNS: &str = "m.id AS manager_id, m.name AS manager_name, \
    m.email AS manager_email, m.phone_number AS manager_phone_number";

/// PostgreSQL implementation of PropertyRepository.
pub struct PgPropertyRepository {
    pool: Pool<Postgres>,
}

impl PgPropertyRepository {
    /// Create a new PgPropertyRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn fetch_detail(
        &self,
        id: i32,
        manager_cognito_id: Option<&str>,
    ) -> Result<Option<PropertyDetail>> {
        let sql = format!(
            "SELECT {PROPERTY_COLUMNS}, {LOCATION_COLUMNS}, \
                    ST_AsText(l.coordinates) AS coordinates_wkt, {MANAGER_COLUMNS}
             FROM property p
             JOIN location l ON l.id = p.location_id
             LEFT JOIN manager m ON m.cognito_id = p.manager_cognito_id
             WHERE p.id = $1 AND ($2::text IS NULL OR p.manager_cognito_id = $2)"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(manager_cognito_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let property = property_from_row(&row)?;
        let wkt: String = row.try_get("coordinates_wkt")?;
        let coordinates = parse_wkt_point(&wkt).ok_or_else(|| {
            Error::Internal(format!(
                "Location {} has unreadable coordinates '{}'",
                property.location_id, wkt
            ))
        })?;
        let location = location_from_row(&row, property.location_id, coordinates)?;
        let manager = match row.try_get::<Option<i32>, _>("manager_id")? {
            Some(manager_id) => Some(Manager {
                id: manager_id,
                cognito_id: property.manager_cognito_id.clone(),
                name: row.try_get("manager_name")?,
                email: row.try_get("manager_email")?,
                phone_number: row.try_get("manager_phone_number")?,
            }),
            None => None,
        };

        Ok(Some(PropertyDetail {
            property,
            location,
            manager,
        }))
    }
}

/// Parse a WKT point (`POINT(lon lat)`) as produced by `ST_AsText`.
pub fn parse_wkt_point(wkt: &str) -> Option<Coordinates> {
    let inner = wkt
        .trim()
        .strip_prefix("POINT")?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')?;
    let mut parts = inner.split_whitespace();
    let longitude = parts.next()?.parse::<f64>().ok()?;
    let latitude = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Coordinates::new(longitude, latitude))
}

fn property_from_row(row: &PgRow) -> Result<Property> {
    let property_type: String = row.try_get("property_type")?;
    let status: String = row.try_get("status")?;
    Ok(Property {
        id: row.try_get("id")?,
        fields: PropertyFields {
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price_per_month: row.try_get("price_per_month")?,
            security_deposit: row.try_get("security_deposit")?,
            application_fee: row.try_get("application_fee")?,
            photo_urls: row.try_get("photo_urls")?,
            images: row.try_get("images")?,
            amenities: row.try_get("amenities")?,
            highlights: row.try_get("highlights")?,
            is_pets_allowed: row.try_get("is_pets_allowed")?,
            is_parking_included: row.try_get("is_parking_included")?,
            beds: row.try_get("beds")?,
            baths: row.try_get("baths")?,
            square_feet: row.try_get("square_feet")?,
            property_type: property_type
                .parse::<PropertyType>()
                .map_err(Error::Internal)?,
        },
        status: status.parse::<PropertyStatus>().map_err(Error::Internal)?,
        posted_date: row.try_get("posted_date")?,
        average_rating: row.try_get("average_rating")?,
        number_of_reviews: row.try_get("number_of_reviews")?,
        location_id: row.try_get("location_id")?,
        manager_cognito_id: row.try_get("manager_cognito_id")?,
    })
}

fn location_from_row(row: &PgRow, id: i32, coordinates: Coordinates) -> Result<Location> {
    Ok(Location {
        id,
        address: Address {
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            country: row.try_get("country")?,
            postal_code: row.try_get("postal_code")?,
        },
        coordinates,
    })
}

#[async_trait]
impl PropertyRepository for PgPropertyRepository {
    async fn search(&self, filter: &PropertySearchFilter) -> Result<Vec<PropertyDetail>> {
        let start = Instant::now();
        let built = PropertyFilterQueryBuilder::new(filter.clone(), 0).build();
        let sql = format!(
            "SELECT {PROPERTY_COLUMNS}, {LOCATION_COLUMNS}, \
                    ST_X(l.coordinates::geometry) AS longitude, \
                    ST_Y(l.coordinates::geometry) AS latitude
             FROM property p
             JOIN location l ON l.id = p.location_id
             WHERE {}
             ORDER BY p.id",
            built.where_clause
        );

        let mut q = sqlx::query(&sql);
        for param in &built.params {
            q = match param {
                QueryParam::IntArray(ids) => q.bind(ids),
                QueryParam::Float(val) => q.bind(val),
                QueryParam::Timestamp(ts) => q.bind(ts),
                QueryParam::String(s) => q.bind(s),
                QueryParam::StringArray(arr) => q.bind(arr),
            };
        }

        let rows = q.fetch_all(&self.pool).await.map_err(Error::Database)?;
        let results = rows
            .iter()
            .map(|row| -> Result<PropertyDetail> {
                let property = property_from_row(row)?;
                let coordinates =
                    Coordinates::new(row.try_get("longitude")?, row.try_get("latitude")?);
                let location = location_from_row(row, property.location_id, coordinates)?;
                Ok(PropertyDetail {
                    property,
                    location,
                    manager: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            subsystem = "database",
            component = "properties",
            op = "search",
            fragment_count = built.fragment_count,
            result_count = results.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Property search complete"
        );
        Ok(results)
    }

    async fn get(&self, id: i32) -> Result<Option<PropertyDetail>> {
        self.fetch_detail(id, None).await
    }

    async fn get_owned(
        &self,
        id: i32,
        manager_cognito_id: &str,
    ) -> Result<Option<PropertyDetail>> {
        self.fetch_detail(id, Some(manager_cognito_id)).await
    }

    async fn create(&self, req: CreatePropertyRequest) -> Result<i32> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let location_id: i32 = sqlx::query_scalar(
            "INSERT INTO location (address, city, state, country, postal_code, coordinates)
             VALUES ($1, $2, $3, $4, $5, ST_SetSRID(ST_MakePoint($6, $7), 4326)::geography)
             RETURNING id",
        )
        .bind(&req.address.address)
        .bind(&req.address.city)
        .bind(&req.address.state)
        .bind(&req.address.country)
        .bind(&req.address.postal_code)
        .bind(req.coordinates.longitude)
        .bind(req.coordinates.latitude)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let f = &req.fields;
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO property (
                 name, description, price_per_month, security_deposit, application_fee,
                 photo_urls, images, amenities, highlights, is_pets_allowed,
                 is_parking_included, beds, baths, square_feet, property_type,
                 location_id, manager_cognito_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
             RETURNING id",
        )
        .bind(&f.name)
        .bind(&f.description)
        .bind(f.price_per_month)
        .bind(f.security_deposit)
        .bind(f.application_fee)
        .bind(&f.photo_urls)
        .bind(&f.images)
        .bind(&f.amenities)
        .bind(&f.highlights)
        .bind(f.is_pets_allowed)
        .bind(f.is_parking_included)
        .bind(f.beds)
        .bind(f.baths)
        .bind(f.square_feet)
        .bind(f.property_type.as_str())
        .bind(location_id)
        .bind(&req.manager_cognito_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(id)
    }

    async fn update_fields(&self, id: i32, fields: &PropertyFields) -> Result<()> {
        let result = sqlx::query(
            "UPDATE property SET
                 name = $2, description = $3, price_per_month = $4, security_deposit = $5,
                 application_fee = $6, photo_urls = $7, images = $8, amenities = $9,
                 highlights = $10, is_pets_allowed = $11, is_parking_included = $12,
                 beds = $13, baths = $14, square_feet = $15, property_type = $16
             WHERE id = $1",
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price_per_month)
        .bind(fields.security_deposit)
        .bind(fields.application_fee)
        .bind(&fields.photo_urls)
        .bind(&fields.images)
        .bind(&fields.amenities)
        .bind(&fields.highlights)
        .bind(fields.is_pets_allowed)
        .bind(fields.is_parking_included)
        .bind(fields.beds)
        .bind(fields.baths)
        .bind(fields.square_feet)
        .bind(fields.property_type.as_str())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Property {} not found", id)));
        }
        Ok(())
    }

    async fn update_location(
        &self,
        location_id: i32,
        address: &Address,
        coordinates: Coordinates,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE location SET
                 address = $2, city = $3, state = $4, country = $5, postal_code = $6,
                 coordinates = ST_SetSRID(ST_MakePoint($7, $8), 4326)::geography
             WHERE id = $1",
        )
        .bind(location_id)
        .bind(&address.address)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.postal_code)
        .bind(coordinates.longitude)
        .bind(coordinates.latitude)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Location {} not found", location_id)));
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let location_id: Option<i32> =
            sqlx::query_scalar("SELECT location_id FROM property WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;
        let Some(location_id) = location_id else {
            return Err(Error::NotFound(format!("Property {} not found", id)));
        };

        let active_leases: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lease WHERE property_id = $1 AND end_date >= NOW()",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;
        if active_leases > 0 {
            return Err(Error::DeleteBlocked(format!(
                "Cannot delete property with {} active lease(s)",
                active_leases
            )));
        }

        sqlx::query("DELETE FROM property WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        sqlx::query("DELETE FROM location WHERE id = $1")
            .bind(location_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn update_status(&self, id: i32, status: PropertyStatus) -> Result<Property> {
        let sql = format!(
            "UPDATE property AS p SET status = $2 WHERE p.id = $1 RETURNING {PROPERTY_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("Property {} not found", id)))?;
        property_from_row(&row)
    }

    async fn bulk_update_status(
        &self,
        ids: &[i32],
        manager_cognito_id: &str,
        status: PropertyStatus,
    ) -> Result<Vec<Property>> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let owned: Vec<i32> = sqlx::query_scalar(
            "SELECT id FROM property
             WHERE id = ANY($1::int[]) AND manager_cognito_id = $2
             FOR UPDATE",
        )
        .bind(&ids)
        .bind(manager_cognito_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if owned.len() != ids.len() {
            tx.rollback().await.map_err(Error::Database)?;
            debug!(
                subsystem = "database",
                component = "properties",
                op = "bulk_update_status",
                requested = ids.len(),
                owned = owned.len(),
                "Bulk status update rejected"
            );
            return Err(Error::Forbidden(
                "One or more properties do not exist or are not owned by this manager"
                    .to_string(),
            ));
        }

        let sql = format!(
            "UPDATE property AS p SET status = $2 WHERE p.id = ANY($1::int[]) \
             RETURNING {PROPERTY_COLUMNS}"
        );
        let rows = sqlx::query(&sql)
            .bind(&ids)
            .bind(status.as_str())
            .fetch_all(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        let mut properties = rows
            .iter()
            .map(property_from_row)
            .collect::<Result<Vec<_>>>()?;
        properties.sort_by_key(|p| p.id);
        Ok(properties)
    }

    async fn update_images(&self, id: i32, images: &[String]) -> Result<Property> {
        let sql = format!(
            "UPDATE property AS p SET images = $2 WHERE p.id = $1 RETURNING {PROPERTY_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(images)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("Property {} not found", id)))?;
        property_from_row(&row)
    }

    async fn list_leases(&self, property_id: i32) -> Result<Vec<LeaseWithTenant>> {
        let rows = sqlx::query(
            "SELECT le.id, le.start_date, le.end_date, le.rent, le.deposit, le.property_id,
                    le.tenant_cognito_id, t.id AS tenant_id, t.name, t.email, t.phone_number
             FROM lease le
             JOIN tenant t ON t.cognito_id = le.tenant_cognito_id
             WHERE le.property_id = $1
             ORDER BY le.start_date, le.id",
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|r| -> Result<LeaseWithTenant> {
                let tenant_cognito_id: String = r.try_get("tenant_cognito_id")?;
                Ok(LeaseWithTenant {
                    lease: Lease {
                        id: r.try_get("id")?,
                        start_date: r.try_get("start_date")?,
                        end_date: r.try_get("end_date")?,
                        rent: r.try_get("rent")?,
                        deposit: r.try_get("deposit")?,
                        property_id: r.try_get("property_id")?,
                        tenant_cognito_id: tenant_cognito_id.clone(),
                    },
                    tenant: Tenant {
                        id: r.try_get("tenant_id")?,
                        cognito_id: tenant_cognito_id,
                        name: r.try_get("name")?,
                        email: r.try_get("email")?,
                        phone_number: r.try_get("phone_number")?,
                    },
                })
            })
            .collect()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wkt_point() {
        assert_eq!(
            parse_wkt_point("POINT(-75.1652 39.9526)"),
            Some(Coordinates::new(-75.1652, 39.9526))
        );
        assert_eq!(
            parse_wkt_point("POINT (0 0)"),
            Some(Coordinates::new(0.0, 0.0))
        );
    }

    #[test]
    fn test_parse_wkt_point_rejects_other_shapes() {
        assert!(parse_wkt_point("LINESTRING(0 0, 1 1)").is_none());
        assert!(parse_wkt_point("POINT(1)").is_none());
        assert!(parse_wkt_point("POINT(1 2 3)").is_none());
        assert!(parse_wkt_point("POINT(a b)").is_none());
    }
}

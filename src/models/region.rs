// src/models/region.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::{Validate, ValidationError};

/// The closed set of South African provinces a region may belong to.
pub const PROVINCES: [&str; 9] = [
    "Eastern Cape",
    "Free State",
    "Gauteng",
    "KwaZulu-Natal",
    "Limpopo",
    "Mpumalanga",
    "Northern Cape",
    "North West",
    "Western Cape",
];

/// Represents a row of the 'regions' table.
///
/// Regions are never hard-deleted; `is_active` soft-disables them and every
/// read path filters on it.
#[derive(Debug, Clone, FromRow)]
pub struct RegionRow {
    pub id: i64,
    pub name: String,
    pub township: String,
    pub city: String,
    pub province: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Geographic point, constrained to the national bounding box.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Coordinates {
    #[validate(range(min = -35.0, max = -22.0, message = "Invalid latitude"))]
    pub latitude: f64,
    #[validate(range(min = 16.0, max = 33.0, message = "Invalid longitude"))]
    pub longitude: f64,
}

/// Wire shape of a region: latitude/longitude folded into an optional
/// `coordinates` object, matching what the client renders on the map.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionResponse {
    pub id: i64,
    pub name: String,
    pub township: String,
    pub city: String,
    pub province: String,
    pub coordinates: Option<Coordinates>,
    pub is_active: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<RegionRow> for RegionResponse {
    fn from(row: RegionRow) -> Self {
        let coordinates = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        };
        RegionResponse {
            id: row.id,
            name: row.name,
            township: row.township,
            city: row.city,
            province: row.province,
            coordinates,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

/// DTO for creating a new region (admin only).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRegionRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Region name must be between 1 and 100 characters"
    ))]
    pub name: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Township must be between 1 and 100 characters"
    ))]
    pub township: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "City must be between 1 and 100 characters"
    ))]
    pub city: String,
    #[validate(custom(function = validate_province))]
    pub province: String,
    #[validate(nested)]
    pub coordinates: Option<Coordinates>,
}

/// Validates that a province belongs to the fixed set.
fn validate_province(province: &str) -> Result<(), ValidationError> {
    if !PROVINCES.contains(&province) {
        let mut err = ValidationError::new("invalid_province");
        err.message = Some("Province must be one of the 9 South African provinces".into());
        return Err(err);
    }
    Ok(())
}

/// Query parameters for listing regions.
#[derive(Debug, Deserialize)]
pub struct RegionListParams {
    pub province: Option<String>,
    pub city: Option<String>,
    pub township: Option<String>,
    pub search: Option<String>,
}

/// Projection for the townships-by-province endpoint.
#[derive(Debug, Serialize, FromRow)]
pub struct TownshipEntry {
    pub township: String,
    pub city: String,
}

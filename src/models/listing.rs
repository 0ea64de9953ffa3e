// src/models/listing.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use url::Url;
use validator::{Validate, ValidationError};

/// Property types a listing may advertise.
pub const PROPERTY_TYPES: [&str; 5] = ["room", "flat", "house", "plot", "backroom"];

/// Listing categories.
pub const CATEGORIES: [&str; 2] = ["rent", "sale"];

/// The fixed amenity vocabulary. Filter tokens outside this set are not an
/// error, they simply match nothing.
pub const AMENITIES: [&str; 6] = [
    "wifi",
    "electricity",
    "water",
    "parking",
    "security",
    "furnished",
];

/// One uploaded image reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingImage {
    pub url: String,
    pub public_id: Option<String>,
}

/// Contact details shown on a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
}

/// A listing row joined with its region and owner.
///
/// The flat aliased columns are assembled into the nested `ListingResponse`
/// by the `From` impl below; handlers never serialize this directly.
#[derive(Debug, FromRow)]
pub struct ListingDetailRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub images: Json<Vec<ListingImage>>,
    #[sqlx(rename = "type")]
    pub property_type: String,
    pub category: String,
    pub region_id: i64,
    pub owner_id: i64,
    pub amenities: Json<Vec<String>>,
    pub deposit: Option<i64>,
    pub is_available: bool,
    pub is_featured: bool,
    pub views: i64,
    pub contact_phone: Option<String>,
    pub contact_whatsapp: Option<String>,
    pub contact_email: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub region_name: String,
    pub region_township: String,
    pub region_city: String,
    pub region_province: String,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_phone: Option<String>,
}

/// Region fields expanded inline in listing responses.
#[derive(Debug, Serialize)]
pub struct RegionSummary {
    pub id: i64,
    pub name: String,
    pub township: String,
    pub city: String,
    pub province: String,
}

/// Owner fields expanded inline in listing responses.
#[derive(Debug, Serialize)]
pub struct OwnerSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Wire shape of a listing with region and owner expanded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub images: Vec<ListingImage>,
    #[serde(rename = "type")]
    pub property_type: String,
    pub category: String,
    pub region: RegionSummary,
    pub owner: OwnerSummary,
    pub amenities: Vec<String>,
    pub deposit: Option<i64>,
    pub is_available: bool,
    pub is_featured: bool,
    pub views: i64,
    pub contact_info: ContactInfo,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<ListingDetailRow> for ListingResponse {
    fn from(row: ListingDetailRow) -> Self {
        ListingResponse {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            images: row.images.0,
            property_type: row.property_type,
            category: row.category,
            region: RegionSummary {
                id: row.region_id,
                name: row.region_name,
                township: row.region_township,
                city: row.region_city,
                province: row.region_province,
            },
            owner: OwnerSummary {
                id: row.owner_id,
                name: row.owner_name,
                email: row.owner_email,
                phone: row.owner_phone,
            },
            amenities: row.amenities.0,
            deposit: row.deposit,
            is_available: row.is_available,
            is_featured: row.is_featured,
            views: row.views,
            contact_info: ContactInfo {
                phone: row.contact_phone,
                whatsapp: row.contact_whatsapp,
                email: row.contact_email,
            },
            created_at: row.created_at,
        }
    }
}

/// Paginated envelope returned by the listing search.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    pub listings: Vec<ListingResponse>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total: i64,
}

/// DTO for creating a new listing.
///
/// Deliberately has no `owner` field: the owner is always the authenticated
/// caller, so an owner value smuggled into the body is ignored by serde.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    #[validate(length(min = 1, max = 100, message = "Title cannot exceed 100 characters"))]
    pub title: String,
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Description cannot exceed 1000 characters"
    ))]
    pub description: String,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: i64,
    #[validate(custom(function = validate_images))]
    pub images: Option<Vec<ListingImage>>,
    #[serde(rename = "type")]
    #[validate(custom(function = validate_property_type))]
    pub property_type: String,
    #[validate(custom(function = validate_category))]
    pub category: Option<String>,
    pub region: i64,
    #[validate(custom(function = validate_amenities))]
    pub amenities: Option<Vec<String>>,
    #[validate(range(min = 0, message = "Deposit cannot be negative"))]
    pub deposit: Option<i64>,
    #[serde(default)]
    pub is_featured: bool,
    pub contact_info: Option<ContactInfo>,
}

fn validate_property_type(property_type: &str) -> Result<(), ValidationError> {
    if !PROPERTY_TYPES.contains(&property_type) {
        let mut err = ValidationError::new("invalid_type");
        err.message = Some("Property type must be one of: room, flat, house, plot, backroom".into());
        return Err(err);
    }
    Ok(())
}

fn validate_category(category: &str) -> Result<(), ValidationError> {
    if !CATEGORIES.contains(&category) {
        let mut err = ValidationError::new("invalid_category");
        err.message = Some("Category must be 'rent' or 'sale'".into());
        return Err(err);
    }
    Ok(())
}

fn validate_amenities(amenities: &Vec<String>) -> Result<(), ValidationError> {
    for amenity in amenities {
        if !AMENITIES.contains(&amenity.as_str()) {
            let mut err = ValidationError::new("invalid_amenity");
            err.message = Some(
                "Amenities must be from: wifi, electricity, water, parking, security, furnished"
                    .into(),
            );
            return Err(err);
        }
    }
    Ok(())
}

fn validate_images(images: &Vec<ListingImage>) -> Result<(), ValidationError> {
    for image in images {
        if image.url.len() > 500 || Url::parse(&image.url).is_err() {
            let mut err = ValidationError::new("invalid_image_url");
            err.message = Some("Image URL is not a valid URL".into());
            return Err(err);
        }
    }
    Ok(())
}

/// Raw listing search parameters, exactly as they arrive on the query string.
/// Everything is text here; `filter::ListingFilter` is the typed boundary.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQueryParams {
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub region: Option<String>,
    pub township: Option<String>,
    pub amenities: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

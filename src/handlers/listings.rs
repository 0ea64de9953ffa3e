// src/handlers/listings.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    filter::{self, LISTING_SELECT, ListingFilter},
    models::listing::{
        CreateListingRequest, ListingDetailRow, ListingQueryParams, ListingResponse,
    },
    utils::{html::clean_html, jwt::Claims},
};

/// Lists available listings through the filter resolution engine.
///
/// All parameters arrive as text; `ListingFilter::from_params` is the typed
/// boundary that rejects malformed numbers and unknown sort keys.
pub async fn list_listings(
    State(pool): State<SqlitePool>,
    Query(params): Query<ListingQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    let listing_filter = ListingFilter::from_params(params)?;
    let page = filter::execute(&pool, &listing_filter).await?;
    Ok(Json(page))
}

/// Retrieves a single listing with region and owner expanded.
///
/// Increments the view counter by exactly one per read, with a single atomic
/// UPDATE rather than load-mutate-save, before returning the record.
pub async fn get_listing(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("UPDATE listings SET views = views + 1 WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Listing not found".to_string()));
    }

    let row = sqlx::query_as::<_, ListingDetailRow>(&format!("{} WHERE l.id = ?", LISTING_SELECT))
        .bind(id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({ "listing": ListingResponse::from(row) })))
}

/// Creates a new listing.
/// Landlord/Admin only. The owner is always the authenticated caller; any
/// owner value in the body is ignored.
pub async fn create_listing(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateListingRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::from_validation(validation_errors));
    }

    let owner_id = claims.user_id()?;

    // Referential check: the region must exist and be active.
    sqlx::query_scalar::<_, i64>("SELECT id FROM regions WHERE id = ? AND is_active = 1")
        .bind(payload.region)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::BadRequest("Region does not exist".to_string()))?;

    // Amenities are a set: duplicates collapse, order is irrelevant.
    let mut amenities: Vec<String> = Vec::new();
    for amenity in payload.amenities.unwrap_or_default() {
        if !amenities.contains(&amenity) {
            amenities.push(amenity);
        }
    }

    let title = clean_html(&payload.title);
    let description = clean_html(&payload.description);
    let images = serde_json::to_string(&payload.images.unwrap_or_default())?;
    let amenities_json = serde_json::to_string(&amenities)?;
    let category = payload.category.unwrap_or_else(|| "rent".to_string());
    let contact = payload.contact_info.unwrap_or_default();

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO listings
        (title, description, price, images, type, category, region_id, owner_id,
         amenities, deposit, is_featured, contact_phone, contact_whatsapp, contact_email)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&title)
    .bind(&description)
    .bind(payload.price)
    .bind(&images)
    .bind(&payload.property_type)
    .bind(&category)
    .bind(payload.region)
    .bind(owner_id)
    .bind(&amenities_json)
    .bind(payload.deposit)
    .bind(payload.is_featured)
    .bind(&contact.phone)
    .bind(&contact.whatsapp)
    .bind(&contact.email)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create listing: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let row = sqlx::query_as::<_, ListingDetailRow>(&format!("{} WHERE l.id = ?", LISTING_SELECT))
        .bind(id)
        .fetch_one(&pool)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Listing created successfully",
            "listing": ListingResponse::from(row)
        })),
    ))
}

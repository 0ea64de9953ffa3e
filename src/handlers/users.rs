// src/handlers/users.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    filter::LISTING_SELECT,
    models::{
        listing::{ListingDetailRow, ListingResponse},
        user::{ProfileResponse, SavedListingSummary, UpdateProfileRequest, User},
    },
    utils::jwt::Claims,
};

const USER_SELECT: &str =
    "SELECT id, name, email, password, role, phone, avatar, created_at FROM users WHERE id = ?";

/// Get the current user's profile with saved listings expanded.
pub async fn get_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let user = sqlx::query_as::<_, User>(USER_SELECT)
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let saved_listings = sqlx::query_as::<_, SavedListingSummary>(
        "SELECT l.id, l.title, l.price, l.type, l.images, l.region_id \
         FROM saved_listings s \
         JOIN listings l ON l.id = s.listing_id \
         WHERE s.user_id = ? \
         ORDER BY s.created_at DESC, l.id DESC",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "user": ProfileResponse { user, saved_listings }
    })))
}

/// Partially updates the current user's profile.
/// Only supplied fields are overwritten; absent fields are left untouched.
pub async fn update_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::from_validation(validation_errors));
    }

    let user_id = claims.user_id()?;

    // Check existence
    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    if let Some(name) = payload.name {
        sqlx::query("UPDATE users SET name = ? WHERE id = ?")
            .bind(name)
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    if let Some(phone) = payload.phone {
        sqlx::query("UPDATE users SET phone = ? WHERE id = ?")
            .bind(phone)
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    if let Some(avatar) = payload.avatar {
        sqlx::query("UPDATE users SET avatar = ? WHERE id = ?")
            .bind(avatar)
            .bind(user_id)
            .execute(&pool)
            .await?;
    }

    let user = sqlx::query_as::<_, User>(USER_SELECT)
        .bind(user_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": user
    })))
}

/// Toggle a listing in the current user's saved set.
///
/// Present -> removed (`saved: false`), absent -> added (`saved: true`).
/// Runs in a transaction so concurrent toggles cannot double-insert.
pub async fn toggle_saved_listing(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(listing_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM listings WHERE id = ?")
        .bind(listing_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Listing not found".to_string()))?;

    let mut tx = pool.begin().await?;

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM saved_listings WHERE user_id = ? AND listing_id = ?",
    )
    .bind(user_id)
    .bind(listing_id)
    .fetch_optional(&mut *tx)
    .await?;

    let was_saved = existing.is_some();

    if was_saved {
        sqlx::query("DELETE FROM saved_listings WHERE user_id = ? AND listing_id = ?")
            .bind(user_id)
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;
    } else {
        sqlx::query("INSERT INTO saved_listings (user_id, listing_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(listing_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint") {
                    // Concurrent toggle handled gracefully
                    return AppError::Conflict("Already saved".to_string());
                }
                AppError::InternalServerError(e.to_string())
            })?;
    }

    tx.commit().await?;

    let message = if was_saved {
        "Listing removed from saved"
    } else {
        "Listing saved successfully"
    };

    Ok(Json(json!({ "message": message, "saved": !was_saved })))
}

/// Lists the current user's own listings, newest first.
/// Landlord/Admin only.
pub async fn my_listings(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let rows = sqlx::query_as::<_, ListingDetailRow>(&format!(
        "{} WHERE l.owner_id = ? ORDER BY l.created_at DESC, l.id DESC",
        LISTING_SELECT
    ))
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let listings: Vec<ListingResponse> = rows.into_iter().map(ListingResponse::from).collect();

    Ok(Json(json!({ "listings": listings })))
}

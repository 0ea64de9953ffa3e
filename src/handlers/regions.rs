// src/handlers/regions.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    filter::like_pattern,
    models::region::{
        CreateRegionRequest, RegionListParams, RegionResponse, RegionRow, TownshipEntry,
    },
};

/// Lists active regions, optionally filtered by province (equality),
/// city/township (case-insensitive substring) and a free-text search
/// ORed over name/township/city. Ordered by (province, city, township).
pub async fn list_regions(
    State(pool): State<SqlitePool>,
    Query(params): Query<RegionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, name, township, city, province, latitude, longitude, is_active, created_at \
         FROM regions WHERE is_active = 1",
    );

    if let Some(province) = params.province.filter(|v| !v.is_empty()) {
        builder.push(" AND province = ");
        builder.push_bind(province);
    }
    if let Some(city) = params.city.filter(|v| !v.is_empty()) {
        builder.push(" AND city LIKE ");
        builder.push_bind(like_pattern(&city));
        builder.push(" ESCAPE '\\'");
    }
    if let Some(township) = params.township.filter(|v| !v.is_empty()) {
        builder.push(" AND township LIKE ");
        builder.push_bind(like_pattern(&township));
        builder.push(" ESCAPE '\\'");
    }
    if let Some(search) = params.search.filter(|v| !v.is_empty()) {
        let pattern = like_pattern(&search);
        builder.push(" AND (name LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR township LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR city LIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }

    builder.push(" ORDER BY province ASC, city ASC, township ASC");

    let rows: Vec<RegionRow> = builder.build_query_as().fetch_all(&pool).await?;
    let regions: Vec<RegionResponse> = rows.into_iter().map(RegionResponse::from).collect();

    Ok(Json(json!({ "regions": regions })))
}

/// Sorted distinct provinces among active regions.
pub async fn list_provinces(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let provinces = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT province FROM regions WHERE is_active = 1 ORDER BY province ASC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "provinces": provinces })))
}

/// Active regions of a province, ordered by township, projected down to
/// `{township, city}`.
pub async fn townships_by_province(
    State(pool): State<SqlitePool>,
    Path(province): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let townships = sqlx::query_as::<_, TownshipEntry>(
        "SELECT township, city FROM regions \
         WHERE province = ? AND is_active = 1 ORDER BY township ASC",
    )
    .bind(&province)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "townships": townships })))
}

/// Creates a new region.
/// Admin only. Every violated constraint is reported, not just the first.
pub async fn create_region(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateRegionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::from_validation(validation_errors));
    }

    let (latitude, longitude) = match &payload.coordinates {
        Some(c) => (Some(c.latitude), Some(c.longitude)),
        None => (None, None),
    };

    let row = sqlx::query_as::<_, RegionRow>(
        r#"
        INSERT INTO regions (name, township, city, province, latitude, longitude)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, name, township, city, province, latitude, longitude, is_active, created_at
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.township)
    .bind(&payload.city)
    .bind(&payload.province)
    .bind(latitude)
    .bind(longitude)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create region: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Region created successfully",
            "region": RegionResponse::from(row)
        })),
    ))
}

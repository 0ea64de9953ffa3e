// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use url::Url;
use validator::{Validate, ValidationError};

use crate::models::listing::ListingImage;

/// Roles self-registration may request. 'admin' is only ever seeded.
pub const SELF_SERVICE_ROLES: [&str; 2] = ["tenant", "landlord"];

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique email address, doubles as the login identifier.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'tenant', 'landlord' or 'admin'.
    pub role: String,

    pub phone: Option<String>,

    pub avatar: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password must be between 6 and 128 characters"
    ))]
    pub password: String,
    pub phone: Option<String>,
    #[validate(custom(function = validate_self_service_role))]
    pub role: Option<String>,
}

fn validate_self_service_role(role: &str) -> Result<(), ValidationError> {
    if !SELF_SERVICE_ROLES.contains(&role) {
        let mut err = ValidationError::new("invalid_role");
        err.message = Some("Role must be 'tenant' or 'landlord'".into());
        return Err(err);
    }
    Ok(())
}

/// DTO for login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for partial profile updates. Absent fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 30, message = "Phone cannot exceed 30 characters"))]
    pub phone: Option<String>,
    #[validate(custom(function = validate_avatar_url))]
    pub avatar: Option<String>,
}

fn validate_avatar_url(avatar: &str) -> Result<(), ValidationError> {
    if avatar.len() > 500 || Url::parse(avatar).is_err() {
        let mut err = ValidationError::new("invalid_avatar_url");
        err.message = Some("Avatar is not a valid URL".into());
        return Err(err);
    }
    Ok(())
}

/// A saved listing projected down to what the profile page renders.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SavedListingSummary {
    pub id: i64,
    pub title: String,
    pub price: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub property_type: String,
    pub images: Json<Vec<ListingImage>>,
    pub region_id: i64,
}

/// Profile payload: the user plus their saved listings, expanded.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    #[serde(rename = "savedListings")]
    pub saved_listings: Vec<SavedListingSummary>,
}

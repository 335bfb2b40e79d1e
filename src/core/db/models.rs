//! Database models for cositas
//!
//! This module defines the database entity structs that map to PostgreSQL tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Image shown when a product has no images at all
pub const PLACEHOLDER_IMAGE_URL: &str = "/generic-product-display.png";

// ============================================================================
// User Model
// ============================================================================

/// User entity. Every user is an administrator of the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User without sensitive data (for API responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

// ============================================================================
// Session Model
// ============================================================================

/// Server-side session record. Only the SHA-256 of the cookie token is kept.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: i32,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Session data for creation
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: i32,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// Product Model
// ============================================================================

/// Product row as stored in the `products` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub reserved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product row joined with its main image, used by the catalog listing
#[derive(Debug, Clone, FromRow)]
pub struct ProductSummaryRow {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub reserved: bool,
    pub main_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Product summary for listing responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub reserved: bool,
    pub main_image: String,
}

impl From<ProductSummaryRow> for ProductSummary {
    fn from(row: ProductSummaryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            reserved: row.reserved,
            main_image: row
                .main_image
                .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string()),
        }
    }
}

/// Image attached to a product
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductImage {
    pub id: i32,
    pub product_id: i32,
    pub url: String,
    pub is_main: bool,
}

/// Product data for creation and full updates
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub reserved: bool,
    #[serde(default)]
    pub images: Vec<String>,
    /// Index into `images` of the main image; out of range means none is main
    #[serde(default)]
    pub main_image_index: usize,
}

/// Pick the main image: the flagged one, else the first, else the placeholder.
/// `images` is expected in storage order with main images first.
pub fn resolve_main_image(images: &[ProductImage]) -> String {
    images
        .iter()
        .find(|img| img.is_main)
        .or_else(|| images.first())
        .map(|img| img.url.clone())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string())
}

// ============================================================================
// Tests
// ============================================================================

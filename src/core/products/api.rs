//! Product API endpoints
//!
//! Provides REST API endpoints for the catalog:
//! - GET /api/products - List products, newest first
//! - GET /api/products/{id} - Get product detail with images
//! - POST /api/products - Create a product (auth required)
//! - PUT /api/products/{id} - Replace a product (auth required)
//! - DELETE /api/products/{id} - Delete a product (auth required)
//! - POST /api/products/{id}/delete - Same as DELETE, for HTML forms (auth required)
//! - POST /api/products/{id}/toggle-reservation - Flip the reserved flag (auth required)

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::{ApiError, AuthError, AuthService};
use crate::core::db::models::{Product, ProductImage, ProductInput, ProductSummary, Session};
use crate::core::db::repositories::{ProductRepository, ProductRepositoryError};

/// Default greeting placed before the product name in contact links
pub const DEFAULT_CONTACT_PREFIX: &str = "Hola! Me interesó";

/// WhatsApp contact link settings
#[derive(Debug, Clone)]
pub struct ContactLink {
    pub phone: String,
    pub prefix: String,
}

impl ContactLink {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            prefix: DEFAULT_CONTACT_PREFIX.to_string(),
        }
    }

    /// `https://wa.me/{phone}?text={prefix} {name}`, with the text URL-encoded
    pub fn url_for(&self, product_name: &str) -> String {
        let text = format!("{} {}", self.prefix, product_name);
        format!(
            "https://wa.me/{}?text={}",
            self.phone,
            urlencoding::encode(&text)
        )
    }
}

/// Product API state
#[derive(Clone)]
pub struct ProductApiState {
    pub product_repo: ProductRepository,
    pub auth_service: AuthService,
    pub contact: Option<ContactLink>,
}

/// Product API error types
#[derive(Debug, thiserror::Error)]
pub enum ProductApiError {
    #[error("Product not found")]
    NotFound,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<ProductRepositoryError> for ProductApiError {
    fn from(err: ProductRepositoryError) -> Self {
        match err {
            ProductRepositoryError::NotFound => ProductApiError::NotFound,
            ProductRepositoryError::DatabaseError(e) => {
                ProductApiError::InternalError(e.to_string())
            }
        }
    }
}

impl From<AuthError> for ProductApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InternalError(e) => ProductApiError::InternalError(e),
            _ => ProductApiError::Unauthorized,
        }
    }
}

impl IntoResponse for ProductApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ProductApiError::NotFound => (StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND"),
            ProductApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ProductApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ProductApiError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let message = match &self {
            ProductApiError::InternalError(detail) => {
                tracing::error!("Product request failed: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiError::new(message, code))).into_response()
    }
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Response for a single product
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductDetailResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub reserved: bool,
    pub images: Vec<String>,
    pub main_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ProductDetailResponse {
    pub fn new(product: Product, images: Vec<ProductImage>, contact: Option<&ContactLink>) -> Self {
        let main_image = crate::core::db::models::resolve_main_image(&images);
        Self {
            whatsapp_url: contact.map(|c| c.url_for(&product.name)),
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            reserved: product.reserved,
            images: images.into_iter().map(|img| img.url).collect(),
            main_image,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Response for product creation
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i32,
}

/// Response for reservation toggling
#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub success: bool,
    pub reserved: bool,
}

/// Generic success response
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Parse a product id from the path
fn parse_id(raw: &str) -> Result<i32, ProductApiError> {
    raw.parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ProductApiError::BadRequest(format!("invalid product id '{}'", raw)))
}

/// Normalize and validate product input
fn validate_input(mut input: ProductInput) -> Result<ProductInput, ProductApiError> {
    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
        return Err(ProductApiError::BadRequest("name is required".to_string()));
    }

    if !input.price.is_finite() || input.price <= 0.0 {
        return Err(ProductApiError::BadRequest(
            "price must be a positive number".to_string(),
        ));
    }

    input.description = input.description.trim().to_string();

    // Blank URLs are dropped; the main index follows its image, or points
    // past the end when the main entry itself was blank
    let requested_main = input.main_image_index;
    let mut main_image_index = usize::MAX;
    let mut images = Vec::with_capacity(input.images.len());
    for (i, url) in input.images.iter().enumerate() {
        let url = url.trim();
        if url.is_empty() {
            continue;
        }
        if i == requested_main {
            main_image_index = images.len();
        }
        images.push(url.to_string());
    }
    input.images = images;
    input.main_image_index = main_image_index;

    Ok(input)
}

/// Extractor that rejects requests without a live admin session.
///
/// Runs before any body extractor, so anonymous callers get 401 even when
/// the body is malformed.
pub struct AdminSession(pub Session);

impl FromRequestParts<Arc<ProductApiState>> for AdminSession {
    type Rejection = ProductApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ProductApiState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session = state.auth_service.require_session(&jar).await?;
        Ok(AdminSession(session))
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the product API router
pub fn product_api_router(state: ProductApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route(
            "/api/products",
            get(list_products_handler).post(create_product_handler),
        )
        .route(
            "/api/products/{id}",
            get(get_product_handler)
                .put(update_product_handler)
                .delete(delete_product_handler),
        )
        .route("/api/products/{id}/delete", post(delete_product_handler))
        .route(
            "/api/products/{id}/toggle-reservation",
            post(toggle_reservation_handler),
        )
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/products
async fn list_products_handler(
    State(state): State<Arc<ProductApiState>>,
) -> Result<Json<Vec<ProductSummary>>, ProductApiError> {
    let rows = state.product_repo.list().await?;
    Ok(Json(rows.into_iter().map(ProductSummary::from).collect()))
}

/// GET /api/products/{id}
async fn get_product_handler(
    State(state): State<Arc<ProductApiState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetailResponse>, ProductApiError> {
    let id = parse_id(&id)?;

    let product = state
        .product_repo
        .find_by_id(id)
        .await?
        .ok_or(ProductApiError::NotFound)?;
    let images = state.product_repo.images(id).await?;

    Ok(Json(ProductDetailResponse::new(
        product,
        images,
        state.contact.as_ref(),
    )))
}

/// POST /api/products
async fn create_product_handler(
    State(state): State<Arc<ProductApiState>>,
    _session: AdminSession,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<CreatedResponse>), ProductApiError> {
    let input = validate_input(input)?;

    let id = state.product_repo.create(&input).await?;
    tracing::info!("Product {} created: {}", id, input.name);

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// PUT /api/products/{id}
async fn update_product_handler(
    State(state): State<Arc<ProductApiState>>,
    _session: AdminSession,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> Result<Json<SuccessResponse>, ProductApiError> {
    let id = parse_id(&id)?;
    let input = validate_input(input)?;

    state.product_repo.update(id, &input).await?;
    tracing::info!("Product {} updated", id);

    Ok(Json(SuccessResponse { success: true }))
}

/// DELETE /api/products/{id} and POST /api/products/{id}/delete
async fn delete_product_handler(
    State(state): State<Arc<ProductApiState>>,
    _session: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ProductApiError> {
    let id = parse_id(&id)?;

    if !state.product_repo.delete(id).await? {
        return Err(ProductApiError::NotFound);
    }
    tracing::info!("Product {} deleted", id);

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/products/{id}/toggle-reservation
async fn toggle_reservation_handler(
    State(state): State<Arc<ProductApiState>>,
    _session: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<ReservationResponse>, ProductApiError> {
    let id = parse_id(&id)?;

    let reserved = state.product_repo.toggle_reserved(id).await?;

    Ok(Json(ReservationResponse {
        success: true,
        reserved,
    }))
}

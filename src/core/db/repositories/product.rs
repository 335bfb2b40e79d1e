//! Product repository for catalog operations
//!
//! Products own an ordered set of image URLs. Writes that touch both tables
//! run inside a single transaction.

use sqlx::{PgPool, Postgres, Transaction};

use crate::core::db::models::{Product, ProductImage, ProductInput, ProductSummaryRow};

/// Product repository error types
#[derive(Debug, thiserror::Error)]
pub enum ProductRepositoryError {
    #[error("Product not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Product repository for database operations
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Create a new product repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all products, newest first, with their main image URL
    pub async fn list(&self) -> Result<Vec<ProductSummaryRow>, ProductRepositoryError> {
        let rows = sqlx::query_as::<_, ProductSummaryRow>(
            r#"
            SELECT p.id, p.name, p.description, p.price, p.reserved, p.created_at,
                   (SELECT i.url FROM images i
                    WHERE i.product_id = p.id
                    ORDER BY i.is_main DESC, i.id ASC
                    LIMIT 1) AS main_image
            FROM products p
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Find a product by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<Product>, ProductRepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, reserved, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// All images of a product, main image first
    pub async fn images(&self, product_id: i32) -> Result<Vec<ProductImage>, ProductRepositoryError> {
        let images = sqlx::query_as::<_, ProductImage>(
            r#"
            SELECT id, product_id, url, is_main
            FROM images
            WHERE product_id = $1
            ORDER BY is_main DESC, id ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    /// Create a product together with its images, returning the new ID
    pub async fn create(&self, input: &ProductInput) -> Result<i32, ProductRepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO products (name, description, price, reserved)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.reserved)
        .fetch_one(&mut *tx)
        .await?;

        insert_images(&mut tx, id, &input.images, input.main_image_index).await?;
        tx.commit().await?;

        Ok(id)
    }

    /// Replace every field and the full image set of a product
    pub async fn update(&self, id: i32, input: &ProductInput) -> Result<(), ProductRepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, reserved = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.reserved)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ProductRepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM images WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_images(&mut tx, id, &input.images, input.main_image_index).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Flip the reserved flag and return its new value
    pub async fn toggle_reserved(&self, id: i32) -> Result<bool, ProductRepositoryError> {
        let reserved: Option<(bool,)> = sqlx::query_as(
            r#"
            UPDATE products
            SET reserved = NOT reserved, updated_at = NOW()
            WHERE id = $1
            RETURNING reserved
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        reserved
            .map(|(r,)| r)
            .ok_or(ProductRepositoryError::NotFound)
    }

    /// Delete a product; its images go with it (ON DELETE CASCADE)
    pub async fn delete(&self, id: i32) -> Result<bool, ProductRepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn insert_images(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i32,
    urls: &[String],
    main_index: usize,
) -> Result<(), sqlx::Error> {
    for (i, url) in urls.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO images (product_id, url, is_main)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(product_id)
        .bind(url)
        .bind(i == main_index)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

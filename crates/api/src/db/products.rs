//! Database operations for catalog products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use sugarloaf_core::ProductId;

use super::RepositoryError;
use crate::models::{CreateProductInput, Product, ProductFilter, UpdateProductInput};

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    title: String,
    description: String,
    price: Decimal,
    stock: i32,
    category: String,
    images: Vec<String>,
    rating: Option<f64>,
    featured: bool,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            title: row.title,
            description: row.description,
            price: row.price,
            stock: row.stock,
            category: row.category,
            images: row.images,
            rating: row.rating,
            featured: row.featured,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, title, description, price, stock, category, images, rating, \
     featured, tags, created_at, updated_at";

/// Repository for product operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new repository with the given pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn create(&self, input: &CreateProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO shop.product \
                 (title, description, price, stock, category, images, rating, featured, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .bind(&input.category)
        .bind(&input.images)
        .bind(input.rating)
        .bind(input.featured)
        .bind(&input.tags)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Fetch a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// List and search products with pagination, newest first.
    ///
    /// All filter fields are optional; text filters match
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn search(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        const WHERE_CLAUSE: &str = "($1::text IS NULL \
                 OR title ILIKE '%' || $1 || '%' \
                 OR description ILIKE '%' || $1 || '%') \
            AND ($2::text IS NULL OR category ILIKE $2) \
            AND ($3::numeric IS NULL OR price >= $3) \
            AND ($4::numeric IS NULL OR price <= $4)";

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product \
             WHERE {WHERE_CLAUSE} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $5 OFFSET $6"
        ))
        .bind(filter.q.as_deref())
        .bind(filter.category.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(i64::from(filter.limit()))
        .bind(filter.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM shop.product WHERE {WHERE_CLAUSE}"
        ))
        .bind(filter.q.as_deref())
        .bind(filter.category.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .fetch_one(self.pool)
        .await?;

        Ok((rows.into_iter().map(Product::from).collect(), total))
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn update(
        &self,
        id: ProductId,
        update: &UpdateProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE shop.product SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 price = COALESCE($4, price), \
                 stock = COALESCE($5, stock), \
                 category = COALESCE($6, category), \
                 images = COALESCE($7, images), \
                 rating = COALESCE($8, rating), \
                 featured = COALESCE($9, featured), \
                 tags = COALESCE($10, tags), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(update.title.as_deref())
        .bind(update.description.as_deref())
        .bind(update.price)
        .bind(update.stock)
        .bind(update.category.as_deref())
        .bind(update.images.as_deref())
        .bind(update.rating)
        .bind(update.featured)
        .bind(update.tags.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product. Cart lines keep their snapshot prices; the
    /// joined product summary simply disappears.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

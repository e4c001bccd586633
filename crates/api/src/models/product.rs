//! Catalog product model and input types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sugarloaf_core::ProductId;

/// Title length bounds.
pub const MIN_TITLE_LENGTH: usize = 3;
pub const MAX_TITLE_LENGTH: usize = 100;

/// Description length bounds.
pub const MIN_DESCRIPTION_LENGTH: usize = 10;
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Maximum length for the category name.
pub const MAX_CATEGORY_LENGTH: usize = 50;

/// Price bounds in major units.
pub const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    /// Unit price in major currency units (e.g. dollars).
    pub price: Decimal,
    /// Units currently available for purchase.
    pub stock: i32,
    pub category: String,
    /// Image URLs, in display order.
    pub images: Vec<String>,
    /// Average review rating, 0.0 to 5.0.
    pub rating: Option<f64>,
    pub featured: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateProductInput {
    /// Validate field constraints before hitting the database.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message describing the first violated
    /// constraint.
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        validate_price(self.price)?;
        if self.stock < 0 {
            return Err("stock must not be negative".to_string());
        }
        validate_category(&self.category)?;
        validate_images(&self.images)?;
        validate_rating(self.rating)?;
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), String> {
    let len = title.trim().len();
    if !(MIN_TITLE_LENGTH..=MAX_TITLE_LENGTH).contains(&len) {
        return Err(format!(
            "title must be {MIN_TITLE_LENGTH} to {MAX_TITLE_LENGTH} characters"
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), String> {
    let len = description.trim().len();
    if !(MIN_DESCRIPTION_LENGTH..=MAX_DESCRIPTION_LENGTH).contains(&len) {
        return Err(format!(
            "description must be {MIN_DESCRIPTION_LENGTH} to {MAX_DESCRIPTION_LENGTH} characters"
        ));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), String> {
    if !(MIN_PRICE..=MAX_PRICE).contains(&price) {
        return Err(format!("price must be between {MIN_PRICE} and {MAX_PRICE}"));
    }
    // At most two decimal places
    if price.round_dp(2) != price {
        return Err("price must have at most two decimal places".to_string());
    }
    Ok(())
}

fn validate_category(category: &str) -> Result<(), String> {
    let len = category.trim().len();
    if len == 0 || len > MAX_CATEGORY_LENGTH {
        return Err(format!("category must be 1 to {MAX_CATEGORY_LENGTH} characters"));
    }
    Ok(())
}

fn validate_images(images: &[String]) -> Result<(), String> {
    if images.is_empty() {
        return Err("at least one image URL is required".to_string());
    }
    for url in images {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!("image URL '{url}' must be http(s)"));
        }
    }
    Ok(())
}

fn validate_rating(rating: Option<f64>) -> Result<(), String> {
    if rating.is_some_and(|r| !(0.0..=5.0).contains(&r)) {
        return Err("rating must be between 0 and 5".to_string());
    }
    Ok(())
}

/// Partial update for a product. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub featured: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl UpdateProductInput {
    /// True if no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.category.is_none()
            && self.images.is_none()
            && self.rating.is_none()
            && self.featured.is_none()
            && self.tags.is_none()
    }

    /// Validate the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(stock) = self.stock
            && stock < 0
        {
            return Err("stock must not be negative".to_string());
        }
        if let Some(category) = &self.category {
            validate_category(category)?;
        }
        if let Some(images) = &self.images {
            validate_images(images)?;
        }
        validate_rating(self.rating)?;
        Ok(())
    }
}

/// Query parameters for listing and searching products.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Free-text query matched against title and description.
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductFilter {
    /// Page number, 1-based.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to 1..=100.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }

    /// SQL OFFSET for the current page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }
}

/// Pagination metadata returned alongside listings.
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl PageMeta {
    #[must_use]
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let step = i64::from(limit.max(1));
        let pages = ((total + step - 1) / step).max(1);
        Self { page, limit, total, pages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> CreateProductInput {
        CreateProductInput {
            title: "Espresso Beans".to_string(),
            description: "Dark roast, 1kg bag".to_string(),
            price: Decimal::new(1899, 2),
            stock: 40,
            category: "coffee".to_string(),
            images: vec!["https://cdn.example.com/beans.jpg".to_string()],
            rating: Some(4.5),
            featured: false,
            tags: vec!["roast".to_string()],
        }
    }

    #[test]
    fn create_input_accepts_valid_product() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn create_input_rejects_empty_title() {
        let mut input = valid_input();
        input.title = "  ".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn create_input_rejects_negative_price() {
        let mut input = valid_input();
        input.price = Decimal::new(-100, 2);
        assert!(input.validate().is_err());
    }

    #[test]
    fn create_input_rejects_out_of_range_rating() {
        let mut input = valid_input();
        input.rating = Some(5.5);
        assert!(input.validate().is_err());
    }

    #[test]
    fn create_input_rejects_sub_cent_precision() {
        let mut input = valid_input();
        input.price = Decimal::new(18_999, 3);
        assert!(input.validate().is_err());
    }

    #[test]
    fn create_input_requires_http_images() {
        let mut input = valid_input();
        input.images = vec!["ftp://example.com/img".to_string()];
        assert!(input.validate().is_err());
        input.images.clear();
        assert!(input.validate().is_err());
    }

    #[test]
    fn update_input_detects_empty_update() {
        assert!(UpdateProductInput::default().is_empty());
        let update = UpdateProductInput { stock: Some(3), ..Default::default() };
        assert!(!update.is_empty());
    }

    #[test]
    fn filter_clamps_page_and_limit() {
        let filter = ProductFilter { page: Some(0), limit: Some(500), ..Default::default() };
        assert_eq!(filter.page(), 1);
        assert_eq!(filter.limit(), 100);
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn page_meta_rounds_up_page_count() {
        let meta = PageMeta::new(1, 20, 41);
        assert_eq!(meta.pages, 3);
        let empty = PageMeta::new(1, 20, 0);
        assert_eq!(empty.pages, 1);
    }

    #[test]
    fn page_meta_exact_multiple_does_not_round_up() {
        let meta = PageMeta::new(2, 20, 40);
        assert_eq!(meta.pages, 2);
        let single = PageMeta::new(1, 20, 1);
        assert_eq!(single.pages, 1);
    }
}

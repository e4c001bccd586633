//! Seed database with demo catalog data.
//!
//! Inserts a small set of products and coupons for local development.
//! Existing rows with the same identity are left alone, so the command
//! is safe to re-run.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use super::migrate::MigrationError;

struct SeedProduct {
    title: &'static str,
    description: &'static str,
    price: &'static str,
    stock: i32,
    category: &'static str,
    image: &'static str,
    featured: bool,
    tags: &'static [&'static str],
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        title: "Enamel Camp Mug",
        description: "12oz speckled enamel mug, fire-safe and nearly indestructible.",
        price: "14.50",
        stock: 120,
        category: "kitchen",
        image: "https://cdn.sugarloaf.shop/img/camp-mug.jpg",
        featured: true,
        tags: &["camping", "drinkware"],
    },
    SeedProduct {
        title: "Waxed Canvas Tote",
        description: "Heavy waxed canvas tote with brass rivets and leather handles.",
        price: "68.00",
        stock: 45,
        category: "bags",
        image: "https://cdn.sugarloaf.shop/img/canvas-tote.jpg",
        featured: true,
        tags: &["canvas", "everyday-carry"],
    },
    SeedProduct {
        title: "Cast Iron Skillet 10\"",
        description: "Pre-seasoned cast iron skillet, machined cooking surface.",
        price: "42.00",
        stock: 60,
        category: "kitchen",
        image: "https://cdn.sugarloaf.shop/img/skillet-10.jpg",
        featured: false,
        tags: &["cast-iron", "cookware"],
    },
    SeedProduct {
        title: "Wool Camp Blanket",
        description: "80/20 wool blend blanket, 64 by 80 inches.",
        price: "95.00",
        stock: 30,
        category: "home",
        image: "https://cdn.sugarloaf.shop/img/camp-blanket.jpg",
        featured: false,
        tags: &["wool", "camping"],
    },
    SeedProduct {
        title: "Pocket Field Notebook (3-pack)",
        description: "Dot-grid memo books with waterproof covers.",
        price: "12.00",
        stock: 300,
        category: "stationery",
        image: "https://cdn.sugarloaf.shop/img/field-notebook.jpg",
        featured: false,
        tags: &["notebook", "everyday-carry"],
    },
];

/// Seed demo products and coupons.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection
/// fails, or an insert fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = super::migrate::database_url()?;

    info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    let mut inserted = 0_u64;
    for product in PRODUCTS {
        // Title is not unique in the schema; skip rows we seeded before
        let result = sqlx::query(
            "INSERT INTO shop.product \
                 (title, description, price, stock, category, images, featured, tags) \
             SELECT $1, $2, $3, $4, $5, ARRAY[$6], $7, $8 \
             WHERE NOT EXISTS (SELECT 1 FROM shop.product WHERE title = $1)",
        )
        .bind(product.title)
        .bind(product.description)
        .bind(product.price.parse::<Decimal>().unwrap_or_default())
        .bind(product.stock)
        .bind(product.category)
        .bind(product.image)
        .bind(product.featured)
        .bind(product.tags.iter().map(|t| (*t).to_string()).collect::<Vec<_>>())
        .execute(&pool)
        .await?;
        inserted += result.rows_affected();
    }
    info!("Seeded {inserted} products");

    let now = Utc::now();
    let coupons_inserted = sqlx::query(
        "INSERT INTO shop.coupon \
             (code, discount_type, discount_value, valid_from, valid_to, \
              min_cart_value, max_discount, is_active) \
         VALUES \
             ('WELCOME10', 'percentage', 10, $1, $2, NULL, 25.00, TRUE), \
             ('FLAT5',     'fixed',      5, $1, $2, 30.00, NULL, TRUE) \
         ON CONFLICT (code) DO NOTHING",
    )
    .bind(now)
    .bind(now + Duration::days(90))
    .execute(&pool)
    .await?
    .rows_affected();
    info!("Seeded {coupons_inserted} coupons");

    info!("Seeding complete!");
    Ok(())
}

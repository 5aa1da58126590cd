// commerce_server/src/db/seed.rs

use sqlx::PgPool;
use tracing::{error, info, instrument};

use crate::errors::{AppError, Result};

pub(crate) struct SeedProduct {
  pub name: &'static str,
  pub description: &'static str,
  pub price: f64,
  pub image: &'static str,
  pub extra_images: &'static [&'static str],
  pub category: &'static str,
}

pub(crate) const SEED_PRODUCTS: &[SeedProduct] = &[
  SeedProduct {
    name: "Acme Drawstring Bag",
    description: "Have you ever wondered just how exactly that drawstring bag works? Wonder no more!",
    price: 12.00,
    image: "https://images.unsplash.com/photo-1553062407-98eeb64c6a62?w=800&q=80",
    extra_images: &["https://images.unsplash.com/photo-1590874103328-eac38a683ce7?w=800&q=80"],
    category: "Accessories",
  },
  SeedProduct {
    name: "Acme Cup",
    description: "The perfect cup for your morning coffee or afternoon tea.",
    price: 15.00,
    image: "https://images.unsplash.com/photo-1514228742587-6b1558fcca3d?w=800&q=80",
    extra_images: &[],
    category: "Accessories",
  },
  SeedProduct {
    name: "Acme T-Shirt",
    description: "A comfortable and stylish t-shirt for everyday wear.",
    price: 25.00,
    image: "https://images.unsplash.com/photo-1521572163474-6864f9cf17ab?w=800&q=80",
    extra_images: &[],
    category: "Clothing",
  },
  SeedProduct {
    name: "Acme Hoodie",
    description: "Stay warm and cozy with this premium hoodie.",
    price: 45.00,
    image: "https://images.unsplash.com/photo-1556821840-3a63f95609a7?w=800&q=80",
    extra_images: &[],
    category: "Clothing",
  },
  SeedProduct {
    name: "Acme Sticker",
    description: "Show your support with this high-quality sticker.",
    price: 3.00,
    image: "https://images.unsplash.com/photo-1606092195730-5d7b9af1efc5?w=800&q=80",
    extra_images: &[],
    category: "Accessories",
  },
  SeedProduct {
    name: "Acme Notebook",
    description: "Perfect for jotting down ideas and notes.",
    price: 18.00,
    image: "https://images.unsplash.com/photo-1544947950-fa07a98d237f?w=800&q=80",
    extra_images: &[],
    category: "Accessories",
  },
];

impl SeedProduct {
  /// `images` column value: `None` unless the product has more than its main image.
  fn images(&self) -> Option<Vec<String>> {
    if self.extra_images.is_empty() {
      return None;
    }
    let mut all = vec![self.image.to_string()];
    all.extend(self.extra_images.iter().map(|s| s.to_string()));
    Some(all)
  }
}

/// Inserts the demo catalogue when `products` is empty. Returns the number of rows inserted.
#[instrument(name = "db::seed::seed_products", skip(pool))]
pub async fn seed_products(pool: &PgPool) -> Result<usize> {
  let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
    .fetch_one(pool)
    .await
    .map_err(|e| {
      error!("Error checking existing products: {}", e);
      AppError::Sqlx(e)
    })?;
  if existing > 0 {
    info!(existing, "Database already contains products. Skipping seed.");
    return Ok(0);
  }

  let mut tx = pool.begin().await.map_err(AppError::Sqlx)?;
  for product in SEED_PRODUCTS {
    sqlx::query(
      "INSERT INTO products (name, description, price, currency, image, images, category, in_stock) \
       VALUES ($1, $2, $3, 'USD', $4, $5, $6, TRUE)",
    )
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.image)
    .bind(product.images())
    .bind(product.category)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
      error!(product = product.name, "Failed to insert seed product: {}", e);
      AppError::Sqlx(e)
    })?;
  }
  tx.commit().await.map_err(AppError::Sqlx)?;

  info!(inserted = SEED_PRODUCTS.len(), "Seeded product catalogue.");
  Ok(SEED_PRODUCTS.len())
}

//! # Seed Data Generator
//!
//! Fills a Stockroom database with supermarket products for development.
//!
//! ## Usage
//! ```bash
//! # 200 products into ./stockroom.db
//! cargo run -p stockroom-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p stockroom-db --bin seed -- --count 1000 --db ./data/dev.db
//! ```
//!
//! Names combine a base item with a pack size, e.g. "Oat Milk 1L".
//! Prices and stock levels are derived from the item index so repeated
//! runs against fresh databases produce the same catalogue.

use std::env;

use anyhow::{bail, Context};
use stockroom_core::ProductInput;
use stockroom_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_COUNT: usize = 200;
const DEFAULT_DB: &str = "./stockroom.db";

/// (category, items)
const CATALOGUE: &[(&str, &[&str])] = &[
    (
        "Beverages",
        &[
            "Sparkling Water",
            "Still Water",
            "Cola",
            "Lemon Soda",
            "Orange Juice",
            "Apple Juice",
            "Iced Tea",
            "Cold Brew",
        ],
    ),
    (
        "Dairy",
        &[
            "Whole Milk",
            "Oat Milk",
            "Greek Yogurt",
            "Butter",
            "Cheddar",
            "Mozzarella",
            "Cream Cheese",
            "Free Range Eggs",
        ],
    ),
    (
        "Bakery",
        &[
            "Sourdough Loaf",
            "Rye Bread",
            "Croissant",
            "Bagels",
            "Pita",
            "Brioche Buns",
        ],
    ),
    (
        "Pantry",
        &[
            "Spaghetti",
            "Basmati Rice",
            "Chickpeas",
            "Chopped Tomatoes",
            "Olive Oil",
            "Peanut Butter",
            "Rolled Oats",
            "Honey",
        ],
    ),
    (
        "Snacks",
        &[
            "Sea Salt Crisps",
            "Tortilla Chips",
            "Dark Chocolate",
            "Trail Mix",
            "Rice Cakes",
            "Popcorn",
        ],
    ),
];

/// (size label, price add-on in cents)
const SIZES: &[(&str, i64)] = &[("Small", 0), ("Regular", 80), ("Large", 190), ("Family", 320)];

struct Args {
    count: usize,
    db_path: String,
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let mut args = Args {
        count: DEFAULT_COUNT,
        db_path: DEFAULT_DB.to_string(),
    };

    let mut iter = env::args().skip(1);
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--count" | "-c" => {
                let value = iter.next().context("--count needs a value")?;
                args.count = value
                    .parse()
                    .with_context(|| format!("invalid --count: {value}"))?;
            }
            "--db" | "-d" => {
                args.db_path = iter.next().context("--db needs a value")?;
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: {DEFAULT_COUNT})");
                println!("  -d, --db <PATH>    Database file path (default: {DEFAULT_DB})");
                println!("  -h, --help         Show this help message");
                return Ok(None);
            }
            other => bail!("unknown argument: {other}"),
        }
    }

    Ok(Some(args))
}

/// Builds the n-th generated product.
fn product_input(category: &str, item: &str, size: &str, price_addon: i64, seed: usize) -> ProductInput {
    let base_price = 99 + ((seed * 37) % 900) as i64;
    let quantity = ((seed * 13) % 120) as i64;
    let code: String = item
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_uppercase();

    ProductInput {
        name: Some(format!("{item} {size}")),
        sku: Some(format!("{}-{code}-{seed:04}", &category[..3].to_uppercase())),
        category: Some(category.to_string()),
        price_cents: Some(base_price + price_addon),
        quantity: Some(quantity),
        image_url: None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let Some(args) = parse_args()? else {
        return Ok(());
    };

    info!(db = %args.db_path, count = args.count, "Seeding database");

    let db = Database::new(DbConfig::new(&args.db_path))
        .await
        .with_context(|| format!("opening {}", args.db_path))?;
    let products = db.products();

    let existing = products.count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut seed = 0;

    'outer: for (category, items) in CATALOGUE {
        for item in *items {
            for (size, price_addon) in SIZES {
                if generated >= args.count {
                    break 'outer;
                }
                seed += 1;

                let new = product_input(category, item, size, *price_addon, seed)
                    .into_new_product()
                    .with_context(|| format!("generated product {seed} is invalid"))?;
                products.insert(new).await?;
                generated += 1;
            }
        }
    }

    if generated < args.count {
        warn!(
            generated,
            requested = args.count,
            "Catalogue exhausted before reaching the requested count"
        );
    }

    let stats = db.stats().summary().await?;
    info!(
        generated,
        elapsed_ms = start.elapsed().as_millis() as u64,
        stock_units = stats.total_stock_units,
        "Seed complete"
    );

    db.close().await;
    Ok(())
}

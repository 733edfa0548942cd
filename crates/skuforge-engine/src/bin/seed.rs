//! # Seed Data Generator
//!
//! Populates a database with a small catalogue and generates every SKU
//! through the engine.
//!
//! ## Usage
//! ```bash
//! # Seed ./skuforge_dev.db
//! cargo run -p skuforge-engine --bin seed
//!
//! # Specify database path
//! cargo run -p skuforge-engine --bin seed -- --db ./data/skuforge.db
//!
//! # Use an engine.toml
//! cargo run -p skuforge-engine --bin seed -- --config ./engine.toml
//! ```
//!
//! ## Generated Data
//! - Categories with codes (AT, QJ, GI)
//! - A global pattern `{CATEGORY_CODE}-{PRODUCT_NAME}-{INCREMENT}` and a
//!   variant pattern for shoes without `{INCREMENT}`
//! - Attribute abbreviations for common Vietnamese colors and sizes
//! - Products with legacy and dynamic variants

use std::env;
use std::path::PathBuf;

use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use skuforge_core::{AbbreviationType, AttributeBag, CaseType, VariantAttributes};
use skuforge_engine::{EngineConfig, SkuService};

/// (category name, code, products)
const CATALOGUE: &[(&str, &str, &[&str])] = &[
    ("Áo Thun", "AT", &["Áo Thun Cổ Tròn", "Áo Thun Polo", "Áo Thun Oversize"]),
    ("Quần Jean", "QJ", &["Quần Jean Slim", "Quần Jean Ống Rộng"]),
    ("Giày", "GI", &["Giày Thể Thao", "Giày Lười Da"]),
];

/// (value, short code)
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("Đỏ", "RED"),
    ("Đen", "BLK"),
    ("Trắng", "WHT"),
    ("Xanh Dương", "BLU"),
    ("Nhỏ", "S"),
    ("Vừa", "M"),
    ("Lớn", "L"),
];

const COLORS: &[&str] = &["Đỏ", "Đen", "Trắng"];
const SIZES: &[&str] = &["Nhỏ", "Vừa", "Lớn"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("SKU Forge Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (default: ./skuforge_dev.db)");
                println!("  -c, --config <PATH>   engine.toml to load");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = EngineConfig::load_or_default(config_path);
    config.database.path = db_path.unwrap_or_else(|| PathBuf::from("./skuforge_dev.db"));

    println!("🌱 SKU Forge Seed Data Generator");
    println!("================================");
    println!("Database: {}", config.database.path.display());
    println!();

    let service = SkuService::connect(config).await?;
    let db = service.database();

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (value, code) in ABBREVIATIONS {
        db.abbreviations()
            .insert(AbbreviationType::Attribute, value, code, None)
            .await?;
    }
    println!("✓ {} abbreviations", ABBREVIATIONS.len());

    db.pattern_settings()
        .upsert(None, "{CATEGORY_CODE}-{PRODUCT_NAME}-{INCREMENT}", "-", CaseType::Upper)
        .await?;

    let start = std::time::Instant::now();
    let mut products = 0;
    let mut variants = 0;

    for (name, code, items) in CATALOGUE {
        let category = db.categories().insert(name, Some(*code)).await?;

        if *code == "GI" {
            // Shoes: one SKU per color/size combination, suffixed on collision
            db.pattern_settings()
                .upsert(
                    Some(&category.id),
                    "{CATEGORY_CODE}-{ATTRIBUTE_VALUE}",
                    "-",
                    CaseType::Upper,
                )
                .await?;
        }

        for item in *items {
            let product = db.products().insert(Some(&category.id), None, item).await?;
            let product = service.regenerate_product_sku(&product.id, Some("seed")).await?;
            println!("  {} → {}", item, product.sku.as_deref().unwrap_or("-"));
            products += 1;

            for (idx, color) in COLORS.iter().enumerate() {
                let size = SIZES[idx % SIZES.len()];
                let attributes = if idx % 2 == 0 {
                    VariantAttributes::legacy(Some(size), Some(*color))
                } else {
                    VariantAttributes::dynamic(AttributeBag::from_pairs([("Color", *color), ("Size", size)])?)
                };

                let variant = db.variants().insert(&product.id, &attributes).await?;
                let variant = service.regenerate_variant_sku(&variant.id, Some("seed")).await?;
                println!("      {}", variant.sku.as_deref().unwrap_or("-"));
                variants += 1;
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products and {} variants in {:?}", products, variants, elapsed);

    let history = db.sku_history().count().await?;
    println!("  History entries: {}", history);
    if service.history_logger().failure_count() > 0 {
        println!(
            "⚠ {} history writes failed",
            service.history_logger().failure_count()
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info,skuforge=debug,sqlx=warn";

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show all debug logs
/// - `RUST_LOG=skuforge=trace` - Trace logging for the engine only
/// - Default: `info,skuforge=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    subscriber(filter).init();
}

fn subscriber(filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt().with_env_filter(filter).finish()
}

//! # Seed Data Generator
//!
//! Populates the database with the demo storefront.
//!
//! ## Usage
//! ```bash
//! # Seed ./foodie_dev.db (default)
//! cargo run -p foodie-db --bin seed
//!
//! # Specify database path
//! cargo run -p foodie-db --bin seed -- --db ./data/foodie.db
//!
//! # Restaurants, menus and promotions only (no accounts)
//! cargo run -p foodie-db --bin seed -- --catalog-only
//! ```
//!
//! ## Demo Accounts
//! - john@example.com / password
//! - jane@example.com / password
//! - mike@example.com / password
//! - admin@foodie.com / admin123 (admin)

use std::env;

use foodie_db::seed::{seed_catalog, seed_demo_data};
use foodie_db::{Database, DbConfig, RestaurantFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./foodie_dev.db");
    let mut catalog_only = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--catalog-only" => catalog_only = true,
            "--help" | "-h" => {
                println!("Foodie Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./foodie_dev.db)");
                println!("      --catalog-only Skip demo accounts");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Foodie Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let start = std::time::Instant::now();
    let summary = if catalog_only {
        seed_catalog(&db).await?
    } else {
        seed_demo_data(&db).await?
    };

    let Some(summary) = summary else {
        let existing = db.restaurants().list(&RestaurantFilter::default()).await?.total;
        println!("⚠ Database already has {} restaurants", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    };

    println!();
    println!("✓ Seeded in {:?}", start.elapsed());
    println!("  Users:       {}", summary.users);
    println!("  Restaurants: {}", summary.restaurants);
    println!("  Menu items:  {}", summary.menu_items);
    println!("  Promotions:  {}", summary.promotions);

    // Quick read-back
    let featured = db
        .restaurants()
        .list(&RestaurantFilter {
            featured: Some(true),
            ..Default::default()
        })
        .await?;
    println!();
    println!("  Featured restaurants: {}", featured.total);

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

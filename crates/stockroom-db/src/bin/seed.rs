//! # Seed Data Generator
//!
//! Populates the database with borrowers and inventory for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p stockroom-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```
//!
//! ## Generated Data
//! Creates gear across the categories a media team actually lends out:
//! cameras, lenses, audio, lights, stands, and cables (with lengths),
//! plus a handful of borrowers to test against.

use chrono::Utc;
use std::env;
use tracing_subscriber::EnvFilter;

use stockroom_core::{Borrower, Product, ProductStatus};
use stockroom_db::{Database, DbConfig};

/// Gear categories for realistic test data: (category, items, lengths?)
const CATEGORIES: &[(&str, &[&str], bool)] = &[
    (
        "camera",
        &[
            "Sony FX3",
            "Sony A7 IV",
            "Canon R6",
            "Blackmagic Pocket 6K",
            "GoPro Hero 12",
        ],
        false,
    ),
    (
        "audio",
        &[
            "Sennheiser MKH 416",
            "Rode NTG5",
            "Zoom H6",
            "Wireless GO II set",
            "SM58",
        ],
        false,
    ),
    (
        "light",
        &[
            "Aputure 300D",
            "Aputure MC",
            "Nanlite Forza 60",
            "Softbox 90cm",
            "Reflector 5-in-1",
        ],
        false,
    ),
    (
        "stand",
        &[
            "C-Stand",
            "Light stand compact",
            "Tripod Manfrotto 055",
            "Monopod",
            "Slider 80cm",
        ],
        false,
    ),
    (
        "cable",
        &[
            "XLR cable",
            "HDMI cable",
            "SDI cable",
            "Power extension",
            "Ethernet Cat6",
        ],
        true,
    ),
];

/// Cable lengths in meters.
const LENGTHS_M: &[f64] = &[1.0, 3.0, 5.0, 10.0, 20.0];

/// Storage locations.
const LOCATIONS: &[&str] = &["Shelf A", "Shelf B", "Shelf C", "Case 1", "Case 2"];

/// Borrowers to seed alongside the gear.
const BORROWERS: &[(&str, &str)] = &[
    ("alice", "Alice Winter"),
    ("bob", "Bob Keller"),
    ("carol", "Carol Novak"),
    ("dave", "Dave Okafor"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./stockroom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stockroom Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("Connected, migrations applied");

    // Check existing data
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("Database already has {} products", existing);
        println!("Skipping seed to avoid duplicates.");
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    // Borrowers first (transactions reference them)
    let now = Utc::now();
    for (id, name) in BORROWERS {
        db.borrowers()
            .insert(&Borrower {
                id: (*id).to_string(),
                display_name: (*name).to_string(),
                is_active: true,
                created_at: now,
            })
            .await?;
    }
    println!("Seeded {} borrowers", BORROWERS.len());

    // Generate products
    println!("Generating products...");

    let mut generated = 0;
    'outer: for (category, names, has_length) in CATEGORIES {
        for (item_idx, name) in names.iter().enumerate() {
            for unit in 0..1 + count / (CATEGORIES.len() * names.len()) {
                if generated >= count {
                    break 'outer;
                }

                let seed = generated + item_idx * 7 + unit;
                let product = generate_product(category, name, *has_length, seed);
                db.products().insert(&product).await?;
                generated += 1;
            }
        }
    }

    println!("Generated {} products", generated);
    println!();
    println!("Seed complete!");

    Ok(())
}

/// Generates a single product with realistic data.
fn generate_product(category: &str, name: &str, has_length: bool, seed: usize) -> Product {
    let now = Utc::now();

    let length_m = has_length.then(|| LENGTHS_M[seed % LENGTHS_M.len()]);

    // Cables get their length in the display name, like the real shelf labels.
    let full_name = match length_m {
        Some(l) => format!("{} {}m", name, l),
        None => name.to_string(),
    };

    Product {
        id: stockroom_db::repository::product::generate_product_id(),
        name: full_name,
        category: Some(category.to_string()),
        serial_number: (!has_length).then(|| format!("SN-{:06}", 31_000 + seed)),
        condition: Some("good".to_string()),
        location: Some(LOCATIONS[seed % LOCATIONS.len()].to_string()),
        status: ProductStatus::Available,
        length_m,
        folder_id: None,
        created_at: now,
        updated_at: now,
    }
}

//! # Seed Data Generator
//!
//! Populates the database with a cashier, a small menu and one demo sale.
//!
//! ## Usage
//! ```bash
//! # Use kasir.toml / KASIR__* settings
//! cargo run -p kasir-db --bin seed
//!
//! # Override the database path
//! cargo run -p kasir-db --bin seed -- --db ./data/kasir_dev.db
//!
//! # Seed the menu but skip the demo checkout
//! cargo run -p kasir-db --bin seed -- --no-demo
//! ```
//!
//! ## Generated Data
//! - Admin user `admin@kasir.local`
//! - Categories: makanan, minuman, snack
//! - A dozen products with mixed discounts and stock levels
//! - One walk-in transaction, printed as the JSON envelope a client
//!   would receive

use std::env;
use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kasir_core::{
    ApiResponse, CheckoutPayload, DeliveryType, DiscountType, NewCategory, NewLineItem,
    NewProduct, NewUser, PaymentStatus, PaymentType, UserRole,
};
use kasir_db::{AppConfig, Database, DbConfig};

const ADMIN_EMAIL: &str = "admin@kasir.local";

/// (category, [(name, price, discount type, discount amount, stock)])
const MENU: &[(&str, &[(&str, i64, DiscountType, i64, i64)])] = &[
    (
        "makanan",
        &[
            ("Nasi Goreng Spesial", 25_000, DiscountType::None, 0, 40),
            ("Ayam Geprek", 22_000, DiscountType::Percentage, 10, 30),
            ("Mie Ayam Bakso", 20_000, DiscountType::None, 0, 25),
            ("Sate Ayam", 30_000, DiscountType::Nominal, 5_000, 20),
            ("Gado Gado", 18_000, DiscountType::None, 0, 15),
        ],
    ),
    (
        "minuman",
        &[
            ("Es Teh Manis", 5_000, DiscountType::None, 0, 100),
            ("Es Jeruk", 8_000, DiscountType::None, 0, 60),
            ("Kopi Susu Gula Aren", 18_000, DiscountType::Percentage, 20, 50),
            ("Jus Alpukat", 15_000, DiscountType::None, 0, 3),
        ],
    ),
    (
        "snack",
        &[
            ("Pisang Goreng", 10_000, DiscountType::None, 0, 35),
            ("Tahu Crispy", 12_000, DiscountType::Nominal, 2_000, 30),
            ("Kentang Goreng", 15_000, DiscountType::None, 0, 0),
        ],
    ),
];

fn init_tracing(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load()?;
    let mut demo = true;

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database.path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--no-demo" => demo = false,
            "--help" | "-h" => {
                println!("Kasir Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: database.path setting)");
                println!("      --no-demo      Skip the demo checkout");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    init_tracing(&config);

    info!(path = %config.database.path.display(), "Seeding database");
    let db = Database::new(DbConfig::from_app_config(&config)).await?;

    let admin = match db.users().get_by_email(ADMIN_EMAIL).await? {
        Some(user) => user,
        None => {
            db.users()
                .create(&NewUser {
                    name: "Admin Kasir".into(),
                    email: ADMIN_EMAIL.into(),
                    role: UserRole::Admin,
                })
                .await?
        }
    };
    println!("✓ Admin user: {} ({})", admin.email, admin.id);

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Products already present, skipping menu");
        println!("⚠ Database already has {} products, skipping menu", existing);
    } else {
        let catalog = db.catalog();
        for (category_name, items) in MENU {
            let category = catalog
                .create_category(NewCategory {
                    name: (*category_name).to_string(),
                    status: true,
                })
                .await?;

            for (name, price, discount_type, discount_amount, stock) in *items {
                catalog
                    .create_product(NewProduct {
                        name: (*name).to_string(),
                        category_id: category.id.clone(),
                        description: None,
                        normal_price: *price,
                        cost_price: price * 6 / 10,
                        discount_type: *discount_type,
                        discount_amount: *discount_amount,
                        stock: *stock,
                        active: true,
                        available: true,
                    })
                    .await?;
            }
            println!("✓ Category '{}': {} products", category.name, items.len());
        }
    }

    if demo {
        let catalog = db.catalog();
        let nasi = catalog.get_product_by_name("Nasi Goreng Spesial").await?;
        let teh = catalog.get_product_by_name("Es Teh Manis").await?;

        let items = vec![
            NewLineItem {
                product_id: nasi.product.id.clone(),
                qty: 2,
                discount: 0,
                subtotal: nasi.effective_price * 2,
                notes: Some("pedas".into()),
            },
            NewLineItem {
                product_id: teh.product.id.clone(),
                qty: 2,
                discount: 0,
                subtotal: teh.effective_price * 2,
                notes: None,
            },
        ];

        let payload = CheckoutPayload {
            created_by: Some(admin.name.clone()),
            customer_name: "Pelanggan Umum".into(),
            table_number: Some(1),
            payment_type: PaymentType::Now,
            payment_method: Some("cash".into()),
            payment_status: Some(PaymentStatus::Success),
            payment: 100_000,
            transaction_date: None,
            delivery_type: DeliveryType::DineIn,
            ppn: 0,
            items,
        };

        let result = db.checkout().create_transaction(&admin.id, payload).await;
        let envelope = ApiResponse::from_result(result);
        println!();
        println!("Demo checkout:");
        println!("{}", serde_json::to_string_pretty(&envelope)?);

        println!();
        println!("Stock after checkout:");
        for product in [&nasi, &teh] {
            let stock = db.stock().available(&product.product.id).await?.unwrap_or(0);
            println!("  {:<24} {}", product.product.name, stock);
        }
    }

    db.close().await;
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

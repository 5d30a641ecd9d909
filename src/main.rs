//! Bakeshop command-line entry point.
//!
//! A thin operational shell over the library: inspect the reconciled
//! datasets from whichever backend the environment configures, or restore
//! the default catalog.

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bakeshop::{select_store, AdminService, Config, LocalStore};

/// Initialize the tracing subscriber for logging.
fn init_tracing() {
    // RUST_LOG controls the level (e.g. RUST_LOG=debug).
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let persist = LocalStore::new(&config.data_dir)?;
    let store = select_store(&config, &persist)?;
    let mut admin = AdminService::new(store, persist);
    info!("Bakeshop starting");

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--dump-products") => {
            let products = admin.products().await;
            println!("{}", serde_json::to_string_pretty(&products)?);
        }
        Some("--dump-orders") => {
            let orders = admin.orders().await;
            println!("{}", serde_json::to_string_pretty(&orders)?);
        }
        Some("--restore-defaults") => {
            admin.restore_defaults().await?;
            eprintln!("Default catalog restored.");
        }
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Usage: bakeshop [--dump-products | --dump-orders | --restore-defaults]");
            std::process::exit(2);
        }
        None => {
            let products = admin.products().await;
            let stats = admin.stats().await;
            println!("{} products in catalog", products.len());
            for product in &products {
                println!(
                    "  {:<20} Rs {:>8.2}  stock {:>3}  [{}]",
                    product.name,
                    product.price,
                    product.stock_quantity,
                    product.stock_status().label()
                );
            }
            println!(
                "{} orders, Rs {:.2} total revenue",
                stats.total_orders, stats.total_revenue
            );
            if let Some(top) = stats.top_product {
                println!("Top product: {} ({} sold)", top.name, top.quantity);
            }
        }
    }

    for notice in admin.take_notices() {
        eprintln!("! {}: {}", notice.title, notice.detail);
    }

    Ok(())
}

//! # Seed Data Generator
//!
//! Creates a demo trip and records one itemized dinner through the full
//! validation pipeline.
//!
//! ## Usage
//! ```bash
//! # Seed the configured database
//! cargo run -p tripsplit-service --bin seed
//!
//! # Specify database path
//! cargo run -p tripsplit-service --bin seed -- --db ./data/tripsplit.db
//!
//! # Use a specific config file
//! cargo run -p tripsplit-service --bin seed -- --config ./tripsplit.toml
//! ```
//!
//! ## Generated Data
//! - Session "Lisbon weekend" with members alice, bob and carol
//! - "Dinner at Ramiro" (EUR 60.00, paid by alice) split across three items

use chrono::Utc;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use tripsplit_core::{DistributionEntry, ExpenditureRequest, Fraction, ItemRequest};
use tripsplit_db::Database;
use tripsplit_service::{init_tracing, BroadcastNotifier, ExpenditureService, ServiceConfig};

const MEMBERS: &[&str] = &["alice", "bob", "carol"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
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
                println!("TripSplit Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (overrides config)");
                println!("  -c, --config <PATH>    Config file path");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = ServiceConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }
    init_tracing(&config.logging.filter);

    println!("TripSplit Seed Data Generator");
    println!("=============================");
    println!("Database: {}", config.database.path.display());
    println!();

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(config.db_config()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Session and members
    let session = db.sessions().create("Lisbon weekend").await?;
    for member in MEMBERS {
        db.sessions().add_member(&session.session_id, member).await?;
    }
    info!(session_id = %session.session_id, "Demo session created");
    println!("✓ Session {} with {} members", session.session_id, MEMBERS.len());

    let notifier = Arc::new(BroadcastNotifier::new(config.notifications.channel_capacity));
    let service = ExpenditureService::new(db.clone(), config.reference_data(), notifier);

    // 60.00 = grilled fish 24 (alice, bob) + prawns 30 (all three) + wine 6 (carol)
    // alice 12 + 10, bob 12 + 10, carol 10 + 6
    let request = ExpenditureRequest {
        session_id: session.session_id.clone(),
        expenditure_id: None,
        name: "Dinner at Ramiro".to_string(),
        total_price: 60.0,
        currency_code: "EUR".to_string(),
        category: "food".to_string(),
        payed_at: Utc::now().timestamp_millis(),
        payers_id: vec!["alice".to_string()],
        distribution: vec![
            share("alice", 22),
            share("bob", 22),
            share("carol", 16),
        ],
        items: vec![
            item("Grilled fish", 24.0, &["alice", "bob"]),
            item("Prawns", 30.0, &["alice", "bob", "carol"]),
            item("Vinho verde", 6.0, &["carol"]),
        ],
    };

    let record = match service.save_expenditure("alice", &request).await {
        Ok(record) => record,
        Err(e) => {
            eprintln!("Failed to save expenditure: {}", e);
            db.close().await;
            return Err(e.into());
        }
    };

    println!("✓ Expenditure {} saved", record.expenditure_id);
    println!();
    println!("{}", serde_json::to_string_pretty(&record)?);

    db.close().await;
    println!();
    println!("Done.");

    Ok(())
}

fn share(member_id: &str, amount: i64) -> DistributionEntry {
    DistributionEntry {
        member_id: member_id.to_string(),
        amount: Fraction {
            numerator: amount,
            denominator: 1,
        },
    }
}

fn item(label: &str, price: f64, members: &[&str]) -> ItemRequest {
    ItemRequest {
        label: label.to_string(),
        price,
        allocations: members.iter().map(|m| m.to_string()).collect(),
    }
}

use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rust_decimal::Decimal;

use tradepost_rs::{
    Transaction, TransactionStatus, UserId, count_transactions, count_users, create_transaction,
    open_db, set_scammer_flag, transition_transaction,
};

/// A utility for creating a test database for the tradepost ledger server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = open_db(output_path)?;

    let alice = UserId::new(1001);
    let bob = UserId::new(1002);
    let mallory = UserId::new(1003);

    println!("Creating test transactions...");

    let sword = create_transaction(
        Transaction::build(alice, "Sword", 2, Decimal::new(1000, 2))
            .buyer_name("Alice")
            .creator(Some(bob))
            .creator_name("Bob"),
        &conn,
    )?;
    transition_transaction(sword.id, TransactionStatus::Completed, &conn)?;

    let shield = create_transaction(
        Transaction::build(bob, "Shield", 1, Decimal::new(2550, 2)).creator(Some(alice)),
        &conn,
    )?;
    transition_transaction(shield.id, TransactionStatus::Cancelled, &conn)?;

    create_transaction(
        Transaction::build(alice, "Gem", 3, Decimal::new(150, 2)),
        &conn,
    )?;

    create_transaction(
        Transaction::build(mallory, "Rare mount", 1, Decimal::new(99999, 2))
            .buyer_name("Mallory")
            .creator(Some(bob)),
        &conn,
    )?;
    set_scammer_flag(mallory, true, Some("Charged back three purchases"), &conn)?;

    println!(
        "Success! Created {} users and {} transactions.",
        count_users(&conn)?,
        count_transactions(&conn)?
    );

    Ok(())
}

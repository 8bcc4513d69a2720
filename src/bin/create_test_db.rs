use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use ledgerly::{
    CategoryKind, CategoryName, Currency, NewUser, PasswordHash, Transaction, Username,
    ValidatedPassword, create_category, create_transaction, create_user, initialize_db,
};

/// A utility for creating a demo database for the Ledgerly server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// The demo categories and the amount of each transaction recorded against them.
const DEMO_CATEGORIES: [(&str, CategoryKind, f64); 6] = [
    ("Salary", CategoryKind::Income, 2450.0),
    ("Side project", CategoryKind::Income, 180.0),
    ("Rent", CategoryKind::Expense, 950.0),
    ("Groceries", CategoryKind::Expense, 64.35),
    ("Transport", CategoryKind::Expense, 23.8),
    ("Eating out", CategoryKind::Expense, 31.5),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating test user 'demo' with the password 'test'...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(
        NewUser {
            username: Username::new_unchecked("demo"),
            email: None,
            password_hash,
            currency: Currency::GBP,
        },
        &connection,
    )?;

    println!("Creating categories and transactions...");

    let today = OffsetDateTime::now_utc().date();
    let mut transaction_count = 0;

    for (name, kind, amount) in DEMO_CATEGORIES {
        let category = create_category(user.id, CategoryName::new(name)?, kind, &connection)?;

        // Income once a month, rent once a month, everything else every few days.
        let step_days = match (kind, name) {
            (CategoryKind::Income, _) | (_, "Rent") => 30,
            _ => 4,
        };

        for days_ago in (0..180).step_by(step_days) {
            let date = today - Duration::days(days_ago);
            let new_transaction = Transaction::build(category.id, kind, amount, date, name)
                .finalize(today)?;

            create_transaction(user.id, new_transaction, &connection)?;
            transaction_count += 1;
        }
    }

    println!("Created {transaction_count} transactions.");
    println!("Success!");

    Ok(())
}

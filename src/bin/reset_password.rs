use std::{io, path::Path, process::ExitCode};

use clap::Parser;
use rusqlite::Connection;

use ledgerly::{
    PasswordHash, User, ValidatedPassword, get_user_by_username, update_user_password,
};

/// Set a new password for a Ledgerly account, e.g. when its owner has forgotten it.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The username of the account to reset.
    #[arg(long, short)]
    username: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match reset_password(&args) {
        Ok(true) => {
            println!("Password updated for {}.", args.username);
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("Password left unchanged.");
            ExitCode::SUCCESS
        }
        Err(message) => {
            print_error(&message);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the password was changed.
fn reset_password(args: &Args) -> Result<bool, String> {
    let db_path = Path::new(&args.db_path);
    check_db_path(db_path)?;

    let connection = Connection::open(db_path)
        .map_err(|error| format!("could not open {}: {error}", db_path.display()))?;

    let user = get_user_by_username(&args.username, &connection)
        .map_err(|error| format!("could not look up user: {error}"))?
        .ok_or_else(|| format!("there is no user called \"{}\"", args.username))?;

    let Some(password_hash) = choose_password(&user)? else {
        return Ok(false);
    };

    update_user_password(user.id, &password_hash, &connection)
        .map_err(|error| format!("could not save the new password: {error}"))?;

    Ok(true)
}

fn check_db_path(db_path: &Path) -> Result<(), String> {
    if db_path.extension().is_none_or(|extension| extension.is_empty()) {
        return Err(
            "database path must include a file extension (e.g., 'ledgerly.db')".to_owned(),
        );
    }

    if !db_path.is_file() {
        return Err(format!("no database file at {}", db_path.display()));
    }

    Ok(())
}

/// Ask for a new password until one is strong enough and typed the same way twice.
///
/// Returns `None` if stdin is closed before that happens.
fn choose_password(user: &User) -> Result<Option<PasswordHash>, String> {
    let username = user.username.as_ref();
    println!("Choosing a new password for {username}.");

    loop {
        println!();

        let Some(first_attempt) = read_password("New password: ")? else {
            return Ok(None);
        };

        let password = match ValidatedPassword::new(&first_attempt, &[username]) {
            Ok(password) => password,
            Err(error) => {
                print_error(&error.to_string());
                continue;
            }
        };

        let Some(second_attempt) = read_password("Confirm new password: ")? else {
            return Ok(None);
        };

        if first_attempt != second_attempt {
            print_error("the passwords do not match, try again");
            continue;
        }

        return PasswordHash::new(password, PasswordHash::DEFAULT_COST)
            .map(Some)
            .map_err(|error| format!("could not hash password: {error}"));
    }
}

fn read_password(prompt: &str) -> Result<Option<String>, String> {
    match rpassword::prompt_password(prompt) {
        Ok(password) => Ok(Some(password)),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(error) => Err(format!("could not read password: {error}")),
    }
}

/// Print `message` in bold red with its first letter capitalised.
fn print_error(message: &str) {
    let mut chars = message.chars();
    let message: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };

    eprintln!("\x1b[31;1m{message}\x1b[0m");
}

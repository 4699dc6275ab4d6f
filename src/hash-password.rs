//! A small CLI tool producing the `admin_password_hash` configuration value.
//! This uses the server's own hashing, so its output is always accepted by
//! the admin login.

use clap::{Arg, ArgAction, ArgMatches, Command};

use assembleia_backend::model::api::admin::{hash_password, verify_password};

const PROGRAM_NAME: &str = "hash-password";

const ABOUT_TEXT: &str = "Hash an admin password for `admin_password_hash`.

With --check, verify a password against an existing hash instead.

EXIT CODES:
     0: Success (or the password matched).
   255: Ran successfully, but the password did not match.
 Other: Error.";

const PASSWORD: &str = "PASSWORD";
const CHECK: &str = "check";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new(PASSWORD)
                .help("The admin password")
                .action(ArgAction::Set)
                .required(true),
        )
        .arg(
            Arg::new(CHECK)
                .long(CHECK)
                .value_name("HASH")
                .help("An encoded hash to check the password against")
                .action(ArgAction::Set),
        )
}

/// Run the program, returning the exit code.
fn run(args: &ArgMatches) -> u8 {
    // Unwrap is safe as the argument is required.
    let password = args.get_one::<String>(PASSWORD).unwrap();

    match args.get_one::<String>(CHECK) {
        Some(hash) => match verify_password(hash, password) {
            Ok(true) => {
                println!("Password matches");
                0
            }
            Ok(false) => {
                println!("Password does not match");
                255
            }
            Err(e) => {
                eprintln!("Invalid hash: {e}");
                1
            }
        },
        None => match hash_password(password) {
            Ok(hash) => {
                println!("{hash}");
                0
            }
            Err(e) => {
                eprintln!("Failed to hash password: {e}");
                1
            }
        },
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}

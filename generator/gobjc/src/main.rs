//! Generic-object database CLI.
//!
//! Offline inspection and repair of the generation databases written by a
//! generation session.

mod commands;
mod logging;

use commands::{inspect_database, verify_database};

fn main() {
    logging::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "inspect" => {
            let Some(db_file) = args.get(2) else {
                eprintln!("Usage: gobj inspect <db-file>");
                std::process::exit(1);
            };
            inspect_database(db_file);
        }
        "verify" => {
            let (Some(db_file), Some(modules_dir)) = (args.get(2), args.get(3)) else {
                eprintln!("Usage: gobj verify <db-file> <modules-dir>");
                eprintln!();
                eprintln!("Removes instantiations whose generated module no longer exists");
                eprintln!("and saves the healed database.");
                std::process::exit(1);
            };
            verify_database(db_file, modules_dir);
        }
        "help" | "--help" | "-h" => print_usage(),
        "version" | "--version" | "-V" => {
            println!("gobj {}", env!("CARGO_PKG_VERSION"));
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("gobj - generic-object generation database tools");
    println!();
    println!("Usage: gobj <command> [args]");
    println!();
    println!("Commands:");
    println!("  inspect <db-file>                Print generic definitions and instantiations");
    println!("  verify <db-file> <modules-dir>   Drop entries whose module file is gone");
    println!("  help                             Show this message");
    println!("  version                          Show version information");
    println!();
    println!("Environment:");
    println!("  GOBJ_LOG        Log filter (falls back to RUST_LOG), e.g. GOBJ_LOG=debug");
    println!("  GOBJ_LOG_TREE   Print logs as an indented span tree");
}

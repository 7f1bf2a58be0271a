use std::env;
use std::error::Error;
use std::path::PathBuf;

use glob::glob;
use storefront_core::{Catalog, StorefrontConfig};

const CATALOG_PATTERNS: &[&str] = &[
    "storefront_core/src/data/catalog*.json",
    "integration_tests/tests/fixtures/*catalog*.json",
];

const CONFIG_PATTERNS: &[&str] = &[
    "storefront_core/src/data/storefront_config*.json",
    "integration_tests/tests/fixtures/*config*.json",
];

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("validate-data") => validate_data(),
        Some("help") | None => {
            print_usage();
            Ok(())
        }
        Some(cmd) => {
            eprintln!("Unknown xtask '{cmd}'.");
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: cargo xtask validate-data");
    eprintln!("       cargo xtask help");
}

fn matching(patterns: &[&str]) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        for entry in glob(pattern)? {
            paths.push(entry?);
        }
    }
    Ok(paths)
}

fn validate_data() -> Result<(), Box<dyn Error>> {
    let mut failures = 0usize;

    let catalogs = matching(CATALOG_PATTERNS)?;
    if catalogs.is_empty() {
        return Err("no catalog files found; run from the workspace root".into());
    }
    for path in &catalogs {
        match Catalog::from_file(path) {
            Ok(catalog) => println!("ok      {} ({} items)", path.display(), catalog.len()),
            Err(err) => {
                failures += 1;
                eprintln!("invalid {}: {err}", path.display());
            }
        }
    }

    for path in &matching(CONFIG_PATTERNS)? {
        match StorefrontConfig::from_file(path) {
            Ok(_) => println!("ok      {}", path.display()),
            Err(err) => {
                failures += 1;
                eprintln!("invalid {}: {err}", path.display());
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} data file(s) failed validation").into());
    }
    Ok(())
}

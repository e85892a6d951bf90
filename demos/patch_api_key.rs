//! Download an extension, inject an API key, print the launch flag.
//!
//! Usage:
//!   cargo run --example patch_api_key -- <web-store-link> <api-key>
//!   cargo run --example patch_api_key -- <web-store-link> <api-key> --force
//!   cargo run --example patch_api_key -- <web-store-link> <api-key> --debug

// ============================================================================
// Imports
// ============================================================================

use chrome_extension::{Error, Extension, ExtensionOptions, Result};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

/// Placeholder many extensions ship in their config scripts.
const PLACEHOLDER: &str = "YOUR_API_KEY";

// ============================================================================
// Main
// ============================================================================

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let debug = args.iter().any(|a| a == "--debug");
    let force = args.iter().any(|a| a == "--force");
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    init_logging(debug);

    let [link, api_key] = positional.as_slice() else {
        eprintln!("Usage: patch_api_key <web-store-link> <api-key> [--force] [--debug]");
        std::process::exit(2);
    };

    if let Err(e) = run(link, api_key, force) {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

fn run(link: &str, api_key: &str, force: bool) -> Result<()> {
    let extension = Extension::builder()
        .link(link)
        .force_update(force)
        .option("api_key", api_key)
        .configurator(inject_api_key)
        .build()?;

    println!("[Setup] {} ({})", extension.name(), extension.id());

    let flag = extension.load_flag()?;
    println!("        ✓ {flag}");

    Ok(())
}

// ============================================================================
// Configurator
// ============================================================================

/// Replaces the placeholder in every script that contains it.
fn inject_api_key(extension: &Extension, options: &ExtensionOptions) -> Result<()> {
    let api_key = options
        .get_str("api_key")
        .ok_or_else(|| Error::patch("api_key option is required"))?;

    let mut replaced = 0;
    for file in extension.js_files()? {
        replaced += file.replace_all(PLACEHOLDER, api_key)?;
    }

    println!("        ✓ Replaced {replaced} placeholder(s)");
    Ok(())
}

// ============================================================================
// Logging
// ============================================================================

fn init_logging(debug: bool) {
    let filter = if debug {
        "chrome_extension=debug"
    } else {
        "chrome_extension=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

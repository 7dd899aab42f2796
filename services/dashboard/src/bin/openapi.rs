//! services/dashboard/src/bin/openapi.rs
//!
//! Dumps the dashboard's OpenAPI document without starting the server.
//! `openapi [PATH]` writes to PATH (default `openapi.json`); `openapi -` prints to stdout.

use dashboard_lib::web::openapi_json;
use std::io::Write;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let document = openapi_json()?;
    match std::env::args().nth(1).as_deref() {
        Some("-") => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(document.as_bytes())?;
            writeln!(stdout)?;
        }
        target => {
            let target = target.unwrap_or(DEFAULT_OUTPUT);
            std::fs::write(target, document)?;
            eprintln!("Wrote OpenAPI document to {target}");
        }
    }
    Ok(())
}

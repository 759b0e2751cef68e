//! services/api/src/bin/openapi.rs
//!
//! Dumps the study planner's OpenAPI document.
//!
//! Usage: `openapi [PATH]`. Writes to `openapi.json` by default; `-` prints to stdout.

use api_lib::web::rest::ApiDoc;
use std::io::Write;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let target = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let document = ApiDoc::openapi().to_pretty_json()?;

    if target == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(document.as_bytes())?;
        stdout.write_all(b"\n")?;
    } else {
        std::fs::write(&target, document)?;
        eprintln!("OpenAPI document written to {}", target);
    }
    Ok(())
}

use crate::commands::output;
use crate::{FilterArgs, OutputFormat};
use anyhow::{Context, Result, anyhow};
use ordex_core::AppState;
use ordex_core::codec::{self, RELAY_PARAM};
use std::io::Read;
use std::path::{Path, PathBuf};
use url::Url;

/// Decode a relay payload and print the orders it carries.
///
/// `input` is a file, `-` for stdin, a dashboard URL, or the payload itself.
pub fn execute(
    input: &str,
    filters: &FilterArgs,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let raw = read_input(input)?;
    let payload = payload_of(raw.trim())?;

    let records = codec::decode(&payload).context("Failed to decode payload")?;
    tracing::info!("Decoded {} orders", records.len());

    let mut state = AppState::new();
    state.ingest(records);
    output::emit(&state, &filters.to_filter(), format, output.as_deref())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read payload from stdin")?;
        return Ok(buf);
    }

    let path = Path::new(input);
    if path.is_file() {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    Ok(input.to_string())
}

/// A URL yields its relay parameter; anything else is taken as the payload
fn payload_of(text: &str) -> Result<String> {
    match Url::parse(text) {
        Ok(url) => codec::payload_from_url(&url)
            .ok_or_else(|| anyhow!("URL has no `{}` parameter", RELAY_PARAM)),
        Err(_) => Ok(text.to_string()),
    }
}

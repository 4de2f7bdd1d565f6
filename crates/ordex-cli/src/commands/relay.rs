use anyhow::{Context, Result};
use ordex_core::{OrderRecord, codec};
use std::io::Read;
use std::path::Path;
use url::Url;

/// Encode a JSON order list into a dashboard URL
pub fn execute(dashboard: &Url, input: Option<&Path>) -> Result<()> {
    let json = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read orders from stdin")?;
            buf
        }
    };

    let records: Vec<OrderRecord> =
        serde_json::from_str(&json).context("Input is not a JSON array of orders")?;
    tracing::info!("Relaying {} orders to {}", records.len(), dashboard);

    println!("{}", codec::relay_url(dashboard, &records)?);
    Ok(())
}

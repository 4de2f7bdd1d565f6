use clap::{Args, ValueEnum};
use ordex_core::export::ExportFormat;
use ordex_core::filter::OrderFilter;

pub mod commands;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Pretty => "pretty",
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
        }
    }

    /// File format behind this output, `None` for the terminal table
    pub fn export_format(&self) -> Option<ExportFormat> {
        match self {
            OutputFormat::Pretty => None,
            OutputFormat::Csv => Some(ExportFormat::Csv),
            OutputFormat::Tsv => Some(ExportFormat::Tsv),
            OutputFormat::Json => Some(ExportFormat::Json),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Backend {
    /// Plain HTTP client with a cookie jar
    Http,
    /// Headless Chrome driven over CDP
    Browser,
}

/// Record filters shared by commands that print orders
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep orders for this client (exact match)
    #[arg(long)]
    pub client: Option<String>,

    /// Keep orders delivered to this destination (exact match)
    #[arg(long)]
    pub destination: Option<String>,

    /// Case-insensitive text search across all fields
    #[arg(long)]
    pub search: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> OrderFilter {
        let mut filter = OrderFilter::new();
        if let Some(client) = &self.client {
            filter = filter.with_client(client);
        }
        if let Some(destination) = &self.destination {
            filter = filter.with_destination(destination);
        }
        if let Some(search) = &self.search {
            filter = filter.with_search(search);
        }
        filter
    }
}

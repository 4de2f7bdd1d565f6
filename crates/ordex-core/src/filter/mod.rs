mod summary;

pub use summary::{OrderSummary, parse_amount, parse_display_date};

use crate::record::OrderRecord;

/// Filter criteria for order records
///
/// All conditions are combined with AND logic. Filtering never mutates the
/// source list; matching records are cloned.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrderFilter {
    /// Exact match on `client`
    pub client: Option<String>,
    /// Exact match on `livrer_a`
    pub destination: Option<String>,
    /// Case-insensitive substring over every field
    pub search: Option<String>,
}

impl OrderFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() {
            None
        } else {
            Some(search.to_lowercase())
        };
        self
    }

    pub fn is_empty(&self) -> bool {
        self.client.is_none() && self.destination.is_none() && self.search.is_none()
    }

    pub fn matches(&self, record: &OrderRecord) -> bool {
        if let Some(client) = &self.client {
            if record.client != *client {
                return false;
            }
        }
        if let Some(destination) = &self.destination {
            if record.livrer_a != *destination {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            if !record.values().any(|v| v.to_lowercase().contains(needle)) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, records: &[OrderRecord]) -> Vec<OrderRecord> {
        let filtered: Vec<OrderRecord> = records.iter().filter(|r| self.matches(r)).cloned().collect();
        tracing::debug!("Filter kept {} of {} records", filtered.len(), records.len());
        filtered
    }
}

/// Distinct values of `client` and `livrer_a`, sorted, for filter pickers
pub fn distinct_values(records: &[OrderRecord]) -> (Vec<String>, Vec<String>) {
    let mut clients: Vec<String> = records.iter().map(|r| r.client.clone()).collect();
    let mut destinations: Vec<String> = records.iter().map(|r| r.livrer_a.clone()).collect();
    clients.sort();
    clients.dedup();
    destinations.sort();
    destinations.dedup();
    (clients, destinations)
}

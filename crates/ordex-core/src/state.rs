use crate::filter::{OrderFilter, OrderSummary};
use crate::record::OrderRecord;
use chrono::{DateTime, Local, NaiveDate};

/// Application state shared by the operations of one run.
///
/// Empty until the first ingest; `reset` returns it to that state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    orders: Option<Vec<OrderRecord>>,
    last_update: Option<DateTime<Local>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current record list
    pub fn ingest(&mut self, orders: Vec<OrderRecord>) {
        tracing::debug!("State: ingesting {} records", orders.len());
        self.orders = Some(orders);
        self.last_update = Some(Local::now());
    }

    pub fn reset(&mut self) {
        self.orders = None;
        self.last_update = None;
    }

    pub fn has_orders(&self) -> bool {
        self.orders.is_some()
    }

    pub fn orders(&self) -> &[OrderRecord] {
        self.orders.as_deref().unwrap_or(&[])
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    /// Filtered copy of the current records
    pub fn filtered(&self, filter: &OrderFilter) -> Vec<OrderRecord> {
        filter.apply(self.orders())
    }

    pub fn summary(&self, filter: &OrderFilter, today: NaiveDate) -> OrderSummary {
        OrderSummary::compute(&self.filtered(filter), today)
    }
}

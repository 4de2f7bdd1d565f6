use crate::record::OrderRecord;
use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

lazy_static! {
    static ref AMOUNT_NOISE: Regex = Regex::new(r"[^0-9,.\-]").unwrap();
}

/// Aggregate metrics over a record list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub count: usize,
    pub total_amount: f64,
    /// Amounts that could not be read as numbers
    pub unparsed_amounts: usize,
    /// Orders whose delivery date is today or later
    pub upcoming_deliveries: usize,
    pub distinct_clients: usize,
}

impl OrderSummary {
    pub fn compute(records: &[OrderRecord], today: NaiveDate) -> Self {
        let mut total_amount = 0.0;
        let mut unparsed_amounts = 0;

        for record in records {
            match parse_amount(&record.montant_calcule) {
                Some(amount) => total_amount += amount,
                None => unparsed_amounts += 1,
            }
        }

        let upcoming_deliveries = records
            .iter()
            .filter_map(|r| parse_display_date(&r.livrer_le))
            .filter(|d| *d >= today)
            .count();

        let distinct_clients = records
            .iter()
            .map(|r| r.client.as_str())
            .collect::<HashSet<_>>()
            .len();

        Self {
            count: records.len(),
            total_amount,
            unparsed_amounts,
            upcoming_deliveries,
            distinct_clients,
        }
    }
}

/// Read a display amount such as `"1 234,50 €"` or `"1.234,50"`.
///
/// A comma is the decimal separator; when one is present, dots are taken as
/// thousands separators.
pub fn parse_amount(display: &str) -> Option<f64> {
    let digits = AMOUNT_NOISE.replace_all(display, "");
    if digits.is_empty() {
        return None;
    }

    let canonical = if digits.contains(',') {
        digits.replace('.', "").replace(',', ".")
    } else {
        digits.into_owned()
    };

    canonical.parse::<f64>().ok()
}

/// Read a display date (`dd/mm/yyyy`, `dd/mm/yyyy HH:MM` or `yyyy-mm-dd`)
pub fn parse_display_date(display: &str) -> Option<NaiveDate> {
    let display = display.trim();
    if display.is_empty() {
        return None;
    }

    for fmt in ["%d/%m/%Y %H:%M", "%d/%m/%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(display, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%d/%m/%Y", "%Y-%m-%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(display, fmt) {
            return Some(d);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(montant: &str, livrer_le: &str, client: &str) -> OrderRecord {
        OrderRecord {
            numero: "ORD12345".to_string(),
            client: client.to_string(),
            livrer_le: livrer_le.to_string(),
            montant_calcule: montant.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount("12,50"), Some(12.5));
        assert_eq!(parse_amount("1 234,50 €"), Some(1234.5));
        assert_eq!(parse_amount("1\u{a0}234,50\u{a0}€"), Some(1234.5));
        assert_eq!(parse_amount("1.234,50"), Some(1234.5));
        assert_eq!(parse_amount("99.90"), Some(99.9));
        assert_eq!(parse_amount("-3,00"), Some(-3.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_parse_display_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        assert_eq!(parse_display_date("03/02/2025"), Some(expected));
        assert_eq!(parse_display_date("03/02/2025 14:30"), Some(expected));
        assert_eq!(parse_display_date("2025-02-03"), Some(expected));
        assert_eq!(parse_display_date("bientôt"), None);
    }

    #[test]
    fn test_summary() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        let records = vec![
            record("10,00 €", "03/02/2025", "A"),
            record("2,50", "01/02/2025", "B"),
            record("?", "10/02/2025", "A"),
        ];
        let summary = OrderSummary::compute(&records, today);

        assert_eq!(summary.count, 3);
        assert!((summary.total_amount - 12.5).abs() < f64::EPSILON);
        assert_eq!(summary.unparsed_amounts, 1);
        assert_eq!(summary.upcoming_deliveries, 2);
        assert_eq!(summary.distinct_clients, 2);
    }

    #[test]
    fn test_summary_of_nothing() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        let summary = OrderSummary::compute(&[], today);

        assert_eq!(summary.count, 0);
        assert_eq!(summary.total_amount, 0.0);
    }
}

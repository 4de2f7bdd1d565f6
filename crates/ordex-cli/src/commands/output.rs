use crate::OutputFormat;
use anyhow::{Result, anyhow};
use chrono::{DateTime, Local};
use console::style;
use ordex_core::export::{ExportFormat, OrderWriter};
use ordex_core::filter::{OrderFilter, OrderSummary};
use ordex_core::{AppState, OrderRecord, StepLog, StepStatus};
use std::path::Path;

const MAX_CELL_WIDTH: usize = 32;

/// Print or write the filtered orders held in `state`
pub fn emit(
    state: &AppState,
    filter: &OrderFilter,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let records = state.filtered(filter);

    match (format.export_format(), output) {
        (None, None) => {
            let summary = state.summary(filter, Local::now().date_naive());
            print_pretty(&records, &summary, state.last_update());
        }
        (Some(export), None) => {
            let rendered = OrderWriter::to_string(&records, export)?;
            print!("{}", rendered);
            if !rendered.ends_with('\n') {
                println!();
            }
        }
        (export, Some(path)) => {
            let export = export
                .or_else(|| ExportFormat::from_path(path))
                .ok_or_else(|| {
                    anyhow!(
                        "Cannot infer export format from {}; pass --format csv, tsv or json",
                        path.display()
                    )
                })?;
            OrderWriter::to_file(&records, path, export)?;
            eprintln!(
                "{} Wrote {} orders to {}",
                style("✓").green(),
                records.len(),
                path.display()
            );
        }
    }

    Ok(())
}

fn print_pretty(records: &[OrderRecord], summary: &OrderSummary, last_update: Option<DateTime<Local>>) {
    println!("\n{}", style("Orders").bold().cyan());

    if records.is_empty() {
        println!("  {}", style("No orders").dim());
    } else {
        let headers = ["Numero", "Client", "Livrer a", "Livrer le", "Montant", "Statut"];
        let rows: Vec<[&str; 6]> = records
            .iter()
            .map(|r| {
                [
                    r.numero.as_str(),
                    r.client.as_str(),
                    r.livrer_a.as_str(),
                    r.livrer_le.as_str(),
                    r.montant_calcule.as_str(),
                    r.statut.as_str(),
                ]
            })
            .collect();

        let mut widths = headers.map(|h| h.chars().count());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count().min(MAX_CELL_WIDTH));
            }
        }

        let header_line: Vec<String> = headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:<w$}", h, w = *w))
            .collect();
        println!("  {}", style(header_line.join("  ")).bold());

        for row in &rows {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{:<w$}", truncate(cell, *w), w = *w))
                .collect();
            println!("  {}", line.join("  "));
        }
    }

    println!("\n{}", style("Summary").bold());
    println!("  Orders:             {}", style(summary.count).yellow());
    println!("  Total amount:       {}", style(format_amount(summary.total_amount)).green());
    if summary.unparsed_amounts > 0 {
        println!(
            "  Unreadable amounts: {}",
            style(summary.unparsed_amounts).red()
        );
    }
    println!("  Upcoming delivery:  {}", summary.upcoming_deliveries);
    println!("  Clients:            {}", summary.distinct_clients);
    if let Some(at) = last_update {
        println!("  Updated:            {}", style(at.format("%d/%m/%Y %H:%M")).dim());
    }
    println!();
}

/// Step log goes to stderr so exported data on stdout stays clean
pub fn print_steps(log: &StepLog) {
    eprintln!("\n{}", style("Steps").bold());
    for entry in log.entries() {
        let status = match entry.status {
            StepStatus::Success => style(entry.status.as_str()).green(),
            StepStatus::Error => style(entry.status.as_str()).red(),
            StepStatus::Warning => style(entry.status.as_str()).yellow(),
            StepStatus::Info => style(entry.status.as_str()).dim(),
        };
        eprintln!(
            "  {} {:<10} {:<8} {}",
            style(entry.timestamp.format("%H:%M:%S")).dim(),
            entry.step,
            status,
            entry.details
        );
    }
    eprintln!();
}

/// `1234.5` -> `"1 234,50"`
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{},{}", sign, grouped, frac_part)
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

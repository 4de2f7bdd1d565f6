mod columns;

pub use columns::{ColumnLayout, ColumnMap, MIN_DATA_CELLS};

use crate::normalize::element_text;
use crate::record::{OrderField, OrderRecord};
use crate::{Error, Result};
use scraper::{ElementRef, Html, Selector};

/// Upper bound on a header `colspan`, guards against absurd attribute values
const MAX_COLSPAN: usize = 64;

/// Result of parsing one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableParse {
    pub records: Vec<OrderRecord>,
    pub rows_seen: usize,
    pub skipped_short: usize,
    pub skipped_invalid: usize,
}

/// Parse the orders table of a listing page.
///
/// Uses the first `<tbody>` in the document. Returns `TableNotFound` when the
/// page has none; an empty body yields an empty parse. Rows that fail to map
/// are counted and dropped, never reported upwards.
pub fn parse_orders(html: &str, layout: &ColumnLayout) -> Result<TableParse> {
    let document = Html::parse_document(html);
    let tbody_sel = Selector::parse("tbody").map_err(|e| Error::Config(e.to_string()))?;

    let tbody = document.select(&tbody_sel).next().ok_or(Error::TableNotFound)?;
    let rows: Vec<Vec<String>> = child_elements(tbody, "tr")
        .map(|row| child_elements(row, "td").map(element_text).collect())
        .collect();

    let mut map = layout.resolve(&header_texts(tbody));
    let positional = layout.positional();
    if map != positional && numero_always_empty(&rows, &map) {
        tracing::warn!(
            "Order number column from headers is empty on every row, using positional layout"
        );
        map = positional;
    }

    let mut parse = TableParse::default();
    for (idx, cells) in rows.iter().enumerate() {
        parse.rows_seen += 1;

        match parse_row(idx + 1, cells, &map) {
            Ok(record) => parse.records.push(record),
            Err(e) => {
                tracing::debug!("{}", e);
                if cells.len() < map.min_cells() {
                    parse.skipped_short += 1;
                } else {
                    parse.skipped_invalid += 1;
                }
            }
        }
    }

    tracing::debug!(
        "Parsed {} rows: {} records, {} short, {} invalid",
        parse.rows_seen,
        parse.records.len(),
        parse.skipped_short,
        parse.skipped_invalid
    );

    Ok(parse)
}

/// Map one row's normalized cells to a record, applying the validity gate
pub fn parse_row(row: usize, cells: &[String], map: &ColumnMap) -> Result<OrderRecord> {
    if cells.len() < map.min_cells() {
        return Err(Error::RowParse {
            row,
            reason: format!("{} cells, expected at least {}", cells.len(), map.min_cells()),
        });
    }

    let mut record = OrderRecord::default();
    for field in OrderField::ALL {
        record.set(field, map.get(cells, field).to_string());
    }

    if !record.is_valid() {
        return Err(Error::RowParse {
            row,
            reason: format!("invalid order number {:?}", record.numero),
        });
    }

    Ok(record)
}

/// True when the page has data rows and none of them has an order number under `map`
fn numero_always_empty(rows: &[Vec<String>], map: &ColumnMap) -> bool {
    let mut data = rows.iter().filter(|cells| cells.len() >= map.min_cells()).peekable();
    data.peek().is_some() && data.all(|cells| map.get(cells, OrderField::Numero).is_empty())
}

/// Header cell texts of the table owning `tbody`, one slot per column.
///
/// A cell spanning several columns puts its text in the last of them; the
/// leading columns of a merged header hold checkboxes or icons.
fn header_texts(tbody: ElementRef<'_>) -> Vec<String> {
    let table = tbody
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table");

    let Some(table) = table else {
        return Vec::new();
    };

    child_elements(table, "thead")
        .next()
        .and_then(|thead| child_elements(thead, "tr").next())
        .map(|tr| {
            tr.children()
                .filter_map(ElementRef::wrap)
                .filter(|e| matches!(e.value().name(), "th" | "td"))
                .flat_map(|cell| {
                    let span = cell
                        .value()
                        .attr("colspan")
                        .and_then(|s| s.trim().parse::<usize>().ok())
                        .unwrap_or(1)
                        .clamp(1, MAX_COLSPAN);
                    let mut slots = vec![String::new(); span - 1];
                    slots.push(element_text(cell));
                    slots
                })
                .collect()
        })
        .unwrap_or_default()
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |e| e.value().name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> String {
        let tds: String = cells.iter().map(|c| format!("<td>{}</td>", c)).collect();
        format!("<tr>{}</tr>", tds)
    }

    fn page(rows: &[String]) -> String {
        format!(
            "<html><body><table><tbody>{}</tbody></table></body></html>",
            rows.concat()
        )
    }

    #[test]
    fn test_missing_tbody_is_table_not_found() {
        let result = parse_orders("<html><body><p>Aucune commande</p></body></html>", &ColumnLayout::default());
        assert!(matches!(result, Err(Error::TableNotFound)));
    }

    #[test]
    fn test_empty_tbody_yields_empty_list() {
        let parse = parse_orders(&page(&[]), &ColumnLayout::default()).unwrap();

        assert!(parse.records.is_empty());
        assert_eq!(parse.rows_seen, 0);
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let html = page(&[
            row(&["", "ORD12345", "C", "D", "E", "F", "G"]),
            row(&["Page 1 / 3"]),
        ]);
        let parse = parse_orders(&html, &ColumnLayout::default()).unwrap();

        assert!(parse.records.is_empty());
        assert_eq!(parse.skipped_short, 2);
    }

    #[test]
    fn test_short_identifier_is_excluded() {
        let html = page(&[
            row(&["", "  A1 \u{a0}\u{a0}", "C", "D", "E", "F", "G", "1,00"]),
            row(&["", "ORD12345", "C", "D", "E", "F", "G", "1,00"]),
        ]);
        let parse = parse_orders(&html, &ColumnLayout::default()).unwrap();

        assert_eq!(parse.records.len(), 1);
        assert_eq!(parse.records[0].numero, "ORD12345");
        assert_eq!(parse.skipped_invalid, 1);
    }

    #[test]
    fn test_optional_status_column() {
        let html = page(&[
            row(&["", "ORD00001", "C", "D", "E", "F", "G", "1,00"]),
            row(&["", "ORD00002", "C", "D", "E", "F", "G", "2,00", " Intégrée "]),
        ]);
        let parse = parse_orders(&html, &ColumnLayout::default()).unwrap();

        assert_eq!(parse.records[0].statut, "");
        assert_eq!(parse.records[1].statut, "Intégrée");
    }

    #[test]
    fn test_cells_are_normalized() {
        let html = page(&[row(&[
            "<input type='checkbox'>",
            "<a href='/voir?n=1'> ORD\n  12345 </a>",
            "AUCHAN\u{a0} FRANCE",
            "ENTREPOT   NORD",
            "01/02/2025",
            "03/02/2025",
            "3020000000000",
            " 1 234,50 € ",
        ])]);
        let parse = parse_orders(&html, &ColumnLayout::default()).unwrap();
        let record = &parse.records[0];

        assert_eq!(record.numero, "ORD 12345");
        assert_eq!(record.client, "AUCHAN FRANCE");
        assert_eq!(record.livrer_a, "ENTREPOT NORD");
        assert_eq!(record.montant_calcule, "1 234,50 €");
    }

    #[test]
    fn test_nested_table_rows_are_not_orders() {
        let nested = "<table><tbody><tr><td>x</td></tr></tbody></table>";
        let html = page(&[row(&[
            "", "ORD12345", nested, "D", "E", "F", "G", "1,00",
        ])]);
        let parse = parse_orders(&html, &ColumnLayout::default()).unwrap();

        assert_eq!(parse.rows_seen, 1);
        assert_eq!(parse.records.len(), 1);
    }

    fn headed_page(header: &str, rows: &[String]) -> String {
        format!(
            "<html><body><table><thead><tr>{}</tr></thead><tbody>{}</tbody></table></body></html>",
            header,
            rows.concat()
        )
    }

    fn full_row(numero: &str) -> String {
        row(&[
            "<input type='checkbox'>",
            numero,
            "AUCHAN",
            "ENTREPOT NORD",
            "01/10/2026",
            "20/10/2026",
            "3020180000014",
            "10,00",
            "Nouvelle",
        ])
    }

    #[test]
    fn test_colspan_header_keeps_columns_aligned() {
        let header = "<th colspan=\"2\">Numéro</th><th>Client</th><th>Livrer à</th>\
            <th>Création le</th><th>Livrer le</th><th>GLN Commandé par</th>\
            <th>Montant calculé</th><th>Statut</th>";
        let html = headed_page(header, &[full_row("CMD-10421")]);

        let parse = parse_orders(&html, &ColumnLayout::default()).unwrap();

        assert_eq!(parse.records.len(), 1);
        let record = &parse.records[0];
        assert_eq!(record.numero, "CMD-10421");
        assert_eq!(record.client, "AUCHAN");
        assert_eq!(record.montant_calcule, "10,00");
        assert_eq!(record.statut, "Nouvelle");
    }

    #[test]
    fn test_empty_header_numero_column_falls_back_to_positions() {
        // header row lacks the checkbox column, so "Numéro" lands on it
        let header = "<th>Numéro</th><th>Client</th><th>Livrer à</th>";
        let html = headed_page(header, &[full_row("CMD-10421"), full_row("CMD-10422")]);

        let parse = parse_orders(&html, &ColumnLayout::default()).unwrap();

        let numeros: Vec<&str> = parse.records.iter().map(|r| r.numero.as_str()).collect();
        assert_eq!(numeros, vec!["CMD-10421", "CMD-10422"]);
        assert_eq!(parse.records[0].client, "AUCHAN");
        assert_eq!(parse.skipped_invalid, 0);
    }

    #[test]
    fn test_header_map_kept_when_some_rows_have_numbers() {
        let header = "<th></th><th>Client</th><th>Numéro</th>";
        let html = headed_page(
            header,
            &[row(&["", "AUCHAN", "CMD-10421", "D", "E", "F", "G", "1,00"])],
        );

        let parse = parse_orders(&html, &ColumnLayout::default()).unwrap();

        assert_eq!(parse.records[0].numero, "CMD-10421");
        assert_eq!(parse.records[0].client, "AUCHAN");
    }

    #[test]
    fn test_parse_row_reports_reason() {
        let map = ColumnLayout::default().positional();
        let cells: Vec<String> = vec!["".into(); 3];

        let err = parse_row(4, &cells, &map).unwrap_err();
        assert!(err.to_string().contains("Row 4"));
        assert!(err.to_string().contains("3 cells"));
    }
}

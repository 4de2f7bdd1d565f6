use crate::normalize::normalize_ws;
use crate::record::OrderField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rows with fewer cells than this are not order rows
pub const MIN_DATA_CELLS: usize = 8;

/// Configurable mapping from table columns to record fields.
///
/// Header hints are matched (lower-cased substring) against the `<thead>`
/// cells of each fetched page; fields that no header claims fall back to
/// their configured position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub positions: BTreeMap<OrderField, usize>,
    pub header_hints: BTreeMap<OrderField, Vec<String>>,
    pub min_cells: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        let positions = OrderField::ALL
            .iter()
            .map(|f| (*f, f.default_index()))
            .collect();

        let hints: [(OrderField, &[&str]); 8] = [
            (OrderField::Numero, &["numéro", "numero", "n°"]),
            (OrderField::Client, &["client"]),
            (OrderField::LivrerA, &["livrer à", "livrer a", "livré à", "destinataire"]),
            (OrderField::CreationLe, &["création", "creation", "créé le", "cree le"]),
            (OrderField::LivrerLe, &["livrer le", "livraison le", "date de livraison"]),
            (OrderField::GlnCommandePar, &["gln", "commandé par", "commande par"]),
            (OrderField::MontantCalcule, &["montant"]),
            (OrderField::Statut, &["statut", "état", "etat"]),
        ];
        let header_hints = hints
            .into_iter()
            .map(|(f, h)| (f, h.iter().map(|s| s.to_string()).collect()))
            .collect();

        Self {
            positions,
            header_hints,
            min_cells: MIN_DATA_CELLS,
        }
    }
}

impl ColumnLayout {
    fn position(&self, field: OrderField) -> usize {
        self.positions
            .get(&field)
            .copied()
            .unwrap_or_else(|| field.default_index())
    }

    /// Resolve field indices for one page from its header texts.
    ///
    /// Fields are resolved in key order and a header cell is claimed by at
    /// most one field.
    pub fn resolve(&self, headers: &[String]) -> ColumnMap {
        let lowered: Vec<String> = headers
            .iter()
            .map(|h| normalize_ws(h).to_lowercase())
            .collect();
        let mut claimed = vec![false; lowered.len()];
        let mut indices = [0usize; 8];
        let mut from_headers = 0;

        for (slot, field) in OrderField::ALL.iter().enumerate() {
            let hints = self.header_hints.get(field).map(Vec::as_slice).unwrap_or(&[]);
            let found = lowered.iter().enumerate().find(|(idx, text)| {
                !claimed[*idx]
                    && !text.is_empty()
                    && hints.iter().any(|h| text.contains(&h.to_lowercase()))
            });

            indices[slot] = match found {
                Some((idx, _)) => {
                    claimed[idx] = true;
                    from_headers += 1;
                    idx
                }
                None => self.position(*field),
            };
        }

        tracing::debug!(
            "Column map: {} of {} fields resolved from {} headers",
            from_headers,
            OrderField::ALL.len(),
            headers.len()
        );

        ColumnMap {
            indices,
            min_cells: self.min_cells,
        }
    }

    /// Map using configured positions only
    pub fn positional(&self) -> ColumnMap {
        self.resolve(&[])
    }
}

/// Field accessor resolved for a single page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    indices: [usize; 8],
    min_cells: usize,
}

impl ColumnMap {
    pub fn index(&self, field: OrderField) -> usize {
        let slot = OrderField::ALL
            .iter()
            .position(|f| *f == field)
            .unwrap_or_default();
        self.indices[slot]
    }

    pub fn min_cells(&self) -> usize {
        self.min_cells
    }

    /// Cell text for a field, empty when the row has no such cell
    pub fn get<'a>(&self, cells: &'a [String], field: OrderField) -> &'a str {
        cells
            .get(self.index(field))
            .map(String::as_str)
            .unwrap_or("")
    }
}

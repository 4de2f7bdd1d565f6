use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum identifier length (exclusive) for a row to count as an order
pub const MIN_NUMERO_LEN: usize = 3;

/// One scraped order row.
///
/// Dates and amounts are kept exactly as the portal displays them; parsing is
/// left to whoever consumes the records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub numero: String,
    pub client: String,
    pub livrer_a: String,
    pub creation_le: String,
    pub livrer_le: String,
    #[serde(alias = "gln")]
    pub gln_commande_par: String,
    pub montant_calcule: String,
    #[serde(default)]
    pub statut: String,
}

impl OrderRecord {
    /// Validity gate: the identifier must be longer than three characters
    pub fn is_valid(&self) -> bool {
        self.numero.chars().count() > MIN_NUMERO_LEN
    }

    pub fn get(&self, field: OrderField) -> &str {
        match field {
            OrderField::Numero => &self.numero,
            OrderField::Client => &self.client,
            OrderField::LivrerA => &self.livrer_a,
            OrderField::CreationLe => &self.creation_le,
            OrderField::LivrerLe => &self.livrer_le,
            OrderField::GlnCommandePar => &self.gln_commande_par,
            OrderField::MontantCalcule => &self.montant_calcule,
            OrderField::Statut => &self.statut,
        }
    }

    pub fn set(&mut self, field: OrderField, value: String) {
        let slot = match field {
            OrderField::Numero => &mut self.numero,
            OrderField::Client => &mut self.client,
            OrderField::LivrerA => &mut self.livrer_a,
            OrderField::CreationLe => &mut self.creation_le,
            OrderField::LivrerLe => &mut self.livrer_le,
            OrderField::GlnCommandePar => &mut self.gln_commande_par,
            OrderField::MontantCalcule => &mut self.montant_calcule,
            OrderField::Statut => &mut self.statut,
        };
        *slot = value;
    }

    /// Field values in canonical key order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        OrderField::ALL.iter().map(move |f| self.get(*f))
    }
}

/// Keys of an [`OrderRecord`], in export order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    Numero,
    Client,
    LivrerA,
    CreationLe,
    LivrerLe,
    GlnCommandePar,
    MontantCalcule,
    Statut,
}

impl OrderField {
    pub const ALL: [OrderField; 8] = [
        OrderField::Numero,
        OrderField::Client,
        OrderField::LivrerA,
        OrderField::CreationLe,
        OrderField::LivrerLe,
        OrderField::GlnCommandePar,
        OrderField::MontantCalcule,
        OrderField::Statut,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            OrderField::Numero => "numero",
            OrderField::Client => "client",
            OrderField::LivrerA => "livrer_a",
            OrderField::CreationLe => "creation_le",
            OrderField::LivrerLe => "livrer_le",
            OrderField::GlnCommandePar => "gln_commande_par",
            OrderField::MontantCalcule => "montant_calcule",
            OrderField::Statut => "statut",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "gln" => Some(OrderField::GlnCommandePar),
            _ => Self::ALL.iter().copied().find(|f| f.key() == key),
        }
    }

    /// Cell index of this field in the portal's listing table.
    ///
    /// Cell 0 holds the row selection checkbox.
    pub fn default_index(&self) -> usize {
        match self {
            OrderField::Numero => 1,
            OrderField::Client => 2,
            OrderField::LivrerA => 3,
            OrderField::CreationLe => 4,
            OrderField::LivrerLe => 5,
            OrderField::GlnCommandePar => 6,
            OrderField::MontantCalcule => 7,
            OrderField::Statut => 8,
        }
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

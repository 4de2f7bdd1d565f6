use ordex_core::table::ColumnLayout;
use ordex_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Everything site-specific about the portal.
///
/// Every field has a default, so a config file only needs the overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub base_url: String,
    pub landing_path: String,
    /// Substrings matched against anchor class and href to find the SSO entry
    pub sso_link_patterns: Vec<String>,
    pub sso_fallback_path: String,
    pub listing_path: String,
    pub page_size_param: String,
    pub default_page_size: usize,
    /// Authenticated-only page probed before logging in; the listing when unset
    pub probe_path: Option<String>,
    pub clear_filter_markers: Vec<String>,
    pub username_field_fallback: String,
    pub password_field_fallback: String,
    pub markers: Markers,
    pub columns: ColumnLayout,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub precheck: bool,
    pub listing_fallback: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://auchan.atgpedi.net".to_string(),
            landing_path: "/index.php".to_string(),
            sso_link_patterns: strings(&["atgp", "sso"]),
            sso_fallback_path: "/call.php?call=base_sso_openid_connect_authentifier".to_string(),
            listing_path:
                "/gui.php?query=documents_commandes_liste&page=documents_commandes_liste&acces_page=1"
                    .to_string(),
            page_size_param: "lines_per_page".to_string(),
            default_page_size: 1000,
            probe_path: None,
            clear_filter_markers: strings(&[
                "effacer",
                "réinitialiser",
                "reinitialiser",
                "clear filter",
                "clear_filter",
                "reset_filter",
            ]),
            username_field_fallback: "_username".to_string(),
            password_field_fallback: "_password".to_string(),
            markers: Markers::default(),
            columns: ColumnLayout::default(),
            timeout_secs: 30,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            precheck: true,
            listing_fallback: true,
        }
    }
}

impl PortalConfig {
    /// Load overrides from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("Reading portal config from: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let config: PortalConfig = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.base()?;
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be at least 1".to_string()));
        }
        if self.retry_attempts == 0 {
            return Err(Error::Config("retry_attempts must be at least 1".to_string()));
        }
        if self.default_page_size == 0 {
            return Err(Error::Config("default_page_size must be at least 1".to_string()));
        }
        if self.columns.min_cells == 0 {
            return Err(Error::Config("columns.min_cells must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid base_url {:?}: {}", self.base_url, e)))
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base()?
            .join(path)
            .map_err(|e| Error::Config(format!("invalid path {:?}: {}", path, e)))
    }

    pub fn host(&self) -> Option<String> {
        self.base().ok()?.host_str().map(str::to_string)
    }

    pub fn landing_url(&self) -> Result<Url> {
        self.join(&self.landing_path)
    }

    pub fn sso_fallback_url(&self) -> Result<Url> {
        self.join(&self.sso_fallback_path)
    }

    /// Listing URL asking for `page_size` rows in one page
    pub fn listing_url(&self, page_size: Option<usize>) -> Result<Url> {
        let mut url = self.join(&self.listing_path)?;
        let size = page_size.unwrap_or(self.default_page_size).to_string();

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| *k != self.page_size_param)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(&self.page_size_param, &size);

        Ok(url)
    }

    pub fn probe_url(&self) -> Result<Url> {
        match &self.probe_path {
            Some(path) => self.join(path),
            None => self.listing_url(None),
        }
    }
}

/// Lexical markers used to classify a page after login.
///
/// Matched lower-cased against the visible text; logout markers are also
/// matched against link targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    pub positive: Vec<String>,
    pub logout: Vec<String>,
    pub negative: Vec<String>,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            positive: strings(&["bonjour", "bienvenue", "welcome", "commandes", "orders"]),
            logout: strings(&["déconnexion", "deconnexion", "logout", "mon compte", "my account"]),
            negative: strings(&[
                "identifiants invalides",
                "identifiant ou mot de passe",
                "mot de passe incorrect",
                "invalid credentials",
                "invalid password",
                "incorrect",
                "invalide",
                "erreur",
                "error",
            ]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

use crate::config::PortalConfig;
use crate::session::Session;
use ordex_core::table::parse_orders;
use ordex_core::{Error, OrderRecord, Page, StepLog, Transport};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Reads the order listing of an authenticated session
pub struct Extractor<'a> {
    config: &'a PortalConfig,
}

impl<'a> Extractor<'a> {
    pub fn new(config: &'a PortalConfig) -> Self {
        Self { config }
    }

    /// Fetch the listing in a single page and map its rows to records.
    ///
    /// Never fails: transport errors and a missing table are recorded in
    /// `log` and yield an empty list.
    pub fn extract_orders<T: Transport>(
        &self,
        session: &mut Session<T>,
        page_size: Option<usize>,
        log: &mut StepLog,
    ) -> Vec<OrderRecord> {
        let url = match self.config.listing_url(page_size) {
            Ok(url) => url,
            Err(e) => {
                log.error("listing", e.to_string());
                return Vec::new();
            }
        };

        tracing::info!("Fetching order listing: {}", url);
        let transport = session.transport_mut();
        let mut page = match transport.fetch(&url).and_then(Page::ensure_success) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Listing fetch failed: {}", e);
                log.error("listing", e.to_string());
                return Vec::new();
            }
        };
        log.success("listing", format!("loaded {} ({} bytes)", page.url, page.body.len()));

        if let Some(cleared) = self.clear_filters(transport, &page, &url, log) {
            page = cleared;
        }

        match parse_orders(&page.body, &self.config.columns) {
            Ok(parse) => {
                tracing::info!(
                    "Extracted {} orders from {} rows ({} short, {} invalid)",
                    parse.records.len(),
                    parse.rows_seen,
                    parse.skipped_short,
                    parse.skipped_invalid
                );
                log.success(
                    "table",
                    format!(
                        "{} orders from {} rows ({} skipped)",
                        parse.records.len(),
                        parse.rows_seen,
                        parse.skipped_short + parse.skipped_invalid
                    ),
                );
                parse.records
            }
            Err(Error::TableNotFound) => {
                tracing::warn!("No orders table on {}", page.url);
                log.error("table", Error::TableNotFound.to_string());
                Vec::new()
            }
            Err(e) => {
                log.error("table", e.to_string());
                Vec::new()
            }
        }
    }

    /// Follow a "clear filter" link if the listing has one, then reload the
    /// listing. Returns `None` when nothing was cleared.
    fn clear_filters<T: Transport>(
        &self,
        transport: &mut T,
        page: &Page,
        listing_url: &Url,
        log: &mut StepLog,
    ) -> Option<Page> {
        let Some(link) = find_clear_filter_link(page, &self.config.clear_filter_markers) else {
            log.info("filters", "no filter to clear");
            return None;
        };

        tracing::debug!("Clearing listing filters via {}", link);
        let reloaded = transport
            .fetch(&link)
            .and_then(Page::ensure_success)
            .and_then(|_| transport.fetch(listing_url))
            .and_then(Page::ensure_success);

        match reloaded {
            Ok(page) => {
                log.success("filters", format!("cleared via {}", link));
                Some(page)
            }
            Err(e) => {
                tracing::warn!("Clearing filters failed, keeping current listing: {}", e);
                log.warning("filters", format!("clearing failed: {}", e));
                None
            }
        }
    }
}

/// A clear-filter link must also name the filter itself
const FILTER_WORDS: &[&str] = &["filtre", "filter"];

/// First link outside the results table whose text, title, class or target
/// mentions clearing filters
pub fn find_clear_filter_link(page: &Page, markers: &[String]) -> Option<Url> {
    let document = Html::parse_document(&page.body);
    let sel = Selector::parse("a[href]").ok()?;
    let markers: Vec<String> = markers.iter().map(|m| m.to_lowercase()).collect();

    document.select(&sel).find_map(|a| {
        let href = a.value().attr("href")?;
        if href.starts_with('#') || href.to_lowercase().starts_with("javascript:") {
            return None;
        }
        if in_results_table(a) {
            return None;
        }
        let haystack = format!(
            "{} {} {} {}",
            a.text().collect::<String>(),
            a.value().attr("title").unwrap_or_default(),
            a.value().attr("class").unwrap_or_default(),
            href
        )
        .to_lowercase();

        let clears = markers
            .iter()
            .any(|m| !m.is_empty() && haystack.contains(m.as_str()));
        let names_filter = FILTER_WORDS.iter().any(|w| haystack.contains(w));

        (clears && names_filter)
            .then(|| page.url.join(href).ok())
            .flatten()
    })
}

/// Row actions live inside the listing table
fn in_results_table(a: ElementRef<'_>) -> bool {
    a.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|e| matches!(e.value().name(), "table" | "tbody"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionMode;
    use crate::testing::ScriptedTransport;
    use ordex_core::StepStatus;

    const LISTING_PATH: &str =
        "/gui.php?query=documents_commandes_liste&page=documents_commandes_liste&acces_page=1&lines_per_page=1000";

    fn config() -> PortalConfig {
        PortalConfig {
            base_url: "https://portal.example.com".to_string(),
            ..Default::default()
        }
    }

    fn listing(extra: &str, rows: &str) -> String {
        format!(
            "<html><body>{}<table><tbody>{}</tbody></table></body></html>",
            extra, rows
        )
    }

    fn row(numero: &str) -> String {
        format!(
            "<tr><td></td><td>{}</td><td>AUCHAN</td><td>ENTREPOT</td><td>01/02/2025</td><td>03/02/2025</td><td>3020000000000</td><td>10,00</td></tr>",
            numero
        )
    }

    fn session(transport: ScriptedTransport) -> Session<ScriptedTransport> {
        Session::new(transport, SessionMode::FormLogin)
    }

    #[test]
    fn test_extracts_rows_in_order() {
        let rows = format!("{}{}{}", row("ORD00001"), row("AB"), row("ORD00002"));
        let mut session = session(ScriptedTransport::new().page(LISTING_PATH, &listing("", &rows)));
        let mut log = StepLog::new();

        let orders = Extractor::new(&config()).extract_orders(&mut session, None, &mut log);

        let numeros: Vec<&str> = orders.iter().map(|o| o.numero.as_str()).collect();
        assert_eq!(numeros, vec!["ORD00001", "ORD00002"]);
        assert_eq!(log.count(StepStatus::Error), 0);
    }

    #[test]
    fn test_page_size_is_requested() {
        let path = LISTING_PATH.replace("1000", "200");
        let mut session = session(ScriptedTransport::new().page(&path, &listing("", "")));
        let mut log = StepLog::new();

        let orders = Extractor::new(&config()).extract_orders(&mut session, Some(200), &mut log);

        assert!(orders.is_empty());
        assert!(session.transport().fetched[0].as_str().contains("lines_per_page=200"));
    }

    #[test]
    fn test_transport_error_degrades_to_empty() {
        let mut session = session(ScriptedTransport::new().status(LISTING_PATH, 500));
        let mut log = StepLog::new();

        let orders = Extractor::new(&config()).extract_orders(&mut session, None, &mut log);

        assert!(orders.is_empty());
        assert_eq!(log.count(StepStatus::Error), 1);
    }

    #[test]
    fn test_missing_table_degrades_to_empty() {
        let mut session = session(
            ScriptedTransport::new().page(LISTING_PATH, "<html><body>Session expirée</body></html>"),
        );
        let mut log = StepLog::new();

        let orders = Extractor::new(&config()).extract_orders(&mut session, None, &mut log);

        assert!(orders.is_empty());
        let last = log.entries().last().unwrap();
        assert_eq!(last.step, "table");
        assert_eq!(last.status, StepStatus::Error);
    }

    #[test]
    fn test_clear_filter_link_is_followed() {
        let filtered = listing(
            r#"<a class="btn" href="/gui.php?page=documents_commandes_liste&filtre=effacer">Effacer les filtres</a>"#,
            &row("ORD00001"),
        );
        let transport = ScriptedTransport::new()
            .page(LISTING_PATH, &filtered)
            .page(
                "/gui.php?page=documents_commandes_liste&filtre=effacer",
                "<html><body>ok</body></html>",
            );
        let mut session = session(transport);
        let mut log = StepLog::new();

        let orders = Extractor::new(&config()).extract_orders(&mut session, None, &mut log);

        assert_eq!(orders.len(), 1);
        assert_eq!(session.transport().fetched.len(), 3);
        assert!(log.entries().iter().any(|e| e.step == "filters" && e.status == StepStatus::Success));
    }

    #[test]
    fn test_failed_clear_keeps_first_listing() {
        let filtered = listing(r#"<a href="/reset_filter">x</a>"#, &row("ORD00001"));
        let mut session = session(ScriptedTransport::new().page(LISTING_PATH, &filtered));
        let mut log = StepLog::new();

        let orders = Extractor::new(&config()).extract_orders(&mut session, None, &mut log);

        assert_eq!(orders.len(), 1);
        assert_eq!(log.count(StepStatus::Warning), 1);
    }

    #[test]
    fn test_extracts_portal_listing_fixture() {
        let html = include_str!("../../../tests/fixtures/orders_listing.html");
        let transport = ScriptedTransport::new()
            .page(LISTING_PATH, html)
            .page("/gui.php?query=documents_commandes_liste&reset_filters=1", "<html></html>");
        let mut session = session(transport);
        let mut log = StepLog::new();

        let orders = Extractor::new(&config()).extract_orders(&mut session, None, &mut log);

        let numeros: Vec<&str> = orders.iter().map(|o| o.numero.as_str()).collect();
        assert_eq!(numeros, vec!["CMD-10421", "CMD-10422", "CMD-10423"]);
        assert_eq!(orders[1].statut, "Intégrée");
        assert_eq!(log.count(StepStatus::Error), 0);
    }

    #[test]
    fn test_find_clear_filter_link_ignores_anchors() {
        let page = Page::new(
            Url::parse("https://portal.example.com/gui.php").unwrap(),
            Some(200),
            r##"<a href="#">Effacer</a><a href="javascript:clearFilter()">Effacer</a>"##,
        );
        assert!(find_clear_filter_link(&page, &config().clear_filter_markers).is_none());
    }

    #[test]
    fn test_row_delete_link_is_not_a_filter_link() {
        let rows = r#"<tr><td><a href="/gui.php?action=supprimer&numero=CMD-10421" title="Effacer la commande">x</a></td>
            <td>CMD-10421</td></tr>
            <tr><td><a href="/gui.php?action=reset_filter_row">Effacer le filtre</a></td></tr>"#;
        let page = Page::new(
            Url::parse("https://portal.example.com/gui.php").unwrap(),
            Some(200),
            listing(r#"<a href="/gui.php?action=effacer_brouillon">Effacer le brouillon</a>"#, rows),
        );

        assert!(find_clear_filter_link(&page, &config().clear_filter_markers).is_none());
    }

    #[test]
    fn test_row_delete_link_does_not_shadow_filter_link() {
        let rows = r#"<tr><td><a href="/gui.php?action=supprimer&numero=CMD-10421" title="Effacer la commande">x</a></td></tr>"#;
        let html = format!(
            "<html><body><table><tbody>{}</tbody></table>{}</body></html>",
            rows, r#"<a href="/gui.php?query=documents_commandes_liste&reset_filters=1">Effacer les filtres</a>"#
        );
        let page = Page::new(Url::parse("https://portal.example.com/gui.php").unwrap(), Some(200), html);

        let link = find_clear_filter_link(&page, &config().clear_filter_markers).unwrap();
        assert_eq!(link.path(), "/gui.php");
        assert!(link.query().unwrap_or_default().contains("reset_filters=1"));
    }
}

use crate::classify::{Classification, classify};
use crate::config::PortalConfig;
use crate::form::LoginForm;
use crate::session::{Session, SessionMode};
use ordex_core::{AuthFailure, Page, StepLog, Transport};
use scraper::{Html, Selector};
use std::fmt;
use url::Url;

/// Username/password pair. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Turns credentials into an authenticated [`Session`]
pub struct Authenticator<'a> {
    config: &'a PortalConfig,
}

impl<'a> Authenticator<'a> {
    pub fn new(config: &'a PortalConfig) -> Self {
        Self { config }
    }

    /// Authenticate over `transport`.
    ///
    /// On failure the transport is closed and dropped; an ambiguous login is
    /// reported as such and never treated as success.
    pub fn authenticate<T: Transport>(
        &self,
        mut transport: T,
        credentials: &Credentials,
        log: &mut StepLog,
    ) -> Result<Session<T>, AuthFailure> {
        tracing::info!("Authenticating as {} via {}", credentials.username, transport.backend());

        if self.config.precheck && self.already_logged_in(&mut transport, log) {
            tracing::info!("Session already active, skipping login");
            log.success("precheck", "already logged in");
            return Ok(Session::new(transport, SessionMode::Resumed));
        }

        let failure = match self.login(&mut transport, credentials, log) {
            Ok(marker) => {
                tracing::info!("Login succeeded (marker: {})", marker);
                log.success("login", format!("authenticated (marker: {})", marker));
                return Ok(Session::new(transport, SessionMode::FormLogin));
            }
            Err(failure) => failure,
        };

        tracing::warn!("Login failed: {}", failure);
        log.error("login", failure.to_string());

        if self.config.listing_fallback && self.listing_accessible(&mut transport, log) {
            tracing::warn!("Listing is reachable despite the failed login, continuing");
            log.warning("fallback", "listing reachable without login form, session treated as valid");
            return Ok(Session::new(transport, SessionMode::ListingFallback));
        }

        if let Err(e) = transport.close() {
            tracing::debug!("Closing transport after failed login: {}", e);
        }
        Err(failure)
    }

    /// Probe an authenticated-only page; true when it renders as logged in
    fn already_logged_in<T: Transport>(&self, transport: &mut T, log: &mut StepLog) -> bool {
        let Ok(url) = self.config.probe_url() else {
            return false;
        };
        tracing::debug!("Pre-check: probing {}", url);

        let page = match transport.fetch(&url).and_then(Page::ensure_success) {
            Ok(page) => page,
            Err(e) => {
                log.info("precheck", format!("probe failed: {}", e));
                return false;
            }
        };

        let active = self.on_portal(&page)
            && !LoginForm::page_has_login_form(&page)
            && classify(&page.body, &self.config.markers).is_authenticated();
        if !active {
            log.info("precheck", "no active session");
        }
        active
    }

    /// Full login flow; returns the marker that confirmed success
    fn login<T: Transport>(
        &self,
        transport: &mut T,
        credentials: &Credentials,
        log: &mut StepLog,
    ) -> Result<String, AuthFailure> {
        let landing_url = self.config.landing_url()?;
        let landing = self.fetch_with_retry(transport, &landing_url, log)?;
        log.success("landing", format!("loaded {}", landing.url));

        let sso_url = match self.find_sso_link(&landing) {
            Some(url) => {
                log.success("sso", format!("entry link {}", url));
                url
            }
            None => {
                let url = self.config.sso_fallback_url()?;
                tracing::warn!("No SSO link on landing page, using {}", url);
                log.warning("sso", format!("no entry link, using fallback {}", url));
                url
            }
        };
        let login_page = transport.fetch(&sso_url)?.ensure_success()?;
        tracing::debug!("SSO redirected to {}", login_page.url);

        let form = LoginForm::locate(&login_page).ok_or(AuthFailure::FormNotFound)?;
        if form.username_field.is_none() || form.password_field.is_none() {
            log.warning("form", "credential fields not identified, using conventional names");
        }
        let submission = form.fill(credentials, self.config);
        log.success("form", format!("{} fields for {}", submission.fields.len(), submission.action));

        let result = transport.submit(&submission)?.ensure_success()?;
        tracing::debug!("Credentials submitted, landed on {}", result.url);

        match classify(&result.body, &self.config.markers) {
            Classification::Rejected { marker } => Err(AuthFailure::CredentialRejected(marker)),
            Classification::Ambiguous => Err(AuthFailure::AmbiguousResult(format!(
                "no success or error marker on {}",
                result.url
            ))),
            Classification::Authenticated { marker } if !self.on_portal(&result) => {
                Err(AuthFailure::AmbiguousResult(format!(
                    "marker {:?} found but still off-portal at {}",
                    marker, result.url
                )))
            }
            Classification::Authenticated { marker } => Ok(marker),
        }
    }

    /// Landing-page fetch with a bounded, fixed-delay retry
    fn fetch_with_retry<T: Transport>(
        &self,
        transport: &mut T,
        url: &Url,
        log: &mut StepLog,
    ) -> Result<Page, AuthFailure> {
        let attempts = self.config.retry_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match transport.fetch(url).and_then(Page::ensure_success) {
                Ok(page) => return Ok(page),
                Err(e) => {
                    tracing::warn!("Fetching {} failed (attempt {}/{}): {}", url, attempt, attempts, e);
                    log.warning("landing", format!("attempt {}/{}: {}", attempt, attempts, e));
                    last_error = e.to_string();
                }
            }
            if attempt < attempts {
                std::thread::sleep(self.config.retry_delay());
            }
        }

        Err(AuthFailure::Transport(last_error))
    }

    /// Direct navigation to the listing; valid when it renders a table and
    /// no login form
    fn listing_accessible<T: Transport>(&self, transport: &mut T, log: &mut StepLog) -> bool {
        let Ok(url) = self.config.listing_url(None) else {
            return false;
        };
        match transport.fetch(&url).and_then(Page::ensure_success) {
            Ok(page) => {
                self.on_portal(&page) && !LoginForm::page_has_login_form(&page) && has_table_body(&page)
            }
            Err(e) => {
                log.info("fallback", format!("listing unreachable: {}", e));
                false
            }
        }
    }

    /// First anchor whose class or href contains an SSO pattern
    fn find_sso_link(&self, page: &Page) -> Option<Url> {
        let document = Html::parse_document(&page.body);
        let sel = Selector::parse("a[href]").ok()?;
        let patterns: Vec<String> = self
            .config
            .sso_link_patterns
            .iter()
            .map(|p| p.to_lowercase())
            .collect();

        document.select(&sel).find_map(|a| {
            let href = a.value().attr("href")?;
            let class = a.value().attr("class").unwrap_or_default().to_lowercase();
            let href_lower = href.to_lowercase();
            patterns
                .iter()
                .any(|p| class.contains(p.as_str()) || href_lower.contains(p.as_str()))
                .then(|| page.url.join(href).ok())
                .flatten()
        })
    }

    fn on_portal(&self, page: &Page) -> bool {
        match (self.config.host(), page.url.host_str()) {
            (Some(expected), Some(actual)) => expected.eq_ignore_ascii_case(actual),
            _ => true,
        }
    }
}

fn has_table_body(page: &Page) -> bool {
    let document = Html::parse_document(&page.body);
    Selector::parse("table tbody")
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;

    const LANDING: &str = r#"<html><body><a class="btn btn-outline-red atgp" href="/call.php?call=sso">Se connecter</a></body></html>"#;
    const LOGIN: &str = r#"<html><body><form method="post" action="/login_check">
        <input type="hidden" name="_csrf_token" value="tok">
        <input type="text" name="_username"><input type="password" name="_password">
        </form></body></html>"#;
    const WELCOME: &str = r#"<html><body><h1>Bonjour</h1><a href="/logout">Déconnexion</a></body></html>"#;
    const REJECTED: &str = r#"<html><body><h1>Bonjour</h1><p>Identifiants invalides</p></body></html>"#;
    const BLANK: &str = "<html><body><p>Redirection</p></body></html>";
    const LISTING: &str = "<html><body><table><tbody><tr><td>x</td></tr></tbody></table></body></html>";

    fn config() -> PortalConfig {
        PortalConfig {
            base_url: "https://portal.example.com".to_string(),
            retry_delay_ms: 0,
            ..Default::default()
        }
    }

    fn credentials() -> Credentials {
        Credentials::new("buyer@example.com", "s3cret")
    }

    fn login_flow(result: &str) -> ScriptedTransport {
        ScriptedTransport::new()
            .page("/index.php", LANDING)
            .page("/call.php?call=sso", LOGIN)
            .submit_result("/login_check", result)
    }

    #[test]
    fn test_full_login_flow() {
        let config = PortalConfig {
            precheck: false,
            ..config()
        };
        let mut log = StepLog::new();
        let session = Authenticator::new(&config)
            .authenticate(login_flow(WELCOME), &credentials(), &mut log)
            .unwrap();

        assert_eq!(session.mode(), SessionMode::FormLogin);
        let submitted = &session.transport().submitted[0];
        assert_eq!(submitted.value("_csrf_token"), Some("tok"));
        assert_eq!(submitted.value("_username"), Some("buyer@example.com"));
        assert_eq!(submitted.value("_password"), Some("s3cret"));
    }

    #[test]
    fn test_precheck_skips_login() {
        let transport = ScriptedTransport::new().page(
            "/gui.php?query=documents_commandes_liste&page=documents_commandes_liste&acces_page=1&lines_per_page=1000",
            WELCOME,
        );
        let mut log = StepLog::new();
        let session = Authenticator::new(&config())
            .authenticate(transport, &credentials(), &mut log)
            .unwrap();

        assert_eq!(session.mode(), SessionMode::Resumed);
        assert!(session.transport().submitted.is_empty());
    }

    #[test]
    fn test_rejection_wins_over_welcome() {
        let config = PortalConfig {
            precheck: false,
            listing_fallback: false,
            ..config()
        };
        let mut log = StepLog::new();
        let result = Authenticator::new(&config).authenticate(
            login_flow(REJECTED),
            &credentials(),
            &mut log,
        );

        assert!(matches!(result, Err(AuthFailure::CredentialRejected(_))));
    }

    #[test]
    fn test_ambiguous_is_not_success() {
        let config = PortalConfig {
            precheck: false,
            listing_fallback: false,
            ..config()
        };
        let mut log = StepLog::new();
        let result =
            Authenticator::new(&config).authenticate(login_flow(BLANK), &credentials(), &mut log);

        assert!(matches!(result, Err(AuthFailure::AmbiguousResult(_))));
    }

    #[test]
    fn test_missing_form_is_reported() {
        let config = PortalConfig {
            precheck: false,
            listing_fallback: false,
            ..config()
        };
        let transport = ScriptedTransport::new()
            .page("/index.php", LANDING)
            .page("/call.php?call=sso", BLANK);
        let mut log = StepLog::new();
        let result = Authenticator::new(&config).authenticate(transport, &credentials(), &mut log);

        assert_eq!(result.err(), Some(AuthFailure::FormNotFound));
    }

    #[test]
    fn test_sso_fallback_url_when_no_link() {
        let config = PortalConfig {
            precheck: false,
            ..config()
        };
        let transport = ScriptedTransport::new()
            .page("/index.php", "<html><body>Accueil</body></html>")
            .page("/call.php?call=base_sso_openid_connect_authentifier", LOGIN)
            .submit_result("/login_check", WELCOME);
        let mut log = StepLog::new();
        let session = Authenticator::new(&config)
            .authenticate(transport, &credentials(), &mut log)
            .unwrap();

        assert_eq!(session.mode(), SessionMode::FormLogin);
        assert!(log.entries().iter().any(|e| e.step == "sso" && e.details.contains("fallback")));
    }

    #[test]
    fn test_landing_retry_is_bounded() {
        let config = PortalConfig {
            precheck: false,
            listing_fallback: false,
            retry_attempts: 3,
            ..config()
        };
        let transport = ScriptedTransport::new().status("/index.php", 503);
        let mut log = StepLog::new();
        let result = Authenticator::new(&config).authenticate(transport, &credentials(), &mut log);

        assert!(matches!(result, Err(AuthFailure::Transport(ref msg)) if msg.contains("503")));
        assert_eq!(log.entries().iter().filter(|e| e.step == "landing").count(), 3);
    }

    #[test]
    fn test_listing_fallback_rescues_failed_login() {
        let config = PortalConfig {
            precheck: false,
            ..config()
        };
        let transport = login_flow(BLANK).page(
            "/gui.php?query=documents_commandes_liste&page=documents_commandes_liste&acces_page=1&lines_per_page=1000",
            LISTING,
        );
        let mut log = StepLog::new();
        let session = Authenticator::new(&config)
            .authenticate(transport, &credentials(), &mut log)
            .unwrap();

        assert_eq!(session.mode(), SessionMode::ListingFallback);
    }

    #[test]
    fn test_listing_with_login_form_is_not_a_fallback() {
        let config = PortalConfig {
            precheck: false,
            ..config()
        };
        let transport = login_flow(BLANK).page(
            "/gui.php?query=documents_commandes_liste&page=documents_commandes_liste&acces_page=1&lines_per_page=1000",
            LOGIN,
        );
        let mut log = StepLog::new();
        let result = Authenticator::new(&config).authenticate(transport, &credentials(), &mut log);

        assert!(matches!(result, Err(AuthFailure::AmbiguousResult(_))));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("buyer@example.com"));
        assert!(!debug.contains("s3cret"));
    }
}

use crate::auth::Credentials;
use crate::config::PortalConfig;
use ordex_core::{FormMethod, FormSubmission, Page};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const USERNAME_HINTS: &[&str] = &["user", "login", "email", "mail", "identifiant", "ident"];
const PASSWORD_HINTS: &[&str] = &["pass", "pwd", "mdp"];

/// Login form found on a page, before credentials are filled in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub action: Url,
    pub method: FormMethod,
    /// Hidden inputs (CSRF tokens and the like), passed through verbatim
    pub hidden: Vec<(String, String)>,
    pub username_field: Option<String>,
    pub password_field: Option<String>,
}

impl LoginForm {
    /// Locate the first `<form>` of a page
    pub fn locate(page: &Page) -> Option<Self> {
        let document = Html::parse_document(&page.body);
        let form_sel = Selector::parse("form").ok()?;
        let input_sel = Selector::parse("input").ok()?;

        let form = document.select(&form_sel).next()?;

        let action = form
            .value()
            .attr("action")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .and_then(|a| page.url.join(a).ok())
            .unwrap_or_else(|| page.url.clone());
        let method = FormMethod::from_attr(form.value().attr("method"));

        let mut hidden = Vec::new();
        let mut username_field = None;
        let mut password_field = None;

        for input in form.select(&input_sel) {
            let Some(name) = input.value().attr("name").filter(|n| !n.is_empty()) else {
                continue;
            };
            let kind = input_type(input);

            match kind.as_str() {
                "hidden" => {
                    let value = input.value().attr("value").unwrap_or_default();
                    hidden.push((name.to_string(), value.to_string()));
                }
                "password" if password_field.is_none() => {
                    password_field = Some(name.to_string());
                }
                "text" | "email" if username_field.is_none() && matches_hint(name, USERNAME_HINTS) => {
                    username_field = Some(name.to_string());
                }
                "text" if password_field.is_none() && matches_hint(name, PASSWORD_HINTS) => {
                    password_field = Some(name.to_string());
                }
                _ => {}
            }
        }

        tracing::debug!(
            "Login form: {:?} {} ({} hidden, user={:?}, password={:?})",
            method,
            action,
            hidden.len(),
            username_field,
            password_field
        );

        Some(Self {
            action,
            method,
            hidden,
            username_field,
            password_field,
        })
    }

    /// Whether the page carries a form with a password input
    pub fn page_has_login_form(page: &Page) -> bool {
        let document = Html::parse_document(&page.body);
        Selector::parse("form input[type=password], form input[type=PASSWORD]")
            .map(|sel| document.select(&sel).next().is_some())
            .unwrap_or(false)
    }

    /// Fill credentials, falling back to the conventional field names when
    /// the heuristics found nothing
    pub fn fill(&self, credentials: &Credentials, config: &PortalConfig) -> FormSubmission {
        let username_field = self
            .username_field
            .clone()
            .unwrap_or_else(|| config.username_field_fallback.clone());
        let password_field = self
            .password_field
            .clone()
            .unwrap_or_else(|| config.password_field_fallback.clone());

        let mut fields: Vec<(String, String)> = self
            .hidden
            .iter()
            .filter(|(n, _)| *n != username_field && *n != password_field)
            .cloned()
            .collect();
        fields.push((username_field, credentials.username.clone()));
        fields.push((password_field.clone(), credentials.password.clone()));

        FormSubmission {
            action: self.action.clone(),
            method: self.method,
            fields,
            secret_fields: vec![password_field],
        }
    }
}

fn input_type(input: ElementRef<'_>) -> String {
    input
        .value()
        .attr("type")
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "text".to_string())
}

fn matches_hint(name: &str, hints: &[&str]) -> bool {
    let name = name.to_lowercase();
    hints.iter().any(|h| name.contains(h))
}

use crate::{Error, Result};
use url::Url;

/// A document as rendered by a transport backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status, `None` when the backend cannot observe it
    pub status: Option<u16>,
    pub body: String,
}

impl Page {
    pub fn new(url: Url, status: Option<u16>, body: impl Into<String>) -> Self {
        Self {
            url,
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_none_or(|s| (200..300).contains(&s))
    }

    /// Turn a non-success page into a transport error
    pub fn ensure_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Transport(format!(
                "HTTP {} for {}",
                self.status.unwrap_or_default(),
                self.url
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
}

impl FormMethod {
    /// Parse a form's `method` attribute; HTML defaults to GET
    pub fn from_attr(attr: Option<&str>) -> Self {
        match attr.map(|m| m.trim().to_ascii_lowercase()) {
            Some(m) if m == "post" => FormMethod::Post,
            _ => FormMethod::Get,
        }
    }
}

/// A filled form ready to be submitted
#[derive(Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub action: Url,
    pub method: FormMethod,
    /// Name/value pairs in document order
    pub fields: Vec<(String, String)>,
    /// Names whose values must not appear in logs
    pub secret_fields: Vec<String>,
}

impl FormSubmission {
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Debug for FormSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(n, v)| {
                if self.secret_fields.contains(n) {
                    (n.as_str(), "********")
                } else {
                    (n.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("FormSubmission")
            .field("action", &self.action.as_str())
            .field("method", &self.method)
            .field("fields", &fields)
            .finish()
    }
}

/// Capability interface over the portal connection.
///
/// Implemented by a direct HTTP session and by a driven browser. All calls
/// block until the page is loaded or the backend's timeout elapses.
pub trait Transport {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    /// Navigate to `url`, following redirects
    fn fetch(&mut self, url: &Url) -> Result<Page>;

    /// Submit a filled form, following redirects
    fn submit(&mut self, form: &FormSubmission) -> Result<Page>;

    /// Release the session. Calling it twice is harmless.
    fn close(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    fn fetch(&mut self, url: &Url) -> Result<Page> {
        (**self).fetch(url)
    }

    fn submit(&mut self, form: &FormSubmission) -> Result<Page> {
        (**self).submit(form)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

use ordex_core::{Error, FormMethod, FormSubmission, Page, Result, Transport};
use reqwest::blocking::{Client, Response};
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Direct HTTP session: a blocking client with a cookie jar
pub struct HttpTransport {
    client: Client,
    closed: bool,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("fr-FR,fr;q=0.9,en;q=0.5"),
        );

        let client = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| Error::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            closed: false,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Transport("session closed".to_string()));
        }
        Ok(())
    }

    fn into_page(response: Response) -> Result<Page> {
        let url = response.url().clone();
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| Error::Transport(format!("failed to read body of {}: {}", url, e)))?;

        tracing::debug!("HTTP {} {} ({} bytes)", status, url, body.len());
        Ok(Page::new(url, Some(status), body))
    }
}

impl Transport for HttpTransport {
    fn backend(&self) -> &'static str {
        "http"
    }

    fn fetch(&mut self, url: &Url) -> Result<Page> {
        self.ensure_open()?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| Error::Transport(format!("GET {} failed: {}", url, e)))?;
        Self::into_page(response)
    }

    fn submit(&mut self, form: &FormSubmission) -> Result<Page> {
        self.ensure_open()?;
        tracing::debug!("{:?} {} ({} fields)", form.method, form.action, form.fields.len());

        let request = match form.method {
            FormMethod::Post => self.client.post(form.action.clone()).form(&form.fields),
            FormMethod::Get => {
                let mut url = form.action.clone();
                url.query_pairs_mut().clear().extend_pairs(&form.fields);
                self.client.get(url)
            }
        };

        let response = request
            .send()
            .map_err(|e| Error::Transport(format!("submitting to {} failed: {}", form.action, e)))?;
        Self::into_page(response)
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            tracing::debug!("HTTP session closed");
            self.closed = true;
        }
        Ok(())
    }
}

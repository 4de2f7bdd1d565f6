//! In-memory transport replaying canned pages, for tests.

use ordex_core::{Error, FormSubmission, Page, Result, Transport};
use std::collections::HashMap;
use url::Url;

const BASE: &str = "https://portal.example.com";

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pages: HashMap<String, (u16, String)>,
    submits: HashMap<String, (u16, String)>,
    pub fetched: Vec<Url>,
    pub submitted: Vec<FormSubmission>,
    pub closed: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 for GETs of `path` (path plus query)
    pub fn page(mut self, path: &str, body: &str) -> Self {
        self.pages.insert(path.to_string(), (200, body.to_string()));
        self
    }

    pub fn status(mut self, path: &str, status: u16) -> Self {
        self.pages.insert(path.to_string(), (status, String::new()));
        self
    }

    /// Serve `body` for form submissions to `path`
    pub fn submit_result(mut self, path: &str, body: &str) -> Self {
        self.submits.insert(path.to_string(), (200, body.to_string()));
        self
    }

    fn key(url: &Url) -> String {
        match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        }
    }

    fn respond(routes: &HashMap<String, (u16, String)>, url: &Url) -> Result<Page> {
        let key = Self::key(url);
        let (status, body) = routes
            .get(&key)
            .ok_or_else(|| Error::Transport(format!("no route for {}", key)))?;
        let url = Url::parse(BASE)
            .and_then(|b| b.join(&key))
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Page::new(url, Some(*status), body.clone()))
    }
}

impl Transport for ScriptedTransport {
    fn backend(&self) -> &'static str {
        "scripted"
    }

    fn fetch(&mut self, url: &Url) -> Result<Page> {
        self.fetched.push(url.clone());
        Self::respond(&self.pages, url)
    }

    fn submit(&mut self, form: &FormSubmission) -> Result<Page> {
        self.submitted.push(form.clone());
        Self::respond(&self.submits, &form.action)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

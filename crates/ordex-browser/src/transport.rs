use crate::{ChromeFinder, ChromeLauncher, Error, ProfileManager, Result};
use chromiumoxide::Page as Tab;
use chromiumoxide::browser::Browser;
use futures::StreamExt;
use ordex_core::{FormMethod, FormSubmission, Page, Transport};
use std::path::PathBuf;
use std::process::Child;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use url::Url;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_DELAY: Duration = Duration::from_millis(500);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Set on the submitting document; a fresh document won't carry it
const PENDING_MARKER: &str = "__ordexPendingSubmit";

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub chrome_path: Option<PathBuf>,
    /// Named profile under `~/.ordex/profiles`, temporary when `None`
    pub profile: Option<String>,
    pub debugging_port: u16,
    pub timeout: Duration,
    pub headless: bool,
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            profile: None,
            debugging_port: crate::launcher::DEFAULT_DEBUGGING_PORT,
            timeout: Duration::from_secs(30),
            headless: true,
            user_agent: None,
        }
    }
}

/// Drives a headless Chrome over CDP.
///
/// The async CDP client runs on an owned current-thread runtime so callers
/// see the same blocking interface as the HTTP backend.
pub struct BrowserTransport {
    runtime: Runtime,
    browser: Option<Browser>,
    tab: Option<Tab>,
    handler_task: Option<JoinHandle<()>>,
    child: Option<Child>,
    timeout: Duration,
    _profile: ProfileManager,
}

impl BrowserTransport {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let chrome_path = ChromeFinder::new(config.chrome_path.clone()).find()?;
        let profile = match &config.profile {
            Some(name) => ProfileManager::named(name)?,
            None => ProfileManager::temporary()?,
        };

        let mut launcher = ChromeLauncher::new(chrome_path, profile.path().to_path_buf())
            .with_debugging_port(config.debugging_port)
            .with_headless(config.headless);
        if let Some(ua) = &config.user_agent {
            launcher = launcher.with_user_agent(ua.clone());
        }

        let mut child = launcher.launch()?;
        tracing::info!(
            "Chrome started (pid {}) with profile {}",
            child.id(),
            profile.path().display()
        );

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let connected = runtime.block_on(connect(config.debugging_port));
        let (browser, tab, handler_task) = match connected {
            Ok(parts) => parts,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };

        Ok(Self {
            runtime,
            browser: Some(browser),
            tab: Some(tab),
            handler_task: Some(handler_task),
            child: Some(child),
            timeout: config.timeout,
            _profile: profile,
        })
    }

    fn tab(&self) -> Result<Tab> {
        self.tab
            .clone()
            .ok_or_else(|| Error::Browser("session closed".to_string()))
    }

    fn with_timeout<F, T>(&self, fut: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        let limit = self.timeout;
        self.runtime.block_on(async move {
            tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| Error::Timeout(limit.as_secs()))?
        })
    }

    fn shutdown(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            let _ = self.runtime.block_on(browser.close());
        }
        self.tab = None;
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Transport for BrowserTransport {
    fn backend(&self) -> &'static str {
        "browser"
    }

    fn fetch(&mut self, url: &Url) -> ordex_core::Result<Page> {
        let tab = self.tab()?;
        tracing::debug!("GET {} (browser)", url);
        let requested = url.clone();
        let page = self.with_timeout(async move {
            tab.goto(requested.as_str()).await?;
            snapshot(&tab, &requested).await
        })?;
        Ok(page)
    }

    fn submit(&mut self, form: &FormSubmission) -> ordex_core::Result<Page> {
        let tab = self.tab()?;
        tracing::debug!("Submitting {:?} (browser)", form);
        let script = submit_script(form).map_err(|e| Error::Browser(e.to_string()))?;
        let action = form.action.clone();
        let page = self.with_timeout(async move {
            tab.evaluate(script.as_str()).await?;
            wait_for_new_document(&tab).await;
            snapshot(&tab, &action).await
        })?;
        Ok(page)
    }

    fn close(&mut self) -> ordex_core::Result<()> {
        if self.browser.is_some() {
            tracing::debug!("Closing browser");
        }
        self.shutdown();
        Ok(())
    }
}

impl Drop for BrowserTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn connect(port: u16) -> Result<(Browser, Tab, JoinHandle<()>)> {
    let endpoint = format!("http://localhost:{}", port);
    let mut attempts_left = CONNECT_ATTEMPTS;
    let (browser, mut handler) = loop {
        tracing::debug!("Attempting CDP connection to {}...", endpoint);
        match Browser::connect(&endpoint).await {
            Ok(result) => break result,
            Err(e) => {
                attempts_left -= 1;
                if attempts_left == 0 {
                    return Err(Error::Cdp(format!(
                        "Failed to connect to Chrome after {} attempts: {}",
                        CONNECT_ATTEMPTS, e
                    )));
                }
                tracing::debug!("CDP connection failed, retrying ({} left)", attempts_left);
                tokio::time::sleep(CONNECT_DELAY).await;
            }
        }
    };

    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!("CDP handler event error: {}", e);
            }
        }
    });

    let tab = match browser.pages().await?.into_iter().next() {
        Some(tab) => tab,
        None => browser.new_page("about:blank").await?,
    };
    tracing::info!("CDP connection established");

    Ok((browser, tab, handler_task))
}

async fn snapshot(tab: &Tab, fallback: &Url) -> Result<Page> {
    let body = tab.content().await?;
    let url = tab
        .url()
        .await?
        .and_then(|u| Url::parse(&u).ok())
        .unwrap_or_else(|| fallback.clone());
    Ok(Page::new(url, None, body))
}

/// Poll until the submitting document has been replaced and the new one has loaded.
/// Evaluation errors while the old context is torn down count as "not yet".
async fn wait_for_new_document(tab: &Tab) {
    let probe = format!(
        "window.{} === undefined && document.readyState === 'complete'",
        PENDING_MARKER
    );
    loop {
        let ready = match tab.evaluate(probe.as_str()).await {
            Ok(result) => result.into_value::<bool>().unwrap_or(false),
            Err(_) => false,
        };
        if ready {
            return;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Build a detached form carrying every field and submit it natively.
/// Values are embedded as JSON so quoting in credentials is harmless.
fn submit_script(form: &FormSubmission) -> serde_json::Result<String> {
    let method = match form.method {
        FormMethod::Get => "get",
        FormMethod::Post => "post",
    };
    Ok(format!(
        r#"(() => {{
    const form = document.createElement('form');
    form.method = {method};
    form.action = {action};
    form.style.display = 'none';
    for (const [name, value] of {fields}) {{
        const input = document.createElement('input');
        input.type = 'hidden';
        input.name = name;
        input.value = value;
        form.appendChild(input);
    }}
    (document.body || document.documentElement).appendChild(form);
    window.{marker} = true;
    HTMLFormElement.prototype.submit.call(form);
    return true;
}})()"#,
        method = serde_json::to_string(method)?,
        action = serde_json::to_string(form.action.as_str())?,
        fields = serde_json::to_string(&form.fields)?,
        marker = PENDING_MARKER,
    ))
}

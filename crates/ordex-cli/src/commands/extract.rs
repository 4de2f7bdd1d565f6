use crate::commands::output;
use crate::{Backend, FilterArgs, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use ordex_browser::{BrowserConfig, BrowserTransport};
use ordex_core::{AppState, OrderRecord, StepLog, Transport, codec};
use ordex_portal::{Authenticator, Credentials, Extractor, HttpTransport, PortalConfig};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Portal username
    #[arg(short, long, env = "ORDEX_USERNAME")]
    pub username: String,

    /// Portal password
    #[arg(short, long, env = "ORDEX_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Transport used to drive the portal
    #[arg(long, value_enum, default_value = "http")]
    pub backend: Backend,

    /// Portal configuration file (JSON)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Rows requested on the listing page
    #[arg(long, value_name = "N")]
    pub page_size: Option<usize>,

    /// Path to Chrome executable (browser backend)
    #[arg(long)]
    pub chrome_path: Option<PathBuf>,

    /// Named Chrome profile kept under ~/.ordex/profiles (browser backend)
    #[arg(long)]
    pub profile: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Write orders to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Print a dashboard URL carrying the filtered orders
    #[arg(long, value_name = "URL")]
    pub relay_url: Option<Url>,

    /// Print the step log after the run
    #[arg(long)]
    pub steps: bool,

    /// Always perform the form login, even if a session looks active
    #[arg(long)]
    pub no_precheck: bool,
}

pub fn execute(args: ExtractArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => PortalConfig::from_file(path)
            .with_context(|| format!("Failed to load portal config from {}", path.display()))?,
        None => PortalConfig::default(),
    };
    if args.no_precheck {
        config.precheck = false;
    }

    let credentials = Credentials::new(args.username.clone(), args.password.clone());
    let mut log = StepLog::new();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = match args.backend {
        Backend::Http => {
            spinner.set_message("Connecting to portal...");
            HttpTransport::new(config.timeout())
                .context("Failed to build HTTP client")
                .and_then(|transport| run(&config, transport, &credentials, args.page_size, &mut log, &spinner))
        }
        Backend::Browser => {
            spinner.set_message("Launching Chrome...");
            let browser_config = BrowserConfig {
                chrome_path: args.chrome_path.clone(),
                profile: args.profile.clone(),
                timeout: config.timeout(),
                ..Default::default()
            };
            BrowserTransport::launch(&browser_config)
                .context("Failed to start browser")
                .and_then(|transport| run(&config, transport, &credentials, args.page_size, &mut log, &spinner))
        }
    };
    spinner.finish_and_clear();

    if args.steps {
        output::print_steps(&log);
    }

    let orders = result?;
    let mut state = AppState::new();
    state.ingest(orders);

    let filter = args.filters.to_filter();
    output::emit(&state, &filter, args.format, args.output.as_deref())?;

    if let Some(dashboard) = &args.relay_url {
        let url = codec::relay_url(dashboard, &state.filtered(&filter))?;
        eprintln!("{} {}", style("Relay URL:").bold(), url);
    }

    Ok(())
}

fn run<T: Transport>(
    config: &PortalConfig,
    transport: T,
    credentials: &Credentials,
    page_size: Option<usize>,
    log: &mut StepLog,
    spinner: &ProgressBar,
) -> Result<Vec<OrderRecord>> {
    spinner.set_message("Authenticating...");
    let mut session = Authenticator::new(config)
        .authenticate(transport, credentials, log)
        .context("Authentication failed")?;
    tracing::info!("Session established ({})", session.mode().as_str());

    spinner.set_message("Extracting orders...");
    let orders = Extractor::new(config).extract_orders(&mut session, page_size, log);

    if let Err(e) = session.close() {
        tracing::warn!("Failed to close session: {}", e);
    }

    Ok(orders)
}

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use ordex_cli::commands;
use ordex_cli::commands::extract::ExtractArgs;
use ordex_cli::{FilterArgs, OutputFormat};
use std::path::PathBuf;
use url::Url;

#[derive(Parser)]
#[command(name = "ordex")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Extract purchase orders from an EDI supplier portal",
    long_about = "Ordex signs in to the supplier portal (SSO or form login), reads the order \
                  listing into structured records, and exports or relays them for dashboards."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and extract the order listing
    Extract(ExtractArgs),

    /// Decode a relay payload back into orders
    Decode {
        /// Payload, dashboard URL, file containing either, or `-` for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: OutputFormat,

        /// Write orders to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Build a dashboard URL from a JSON order list
    Relay {
        /// Dashboard base URL
        #[arg(long, value_name = "URL")]
        dashboard: Url,

        /// JSON file as written by `extract --format json` (stdin when omitted)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    #[command(long_about = "Generate shell completion scripts for ordex.

SUPPORTED SHELLS:
  bash, zsh, fish, powershell, elvish

INSTALLATION:
  Bash:
    ordex completion --shell bash > ~/.local/share/bash-completion/completions/ordex
    # or add to ~/.bashrc:
    eval \"$(ordex completion --shell bash)\"

  Zsh:
    ordex completion --shell zsh > ~/.zfunc/_ordex
    # then in ~/.zshrc:
    fpath=(~/.zfunc $fpath)
    autoload -Uz compinit && compinit

  Fish:
    ordex completion --shell fish > ~/.config/fish/completions/ordex.fish

  PowerShell:
    ordex completion --shell powershell >> $PROFILE")]
    Completion {
        /// Target shell
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Extract(args) => commands::extract::execute(args),
        Commands::Decode {
            input,
            format,
            output,
            filters,
        } => commands::decode::execute(&input, &filters, format, output),
        Commands::Relay { dashboard, input } => {
            commands::relay::execute(&dashboard, input.as_deref())
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            commands::completion::execute(shell, &mut cmd, &mut std::io::stdout())
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("ordex=debug,ordex_cli=debug,ordex_core=debug,ordex_portal=debug,ordex_browser=debug")
    } else {
        EnvFilter::new("ordex=info,ordex_cli=info,ordex_portal=info,ordex_browser=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

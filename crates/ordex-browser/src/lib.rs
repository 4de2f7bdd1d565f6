//! Headless Chrome backend for the portal transport

mod chrome_finder;
mod error;
mod launcher;
mod profile;
mod transport;

pub use chrome_finder::ChromeFinder;
pub use error::{Error, Result};
pub use launcher::{ChromeLauncher, DEFAULT_DEBUGGING_PORT};
pub use profile::ProfileManager;
pub use transport::{BrowserConfig, BrowserTransport};

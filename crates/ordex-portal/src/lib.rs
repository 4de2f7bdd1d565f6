pub mod auth;
pub mod classify;
pub mod config;
pub mod extract;
pub mod form;
pub mod http;
pub mod session;

#[cfg(test)]
mod testing;

pub use auth::{Authenticator, Credentials};
pub use classify::{Classification, classify};
pub use config::{Markers, PortalConfig};
pub use extract::Extractor;
pub use form::LoginForm;
pub use http::HttpTransport;
pub use session::{Session, SessionMode};

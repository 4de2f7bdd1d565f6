use chrono::{DateTime, Utc};
use ordex_core::{Result, Transport};

/// How the session was established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// An existing session was detected by the pre-check
    Resumed,
    /// Credentials were submitted and accepted
    FormLogin,
    /// Login could not be confirmed but the listing rendered anyway
    ListingFallback,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Resumed => "resumed",
            SessionMode::FormLogin => "form login",
            SessionMode::ListingFallback => "listing fallback",
        }
    }
}

/// Authenticated portal connection.
///
/// Owns its transport; extraction borrows it. Nothing is persisted, the
/// session ends with [`Session::close`] or when dropped.
pub struct Session<T: Transport> {
    transport: T,
    mode: SessionMode,
    established_at: DateTime<Utc>,
}

impl<T: Transport> Session<T> {
    pub(crate) fn new(transport: T, mode: SessionMode) -> Self {
        Self {
            transport,
            mode,
            established_at: Utc::now(),
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn close(mut self) -> Result<()> {
        tracing::debug!("Closing {} session", self.transport.backend());
        self.transport.close()
    }
}

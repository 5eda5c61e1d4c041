use std::io;
use thiserror::Error;

/// Boxed error a [`View`](crate::View) may fail with.
pub type ViewError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the framework itself can report.
///
/// Request-scoped kinds (`EmptyInput`, `Syntax`, view failures) are recovered
/// by the [error guard](crate::Guard); setup-time kinds
/// (`ApplicationNotFound`, `Config`) abort startup.
#[derive(Debug, Error)]
pub enum Error {
    #[error("empty http message")]
    EmptyInput,

    #[error("http syntax error: {0}")]
    Syntax(&'static str),

    #[error("application '{0}' not found")]
    ApplicationNotFound(String),

    #[error("application is not initialized")]
    ApplicationNotInitialized,

    #[error("return type of the view '{view}' must be Response")]
    InvalidReturnType { view: String },

    #[error("static file not found: {0}")]
    StaticNotFound(String),

    #[error("wrong server type '{0}', expected one of 'std', 'socket', 'gateway', 'uvicorn'")]
    ServerType(String),

    #[error("only http gateway connections are handled, not '{0}'")]
    UnsupportedScope(String),

    #[error("stopped on exception:\n{0}")]
    Halted(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Failures that should never be answered on the wire.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Halted(_))
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::EmptyInput, Error::EmptyInput) => true,
            (Error::ApplicationNotInitialized, Error::ApplicationNotInitialized) => true,
            (Error::Syntax(a), Error::Syntax(b)) => a == b,
            (Error::ApplicationNotFound(a), Error::ApplicationNotFound(b)) => a == b,
            (Error::InvalidReturnType { view: a }, Error::InvalidReturnType { view: b }) => a == b,
            (Error::StaticNotFound(a), Error::StaticNotFound(b)) => a == b,
            (Error::ServerType(a), Error::ServerType(b)) => a == b,
            (Error::UnsupportedScope(a), Error::UnsupportedScope(b)) => a == b,
            (Error::Halted(a), Error::Halted(b)) => a == b,
            (Error::Io(a), Error::Io(b)) => a.kind() == b.kind(),
            (Error::Config(a), Error::Config(b)) => a.message() == b.message(),
            _ => false,
        }
    }
}

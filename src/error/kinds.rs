use std::{fmt, io};

/// Crate-wide `Result` type using [`EsdumpError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, EsdumpError>;

/// Top-level error type for esdump operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum EsdumpError {
    /// Invocation errors (missing or malformed job parameters).
    Usage(UsageError),

    /// Configuration errors.
    Config(ConfigError),

    /// Elasticsearch client errors.
    Client(ClientError),

    /// Export pipeline errors.
    Export(ExportError),

    /// I/O errors.
    Io(io::Error),

    /// HTTP transport errors.
    Http(reqwest::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Invocation-specific errors.
///
/// These are pre-flight failures: the job never starts when one is raised.
#[derive(Debug)]
pub enum UsageError {
    /// A required `name=value` parameter was not supplied.
    MissingParameter(String),

    /// A parameter was supplied with a value that cannot be parsed.
    InvalidParameter { name: String, value: String },

    /// A token did not follow the `name=value` form.
    MalformedToken(String),
}

/// Elasticsearch client errors.
#[derive(Debug)]
pub enum ClientError {
    /// The target index does not exist.
    InvalidTarget(String),

    /// The scroll cursor outlived its validity window.
    CursorExpired,

    /// The server answered with something the client cannot interpret.
    UnexpectedResponse(String),
}

/// Export-pipeline errors.
#[derive(Debug)]
pub enum ExportError {
    /// The backup folder is missing and cannot be created, or is not writable.
    FolderUnavailable(String),

    /// A page append against the dump file did not succeed.
    WriteFailure(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for EsdumpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EsdumpError::Usage(e) => write!(f, "Usage error: {e}"),
            EsdumpError::Config(e) => write!(f, "Configuration error: {e}"),
            EsdumpError::Client(e) => write!(f, "{e}"),
            EsdumpError::Export(e) => write!(f, "Export error: {e}"),
            EsdumpError::Io(e) => write!(f, "I/O error: {e}"),
            EsdumpError::Http(e) => write!(f, "HTTP error: {e}"),
            EsdumpError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageError::MissingParameter(name) => {
                write!(f, "required parameter '{name}' is missing")
            }
            UsageError::InvalidParameter { name, value } => {
                write!(f, "invalid value '{value}' for parameter '{name}'")
            }
            UsageError::MalformedToken(token) => {
                write!(f, "expected name=value, found '{token}'")
            }
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::InvalidTarget(index) => write!(f, "Index not found: {index}"),
            ClientError::CursorExpired => write!(f, "Scroll cursor expired"),
            ClientError::UnexpectedResponse(msg) => {
                write!(f, "Unexpected Elasticsearch response: {msg}")
            }
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::FolderUnavailable(folder) => {
                write!(f, "Backup folder unavailable: {folder}")
            }
            ExportError::WriteFailure(msg) => write!(f, "Failed to write dump file: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for EsdumpError {}
impl std::error::Error for UsageError {}
impl std::error::Error for ClientError {}
impl std::error::Error for ExportError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to EsdumpError ========================= */

impl From<io::Error> for EsdumpError {
    fn from(err: io::Error) -> Self {
        EsdumpError::Io(err)
    }
}

impl From<reqwest::Error> for EsdumpError {
    fn from(err: reqwest::Error) -> Self {
        EsdumpError::Http(err)
    }
}

impl From<UsageError> for EsdumpError {
    fn from(err: UsageError) -> Self {
        EsdumpError::Usage(err)
    }
}

impl From<ConfigError> for EsdumpError {
    fn from(err: ConfigError) -> Self {
        EsdumpError::Config(err)
    }
}

impl From<ClientError> for EsdumpError {
    fn from(err: ClientError) -> Self {
        EsdumpError::Client(err)
    }
}

impl From<ExportError> for EsdumpError {
    fn from(err: ExportError) -> Self {
        EsdumpError::Export(err)
    }
}

impl From<String> for EsdumpError {
    fn from(msg: String) -> Self {
        EsdumpError::Generic(msg)
    }
}

impl From<&str> for EsdumpError {
    fn from(msg: &str) -> Self {
        EsdumpError::Generic(msg.to_owned())
    }
}

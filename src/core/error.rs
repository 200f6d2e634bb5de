use thiserror::Error;

/// Stage-tagged error taxonomy. Every fallible operation picks its variant
/// explicitly at the call site; exit codes are derived from the variant,
/// never from message text.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Source fetch failed: {0}")]
    Source(String),

    #[error("SSH connection failed: {0}")]
    Ssh(String),

    #[error("Container runtime error: {0}")]
    Runtime(String),

    #[error("Proxy configuration failed: {0}")]
    Proxy(String),

    #[error("Deployment validation failed: {0}")]
    Validation(String),

    #[error("Remote command failed: {0}")]
    Remote(String),

    #[error("File transfer failed: {0}")]
    Transfer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Input(_) | Error::Io(_) => 1,
            Error::Source(_) => 2,
            Error::Ssh(_) => 3,
            Error::Runtime(_) => 4,
            Error::Proxy(_) => 5,
            Error::Validation(_) => 6,
            Error::Remote(_) => 7,
            Error::Transfer(_) => 8,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Input(_) => "INPUT_ERROR",
            Error::Source(_) => "SOURCE_ERROR",
            Error::Ssh(_) => "SSH_ERROR",
            Error::Runtime(_) => "RUNTIME_ERROR",
            Error::Proxy(_) => "PROXY_ERROR",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Remote(_) => "REMOTE_ERROR",
            Error::Transfer(_) => "TRANSFER_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }
}

use config_console_shared::{ErrorCode, ErrorEnvelope, ErrorKind};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    Internal = 1,
    InvalidInput = 2,
    ServerRejected = 3,
    Transport = 4,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Exit code for a failed console operation.
    ///
    /// A load failure is classified by the error that caused it.
    #[must_use]
    pub fn for_error(error: &ErrorEnvelope) -> Self {
        let code = if error.code == ErrorCode::load_failed() {
            error
                .metadata_value("cause_code")
                .map_or_else(|| error.code.to_string(), ToOwned::to_owned)
        } else {
            error.code.to_string()
        };

        match code.as_str() {
            "api:server_rejected" | "api:rate_limited" | "core:permission_denied" => {
                Self::ServerRejected
            },
            "api:timeout"
            | "api:connection_failed"
            | "api:dependency_unavailable"
            | "api:request_failed"
            | "api:invalid_response" => Self::Transport,
            _ => match error.kind {
                ErrorKind::Expected => Self::InvalidInput,
                ErrorKind::Invariant | ErrorKind::Unexpected => Self::Internal,
            },
        }
    }
}

#[derive(Debug)]
pub enum CliError {
    InvalidInput(String),
    Io(std::io::Error),
    Serialization(serde_json::Error),
    Yaml(serde_yaml_ng::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::Io(_) | Self::Serialization(_) | Self::Yaml(_) => ExitCode::Internal,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(formatter, "invalid input: {message}"),
            Self::Io(error) => write!(formatter, "io error: {error}"),
            Self::Serialization(error) => write!(formatter, "serialization error: {error}"),
            Self::Yaml(error) => write!(formatter, "yaml error: {error}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}

impl From<serde_yaml_ng::Error> for CliError {
    fn from(error: serde_yaml_ng::Error) -> Self {
        Self::Yaml(error)
    }
}

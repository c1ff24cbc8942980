use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which encrypted field of the signing material a credential error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Secret {
    KeyPassword,
    StorePassword,
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Secret::KeyPassword => write!(f, "key password"),
            Secret::StorePassword => write!(f, "keystore password"),
        }
    }
}

/// Problems with the signing profile or the program settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read signing profile {0}: {1}")]
    ReadProfile(PathBuf, std::io::Error),
    #[error("Failed to parse signing profile {0}: {1}")]
    ParseProfile(PathBuf, json5::Error),
    #[error("Signing profile {0} is missing `{1}`")]
    MissingKey(PathBuf, String),
    #[error("Signing profile {0} has an empty `{1}`")]
    EmptyValue(PathBuf, String),
    #[error("Environment variable {0} must point to the signing tool installation root")]
    MissingToolHome(String),
}

/// Failure modes of the final signing tool invocation
#[derive(Error, Debug)]
pub enum SigningToolError {
    #[error("Failed to launch `{0}`: {1}")]
    Launch(String, std::io::Error),
    #[error("hap-sign-tool exited with status {0}")]
    Exited(i32),
    #[error("hap-sign-tool was terminated by a signal")]
    Terminated,
}

/// Errors returned by hapsign
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to resolve {secret}: {reason}")]
    CredentialResolution { secret: Secret, reason: String },
    #[error("Signing failed: {0}")]
    SigningTool(#[from] SigningToolError),
}

impl Error {
    /// Process exit status for this error.
    ///
    /// A signing tool that exits non-zero hands its own code through; every
    /// other failure maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::SigningTool(SigningToolError::Exited(code)) if *code != 0 => *code,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

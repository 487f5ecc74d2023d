use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Which of the two configured images an asset error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Logo,
    Signature,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Logo => f.write_str("logo"),
            AssetKind::Signature => f.write_str("signature"),
        }
    }
}

/// Coarse classification used by the shell to pick a message and by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    AssetNotFound,
    Render,
    CorruptCounter,
    Io,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("{}:{line}: {reason}", .path.display())]
    ConfigSyntax {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("invalid settings file {}: {reason}", .path.display())]
    Settings { path: PathBuf, reason: String },

    /// A required invoice field is empty. Carries the field's display name.
    #[error("please fill in `{0}`")]
    Validation(&'static str),

    #[error("{kind} image not found at {}: {source}", .path.display())]
    AssetNotFound {
        kind: AssetKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{kind} image at {} could not be decoded: {reason}", .path.display())]
    InvalidImage {
        kind: AssetKind,
        path: PathBuf,
        reason: String,
    },

    #[error("line item {} has rate `{rate}`, expected a non-negative number", .index + 1)]
    InvalidRate { index: usize, rate: String },

    #[error("invoice total overflows at line item {}", .index + 1)]
    AmountOverflow { index: usize },

    #[error("failed to build pdf: {0}")]
    Pdf(String),

    #[error("counter file {} holds `{content}`, expected a non-negative integer", .path.display())]
    CorruptCounter { path: PathBuf, content: String },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConfigNotFound(_) | Error::ConfigSyntax { .. } | Error::Settings { .. } => {
                ErrorKind::Configuration
            }
            Error::Validation(_) => ErrorKind::Validation,
            Error::AssetNotFound { .. } => ErrorKind::AssetNotFound,
            Error::InvalidImage { .. }
            | Error::InvalidRate { .. }
            | Error::AmountOverflow { .. }
            | Error::Pdf(_) => ErrorKind::Render,
            Error::CorruptCounter { .. } => ErrorKind::CorruptCounter,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

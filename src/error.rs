//! Error and diagnostic types for the HUHM compiler

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("Invalid content pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("Watch error: {message}")]
    Watch { message: String },
}

pub type Result<T> = std::result::Result<T, CompilerError>;

impl CompilerError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    pub fn watch(message: impl Into<String>) -> Self {
        Self::Watch {
            message: message.into(),
        }
    }
}

/// A non-fatal problem found while compiling.
///
/// Diagnostics never abort a session: the offending token or rule is dropped
/// (or falls back to a literal value) and compilation carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("Unknown property '{property}' in '{token}'")]
    UnknownProperty { token: String, property: String },

    #[error("Unknown breakpoint '{breakpoint}' in '{token}'")]
    UnknownBreakpoint { token: String, breakpoint: String },

    #[error("clamp() requires exactly 3 values, found {parts} in '{token}'")]
    MalformedClamp { token: String, parts: usize },

    #[error("Element not found for class copy: #{element_id}")]
    UnresolvedElementReference { element_id: String },
}

impl Diagnostic {
    /// Log the diagnostic at warn level and record it in `sink`.
    pub fn emit(self, sink: &mut Vec<Diagnostic>) {
        log::warn!("{}", self);
        sink.push(self);
    }

    /// The token the diagnostic was raised for, if it concerns one.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::UnknownProperty { token, .. }
            | Self::UnknownBreakpoint { token, .. }
            | Self::MalformedClamp { token, .. } => Some(token),
            Self::UnresolvedElementReference { .. } => None,
        }
    }
}

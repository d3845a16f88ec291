//! Centralized error types for Wayfarer.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling throughout the codebase
//! - Provides user-friendly messages suitable for UI display
//! - Preserves full error context for debugging/logging
//!
//! None of these errors are fatal. Storage errors are recovered locally by
//! the preference stores, network errors are surfaced inline in search
//! results, and validation errors reject a single operation.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Storage(e) => e.user_message(),
            AppError::Network(e) => e.user_message(),
            AppError::Validation(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
        }
    }
}

/// Durable backing failures (read/write, quota, malformed content).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read '{key}': {message}")]
    ReadFailed { key: String, message: String },

    #[error("Failed to write '{key}': {message}")]
    WriteFailed { key: String, message: String },

    #[error("Storage quota exceeded writing '{key}' ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("Stored data under '{key}' is malformed: {message}")]
    Corrupt { key: String, message: String },

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl StorageError {
    pub fn read(key: impl Into<String>, message: impl ToString) -> Self {
        StorageError::ReadFailed {
            key: key.into(),
            message: message.to_string(),
        }
    }

    pub fn write(key: impl Into<String>, message: impl ToString) -> Self {
        StorageError::WriteFailed {
            key: key.into(),
            message: message.to_string(),
        }
    }

    pub fn corrupt(key: impl Into<String>, message: impl ToString) -> Self {
        StorageError::Corrupt {
            key: key.into(),
            message: message.to_string(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::ReadFailed { .. } => "Saved places could not be loaded.",
            StorageError::WriteFailed { .. } => "Changes could not be saved on this device.",
            StorageError::QuotaExceeded { .. } => {
                "Local storage is full. Remove some saved places and try again."
            }
            StorageError::Corrupt { .. } => "Saved places were unreadable and have been reset.",
            StorageError::Serialization(_) => "Changes could not be saved on this device.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
///
/// `Clone` so a single failed lookup can be handed to every coalesced waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The search service is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The search failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Rejected input (malformed location candidates, navigation tuples).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Location name is empty")]
    EmptyName,

    #[error("Invalid {axis}: {value}")]
    InvalidCoordinate { axis: &'static str, value: f64 },

    #[error("Malformed selection: {0}")]
    MalformedSelection(String),
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::EmptyName => "This place has no name.",
            ValidationError::InvalidCoordinate { .. } => "This place has invalid coordinates.",
            ValidationError::MalformedSelection(_) => "That selection could not be opened.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration file could not be accessed: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::Io(_) => "Configuration file could not be read or written.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_storage_error(self, key: &str) -> StorageError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_storage_error(self, key: &str) -> StorageError {
        match &self {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::DiskFull =>
            {
                StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed: 0,
                    available: 0,
                }
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                StorageError::corrupt(key, self.to_string())
            }
            _ => StorageError::write(key, self.to_string()),
        }
    }
}

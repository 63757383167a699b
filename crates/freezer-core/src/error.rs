//! Centralized error types for Freezer.
//!
//! This module provides a typed error hierarchy that:
//! - Lets background checks tell "could not evaluate" apart from "no alert"
//! - Provides user-friendly messages for the foreground refresh (retry prompt)
//! - Preserves full error context for logging

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a message suitable for showing to the user.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message, actionable and non-technical.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Location(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status == 401 => {
                "The weather service rejected the API key. Check your settings."
            }
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The weather service is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
        }
    }
}

/// Forecast fetch errors.
///
/// `Network` and `InvalidResponse` are the two failure modes of a fetch;
/// background checks log either one and stay silent for the cycle.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Invalid forecast response: {0}")]
    InvalidResponse(String),

    #[error("No OpenWeatherMap API key configured")]
    MissingApiKey,
}

impl WeatherError {
    /// Create an invalid-response error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// True when the fetch failed on the wire rather than while decoding.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::Network(e) => e.user_message(),
            WeatherError::InvalidResponse(_) => {
                "Received an unexpected forecast. Please try again."
            }
            WeatherError::MissingApiKey => "Weather API key is missing. Check settings.",
        }
    }
}

/// Location errors. Only surfaced to the foreground path.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("No location available")]
    Unavailable,

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Invalid coordinates: lat={lat}, lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::Unavailable => {
                "No location known. Pass --lat/--lon or set one in the config."
            }
            LocationError::PermissionDenied => "Location permission denied.",
            LocationError::InvalidCoordinates { .. } => {
                "Coordinates are out of range. Check latitude and longitude."
            }
        }
    }
}

/// Preference storage errors (SQLite, local state).
///
/// A missing preference is never an error; readers fall back to a default.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::ConnectionFailed(_) => {
                "Unable to access saved settings. Check the data directory."
            }
            StorageError::QueryFailed(_) => "Saving settings failed. Please try again.",
            StorageError::Corruption(_) => {
                "Saved settings may be corrupted. Consider deleting the preferences file."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
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
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_storage_error(self) -> StorageError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_storage_error(self) -> StorageError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                StorageError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                StorageError::ConnectionFailed(self.to_string())
            }
            _ => StorageError::QueryFailed(self.to_string()),
        }
    }
}

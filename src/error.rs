//! Error types and handling for the forecasting engine

use thiserror::Error;

/// Main error type for forecast computation
#[derive(Error, Debug)]
pub enum ForecastError {
    /// History shorter than the requested method needs
    #[error("Insufficient data for {method}: need at least {required} points, got {actual}")]
    InsufficientData {
        method: String,
        required: usize,
        actual: usize,
    },

    /// Trend or regression fit failed numerically
    #[error("Model fit failed: {message}")]
    ModelFit { message: String },

    /// Horizon or interval outside the supported range
    #[error("Invalid horizon: {message}")]
    InvalidHorizon { message: String },

    /// Unsupported forecast method name
    #[error("Unknown forecast method '{method}'. Must be one of: auto, hybrid, extrapolation, persistence")]
    UnknownMethod { method: String },

    /// History violates ordering or range invariants
    #[error("Invalid track: {message}")]
    InvalidTrack { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ForecastError {
    /// Create a new insufficient-data error
    pub fn insufficient_data<S: Into<String>>(method: S, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            method: method.into(),
            required,
            actual,
        }
    }

    /// Create a new model fit error
    pub fn model_fit<S: Into<String>>(message: S) -> Self {
        Self::ModelFit {
            message: message.into(),
        }
    }

    /// Create a new invalid horizon error
    pub fn invalid_horizon<S: Into<String>>(message: S) -> Self {
        Self::InvalidHorizon {
            message: message.into(),
        }
    }

    /// Create a new unknown method error
    pub fn unknown_method<S: Into<String>>(method: S) -> Self {
        Self::UnknownMethod {
            method: method.into(),
        }
    }

    /// Create a new invalid track error
    pub fn invalid_track<S: Into<String>>(message: S) -> Self {
        Self::InvalidTrack {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Errors the orchestrator may absorb by degrading to a simpler method
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientData { .. } | ForecastError::ModelFit { .. }
        )
    }

    /// Whether the caller sent a bad request, as opposed to a server-side failure
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientData { .. }
                | ForecastError::InvalidHorizon { .. }
                | ForecastError::UnknownMethod { .. }
                | ForecastError::InvalidTrack { .. }
                | ForecastError::Validation { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ForecastError::InsufficientData {
                method, required, ..
            } => format!(
                "Insufficient historical data for {method} forecast (minimum {required} points required)."
            ),
            ForecastError::ModelFit { .. } => {
                "The forecast model could not be fitted to this track.".to_string()
            }
            ForecastError::InvalidHorizon { message } => format!("Invalid horizon: {message}"),
            ForecastError::UnknownMethod { method } => format!(
                "Unknown forecast method '{method}'. Use auto, hybrid, extrapolation or persistence."
            ),
            ForecastError::InvalidTrack { message } => format!("Invalid track history: {message}"),
            ForecastError::Validation { message } => format!("Invalid input: {message}"),
            ForecastError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            ForecastError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            ForecastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.

/// Application error type.
///
/// Storage faults never surface here: the store degrades to empty values
/// and logs instead (see `store::user_store`). Analytics delivery
/// likewise swallows its failures. These variants cover the catalog,
/// validation, and auth paths.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Catalog API error: {0}")]
    CatalogApi(String),

    #[error("Invalid data: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for transient network failures worth retrying with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::CatalogApi(_))
    }
}

/// Result type alias for fallible operations.
pub type Result<T> = std::result::Result<T, AppError>;

// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Commbot community assistant.

use thiserror::Error;

/// The primary error type used across all Commbot adapters and core operations.
#[derive(Debug, Error)]
pub enum CommbotError {
    /// Configuration errors (missing credentials, unparseable values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The catalog object could not be fetched from the object store.
    #[error("failed to fetch catalog object `{key}`: {source}")]
    CatalogFetch {
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The catalog object was fetched but is not a valid table.
    #[error("failed to parse catalog object `{key}`: {message}")]
    CatalogParse { key: String, message: String },

    /// Platform API errors (transport failure, API error envelope, bad payload).
    #[error("platform error in {method}: {message}")]
    Platform {
        method: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Object store errors that are not tied to a catalog refresh.
    #[error("object store error: {message}")]
    ObjectStore {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The content request queue has no free slot.
    #[error("content request queue is full")]
    QueueFull,

    /// The content request queue has no consumer anymore.
    #[error("content request queue is closed")]
    QueueClosed,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CommbotError {
    /// Builds a [`CommbotError::Platform`] without an underlying source.
    pub fn platform(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Platform {
            method: method.into(),
            message: message.into(),
            source: None,
        }
    }
}

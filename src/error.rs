//! Unified error types for fabric-drift.
//!
//! Each subsystem has its own error enum; [`FabricDriftError`] wraps them
//! with a context chain for library callers and the binary.

use crate::codec::CodecError;
use crate::import::ImportError;
use crate::reconcile::{FetchError, ReconcileError};
use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fabric-drift operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FabricDriftError {
    /// Encoding or decoding a topology failed
    #[error("Codec failure: {context}")]
    Codec {
        context: String,
        #[source]
        source: CodecError,
    },

    /// Import failed before a result could be produced
    #[error("Import failed: {context}")]
    Import {
        context: String,
        #[source]
        source: ImportError,
    },

    /// Persisted-state read or write failed
    #[error("Storage failure: {context}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },

    /// Live cluster read failed
    #[error("Cluster fetch failed: {context}")]
    Fetch {
        context: String,
        #[source]
        source: FetchError,
    },

    /// Reconciliation setup was rejected
    #[error("Reconciliation setup failed: {context}")]
    Reconcile {
        context: String,
        #[source]
        source: ReconcileError,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for fabric-drift operations
pub type Result<T> = std::result::Result<T, FabricDriftError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl FabricDriftError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            message: source.to_string(),
            source,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

// ============================================================================
// Conversions from subsystem error types
// ============================================================================

impl From<CodecError> for FabricDriftError {
    fn from(source: CodecError) -> Self {
        Self::Codec {
            context: String::new(),
            source,
        }
    }
}

impl From<ImportError> for FabricDriftError {
    fn from(source: ImportError) -> Self {
        Self::Import {
            context: String::new(),
            source,
        }
    }
}

impl From<StoreError> for FabricDriftError {
    fn from(source: StoreError) -> Self {
        Self::Store {
            context: String::new(),
            source,
        }
    }
}

impl From<FetchError> for FabricDriftError {
    fn from(source: FetchError) -> Self {
        Self::Fetch {
            context: String::new(),
            source,
        }
    }
}

impl From<ReconcileError> for FabricDriftError {
    fn from(source: ReconcileError) -> Self {
        Self::Reconcile {
            context: String::new(),
            source,
        }
    }
}

impl From<std::io::Error> for FabricDriftError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: err.to_string(),
            source: err,
        }
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings chain outward, so an error passed up through two layers
/// reads `outer: inner: original`.
///
/// ```ignore
/// use fabric_drift::error::ErrorContext;
///
/// let layout = read_layout(dir).with_context(|| format!("loading {}", dir.display()))?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<FabricDriftError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: FabricDriftError, new_ctx: &str) -> FabricDriftError {
    use FabricDriftError as E;
    match err {
        E::Codec { context, source } => E::Codec {
            context: chain_context(new_ctx, &context),
            source,
        },
        E::Import { context, source } => E::Import {
            context: chain_context(new_ctx, &context),
            source,
        },
        E::Store { context, source } => E::Store {
            context: chain_context(new_ctx, &context),
            source,
        },
        E::Fetch { context, source } => E::Fetch {
            context: chain_context(new_ctx, &context),
            source,
        },
        E::Reconcile { context, source } => E::Reconcile {
            context: chain_context(new_ctx, &context),
            source,
        },
        E::Io {
            path,
            message,
            source,
        } => E::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        E::Config(msg) => E::Config(chain_context(new_ctx, &msg)),
    }
}

/// Chain two context strings together.
///
/// If the existing context is empty, returns just the new context.
/// Otherwise, returns "`new_context`: `existing_context`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_chaining() {
        fn inner() -> Result<()> {
            Err(CodecError::parse("servers.yaml", "bad indentation").into())
        }

        fn outer() -> Result<()> {
            inner().context("decoding lab").context("importing")
        }

        match outer() {
            Err(FabricDriftError::Codec { context, source }) => {
                assert_eq!(context, "importing: decoding lab");
                assert_eq!(source.file(), "servers.yaml");
            }
            other => panic!("expected codec error, got {other:?}"),
        }
    }

    #[test]
    fn test_io_error_names_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = FabricDriftError::io("/state/lab/fgd", io_err);
        assert!(err.to_string().contains("/state/lab/fgd"));
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let mut called = false;
        let ok: std::result::Result<i32, FetchError> = Ok(1);
        let _ = ok.with_context(|| {
            called = true;
            "unused"
        });
        assert!(!called);

        let err: std::result::Result<i32, FetchError> = Err(FetchError::Canceled);
        match err.with_context(|| "listing switches") {
            Err(FabricDriftError::Fetch { context, .. }) => assert_eq!(context, "listing switches"),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[test]
    fn test_config_error_chains_context() {
        let err: Result<()> = Err(FabricDriftError::config("reconcile.maxAttempts must be at least 1"));
        match err.context("loading fabric-drift.yaml") {
            Err(FabricDriftError::Config(msg)) => {
                assert_eq!(msg, "loading fabric-drift.yaml: reconcile.maxAttempts must be at least 1");
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_chain_context_helper() {
        assert_eq!(chain_context("new", ""), "new");
        assert_eq!(chain_context("outer", "middle: inner"), "outer: middle: inner");
    }
}

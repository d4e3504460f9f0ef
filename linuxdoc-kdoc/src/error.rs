use std::io;

use thiserror::Error;

/// Top-level error type for the kernel-doc core.
///
/// Failures that abort an operation are surfaced through this type.
/// Diagnostics produced *during* a parse (unparsable prototypes, parameter
/// mismatches, duplicate names, ...) are recoverable and go through
/// [`crate::Reporter`] instead; the parse continues and the caller inspects
/// the error/warning totals afterwards.
#[derive(Debug, Error)]
pub enum KdocError {
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  #[error("configuration error: {0}")]
  Config(String),

  #[error("{file}: fatal parse failure: {message}")]
  Fatal { file: String, message: String },
}

impl From<std::fmt::Error> for KdocError {
  fn from(e: std::fmt::Error) -> Self {
    Self::Io(io::Error::other(e.to_string()))
  }
}

pub type Result<T> = std::result::Result<T, KdocError>;
